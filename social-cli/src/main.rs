use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use social_client::{
    NewUser, Page, Post, PostPatch, ProfileInput, SocialClient, SocialClientError, User,
    UserUpdate,
};

const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Debug, Parser)]
#[command(name = "social-cli", version, about = "CLI клиент для social-server")]
struct Cli {
    /// Адрес сервера.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Идентификатор действующего пользователя.
    #[arg(long = "as", value_name = "ID", global = true)]
    actor: Option<i64>,

    /// Печатать ответ сервера как JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Проверка доступности сервера.
    Health,
    /// Операции с пользователями.
    Users {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Операции с постами.
    Posts {
        #[command(subcommand)]
        action: PostCommand,
    },
}

#[derive(Debug, Args)]
struct PageArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = 10)]
    limit: u32,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    bio: Option<String>,
}

impl ProfileArgs {
    fn into_input(self) -> Option<ProfileInput> {
        if self.first_name.is_none() && self.last_name.is_none() && self.bio.is_none() {
            return None;
        }
        Some(ProfileInput {
            first_name: self.first_name,
            last_name: self.last_name,
            bio: self.bio,
        })
    }
}

#[derive(Debug, Args)]
struct UserUpdateArgs {
    #[arg(long)]
    id: i64,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[command(flatten)]
    profile: ProfileArgs,
}

impl UserUpdateArgs {
    fn into_update(self) -> (i64, UserUpdate) {
        let update = UserUpdate {
            username: self.username,
            email: self.email,
            password: self.password,
            profile: self.profile.into_input(),
        };
        (self.id, update)
    }
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// Список пользователей.
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Поиск по логину или email.
        #[arg(long)]
        search: Option<String>,
    },
    /// Получение пользователя по id.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Регистрация пользователя.
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Полное обновление пользователя (PUT).
    Update(UserUpdateArgs),
    /// Частичное обновление пользователя (PATCH).
    Patch(UserUpdateArgs),
    /// Удаление пользователя.
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Подписка на пользователя (требует --as).
    Follow {
        #[arg(long)]
        id: i64,
    },
    /// Отписка от пользователя (требует --as).
    Unfollow {
        #[arg(long)]
        id: i64,
    },
    /// Посты пользователя.
    Posts {
        #[arg(long)]
        id: i64,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, Subcommand)]
enum PostCommand {
    /// Список постов.
    List {
        #[command(flatten)]
        page: PageArgs,
        /// Поиск по заголовку или содержимому.
        #[arg(long)]
        search: Option<String>,
    },
    /// Получение поста по id.
    Get {
        #[arg(long)]
        id: i64,
    },
    /// Создание поста (требует --as).
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        excerpt: Option<String>,
    },
    /// Обновление поста (требует --as).
    ///
    /// Если `--content` не указан, используется текущее содержимое поста.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: Option<String>,
    },
    /// Частичное обновление поста (требует --as).
    Patch {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Удаление поста (требует --as).
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Комментарий к посту (требует --as).
    Comment {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        text: String,
    },
    /// Поставить или снять лайк (требует --as).
    Like {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let server = normalize_server(cli.server.unwrap_or_else(|| DEFAULT_SERVER.to_string()));
    let mut client = SocialClient::new(server).context("не удалось создать HTTP-клиент")?;
    if let Some(actor) = cli.actor {
        client.set_actor(actor);
    }
    let output = Output { json: cli.json };

    match cli.command {
        Command::Health => {
            client.health().await.map_err(map_client_error)?;
            println!("Сервер доступен");
        }
        Command::Users { action } => run_users(&mut client, action, output).await?,
        Command::Posts { action } => run_posts(&client, action, output).await?,
    }

    Ok(())
}

async fn run_users(client: &mut SocialClient, action: UserCommand, output: Output) -> Result<()> {
    match action {
        UserCommand::List { page, search } => {
            let list = client
                .list_users(page.page, page.limit, search.as_deref())
                .await
                .map_err(map_client_error)?;
            output.emit(&list, || print_user_page(&list))?;
        }
        UserCommand::Get { id } => {
            let user = client.get_user(id).await.map_err(map_client_error)?;
            output.emit(&user, || print_user("Пользователь", &user))?;
        }
        UserCommand::Create {
            username,
            email,
            password,
            profile,
        } => {
            let new_user = NewUser {
                username,
                email,
                password,
                profile: profile.into_input(),
            };
            let user = client
                .register(&new_user)
                .await
                .map_err(map_client_error)?;
            output.emit(&user, || print_user("Пользователь создан", &user))?;
        }
        UserCommand::Update(args) => {
            let (id, update) = args.into_update();
            let user = client
                .update_user(id, &update)
                .await
                .map_err(map_client_error)?;
            output.emit(&user, || print_user("Пользователь обновлён", &user))?;
        }
        UserCommand::Patch(args) => {
            let (id, update) = args.into_update();
            let user = client
                .patch_user(id, &update)
                .await
                .map_err(map_client_error)?;
            output.emit(&user, || print_user("Пользователь обновлён", &user))?;
        }
        UserCommand::Delete { id } => {
            client.delete_user(id).await.map_err(map_client_error)?;
            println!("Пользователь удалён: id={id}");
        }
        UserCommand::Follow { id } => {
            let result = client.follow(id).await.map_err(map_client_error)?;
            output.emit(&result, || {
                if result.followed {
                    println!("Подписка оформлена");
                } else {
                    println!("Подписка уже существовала");
                }
                println!(
                    "{} -> {} (подписчиков: {})",
                    result.follower.username, result.target.username, result.followers_count
                );
            })?;
        }
        UserCommand::Unfollow { id } => {
            let result = client.unfollow(id).await.map_err(map_client_error)?;
            output.emit(&result, || {
                println!("Подписка отменена");
                println!(
                    "{} -/-> {} (подписчиков: {})",
                    result.follower.username, result.target.username, result.followers_count
                );
            })?;
        }
        UserCommand::Posts { id, page } => {
            let list = client
                .list_user_posts(id, page.page, page.limit)
                .await
                .map_err(map_client_error)?;
            output.emit(&list, || print_post_page(&list))?;
        }
    }
    Ok(())
}

async fn run_posts(client: &SocialClient, action: PostCommand, output: Output) -> Result<()> {
    match action {
        PostCommand::List { page, search } => {
            let list = client
                .list_posts(page.page, page.limit, search.as_deref())
                .await
                .map_err(map_client_error)?;
            output.emit(&list, || print_post_page(&list))?;
        }
        PostCommand::Get { id } => {
            let post = client.get_post(id).await.map_err(map_client_error)?;
            output.emit(&post, || print_post("Пост", &post))?;
        }
        PostCommand::Create {
            title,
            content,
            excerpt,
        } => {
            let post = client
                .create_post(&title, &content, excerpt.as_deref())
                .await
                .map_err(map_client_error)?;
            output.emit(&post, || print_post("Пост создан", &post))?;
        }
        PostCommand::Update { id, title, content } => {
            // без --content сохраняем текущее содержимое поста
            let content = match content {
                Some(content) => content,
                None => client.get_post(id).await.map_err(map_client_error)?.content,
            };

            let post = client
                .update_post(id, &title, &content)
                .await
                .map_err(map_client_error)?;
            output.emit(&post, || print_post("Пост обновлён", &post))?;
        }
        PostCommand::Patch { id, title, content } => {
            let post = client
                .patch_post(id, &PostPatch { title, content })
                .await
                .map_err(map_client_error)?;
            output.emit(&post, || print_post("Пост обновлён", &post))?;
        }
        PostCommand::Delete { id } => {
            let post = client.delete_post(id).await.map_err(map_client_error)?;
            output.emit(&post, || println!("Пост удалён: id={}", post.id))?;
        }
        PostCommand::Comment { id, text } => {
            let post = client
                .add_comment(id, &text)
                .await
                .map_err(map_client_error)?;
            output.emit(&post, || print_post("Комментарий добавлен", &post))?;
        }
        PostCommand::Like { id } => {
            let result = client.toggle_like(id).await.map_err(map_client_error)?;
            output.emit(&result, || {
                if result.liked {
                    println!("Лайк поставлен");
                } else {
                    println!("Лайк снят");
                }
                println!("Лайков: {}", result.likes_count);
            })?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(self, value: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            let rendered =
                serde_json::to_string_pretty(value).context("не удалось сериализовать ответ")?;
            println!("{rendered}");
        } else {
            human();
        }
        Ok(())
    }
}

fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn map_client_error(err: SocialClientError) -> anyhow::Error {
    let message = match err {
        SocialClientError::MissingActor => {
            "требуется действующий пользователь: укажите `--as <id>`".to_string()
        }
        SocialClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        SocialClientError::Forbidden(message) => format!("действие запрещено: {message}"),
        SocialClientError::NotFound(message) => format!("не найдено: {message}"),
        SocialClientError::Conflict(message) => format!("конфликт: {message}"),
        SocialClientError::Unavailable(message) => format!("сервис недоступен: {message}"),
        SocialClientError::Server { status, message } => {
            format!("ошибка сервера ({status}): {message}")
        }
        SocialClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };
    anyhow::anyhow!(message)
}

fn print_user(title: &str, user: &User) {
    println!("{title}");
    println!("id: {}", user.id);
    println!("username: {}", user.username);
    println!("email: {}", user.email);
    if let Some(first_name) = &user.profile.first_name {
        println!("first_name: {first_name}");
    }
    if let Some(last_name) = &user.profile.last_name {
        println!("last_name: {last_name}");
    }
    if let Some(bio) = &user.profile.bio {
        println!("bio: {bio}");
    }
    println!("followers: {}", user.followers_count);
    println!("following: {}", user.following_count);
    println!("created_at: {}", user.created_at);
}

fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("author: {} (id={})", post.author.username, post.author.id);
    println!("published_at: {}", post.published_at);
    println!(
        "views: {}, likes: {}, comments: {}, reading_time: {} мин",
        post.views, post.likes_count, post.comments_count, post.reading_time
    );
    println!("content: {}", post.content);
    for comment in &post.comments {
        let author = comment
            .author
            .as_ref()
            .map_or("<удалён>", |author| author.username.as_str());
        println!("  - {author}: {}", comment.text);
    }
}

fn page_header<T>(label: &str, page: &Page<T>) -> String {
    format!(
        "{label}: {} (page={}/{}, limit={}, total={})",
        page.items.len(),
        page.meta.page,
        page.meta.total_pages,
        page.meta.limit,
        page.meta.total
    )
}

fn print_user_page(page: &Page<User>) {
    println!("{}", page_header("Пользователей", page));
    for user in &page.items {
        println!("- [{}] {} <{}>", user.id, user.username, user.email);
    }
}

fn print_post_page(page: &Page<Post>) {
    println!("{}", page_header("Постов", page));
    for post in &page.items {
        println!("- [{}] {} (author={})", post.id, post.title, post.author.username);
    }
}
