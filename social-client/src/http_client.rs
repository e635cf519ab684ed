use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{SocialClientError, SocialClientResult};
use crate::models::{
    FollowResult, LikeResult, NewUser, Page, Post, PostPatch, User, UserUpdate,
};

#[derive(Debug, Deserialize)]
struct EnvelopeDto<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActorDto {
    user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostRequestDto<'a> {
    title: &'a str,
    content: &'a str,
    author: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePostRequestDto<'a> {
    title: &'a str,
    content: &'a str,
    user_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchPostRequestDto<'a> {
    #[serde(flatten)]
    patch: &'a PostPatch,
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct CreateCommentRequestDto<'a> {
    text: &'a str,
    author: i64,
}

#[derive(Debug, Serialize)]
struct ListQuery<'a> {
    page: u32,
    limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

#[derive(Debug, Clone)]
/// HTTP-клиент для работы с REST API `social-server`.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт новый HTTP-клиент с базовым URL сервера.
    pub fn new(base_url: impl Into<String>) -> SocialClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.endpoint(path))
    }

    fn error_message(status: StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorResponseDto>(body) {
            Ok(ErrorResponseDto {
                error: Some(error),
                message: Some(message),
            }) => format!("{error}: {message}"),
            Ok(ErrorResponseDto {
                error: Some(error), ..
            }) => error,
            Ok(ErrorResponseDto {
                message: Some(message),
                ..
            }) => message,
            _ => format!("http status {status}"),
        }
    }

    async fn decode_error(response: reqwest::Response) -> SocialClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        SocialClientError::from_http_status(status, Some(Self::error_message(status, &body)))
    }

    async fn execute(&self, request: RequestBuilder) -> SocialClientResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(SocialClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    /// отправляет запрос и достаёт `data` из конверта `{success, data}`
    async fn fetch<TRes>(&self, request: RequestBuilder) -> SocialClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let envelope = self
            .execute(request)
            .await?
            .json::<EnvelopeDto<TRes>>()
            .await
            .map_err(SocialClientError::from_reqwest)?;
        Ok(envelope.data)
    }

    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
    ) -> SocialClientResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        self.fetch(self.request(method, path).json(body)).await
    }

    /// Проверяет доступность сервера и хранилища (`GET /health`).
    pub async fn health(&self) -> SocialClientResult<()> {
        self.execute(self.request(Method::GET, "/health")).await?;
        Ok(())
    }

    /// Возвращает страницу пользователей, опционально с поиском по логину/email.
    pub async fn list_users(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> SocialClientResult<Page<User>> {
        let query = ListQuery {
            page,
            limit,
            search,
        };
        self.fetch(self.request(Method::GET, "/api/users").query(&query))
            .await
    }

    /// Получает пользователя по идентификатору.
    pub async fn get_user(&self, id: i64) -> SocialClientResult<User> {
        self.fetch(self.request(Method::GET, &format!("/api/users/{id}")))
            .await
    }

    /// Регистрирует пользователя.
    pub async fn create_user(&self, user: &NewUser) -> SocialClientResult<User> {
        self.send_json(Method::POST, "/api/users", user).await
    }

    /// Полностью обновляет пользователя (`PUT`).
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> SocialClientResult<User> {
        self.send_json(Method::PUT, &format!("/api/users/{id}"), update)
            .await
    }

    /// Частично обновляет пользователя (`PATCH`).
    pub async fn patch_user(&self, id: i64, update: &UserUpdate) -> SocialClientResult<User> {
        self.send_json(Method::PATCH, &format!("/api/users/{id}"), update)
            .await
    }

    /// Удаляет пользователя. Сервер отвечает `204` без тела.
    pub async fn delete_user(&self, id: i64) -> SocialClientResult<()> {
        self.execute(self.request(Method::DELETE, &format!("/api/users/{id}")))
            .await?;
        Ok(())
    }

    /// Подписывает `actor` на пользователя `target`.
    pub async fn follow(&self, actor: i64, target: i64) -> SocialClientResult<FollowResult> {
        let payload = ActorDto { user_id: actor };
        self.send_json(
            Method::POST,
            &format!("/api/users/{target}/follow"),
            &payload,
        )
        .await
    }

    /// Отписывает `actor` от пользователя `target`.
    pub async fn unfollow(&self, actor: i64, target: i64) -> SocialClientResult<FollowResult> {
        let payload = ActorDto { user_id: actor };
        self.send_json(
            Method::POST,
            &format!("/api/users/{target}/unfollow"),
            &payload,
        )
        .await
    }

    /// Возвращает страницу постов автора.
    pub async fn list_user_posts(
        &self,
        user_id: i64,
        page: u32,
        limit: u32,
    ) -> SocialClientResult<Page<Post>> {
        let query = ListQuery {
            page,
            limit,
            search: None,
        };
        self.fetch(
            self.request(Method::GET, &format!("/api/users/{user_id}/posts"))
                .query(&query),
        )
        .await
    }

    /// Возвращает страницу постов, опционально с поиском по заголовку/тексту.
    pub async fn list_posts(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> SocialClientResult<Page<Post>> {
        let query = ListQuery {
            page,
            limit,
            search,
        };
        self.fetch(self.request(Method::GET, "/api/posts").query(&query))
            .await
    }

    /// Получает пост по идентификатору. Каждый вызов увеличивает счётчик просмотров.
    pub async fn get_post(&self, id: i64) -> SocialClientResult<Post> {
        self.fetch(self.request(Method::GET, &format!("/api/posts/{id}")))
            .await
    }

    /// Создаёт пост от имени `author`.
    pub async fn create_post(
        &self,
        author: i64,
        title: &str,
        content: &str,
        excerpt: Option<&str>,
    ) -> SocialClientResult<Post> {
        let payload = CreatePostRequestDto {
            title,
            content,
            author,
            excerpt,
        };
        self.send_json(Method::POST, "/api/posts", &payload).await
    }

    /// Полностью обновляет пост. Разрешено только автору.
    pub async fn update_post(
        &self,
        actor: i64,
        id: i64,
        title: &str,
        content: &str,
    ) -> SocialClientResult<Post> {
        let payload = UpdatePostRequestDto {
            title,
            content,
            user_id: actor,
        };
        self.send_json(Method::PUT, &format!("/api/posts/{id}"), &payload)
            .await
    }

    /// Частично обновляет пост. Разрешено только автору.
    pub async fn patch_post(
        &self,
        actor: i64,
        id: i64,
        patch: &PostPatch,
    ) -> SocialClientResult<Post> {
        let payload = PatchPostRequestDto {
            patch,
            user_id: actor,
        };
        self.send_json(Method::PATCH, &format!("/api/posts/{id}"), &payload)
            .await
    }

    /// Удаляет пост и возвращает его последнее состояние. Разрешено только автору.
    pub async fn delete_post(&self, actor: i64, id: i64) -> SocialClientResult<Post> {
        let query = ActorDto { user_id: actor };
        self.fetch(
            self.request(Method::DELETE, &format!("/api/posts/{id}"))
                .query(&query),
        )
        .await
    }

    /// Добавляет комментарий `author` к посту.
    pub async fn add_comment(
        &self,
        author: i64,
        post_id: i64,
        text: &str,
    ) -> SocialClientResult<Post> {
        let payload = CreateCommentRequestDto { text, author };
        self.send_json(
            Method::POST,
            &format!("/api/posts/{post_id}/comments"),
            &payload,
        )
        .await
    }

    /// Ставит или снимает лайк `actor` на посте.
    pub async fn toggle_like(&self, actor: i64, post_id: i64) -> SocialClientResult<LikeResult> {
        let payload = ActorDto { user_id: actor };
        self.send_json(
            Method::POST,
            &format!("/api/posts/{post_id}/like"),
            &payload,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = HttpClient::new("http://localhost:8080/").expect("client");
        let full = client.endpoint("/api/posts");
        assert_eq!(full, "http://localhost:8080/api/posts");
    }

    #[test]
    fn error_message_joins_error_and_message() {
        let body = r#"{"success":false,"error":"Not found","message":"Route /x does not exist"}"#;
        assert_eq!(
            HttpClient::error_message(StatusCode::NOT_FOUND, body),
            "Not found: Route /x does not exist"
        );

        let body = r#"{"success":false,"error":"User not found"}"#;
        assert_eq!(
            HttpClient::error_message(StatusCode::NOT_FOUND, body),
            "User not found"
        );

        assert_eq!(
            HttpClient::error_message(StatusCode::BAD_GATEWAY, "<html>"),
            "http status 502 Bad Gateway"
        );
    }

    #[test]
    fn patch_payload_carries_only_set_fields() {
        let patch = PostPatch {
            title: Some("New".to_string()),
            content: None,
        };
        let payload = PatchPostRequestDto {
            patch: &patch,
            user_id: 7,
        };

        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json, serde_json::json!({"title": "New", "userId": 7}));
    }

    #[test]
    fn post_envelope_decodes_server_shape() {
        let body = serde_json::json!({
            "success": true,
            "data": {
                "id": 3,
                "title": "Hello",
                "content": "World",
                "excerpt": "World",
                "author": {"id": 1, "username": "alice", "profile": {"firstName": null, "lastName": null, "bio": null}},
                "likes": [2],
                "likesCount": 1,
                "views": 4,
                "publishedAt": "2026-01-01T00:00:00Z",
                "comments": [{
                    "id": 9,
                    "text": "nice",
                    "author": null,
                    "createdAt": "2026-01-02T00:00:00Z"
                }],
                "commentsCount": 1,
                "readingTime": 1,
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-01T00:00:00Z"
            }
        });

        let envelope: EnvelopeDto<Post> = serde_json::from_value(body).expect("decode");
        let post = envelope.data;
        assert_eq!(post.id, 3);
        assert_eq!(post.author.username, "alice");
        assert_eq!(post.likes, vec![2]);
        assert!(post.comments[0].author.is_none());
    }
}
