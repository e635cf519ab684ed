use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Профиль пользователя. Пустые поля сервер возвращает как `null`.
pub struct Profile {
    /// Имя.
    pub first_name: Option<String>,
    /// Фамилия.
    pub last_name: Option<String>,
    /// О себе.
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Краткая проекция пользователя в подписках, постах и комментариях.
pub struct UserSummary {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Логин.
    pub username: String,
    /// Профиль.
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель пользователя (без пароля).
pub struct User {
    /// Идентификатор пользователя.
    pub id: i64,
    /// Логин.
    pub username: String,
    /// Email в нижнем регистре.
    pub email: String,
    /// Профиль.
    pub profile: Profile,
    /// Подписчики (входящие связи).
    pub followers: Vec<UserSummary>,
    /// Подписки (исходящие связи).
    pub following: Vec<UserSummary>,
    /// Количество подписчиков.
    pub followers_count: usize,
    /// Количество подписок.
    pub following_count: usize,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Дата и время последнего изменения (UTC).
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Комментарий к посту.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: i64,
    /// Текст.
    pub text: String,
    /// Автор; `None`, если аккаунт автора удалён.
    pub author: Option<UserSummary>,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Публичная модель поста.
pub struct Post {
    /// Идентификатор поста.
    pub id: i64,
    /// Заголовок.
    pub title: String,
    /// Содержимое.
    pub content: String,
    /// Краткое описание.
    pub excerpt: String,
    /// Автор.
    pub author: UserSummary,
    /// Идентификаторы пользователей, поставивших лайк.
    pub likes: Vec<i64>,
    /// Количество лайков.
    pub likes_count: usize,
    /// Количество просмотров.
    pub views: i64,
    /// Дата публикации (UTC).
    pub published_at: DateTime<Utc>,
    /// Комментарии в порядке добавления.
    pub comments: Vec<Comment>,
    /// Количество комментариев.
    pub comments_count: usize,
    /// Время чтения в минутах.
    pub reading_time: usize,
    /// Дата и время создания (UTC).
    pub created_at: DateTime<Utc>,
    /// Дата и время последнего изменения (UTC).
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Метаданные пагинации.
pub struct PageMeta {
    /// Общее количество элементов.
    pub total: u64,
    /// Номер страницы (с 1).
    pub page: u32,
    /// Размер страницы.
    pub limit: u32,
    /// Количество страниц.
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Страница списка.
pub struct Page<T> {
    /// Элементы текущей страницы.
    pub items: Vec<T>,
    /// Метаданные пагинации.
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Результат подписки или отписки.
pub struct FollowResult {
    /// Подписчик после операции.
    pub follower: User,
    /// Целевой пользователь после операции.
    pub target: User,
    /// `true`, если подписка создана этим запросом.
    pub followed: bool,
    /// Количество подписчиков целевого пользователя.
    pub followers_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Результат переключения лайка.
pub struct LikeResult {
    /// `true`, если лайк поставлен, `false`, если снят.
    pub liked: bool,
    /// Количество лайков после операции.
    pub likes_count: usize,
    /// Пост после операции.
    pub post: Post,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
/// Поля профиля для создания или изменения пользователя.
pub struct ProfileInput {
    /// Имя; пустая строка очищает поле.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Фамилия; пустая строка очищает поле.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// О себе; пустая строка очищает поле.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
/// Данные для регистрации пользователя.
pub struct NewUser {
    /// Логин (3..=64 символов).
    pub username: String,
    /// Email.
    pub email: String,
    /// Пароль (6..=128 символов).
    pub password: String,
    /// Профиль.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileInput>,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Изменение пользователя: отправляются только заданные поля.
pub struct UserUpdate {
    /// Новый логин.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Новый email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Новый пароль.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Изменения профиля.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileInput>,
}

impl UserUpdate {
    /// `true`, если не задано ни одного поля.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.profile.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
/// Частичное изменение поста.
pub struct PostPatch {
    /// Новый заголовок.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Новое содержимое.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
