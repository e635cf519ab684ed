//! Клиентская библиотека для работы с social-server по HTTP.
//!
//! `SocialClient` оборачивает REST API (`/api/users`, `/api/posts`),
//! распаковывает конверт `{success, data}` и превращает ошибки сервера
//! в `SocialClientError`.
//!
//! Сервер не аутентифицирует запросы: действующий пользователь передаётся
//! идентификатором. Клиент хранит его после `set_actor` и подставляет
//! в операции, которые выполняются от имени пользователя.
#![warn(missing_docs)]

mod error;
mod http_client;
mod models;

pub use error::{SocialClientError, SocialClientResult};
pub use models::{
    Comment, FollowResult, LikeResult, NewUser, Page, PageMeta, Post, PostPatch, Profile,
    ProfileInput, User, UserSummary, UserUpdate,
};

use http_client::HttpClient;

#[derive(Debug, Clone)]
/// Клиент для работы с социальным блог-сервисом.
pub struct SocialClient {
    http_client: HttpClient,
    actor: Option<i64>,
}

impl SocialClient {
    /// Создаёт клиент для сервера с базовым URL, например `http://127.0.0.1:3000`.
    pub fn new(base_url: impl Into<String>) -> SocialClientResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(base_url)?,
            actor: None,
        })
    }

    /// Устанавливает действующего пользователя.
    pub fn set_actor(&mut self, user_id: i64) {
        self.actor = Some(user_id);
    }

    /// Возвращает идентификатор действующего пользователя, если он установлен.
    pub fn actor(&self) -> Option<i64> {
        self.actor
    }

    /// Сбрасывает действующего пользователя.
    pub fn clear_actor(&mut self) {
        self.actor = None;
    }

    /// Проверяет доступность сервера и его хранилища.
    pub async fn health(&self) -> SocialClientResult<()> {
        self.http_client.health().await
    }

    /// Возвращает страницу пользователей.
    pub async fn list_users(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> SocialClientResult<Page<User>> {
        self.http_client.list_users(page, limit, search).await
    }

    /// Возвращает пользователя по идентификатору.
    pub async fn get_user(&self, id: i64) -> SocialClientResult<User> {
        self.http_client.get_user(id).await
    }

    /// Регистрирует пользователя и делает его действующим.
    pub async fn register(&mut self, user: &NewUser) -> SocialClientResult<User> {
        let created = self.http_client.create_user(user).await?;
        self.actor = Some(created.id);
        Ok(created)
    }

    /// Полностью обновляет пользователя.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> SocialClientResult<User> {
        self.http_client.update_user(id, update).await
    }

    /// Частично обновляет пользователя.
    ///
    /// Пустое изменение отклоняется без обращения к серверу.
    pub async fn patch_user(&self, id: i64, update: &UserUpdate) -> SocialClientResult<User> {
        if update.is_empty() {
            return Err(SocialClientError::InvalidRequest(
                "request body must not be empty".to_string(),
            ));
        }
        self.http_client.patch_user(id, update).await
    }

    /// Удаляет пользователя. Если это действующий пользователь, он сбрасывается.
    pub async fn delete_user(&mut self, id: i64) -> SocialClientResult<()> {
        self.http_client.delete_user(id).await?;
        if self.actor == Some(id) {
            self.actor = None;
        }
        Ok(())
    }

    /// Подписывает действующего пользователя на `target`.
    ///
    /// Требует установленного действующего пользователя.
    pub async fn follow(&self, target: i64) -> SocialClientResult<FollowResult> {
        let actor = self.require_actor()?;
        self.http_client.follow(actor, target).await
    }

    /// Отписывает действующего пользователя от `target`.
    ///
    /// Требует установленного действующего пользователя.
    pub async fn unfollow(&self, target: i64) -> SocialClientResult<FollowResult> {
        let actor = self.require_actor()?;
        self.http_client.unfollow(actor, target).await
    }

    /// Возвращает страницу постов пользователя.
    pub async fn list_user_posts(
        &self,
        user_id: i64,
        page: u32,
        limit: u32,
    ) -> SocialClientResult<Page<Post>> {
        self.http_client.list_user_posts(user_id, page, limit).await
    }

    /// Возвращает страницу постов.
    pub async fn list_posts(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
    ) -> SocialClientResult<Page<Post>> {
        self.http_client.list_posts(page, limit, search).await
    }

    /// Возвращает пост по идентификатору.
    pub async fn get_post(&self, id: i64) -> SocialClientResult<Post> {
        self.http_client.get_post(id).await
    }

    /// Создаёт пост от имени действующего пользователя.
    ///
    /// Требует установленного действующего пользователя.
    pub async fn create_post(
        &self,
        title: &str,
        content: &str,
        excerpt: Option<&str>,
    ) -> SocialClientResult<Post> {
        let actor = self.require_actor()?;
        self.http_client
            .create_post(actor, title, content, excerpt)
            .await
    }

    /// Полностью обновляет пост.
    ///
    /// Требует установленного действующего пользователя; он должен быть автором.
    pub async fn update_post(&self, id: i64, title: &str, content: &str) -> SocialClientResult<Post> {
        let actor = self.require_actor()?;
        self.http_client.update_post(actor, id, title, content).await
    }

    /// Частично обновляет пост.
    ///
    /// Требует установленного действующего пользователя; он должен быть автором.
    pub async fn patch_post(&self, id: i64, patch: &PostPatch) -> SocialClientResult<Post> {
        let actor = self.require_actor()?;
        self.http_client.patch_post(actor, id, patch).await
    }

    /// Удаляет пост и возвращает его последнее состояние.
    ///
    /// Требует установленного действующего пользователя; он должен быть автором.
    pub async fn delete_post(&self, id: i64) -> SocialClientResult<Post> {
        let actor = self.require_actor()?;
        self.http_client.delete_post(actor, id).await
    }

    /// Комментирует пост от имени действующего пользователя.
    pub async fn add_comment(&self, post_id: i64, text: &str) -> SocialClientResult<Post> {
        let actor = self.require_actor()?;
        self.http_client.add_comment(actor, post_id, text).await
    }

    /// Ставит или снимает лайк действующего пользователя.
    pub async fn toggle_like(&self, post_id: i64) -> SocialClientResult<LikeResult> {
        let actor = self.require_actor()?;
        self.http_client.toggle_like(actor, post_id).await
    }

    fn require_actor(&self) -> SocialClientResult<i64> {
        self.actor.ok_or(SocialClientError::MissingActor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn actor_bound_operations_fail_without_actor() {
        let client = SocialClient::new("http://127.0.0.1:9").expect("client");

        let err = client.follow(1).await.expect_err("no actor");
        assert!(matches!(err, SocialClientError::MissingActor));

        let err = client.delete_post(1).await.expect_err("no actor");
        assert!(matches!(err, SocialClientError::MissingActor));
    }

    #[tokio::test]
    async fn empty_patch_is_rejected_locally() {
        let client = SocialClient::new("http://127.0.0.1:9").expect("client");

        let err = client
            .patch_user(1, &UserUpdate::default())
            .await
            .expect_err("empty patch");
        assert!(matches!(err, SocialClientError::InvalidRequest(_)));
    }

    #[test]
    fn actor_can_be_set_and_cleared() {
        let mut client = SocialClient::new("http://127.0.0.1:9").expect("client");
        assert_eq!(client.actor(), None);

        client.set_actor(42);
        assert_eq!(client.actor(), Some(42));

        client.clear_actor();
        assert_eq!(client.actor(), None);
    }
}
