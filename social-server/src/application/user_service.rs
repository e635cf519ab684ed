use std::sync::Arc;

use tracing::{debug, info};

use crate::application::password::hash_password;
use crate::data::user_repository::{NewUser, UserChanges, UserFilter, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::user::{CreateUserRequest, UpdateUserRequest, User};

#[derive(Debug, Clone)]
pub(crate) struct FollowOutcome {
    pub(crate) follower: User,
    pub(crate) target: User,
    /// `true` only when this call created the relationship.
    pub(crate) followed: bool,
}

pub(crate) struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub(crate) fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub(crate) async fn list_users(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        let filter = UserFilter {
            search: normalize_search(search),
        };
        let users = self.repo.list_users(&filter, page).await?;
        let total = self.repo.count_users(&filter).await?;

        Ok(Page::new(users, total, page))
    }

    pub(crate) async fn get_user(&self, id: i64) -> Result<User, DomainError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    pub(crate) async fn create_user(&self, req: CreateUserRequest) -> Result<User, DomainError> {
        let req = req.validate()?;
        let password_hash = hash_password(&req.password)?;

        let user = self
            .repo
            .create_user(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                profile: req.profile,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// PUT semantics: only provided fields are written, an empty edit returns
    /// the stored user unchanged.
    pub(crate) async fn update_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        self.apply_update(id, req).await
    }

    pub(crate) async fn patch_user(
        &self,
        id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        if req.is_empty() {
            return Err(DomainError::bad_request("request body must not be empty"));
        }
        self.apply_update(id, req).await
    }

    async fn apply_update(&self, id: i64, req: UpdateUserRequest) -> Result<User, DomainError> {
        let req = req.validate()?;
        let password_hash = req.password.as_deref().map(hash_password).transpose()?;

        self.repo
            .update_user(id, UserChanges::from_valid(req, password_hash))
            .await?
            .ok_or_else(|| DomainError::not_found("user"))
    }

    pub(crate) async fn delete_user(&self, id: i64) -> Result<(), DomainError> {
        if !self.repo.delete_user(id).await? {
            return Err(DomainError::not_found("user"));
        }
        info!(user_id = id, "user deleted");
        Ok(())
    }

    pub(crate) async fn follow(
        &self,
        follower_id: i64,
        target_id: i64,
    ) -> Result<FollowOutcome, DomainError> {
        self.ensure_pair(follower_id, target_id).await?;

        let followed = self.repo.insert_follow(follower_id, target_id).await?;
        if followed {
            info!(follower_id, target_id, "follow recorded");
        } else {
            debug!(follower_id, target_id, "already following");
        }

        self.outcome(follower_id, target_id, followed).await
    }

    pub(crate) async fn unfollow(
        &self,
        follower_id: i64,
        target_id: i64,
    ) -> Result<FollowOutcome, DomainError> {
        self.ensure_pair(follower_id, target_id).await?;

        if self.repo.delete_follow(follower_id, target_id).await? {
            info!(follower_id, target_id, "follow removed");
        }

        self.outcome(follower_id, target_id, false).await
    }

    async fn ensure_pair(&self, follower_id: i64, target_id: i64) -> Result<(), DomainError> {
        if follower_id == target_id {
            return Err(DomainError::SelfReference);
        }
        if self.repo.get_user(target_id).await?.is_none() {
            return Err(DomainError::not_found("user"));
        }
        if self.repo.get_user(follower_id).await?.is_none() {
            return Err(DomainError::not_found("follower"));
        }
        Ok(())
    }

    async fn outcome(
        &self,
        follower_id: i64,
        target_id: i64,
        followed: bool,
    ) -> Result<FollowOutcome, DomainError> {
        let follower = self
            .repo
            .get_user(follower_id)
            .await?
            .ok_or_else(|| DomainError::not_found("follower"))?;
        let target = self
            .repo
            .get_user(target_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))?;

        Ok(FollowOutcome {
            follower,
            target,
            followed,
        })
    }
}

pub(crate) fn normalize_search(search: Option<String>) -> Option<String> {
    search
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{UserService, normalize_search};
    use crate::data::repositories::memory::InMemoryStore;
    use crate::domain::error::DomainError;
    use crate::domain::pagination::PageRequest;
    use crate::domain::user::{
        CreateUserRequest, ProfileInput, UpdateUserRequest, User, UserRef,
    };

    fn contains(refs: &[UserRef], id: i64) -> bool {
        refs.iter().any(|user| user.id == id)
    }

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryStore::new()))
    }

    fn create_request(username: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "secret-password".to_string(),
            profile: None,
        }
    }

    async fn create(service: &UserService, username: &str) -> User {
        service
            .create_user(create_request(username))
            .await
            .expect("create_user must succeed")
    }

    #[tokio::test]
    async fn create_user_normalizes_and_rejects_duplicates() {
        let service = service();
        let mut req = create_request("alice");
        req.username = "  alice  ".to_string();
        req.email = "  ALICE@Example.com ".to_string();

        let user = service.create_user(req).await.expect("must succeed");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");

        let err = service
            .create_user(create_request("alice"))
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn create_user_with_short_name_persists_nothing() {
        let service = service();
        let err = service
            .create_user(create_request("ab"))
            .await
            .expect_err("short username must fail");
        assert!(matches!(err, DomainError::Validation { field: "username", .. }));

        let page = service
            .list_users(None, PageRequest::default())
            .await
            .expect("list must succeed");
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn follow_updates_both_sides_and_is_idempotent() {
        let service = service();
        let alice = create(&service, "alice").await;
        let bob = create(&service, "bob").await;

        let outcome = service.follow(alice.id, bob.id).await.expect("follow");
        assert!(outcome.followed);
        assert!(contains(&outcome.follower.following, bob.id));
        assert!(contains(&outcome.target.followers, alice.id));
        assert_eq!(outcome.target.followers[0].username, "alice");

        let again = service.follow(alice.id, bob.id).await.expect("follow again");
        assert!(!again.followed);
        assert_eq!(again.follower.following_count(), 1);
        assert_eq!(again.target.followers_count(), 1);
    }

    #[tokio::test]
    async fn unfollow_clears_both_sides_regardless_of_prior_state() {
        let service = service();
        let alice = create(&service, "alice").await;
        let bob = create(&service, "bob").await;

        let never = service.unfollow(alice.id, bob.id).await.expect("no-op unfollow");
        assert!(!never.followed);

        service.follow(alice.id, bob.id).await.expect("follow");
        let outcome = service.unfollow(alice.id, bob.id).await.expect("unfollow");
        assert!(!outcome.followed);
        assert!(!contains(&outcome.follower.following, bob.id));
        assert!(!contains(&outcome.target.followers, alice.id));
    }

    #[tokio::test]
    async fn follow_is_directed() {
        let service = service();
        let alice = create(&service, "alice").await;
        let bob = create(&service, "bob").await;

        service.follow(alice.id, bob.id).await.expect("follow");
        let bob = service.get_user(bob.id).await.expect("get");
        assert!(bob.following.is_empty());
        assert_eq!(bob.followers.len(), 1);
    }

    #[tokio::test]
    async fn follow_self_is_rejected() {
        let service = service();
        let alice = create(&service, "alice").await;

        let err = service
            .follow(alice.id, alice.id)
            .await
            .expect_err("self follow must fail");
        assert!(matches!(err, DomainError::SelfReference));

        let err = service
            .unfollow(alice.id, alice.id)
            .await
            .expect_err("self unfollow must fail");
        assert!(matches!(err, DomainError::SelfReference));
    }

    #[tokio::test]
    async fn follow_missing_user_is_not_found() {
        let service = service();
        let alice = create(&service, "alice").await;

        let err = service.follow(alice.id, 999).await.expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(resource) if resource == "user"));

        let err = service.follow(999, alice.id).await.expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(resource) if resource == "follower"));
    }

    #[tokio::test]
    async fn patch_requires_non_empty_payload() {
        let service = service();
        let alice = create(&service, "alice").await;

        let err = service
            .patch_user(alice.id, UpdateUserRequest::default())
            .await
            .expect_err("empty patch must fail");
        assert!(matches!(err, DomainError::BadRequest(_)));

        let unchanged = service
            .update_user(alice.id, UpdateUserRequest::default())
            .await
            .expect("empty put is a no-op");
        assert_eq!(unchanged.username, "alice");
    }

    #[tokio::test]
    async fn patch_only_touches_provided_fields() {
        let service = service();
        let alice = create(&service, "alice").await;

        let patched = service
            .patch_user(
                alice.id,
                UpdateUserRequest {
                    profile: Some(ProfileInput {
                        bio: Some("writes about Rust".to_string()),
                        ..ProfileInput::default()
                    }),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect("patch must succeed");
        assert_eq!(patched.username, "alice");
        assert_eq!(patched.email, "alice@example.com");
        assert_eq!(patched.profile.bio.as_deref(), Some("writes about Rust"));

        let err = service
            .patch_user(
                999,
                UpdateUserRequest {
                    username: Some("ghost".to_string()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect_err("missing user must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_to_taken_email_conflicts() {
        let service = service();
        let alice = create(&service, "alice").await;
        create(&service, "bob").await;

        let err = service
            .update_user(
                alice.id,
                UpdateUserRequest {
                    email: Some("bob@example.com".to_string()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect_err("taken email must fail");
        assert!(matches!(err, DomainError::AlreadyExists(field) if field == "email"));
    }

    #[tokio::test]
    async fn delete_user_reports_missing() {
        let service = service();
        let alice = create(&service, "alice").await;

        service.delete_user(alice.id).await.expect("delete must succeed");
        let err = service
            .delete_user(alice.id)
            .await
            .expect_err("second delete must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(service.get_user(alice.id).await.is_err());
    }

    #[tokio::test]
    async fn list_users_paginates_most_recent_first() {
        let service = service();
        for idx in 0..12 {
            create(&service, &format!("user{idx:02}")).await;
        }

        let first = service
            .list_users(None, PageRequest::new(Some(1), Some(10)).expect("valid"))
            .await
            .expect("list");
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].username, "user11");
        assert_eq!(first.total, 12);
        assert_eq!(first.total_pages(), 2);

        let second = service
            .list_users(None, PageRequest::new(Some(2), Some(10)).expect("valid"))
            .await
            .expect("list");
        let names: Vec<_> = second.items.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["user01", "user00"]);
    }

    #[tokio::test]
    async fn list_users_search_is_case_insensitive_substring() {
        let service = service();
        create(&service, "RustAcean").await;
        create(&service, "gopher").await;

        let page = service
            .list_users(Some("  rusta ".to_string()), PageRequest::default())
            .await
            .expect("list");
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].username, "RustAcean");
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(normalize_search(Some("   ".to_string())), None);
        assert_eq!(normalize_search(Some(" x ".to_string())).as_deref(), Some("x"));
    }
}
