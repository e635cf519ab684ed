use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::user::{Profile, User, ValidUpdateUser};

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password_hash: String,
    pub(crate) profile: Profile,
}

/// Validated edit with the password already hashed.
#[derive(Debug, Clone, Default)]
pub(crate) struct UserChanges {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password_hash: Option<String>,
    pub(crate) first_name: Option<Option<String>>,
    pub(crate) last_name: Option<Option<String>>,
    pub(crate) bio: Option<Option<String>>,
}

impl UserChanges {
    pub(crate) fn from_valid(update: ValidUpdateUser, password_hash: Option<String>) -> Self {
        Self {
            username: update.username,
            email: update.email,
            password_hash,
            first_name: update.first_name,
            last_name: update.last_name,
            bio: update.bio,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct UserFilter {
    /// Case-insensitive substring of the username.
    pub(crate) search: Option<String>,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError>;
    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Vec<User>, DomainError>;
    async fn count_users(&self, filter: &UserFilter) -> Result<u64, DomainError>;
    async fn update_user(&self, id: i64, changes: UserChanges)
    -> Result<Option<User>, DomainError>;
    async fn delete_user(&self, id: i64) -> Result<bool, DomainError>;

    /// Records the `follower -> target` edge. Returns `false` if it already existed.
    async fn insert_follow(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError>;
    /// Removes the `follower -> target` edge. Returns `false` if there was none.
    async fn delete_follow(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError>;
}
