use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{NewCommentInput, Post, PostChanges};

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) excerpt: String,
    pub(crate) author_id: i64,
    pub(crate) published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PostFilter {
    /// Case-insensitive substring of the title OR the content.
    pub(crate) search: Option<String>,
    pub(crate) author_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub(crate) struct LikeToggle {
    pub(crate) post: Post,
    pub(crate) liked: bool,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Bumps the view counter by one and returns the post as stored afterwards.
    async fn increment_views(&self, id: i64) -> Result<Option<Post>, DomainError>;
    async fn update_post(&self, id: i64, changes: PostChanges)
    -> Result<Option<Post>, DomainError>;
    async fn delete_post(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Vec<Post>, DomainError>;
    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, DomainError>;
    async fn add_comment(
        &self,
        post_id: i64,
        input: NewCommentInput,
    ) -> Result<Option<Post>, DomainError>;
    async fn toggle_like(&self, post_id: i64, user_id: i64)
    -> Result<Option<LikeToggle>, DomainError>;
}
