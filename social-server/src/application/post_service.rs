use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::application::user_service::normalize_search;
use crate::data::post_repository::{LikeToggle, NewPost, PostFilter, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::policy::authorize_author;
use crate::domain::post::{
    AddCommentRequest, CreatePostRequest, PatchPostRequest, Post, PostChanges, UpdatePostRequest,
    validate_id,
};

pub(crate) struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub(crate) fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    pub(crate) async fn list_posts(
        &self,
        search: Option<String>,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        let filter = PostFilter {
            search: normalize_search(search),
            author_id: None,
        };
        self.page(filter, page).await
    }

    pub(crate) async fn list_by_author(
        &self,
        author_id: i64,
        page: PageRequest,
    ) -> Result<Page<Post>, DomainError> {
        if self.users.get_user(author_id).await?.is_none() {
            return Err(DomainError::not_found("user"));
        }
        let filter = PostFilter {
            search: None,
            author_id: Some(author_id),
        };
        self.page(filter, page).await
    }

    async fn page(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, DomainError> {
        let posts = self.posts.list_posts(&filter, page).await?;
        let total = self.posts.count_posts(&filter).await?;
        Ok(Page::new(posts, total, page))
    }

    /// Every successful single-post read counts as one view.
    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .increment_views(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))
    }

    pub(crate) async fn create_post(&self, req: CreatePostRequest) -> Result<Post, DomainError> {
        let req = req.validate()?;
        let excerpt = req.excerpt.unwrap_or_default();

        let post = self
            .posts
            .create_post(NewPost {
                title: req.title,
                content: req.content,
                excerpt,
                author_id: req.author_id,
                published_at: req.published_at.unwrap_or_else(Utc::now),
            })
            .await?;

        info!(post_id = post.id, author_id = post.author.id, "post created");
        Ok(post)
    }

    pub(crate) async fn update_post(
        &self,
        actor_id: i64,
        id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, DomainError> {
        let changes = req.validate()?;
        self.apply_changes(actor_id, id, changes).await
    }

    pub(crate) async fn patch_post(
        &self,
        actor_id: i64,
        id: i64,
        req: PatchPostRequest,
    ) -> Result<Post, DomainError> {
        let changes = req.validate()?;
        self.apply_changes(actor_id, id, changes).await
    }

    async fn apply_changes(
        &self,
        actor_id: i64,
        id: i64,
        changes: PostChanges,
    ) -> Result<Post, DomainError> {
        self.authorized_post(actor_id, id).await?;

        let post = self
            .posts
            .update_post(id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))?;

        info!(post_id = id, actor_id, "post updated");
        Ok(post)
    }

    /// Returns the post as it was just before removal.
    pub(crate) async fn delete_post(&self, actor_id: i64, id: i64) -> Result<Post, DomainError> {
        let post = self.authorized_post(actor_id, id).await?;

        if !self.posts.delete_post(id).await? {
            return Err(DomainError::not_found("post"));
        }

        info!(post_id = id, actor_id, "post deleted");
        Ok(post)
    }

    async fn authorized_post(&self, actor_id: i64, id: i64) -> Result<Post, DomainError> {
        validate_id("userId", actor_id)?;
        let post = self
            .posts
            .get_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))?;
        authorize_author(actor_id, &post)?;
        Ok(post)
    }

    pub(crate) async fn add_comment(
        &self,
        post_id: i64,
        req: AddCommentRequest,
    ) -> Result<Post, DomainError> {
        let input = req.validate()?;
        let author_id = input.author_id;

        let post = self
            .posts
            .add_comment(post_id, input)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))?;

        debug!(post_id, author_id, comments = post.comments_count(), "comment added");
        Ok(post)
    }

    pub(crate) async fn toggle_like(
        &self,
        post_id: i64,
        user_id: Option<i64>,
    ) -> Result<LikeToggle, DomainError> {
        let user_id = user_id.ok_or_else(|| DomainError::bad_request("userId is required"))?;
        validate_id("userId", user_id)?;

        let toggle = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post"))?;

        debug!(post_id, user_id, liked = toggle.liked, "like toggled");
        Ok(toggle)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::PostService;
    use crate::application::user_service::UserService;
    use crate::data::repositories::memory::InMemoryStore;
    use crate::domain::error::DomainError;
    use crate::domain::pagination::PageRequest;
    use crate::domain::post::{
        AddCommentRequest, CreatePostRequest, PatchPostRequest, Post, UpdatePostRequest,
    };
    use crate::domain::user::CreateUserRequest;

    struct Fixture {
        users: UserService,
        posts: PostService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        Fixture {
            users: UserService::new(store.clone()),
            posts: PostService::new(store.clone(), store),
        }
    }

    impl Fixture {
        async fn user(&self, username: &str) -> i64 {
            self.users
                .create_user(CreateUserRequest {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password: "secret-password".to_string(),
                    profile: None,
                })
                .await
                .expect("user must be created")
                .id
        }

        async fn post(&self, author_id: i64, title: &str, content: &str) -> Post {
            self.posts
                .create_post(CreatePostRequest {
                    title: title.to_string(),
                    content: content.to_string(),
                    author_id,
                    excerpt: None,
                    published_at: None,
                })
                .await
                .expect("post must be created")
        }
    }

    #[tokio::test]
    async fn create_post_derives_excerpt_and_publication_time() {
        let fx = fixture();
        let author = fx.user("writer").await;

        let post = fx.post(author, "Hi", "World").await;
        assert_eq!(post.excerpt, "World");
        assert_eq!(post.author.username, "writer");
        assert_eq!(post.views, 0);
        assert!(post.published_at <= Utc::now());

        let explicit = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid date");
        let scheduled = fx
            .posts
            .create_post(CreatePostRequest {
                title: "Later".to_string(),
                content: "body".to_string(),
                author_id: author,
                excerpt: None,
                published_at: Some(explicit),
            })
            .await
            .expect("post must be created");
        assert_eq!(scheduled.published_at, explicit);
    }

    #[tokio::test]
    async fn create_post_with_empty_title_persists_nothing() {
        let fx = fixture();
        let author = fx.user("writer").await;

        let err = fx
            .posts
            .create_post(CreatePostRequest {
                title: "   ".to_string(),
                content: "content".to_string(),
                author_id: author,
                excerpt: None,
                published_at: None,
            })
            .await
            .expect_err("empty title must fail");
        assert!(matches!(err, DomainError::Validation { field: "title", .. }));

        let page = fx
            .posts
            .list_posts(None, PageRequest::default())
            .await
            .expect("list");
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn create_post_for_missing_author_is_not_found() {
        let fx = fixture();
        let err = fx
            .posts
            .create_post(CreatePostRequest {
                title: "title".to_string(),
                content: "content".to_string(),
                author_id: 42,
                excerpt: None,
                published_at: None,
            })
            .await
            .expect_err("missing author must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_post_counts_one_view_per_call() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let post = fx.post(author, "title", "content").await;

        for expected in 1..=3 {
            let fetched = fx.posts.get_post(post.id).await.expect("get");
            assert_eq!(fetched.views, expected);
        }

        let err = fx.posts.get_post(999).await.expect_err("missing must fail");
        assert!(matches!(err, DomainError::NotFound(resource) if resource == "post"));
    }

    #[tokio::test]
    async fn toggle_like_twice_restores_likes() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let reader = fx.user("reader").await;
        let post = fx.post(author, "title", "content").await;

        let liked = fx.posts.toggle_like(post.id, Some(reader)).await.expect("like");
        assert!(liked.liked);
        assert_eq!(liked.post.likes, vec![reader]);
        assert_eq!(liked.post.likes_count(), 1);

        let unliked = fx.posts.toggle_like(post.id, Some(reader)).await.expect("unlike");
        assert!(!unliked.liked);
        assert_eq!(unliked.post.likes, post.likes);
    }

    #[tokio::test]
    async fn toggle_like_requires_user() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let post = fx.post(author, "title", "content").await;

        let err = fx.posts.toggle_like(post.id, None).await.expect_err("must fail");
        assert!(matches!(err, DomainError::BadRequest(_)));

        let err = fx
            .posts
            .toggle_like(999, Some(author))
            .await
            .expect_err("missing post must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn comments_keep_insertion_order() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let reader = fx.user("reader").await;
        let post = fx.post(author, "title", "content").await;

        for text in ["first", "second", "third"] {
            fx.posts
                .add_comment(
                    post.id,
                    AddCommentRequest {
                        text: Some(text.to_string()),
                        author_id: Some(reader),
                    },
                )
                .await
                .expect("comment");
        }

        let post = fx.posts.get_post(post.id).await.expect("get");
        let texts: Vec<_> = post.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(post.comments_count(), post.comments.len());
        assert_eq!(
            post.comments[0].author.as_ref().map(|a| a.username.as_str()),
            Some("reader")
        );
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_not_found() {
        let fx = fixture();
        let reader = fx.user("reader").await;

        let err = fx
            .posts
            .add_comment(
                999,
                AddCommentRequest {
                    text: Some("hello".to_string()),
                    author_id: Some(reader),
                },
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, DomainError::NotFound(resource) if resource == "post"));
    }

    #[tokio::test]
    async fn non_author_cannot_edit_and_post_stays_unchanged() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let intruder = fx.user("intruder").await;
        let post = fx.post(author, "original", "original content").await;

        let err = fx
            .posts
            .update_post(
                intruder,
                post.id,
                UpdatePostRequest {
                    title: "hijacked".to_string(),
                    content: "hijacked".to_string(),
                },
            )
            .await
            .expect_err("update must be forbidden");
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = fx
            .posts
            .patch_post(
                intruder,
                post.id,
                PatchPostRequest {
                    title: Some("hijacked".to_string()),
                    content: None,
                },
            )
            .await
            .expect_err("patch must be forbidden");
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = fx
            .posts
            .delete_post(intruder, post.id)
            .await
            .expect_err("delete must be forbidden");
        assert!(matches!(err, DomainError::Forbidden(_)));

        let stored = fx.posts.get_post(post.id).await.expect("get");
        assert_eq!(stored.title, "original");
        assert_eq!(stored.content, "original content");
    }

    #[tokio::test]
    async fn author_can_update_patch_and_delete() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let post = fx.post(author, "original", "original content").await;

        let updated = fx
            .posts
            .update_post(
                author,
                post.id,
                UpdatePostRequest {
                    title: "renamed".to_string(),
                    content: "new content".to_string(),
                },
            )
            .await
            .expect("update");
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.excerpt, post.excerpt);

        let patched = fx
            .posts
            .patch_post(
                author,
                post.id,
                PatchPostRequest {
                    title: None,
                    content: Some("patched".to_string()),
                },
            )
            .await
            .expect("patch");
        assert_eq!(patched.title, "renamed");
        assert_eq!(patched.content, "patched");

        let deleted = fx.posts.delete_post(author, post.id).await.expect("delete");
        assert_eq!(deleted.id, post.id);
        assert!(fx.posts.get_post(post.id).await.is_err());
    }

    #[tokio::test]
    async fn empty_patch_is_rejected_before_lookup() {
        let fx = fixture();
        let err = fx
            .posts
            .patch_post(1, 999, PatchPostRequest::default())
            .await
            .expect_err("must fail");
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    // Search matches title OR content, not both.
    #[tokio::test]
    async fn search_matches_title_or_content() {
        let fx = fixture();
        let author = fx.user("writer").await;
        fx.post(author, "Rust ownership", "borrowing explained").await;
        fx.post(author, "Cooking", "a recipe written in rust-proof pans").await;
        fx.post(author, "Gardening", "tomatoes").await;

        let page = fx
            .posts
            .list_posts(Some("RUST".to_string()), PageRequest::default())
            .await
            .expect("list");
        assert_eq!(page.total, 2);
        let titles: Vec<_> = page.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Cooking", "Rust ownership"]);
    }

    #[tokio::test]
    async fn list_by_author_filters_and_paginates() {
        let fx = fixture();
        let author = fx.user("writer").await;
        let other = fx.user("other").await;
        for idx in 0..12 {
            fx.post(author, &format!("post {idx}"), "content").await;
        }
        fx.post(other, "foreign", "content").await;

        let second = fx
            .posts
            .list_by_author(author, PageRequest::new(Some(2), Some(10)).expect("valid"))
            .await
            .expect("list");
        assert_eq!(second.total, 12);
        assert_eq!(second.total_pages(), 2);
        let titles: Vec<_> = second.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["post 1", "post 0"]);

        let err = fx
            .posts
            .list_by_author(999, PageRequest::default())
            .await
            .expect_err("missing author must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
