use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::health::StorageHealth;
use crate::data::post_repository::{LikeToggle, NewPost, PostFilter, PostRepository};
use crate::data::user_repository::{NewUser, UserChanges, UserFilter, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{Comment, NewCommentInput, Post, PostChanges};
use crate::domain::user::{Profile, User, UserRef};

/// Process-local storage backend. Users and posts share one state so that the
/// same reference rules as the relational schema apply: deleting a user drops
/// their follow edges, likes and posts, and detaches their comments.
#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_user_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
    users: BTreeMap<i64, UserRecord>,
    /// `(follower_id, target_id)` in insertion order.
    follows: Vec<(i64, i64)>,
    posts: BTreeMap<i64, PostRecord>,
}

#[derive(Debug, Clone)]
struct UserRecord {
    id: i64,
    username: String,
    email: String,
    #[allow(dead_code)]
    password_hash: String,
    profile: Profile,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct PostRecord {
    id: i64,
    title: String,
    content: String,
    excerpt: String,
    author_id: i64,
    likes: Vec<i64>,
    views: i64,
    published_at: DateTime<Utc>,
    comments: Vec<CommentRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    id: i64,
    text: String,
    author_id: Option<i64>,
    created_at: DateTime<Utc>,
}

impl InMemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::Unexpected("in-memory store lock poisoned".to_string()))
    }
}

impl MemoryState {
    fn user_ref(&self, id: i64) -> Option<UserRef> {
        self.users.get(&id).map(|record| UserRef {
            id: record.id,
            username: record.username.clone(),
            profile: record.profile.clone(),
        })
    }

    fn to_user(&self, record: &UserRecord) -> User {
        let followers = self
            .follows
            .iter()
            .filter(|(_, target)| *target == record.id)
            .filter_map(|(follower, _)| self.user_ref(*follower))
            .collect();
        let following = self
            .follows
            .iter()
            .filter(|(follower, _)| *follower == record.id)
            .filter_map(|(_, target)| self.user_ref(*target))
            .collect();

        User {
            id: record.id,
            username: record.username.clone(),
            email: record.email.clone(),
            profile: record.profile.clone(),
            followers,
            following,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn to_post(&self, record: &PostRecord) -> Result<Post, DomainError> {
        let author = self
            .user_ref(record.author_id)
            .ok_or_else(|| DomainError::Unexpected(format!("post {} has no author", record.id)))?;
        let comments = record
            .comments
            .iter()
            .map(|comment| Comment {
                id: comment.id,
                text: comment.text.clone(),
                author: comment.author_id.and_then(|id| self.user_ref(id)),
                created_at: comment.created_at,
            })
            .collect();

        Ok(Post {
            id: record.id,
            title: record.title.clone(),
            content: record.content.clone(),
            excerpt: record.excerpt.clone(),
            author,
            likes: record.likes.clone(),
            views: record.views,
            published_at: record.published_at,
            comments,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    fn post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        self.posts
            .get(&id)
            .map(|record| self.to_post(record))
            .transpose()
    }

    fn ensure_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except_id: Option<i64>,
    ) -> Result<(), DomainError> {
        for user in self.users.values() {
            if Some(user.id) == except_id {
                continue;
            }
            if username == Some(user.username.as_str()) {
                return Err(DomainError::AlreadyExists("username".to_string()));
            }
            if email == Some(user.email.as_str()) {
                return Err(DomainError::AlreadyExists("email".to_string()));
            }
        }
        Ok(())
    }

    fn matching_users(&self, filter: &UserFilter) -> Vec<&UserRecord> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut users: Vec<&UserRecord> = self
            .users
            .values()
            .filter(|user| match &needle {
                Some(needle) => user.username.to_lowercase().contains(needle),
                None => true,
            })
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        users
    }

    fn matching_posts(&self, filter: &PostFilter) -> Vec<&PostRecord> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut posts: Vec<&PostRecord> = self
            .posts
            .values()
            .filter(|post| filter.author_id.is_none_or(|author| post.author_id == author))
            .filter(|post| match &needle {
                Some(needle) => {
                    post.title.to_lowercase().contains(needle)
                        || post.content.to_lowercase().contains(needle)
                }
                None => true,
            })
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        posts
    }
}

fn page_slice<T>(items: Vec<T>, page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(offset)
        .take(page.limit as usize)
        .collect()
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let mut state = self.state()?;
        state.ensure_unique(Some(&input.username), Some(&input.email), None)?;

        state.last_user_id += 1;
        let now = Utc::now();
        let record = UserRecord {
            id: state.last_user_id,
            username: input.username,
            email: input.email,
            password_hash: input.password_hash,
            profile: input.profile,
            created_at: now,
            updated_at: now,
        };
        let user = state.to_user(&record);
        state.users.insert(record.id, record);
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let state = self.state()?;
        Ok(state.users.get(&id).map(|record| state.to_user(record)))
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Vec<User>, DomainError> {
        let state = self.state()?;
        let records = page_slice(state.matching_users(filter), page);
        Ok(records
            .into_iter()
            .map(|record| state.to_user(record))
            .collect())
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let state = self.state()?;
        Ok(state.matching_users(filter).len() as u64)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, DomainError> {
        let mut state = self.state()?;
        if !state.users.contains_key(&id) {
            return Ok(None);
        }
        state.ensure_unique(changes.username.as_deref(), changes.email.as_deref(), Some(id))?;

        let Some(record) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            record.username = username;
        }
        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            record.password_hash = password_hash;
        }
        if let Some(first_name) = changes.first_name {
            record.profile.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            record.profile.last_name = last_name;
        }
        if let Some(bio) = changes.bio {
            record.profile.bio = bio;
        }
        record.updated_at = Utc::now();

        let record = record.clone();
        Ok(Some(state.to_user(&record)))
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let mut state = self.state()?;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }

        state
            .follows
            .retain(|(follower, target)| *follower != id && *target != id);
        state.posts.retain(|_, post| post.author_id != id);
        for post in state.posts.values_mut() {
            post.likes.retain(|user_id| *user_id != id);
            for comment in &mut post.comments {
                if comment.author_id == Some(id) {
                    comment.author_id = None;
                }
            }
        }
        Ok(true)
    }

    async fn insert_follow(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError> {
        let mut state = self.state()?;
        if follower_id == target_id {
            return Err(DomainError::SelfReference);
        }
        if !state.users.contains_key(&follower_id) || !state.users.contains_key(&target_id) {
            return Err(DomainError::not_found("user"));
        }
        if state.follows.contains(&(follower_id, target_id)) {
            return Ok(false);
        }
        state.follows.push((follower_id, target_id));
        Ok(true)
    }

    async fn delete_follow(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError> {
        let mut state = self.state()?;
        let before = state.follows.len();
        state
            .follows
            .retain(|edge| *edge != (follower_id, target_id));
        Ok(state.follows.len() != before)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let mut state = self.state()?;
        if !state.users.contains_key(&input.author_id) {
            return Err(DomainError::not_found("author"));
        }

        state.last_post_id += 1;
        let now = Utc::now();
        let record = PostRecord {
            id: state.last_post_id,
            title: input.title,
            content: input.content,
            excerpt: input.excerpt,
            author_id: input.author_id,
            likes: Vec::new(),
            views: 0,
            published_at: input.published_at,
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let post = state.to_post(&record)?;
        state.posts.insert(record.id, record);
        Ok(post)
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        self.state()?.post(id)
    }

    async fn increment_views(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let mut state = self.state()?;
        match state.posts.get_mut(&id) {
            Some(record) => record.views += 1,
            None => return Ok(None),
        }
        state.post(id)
    }

    async fn update_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        let mut state = self.state()?;
        let Some(record) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(content) = changes.content {
            record.content = content;
        }
        record.updated_at = Utc::now();
        state.post(id)
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        Ok(self.state()?.posts.remove(&id).is_some())
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Vec<Post>, DomainError> {
        let state = self.state()?;
        page_slice(state.matching_posts(filter), page)
            .into_iter()
            .map(|record| state.to_post(record))
            .collect()
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, DomainError> {
        let state = self.state()?;
        Ok(state.matching_posts(filter).len() as u64)
    }

    async fn add_comment(
        &self,
        post_id: i64,
        input: NewCommentInput,
    ) -> Result<Option<Post>, DomainError> {
        let mut state = self.state()?;
        if !state.posts.contains_key(&post_id) {
            return Ok(None);
        }
        if !state.users.contains_key(&input.author_id) {
            return Err(DomainError::not_found("comment author"));
        }

        state.last_comment_id += 1;
        let comment = CommentRecord {
            id: state.last_comment_id,
            text: input.text,
            author_id: Some(input.author_id),
            created_at: Utc::now(),
        };
        if let Some(record) = state.posts.get_mut(&post_id) {
            record.comments.push(comment);
        }
        state.post(post_id)
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<Option<LikeToggle>, DomainError> {
        let mut state = self.state()?;
        if !state.posts.contains_key(&post_id) {
            return Ok(None);
        }
        if !state.users.contains_key(&user_id) {
            return Err(DomainError::not_found("user"));
        }

        let Some(record) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };
        let liked = if record.likes.contains(&user_id) {
            record.likes.retain(|id| *id != user_id);
            false
        } else {
            record.likes.push(user_id);
            true
        };

        Ok(state.post(post_id)?.map(|post| LikeToggle { post, liked }))
    }
}

#[async_trait]
impl StorageHealth for InMemoryStore {
    async fn ping(&self) -> Result<(), DomainError> {
        self.state().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::InMemoryStore;
    use crate::data::post_repository::{NewPost, PostFilter, PostRepository};
    use crate::data::user_repository::{NewUser, UserChanges, UserFilter, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::pagination::PageRequest;
    use crate::domain::post::NewCommentInput;
    use crate::domain::user::Profile;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
            profile: Profile::default(),
        }
    }

    fn new_post(author_id: i64, title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "content".to_string(),
            excerpt: "content".to_string(),
            author_id,
            published_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let store = InMemoryStore::new();
        store.create_user(new_user("alice")).await.expect("first insert");

        let err = store
            .create_user(new_user("alice"))
            .await
            .expect_err("duplicate must fail");
        assert!(matches!(err, DomainError::AlreadyExists(field) if field == "username"));

        let mut other = new_user("alice2");
        other.email = "alice@example.com".to_string();
        let err = store.create_user(other).await.expect_err("duplicate must fail");
        assert!(matches!(err, DomainError::AlreadyExists(field) if field == "email"));
    }

    #[tokio::test]
    async fn update_keeps_own_username_without_conflict() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("alice")).await.expect("insert");

        let updated = store
            .update_user(
                user.id,
                UserChanges {
                    username: Some("alice".to_string()),
                    ..UserChanges::default()
                },
            )
            .await
            .expect("update must succeed")
            .expect("user must exist");
        assert_eq!(updated.username, "alice");
    }

    #[tokio::test]
    async fn deleting_user_cleans_edges_and_detaches_comments() {
        let store = InMemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.expect("insert");
        let bob = store.create_user(new_user("bob")).await.expect("insert");

        store.insert_follow(alice.id, bob.id).await.expect("follow");
        let bobs_post = store.create_post(new_post(bob.id, "bob's")).await.expect("post");
        let alices_post = store
            .create_post(new_post(alice.id, "alice's"))
            .await
            .expect("post");
        store.toggle_like(bobs_post.id, alice.id).await.expect("like");
        store
            .add_comment(
                bobs_post.id,
                NewCommentInput {
                    text: "hi".to_string(),
                    author_id: alice.id,
                },
            )
            .await
            .expect("comment");

        assert!(store.delete_user(alice.id).await.expect("delete"));

        let bob = store.get_user(bob.id).await.expect("get").expect("bob exists");
        assert!(bob.followers.is_empty());

        let post = store
            .get_post(bobs_post.id)
            .await
            .expect("get")
            .expect("post exists");
        assert!(post.likes.is_empty());
        assert_eq!(post.comments.len(), 1);
        assert!(post.comments[0].author.is_none());

        assert!(store.get_post(alices_post.id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn listing_is_most_recent_first_and_filtered() {
        let store = InMemoryStore::new();
        let author = store.create_user(new_user("writer")).await.expect("insert");
        for title in ["Rust tips", "Cooking", "rusty nails"] {
            store.create_post(new_post(author.id, title)).await.expect("post");
        }

        let filter = PostFilter {
            search: Some("RUST".to_string()),
            author_id: None,
        };
        let posts = store
            .list_posts(&filter, PageRequest::default())
            .await
            .expect("list");
        let titles: Vec<_> = posts.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, vec!["rusty nails", "Rust tips"]);
        assert_eq!(store.count_posts(&filter).await.expect("count"), 2);

        let users = store
            .list_users(
                &UserFilter {
                    search: Some("RIT".to_string()),
                },
                PageRequest::default(),
            )
            .await
            .expect("list");
        assert_eq!(users.len(), 1);
    }
}
