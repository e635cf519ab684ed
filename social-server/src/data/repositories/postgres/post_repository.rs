use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{contains_pattern, timed};
use crate::data::post_repository::{LikeToggle, NewPost, PostFilter, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::post::{Comment, NewCommentInput, Post, PostChanges};
use crate::domain::user::{Profile, UserRef};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    excerpt: String,
    views: i64,
    published_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
    author_bio: Option<String>,
    likes: Vec<i64>,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    text: String,
    created_at: DateTime<Utc>,
    author_id: Option<i64>,
    author_username: Option<String>,
    author_first_name: Option<String>,
    author_last_name: Option<String>,
    author_bio: Option<String>,
}

const POST_SELECT: &str = r#"
    SELECT
        p.id,
        p.title,
        p.content,
        p.excerpt,
        p.views,
        p.published_at,
        p.created_at,
        p.updated_at,
        u.id AS author_id,
        u.username AS author_username,
        u.first_name AS author_first_name,
        u.last_name AS author_last_name,
        u.bio AS author_bio,
        ARRAY(
            SELECT l.user_id
            FROM post_likes l
            WHERE l.post_id = p.id
            ORDER BY l.created_at, l.user_id
        ) AS likes
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

const POST_FILTER: &str = r#"
    WHERE ($1::bigint IS NULL OR p.author_id = $1)
      AND ($2::text IS NULL OR p.title ILIKE $2 OR p.content ILIKE $2)
"#;

impl PostgresPostRepository {
    async fn attach_comments(&self, rows: Vec<PostRow>) -> Result<Vec<Post>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let comment_rows = timed(
            self.query_timeout,
            sqlx::query_as::<_, CommentRow>(
                r#"
                SELECT
                    c.id,
                    c.post_id,
                    c.text,
                    c.created_at,
                    u.id AS author_id,
                    u.username AS author_username,
                    u.first_name AS author_first_name,
                    u.last_name AS author_last_name,
                    u.bio AS author_bio
                FROM post_comments c
                LEFT JOIN users u ON u.id = c.author_id
                WHERE c.post_id = ANY($1)
                ORDER BY c.id
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool),
        )
        .await?;

        let mut comments: HashMap<i64, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            let author = match (row.author_id, row.author_username) {
                (Some(id), Some(username)) => Some(UserRef {
                    id,
                    username,
                    profile: Profile {
                        first_name: row.author_first_name,
                        last_name: row.author_last_name,
                        bio: row.author_bio,
                    },
                }),
                _ => None,
            };
            comments.entry(row.post_id).or_default().push(Comment {
                id: row.id,
                text: row.text,
                author,
                created_at: row.created_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Post {
                comments: comments.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                content: row.content,
                excerpt: row.excerpt,
                author: UserRef {
                    id: row.author_id,
                    username: row.author_username,
                    profile: Profile {
                        first_name: row.author_first_name,
                        last_name: row.author_last_name,
                        bio: row.author_bio,
                    },
                },
                likes: row.likes,
                views: row.views,
                published_at: row.published_at,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn load_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let sql = format!("{POST_SELECT} WHERE p.id = $1");
        let row = timed(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(self.attach_comments(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn require_post(&self, id: i64) -> Result<Post, DomainError> {
        self.load_post(id)
            .await?
            .ok_or_else(|| DomainError::Unexpected(format!("post {id} vanished after write")))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let id: i64 = timed(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                INSERT INTO posts (title, content, excerpt, author_id, published_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(input.title)
            .bind(input.content)
            .bind(input.excerpt)
            .bind(input.author_id)
            .bind(input.published_at)
            .fetch_one(&self.pool),
        )
        .await?;

        self.require_post(id).await
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        self.load_post(id).await
    }

    async fn increment_views(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let updated: Option<i64> = timed(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                UPDATE posts
                SET views = views + 1
                WHERE id = $1
                RETURNING id
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        match updated {
            Some(id) => self.load_post(id).await,
            None => Ok(None),
        }
    }

    async fn update_post(
        &self,
        id: i64,
        changes: PostChanges,
    ) -> Result<Option<Post>, DomainError> {
        let updated: Option<i64> = timed(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                UPDATE posts
                SET title = COALESCE($2, title),
                    content = COALESCE($3, content),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .fetch_optional(&self.pool),
        )
        .await?;

        match updated {
            Some(id) => self.load_post(id).await,
            None => Ok(None),
        }
    }

    async fn delete_post(&self, id: i64) -> Result<bool, DomainError> {
        let result = timed(
            self.query_timeout,
            sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Vec<Post>, DomainError> {
        let sql = format!(
            "{POST_SELECT} {POST_FILTER} ORDER BY p.created_at DESC, p.id DESC LIMIT $3 OFFSET $4"
        );
        let rows = timed(
            self.query_timeout,
            sqlx::query_as::<_, PostRow>(&sql)
                .bind(filter.author_id)
                .bind(filter.search.as_deref().map(contains_pattern))
                .bind(i64::from(page.limit))
                .bind(page.offset() as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        self.attach_comments(rows).await
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<u64, DomainError> {
        let sql = format!("SELECT COUNT(*) FROM posts p {POST_FILTER}");
        let count: i64 = timed(
            self.query_timeout,
            sqlx::query_scalar(&sql)
                .bind(filter.author_id)
                .bind(filter.search.as_deref().map(contains_pattern))
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn add_comment(
        &self,
        post_id: i64,
        input: NewCommentInput,
    ) -> Result<Option<Post>, DomainError> {
        let mut tx = timed(self.query_timeout, self.pool.begin()).await?;

        let exists: Option<i64> = timed(
            self.query_timeout,
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR SHARE")
                .bind(post_id)
                .fetch_optional(&mut *tx),
        )
        .await?;
        if exists.is_none() {
            return Ok(None);
        }

        timed(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO post_comments (post_id, author_id, text)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(post_id)
            .bind(input.author_id)
            .bind(input.text)
            .execute(&mut *tx),
        )
        .await?;

        timed(self.query_timeout, tx.commit()).await?;

        self.load_post(post_id).await
    }

    async fn toggle_like(
        &self,
        post_id: i64,
        user_id: i64,
    ) -> Result<Option<LikeToggle>, DomainError> {
        let mut tx = timed(self.query_timeout, self.pool.begin()).await?;

        // row lock serializes concurrent toggles on the same post
        let exists: Option<i64> = timed(
            self.query_timeout,
            sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(post_id)
                .fetch_optional(&mut *tx),
        )
        .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let removed = timed(
            self.query_timeout,
            sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx),
        )
        .await?
        .rows_affected()
            > 0;

        if !removed {
            timed(
                self.query_timeout,
                sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
                    .bind(post_id)
                    .bind(user_id)
                    .execute(&mut *tx),
            )
            .await?;
        }

        timed(self.query_timeout, tx.commit()).await?;

        let post = self.require_post(post_id).await?;
        Ok(Some(LikeToggle {
            post,
            liked: !removed,
        }))
    }
}
