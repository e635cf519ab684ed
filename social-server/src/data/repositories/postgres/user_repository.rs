use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{contains_pattern, timed};
use crate::data::user_repository::{NewUser, UserChanges, UserFilter, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::pagination::PageRequest;
use crate::domain::user::{Profile, User, UserRef};

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// One follow edge seen from `owner_id`, with the other side projected.
#[derive(sqlx::FromRow)]
struct EdgeRow {
    owner_id: i64,
    id: i64,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    bio: Option<String>,
}

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, bio, created_at, updated_at";

impl PostgresUserRepository {
    async fn hydrate(&self, rows: Vec<UserRow>) -> Result<Vec<User>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();

        let followers = timed(
            self.query_timeout,
            sqlx::query_as::<_, EdgeRow>(
                r#"
                SELECT f.target_id AS owner_id, u.id, u.username, u.first_name, u.last_name, u.bio
                FROM follows f
                JOIN users u ON u.id = f.follower_id
                WHERE f.target_id = ANY($1)
                ORDER BY f.created_at, f.follower_id
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool),
        )
        .await?;

        let following = timed(
            self.query_timeout,
            sqlx::query_as::<_, EdgeRow>(
                r#"
                SELECT f.follower_id AS owner_id, u.id, u.username, u.first_name, u.last_name, u.bio
                FROM follows f
                JOIN users u ON u.id = f.target_id
                WHERE f.follower_id = ANY($1)
                ORDER BY f.created_at, f.target_id
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool),
        )
        .await?;

        let mut followers = group_edges(followers);
        let mut following = group_edges(following);

        Ok(rows
            .into_iter()
            .map(|row| User {
                followers: followers.remove(&row.id).unwrap_or_default(),
                following: following.remove(&row.id).unwrap_or_default(),
                id: row.id,
                username: row.username,
                email: row.email,
                profile: Profile {
                    first_name: row.first_name,
                    last_name: row.last_name,
                    bio: row.bio,
                },
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

fn group_edges(rows: Vec<EdgeRow>) -> HashMap<i64, Vec<UserRef>> {
    let mut grouped: HashMap<i64, Vec<UserRef>> = HashMap::new();
    for row in rows {
        grouped.entry(row.owner_id).or_default().push(UserRef {
            id: row.id,
            username: row.username,
            profile: Profile {
                first_name: row.first_name,
                last_name: row.last_name,
                bio: row.bio,
            },
        });
    }
    grouped
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, bio)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = timed(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(input.username)
                .bind(input.email)
                .bind(input.password_hash)
                .bind(input.profile.first_name)
                .bind(input.profile.last_name)
                .bind(input.profile.bio)
                .fetch_one(&self.pool),
        )
        .await?;

        self.hydrate(vec![row])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Unexpected("inserted user was not returned".to_string()))
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = timed(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<Vec<User>, DomainError> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::text IS NULL OR username ILIKE $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            OFFSET $3
            "#
        );
        let rows = timed(
            self.query_timeout,
            sqlx::query_as::<_, UserRow>(&sql)
                .bind(filter.search.as_deref().map(contains_pattern))
                .bind(i64::from(page.limit))
                .bind(page.offset() as i64)
                .fetch_all(&self.pool),
        )
        .await?;

        self.hydrate(rows).await
    }

    async fn count_users(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let count: i64 = timed(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                SELECT COUNT(*)
                FROM users
                WHERE ($1::text IS NULL OR username ILIKE $1)
                "#,
            )
            .bind(filter.search.as_deref().map(contains_pattern))
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(count.max(0) as u64)
    }

    async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Option<User>, DomainError> {
        let updated: Option<i64> = timed(
            self.query_timeout,
            sqlx::query_scalar(
                r#"
                UPDATE users
                SET username = COALESCE($2, username),
                    email = COALESCE($3, email),
                    password_hash = COALESCE($4, password_hash),
                    first_name = CASE WHEN $5 THEN $6 ELSE first_name END,
                    last_name = CASE WHEN $7 THEN $8 ELSE last_name END,
                    bio = CASE WHEN $9 THEN $10 ELSE bio END,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(changes.username)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.first_name.is_some())
            .bind(changes.first_name.flatten())
            .bind(changes.last_name.is_some())
            .bind(changes.last_name.flatten())
            .bind(changes.bio.is_some())
            .bind(changes.bio.flatten())
            .fetch_optional(&self.pool),
        )
        .await?;

        match updated {
            Some(id) => self.get_user(id).await,
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: i64) -> Result<bool, DomainError> {
        let result = timed(
            self.query_timeout,
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_follow(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError> {
        let result = timed(
            self.query_timeout,
            sqlx::query(
                r#"
                INSERT INTO follows (follower_id, target_id)
                VALUES ($1, $2)
                ON CONFLICT (follower_id, target_id) DO NOTHING
                "#,
            )
            .bind(follower_id)
            .bind(target_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_follow(&self, follower_id: i64, target_id: i64) -> Result<bool, DomainError> {
        let result = timed(
            self.query_timeout,
            sqlx::query(
                r#"
                DELETE FROM follows
                WHERE follower_id = $1 AND target_id = $2
                "#,
            )
            .bind(follower_id)
            .bind(target_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
