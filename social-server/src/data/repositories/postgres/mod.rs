use std::future::Future;
use std::time::Duration;

use crate::domain::error::DomainError;

pub(crate) mod post_repository;
pub(crate) mod user_repository;

/// Runs one storage call under a deadline and classifies its failure.
pub(crate) async fn timed<T>(
    deadline: Duration,
    fut: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, DomainError> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(map_db_error),
        Err(_) => Err(DomainError::Unavailable(format!(
            "database operation exceeded {}s",
            deadline.as_secs()
        ))),
    }
}

pub(crate) fn map_db_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint();
            match db_err.code().as_deref() {
                Some("23505") => DomainError::AlreadyExists(unique_field(constraint).to_string()),
                Some("23503") => DomainError::NotFound(referenced_resource(constraint).to_string()),
                Some("23514") if constraint == Some("follows_no_self") => {
                    DomainError::SelfReference
                }
                _ => DomainError::Unexpected(err.to_string()),
            }
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DomainError::Unavailable(err.to_string())
        }
        _ => DomainError::Unexpected(err.to_string()),
    }
}

fn unique_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_username_key") => "username",
        Some("users_email_key") => "email",
        _ => "record",
    }
}

fn referenced_resource(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("posts_author_id_fkey") => "author",
        Some("post_comments_author_id_fkey") => "comment author",
        Some("post_comments_post_id_fkey") | Some("post_likes_post_id_fkey") => "post",
        _ => "user",
    }
}

/// `ILIKE` pattern for a plain substring: wildcards typed by the caller match
/// literally.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::{contains_pattern, map_db_error, referenced_resource, unique_field};
    use crate::domain::error::DomainError;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rust"), "%rust%");
        assert_eq!(contains_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(unique_field(Some("users_email_key")), "email");
        assert_eq!(unique_field(None), "record");
        assert_eq!(referenced_resource(Some("posts_author_id_fkey")), "author");
        assert_eq!(referenced_resource(Some("post_likes_user_id_fkey")), "user");
    }

    #[test]
    fn pool_timeout_is_unavailable() {
        let err = map_db_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DomainError::Unavailable(_)));

        let err = map_db_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, DomainError::Unexpected(_)));
    }
}
