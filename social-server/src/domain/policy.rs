use super::error::DomainError;
use super::post::Post;

/// Single authorization gate for every mutating post operation.
pub(crate) fn authorize_author(actor_id: i64, post: &Post) -> Result<(), DomainError> {
    if post.author.id != actor_id {
        return Err(DomainError::Forbidden(format!(
            "user {actor_id} is not the author of post {}",
            post.id
        )));
    }
    Ok(())
}
