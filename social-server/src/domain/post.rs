use chrono::{DateTime, Utc};

use super::error::DomainError;
use super::user::UserRef;

pub(crate) const EXCERPT_CHARS: usize = 100;
pub(crate) const READING_CHARS_PER_MINUTE: usize = 200;

const TITLE_MAX: usize = 255;
const EXCERPT_MAX: usize = 300;
const COMMENT_MAX: usize = 2000;

#[derive(Debug, Clone)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) text: String,
    /// `None` once the author account has been deleted.
    pub(crate) author: Option<UserRef>,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) excerpt: String,
    pub(crate) author: UserRef,
    pub(crate) likes: Vec<i64>,
    pub(crate) views: i64,
    pub(crate) published_at: DateTime<Utc>,
    pub(crate) comments: Vec<Comment>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

impl Post {
    pub(crate) fn likes_count(&self) -> usize {
        self.likes.len()
    }

    pub(crate) fn comments_count(&self) -> usize {
        self.comments.len()
    }

    pub(crate) fn reading_time(&self) -> usize {
        reading_time(&self.content)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CreatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) author_id: i64,
    pub(crate) excerpt: Option<String>,
    pub(crate) published_at: Option<DateTime<Utc>>,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        validate_id("author", self.author_id)?;
        let title = normalize_title(&self.title)?;
        let content = normalize_content(&self.content)?;
        let excerpt = match self.excerpt.as_deref().map(str::trim) {
            Some(excerpt) if !excerpt.is_empty() => {
                if excerpt.chars().count() > EXCERPT_MAX {
                    return Err(DomainError::Validation {
                        field: "excerpt",
                        message: "must be at most 300 chars",
                    });
                }
                excerpt.to_string()
            }
            _ => derive_excerpt(&content),
        };

        Ok(Self {
            title,
            content,
            author_id: self.author_id,
            excerpt: Some(excerpt),
            published_at: self.published_at,
        })
    }
}

/// Full replacement of the editable fields. Author never changes.
#[derive(Debug, Clone)]
pub(crate) struct UpdatePostRequest {
    pub(crate) title: String,
    pub(crate) content: String,
}

impl UpdatePostRequest {
    pub(crate) fn validate(self) -> Result<PostChanges, DomainError> {
        Ok(PostChanges {
            title: Some(normalize_title(&self.title)?),
            content: Some(normalize_content(&self.content)?),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PatchPostRequest {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
}

impl PatchPostRequest {
    pub(crate) fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    pub(crate) fn validate(self) -> Result<PostChanges, DomainError> {
        if self.is_empty() {
            return Err(DomainError::bad_request("request body must not be empty"));
        }
        Ok(PostChanges {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            content: self.content.as_deref().map(normalize_content).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PostChanges {
    pub(crate) title: Option<String>,
    pub(crate) content: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct AddCommentRequest {
    pub(crate) text: Option<String>,
    pub(crate) author_id: Option<i64>,
}

impl AddCommentRequest {
    pub(crate) fn validate(self) -> Result<NewCommentInput, DomainError> {
        let author_id = self
            .author_id
            .ok_or_else(|| DomainError::bad_request("author is required to comment a post"))?;
        validate_id("author", author_id)?;

        let text = self.text.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(DomainError::bad_request("comment text is required"));
        }
        if text.chars().count() > COMMENT_MAX {
            return Err(DomainError::Validation {
                field: "text",
                message: "must be at most 2000 chars",
            });
        }

        Ok(NewCommentInput {
            text: text.to_string(),
            author_id,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NewCommentInput {
    pub(crate) text: String,
    pub(crate) author_id: i64,
}

pub(crate) fn derive_excerpt(content: &str) -> String {
    content.chars().take(EXCERPT_CHARS).collect()
}

pub(crate) fn reading_time(content: &str) -> usize {
    content.chars().count().div_ceil(READING_CHARS_PER_MINUTE)
}

pub(crate) fn validate_id(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > TITLE_MAX {
        return Err(DomainError::Validation {
            field: "title",
            message: "must be 1..255 chars",
        });
    }
    Ok(title.to_string())
}

fn normalize_content(content: &str) -> Result<String, DomainError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(DomainError::Validation {
            field: "content",
            message: "must not be empty",
        });
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        AddCommentRequest, CreatePostRequest, DomainError, PatchPostRequest, UpdatePostRequest,
        derive_excerpt, reading_time,
    };

    fn create_request(title: &str, content: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: content.to_string(),
            author_id: 1,
            excerpt: None,
            published_at: None,
        }
    }

    #[test]
    fn create_post_request_validate_rejects_empty_title() {
        let err = create_request("   ", "valid content")
            .validate()
            .expect_err("title must be rejected");
        assert_validation_field(err, "title");
    }

    #[test]
    fn create_post_request_validate_rejects_empty_content() {
        let err = create_request("title", " \n ")
            .validate()
            .expect_err("content must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn short_content_becomes_the_whole_excerpt() {
        let validated = create_request("Hi", "World").validate().expect("must validate");
        assert_eq!(validated.title, "Hi");
        assert_eq!(validated.excerpt.as_deref(), Some("World"));
    }

    #[test]
    fn long_content_is_cut_to_one_hundred_chars() {
        let content = "ж".repeat(150);
        let validated = create_request("title", &content).validate().expect("must validate");
        let excerpt = validated.excerpt.expect("excerpt must be derived");
        assert_eq!(excerpt.chars().count(), 100);
        assert_eq!(derive_excerpt(&content), excerpt);
    }

    #[test]
    fn explicit_excerpt_is_kept() {
        let mut req = create_request("title", "content");
        req.excerpt = Some("  teaser ".to_string());
        let validated = req.validate().expect("must validate");
        assert_eq!(validated.excerpt.as_deref(), Some("teaser"));
    }

    #[test]
    fn non_positive_author_is_rejected() {
        let mut req = create_request("title", "content");
        req.author_id = 0;
        let err = req.validate().expect_err("author 0 must fail");
        assert_validation_field(err, "author");
    }

    #[test]
    fn reading_time_rounds_up_per_two_hundred_chars() {
        assert_eq!(reading_time("a"), 1);
        assert_eq!(reading_time(&"a".repeat(200)), 1);
        assert_eq!(reading_time(&"a".repeat(201)), 2);
        assert_eq!(reading_time(""), 0);
    }

    #[test]
    fn update_post_request_validate_rejects_empty_content() {
        let req = UpdatePostRequest {
            title: "valid title".to_string(),
            content: "   ".to_string(),
        };
        let err = req.validate().expect_err("content must be rejected");
        assert_validation_field(err, "content");
    }

    #[test]
    fn empty_patch_is_a_bad_request() {
        let err = PatchPostRequest::default()
            .validate()
            .expect_err("empty patch must fail");
        assert!(matches!(err, DomainError::BadRequest(_)));
    }

    #[test]
    fn patch_normalizes_only_provided_fields() {
        let changes = PatchPostRequest {
            title: Some("  new title ".to_string()),
            content: None,
        }
        .validate()
        .expect("must validate");
        assert_eq!(changes.title.as_deref(), Some("new title"));
        assert!(changes.content.is_none());
    }

    #[test]
    fn comment_requires_author_before_text() {
        let err = AddCommentRequest {
            text: None,
            author_id: None,
        }
        .validate()
        .expect_err("missing author must fail");
        match err {
            DomainError::BadRequest(message) => assert!(message.contains("author")),
            other => panic!("expected BadRequest, got {other:?}"),
        }

        let err = AddCommentRequest {
            text: Some("   ".to_string()),
            author_id: Some(3),
        }
        .validate()
        .expect_err("blank text must fail");
        match err {
            DomainError::BadRequest(message) => assert!(message.contains("text")),
            other => panic!("expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn comment_text_is_trimmed() {
        let input = AddCommentRequest {
            text: Some("  nice post  ".to_string()),
            author_id: Some(3),
        }
        .validate()
        .expect("must validate");
        assert_eq!(input.text, "nice post");
        assert_eq!(input.author_id, 3);
    }

    fn assert_validation_field(err: DomainError, expected_field: &'static str) {
        match err {
            DomainError::Validation { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected DomainError::Validation, got {other:?}"),
        }
    }
}
