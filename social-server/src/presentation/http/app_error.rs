use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};
use validator::ValidationErrors;

use crate::domain::error::DomainError;
use crate::presentation::http::envelope::ApiErrorBody;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("route {0} does not exist")]
    RouteNotFound(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidId(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        match self {
            AppError::Domain(err) => match err {
                DomainError::Validation { .. } => (
                    StatusCode::BAD_REQUEST,
                    "Validation error".to_string(),
                    Some(err.to_string()),
                ),
                DomainError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
                DomainError::SelfReference => (
                    StatusCode::BAD_REQUEST,
                    "You cannot follow yourself".to_string(),
                    None,
                ),
                DomainError::NotFound(_) => {
                    (StatusCode::NOT_FOUND, capitalize(&err.to_string()), None)
                }
                DomainError::Forbidden(detail) => (
                    StatusCode::FORBIDDEN,
                    "Forbidden".to_string(),
                    Some(detail.clone()),
                ),
                DomainError::AlreadyExists(field) => (
                    StatusCode::CONFLICT,
                    "Duplicate key error".to_string(),
                    Some(format!("{field} already exists")),
                ),
                DomainError::Unavailable(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Database unavailable".to_string(),
                    None,
                ),
                DomainError::Unexpected(detail) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(detail.clone()),
                ),
            },
            AppError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(err.to_string()),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InvalidId(detail) => (
                StatusCode::BAD_REQUEST,
                "Invalid ID format".to_string(),
                Some(detail.clone()),
            ),
            AppError::RouteNotFound(path) => (
                StatusCode::NOT_FOUND,
                "Not found".to_string(),
                Some(format!("Route {path} does not exist")),
            ),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                Some(err.to_string()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();

        if status.is_server_error() {
            match &self {
                AppError::Internal(err) => {
                    error!(status = status.as_u16(), error = ?err, "request failed")
                }
                other => error!(status = status.as_u16(), error = %other, "request failed"),
            }
        } else if status == StatusCode::CONFLICT || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }

        (status, Json(ApiErrorBody::new(error, message))).into_response()
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
