use axum::{Json, extract::State, http::StatusCode, http::Uri};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct IndexLinksDto {
    pub(crate) api: &'static str,
    pub(crate) health: &'static str,
    pub(crate) users: &'static str,
    pub(crate) posts: &'static str,
    pub(crate) docs: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct IndexDto {
    pub(crate) name: &'static str,
    pub(crate) version: &'static str,
    pub(crate) links: IndexLinksDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct HealthDto {
    /// `connected` or `disconnected`.
    pub(crate) db: &'static str,
    /// Seconds since start-up.
    pub(crate) uptime: f64,
    pub(crate) environment: String,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service index", body = IndexDto)
    )
)]
pub(crate) async fn index() -> Json<IndexDto> {
    Json(IndexDto {
        name: "Social REST API",
        version: env!("CARGO_PKG_VERSION"),
        links: IndexLinksDto {
            api: "/api",
            health: "/health",
            users: "/api/users",
            posts: "/api/posts",
            docs: "/swagger-ui",
        },
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Storage reachable", body = HealthDto),
        (status = 503, description = "Storage unreachable", body = HealthDto)
    )
)]
pub(crate) async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthDto>) {
    let (status, db) = match state.health.ping().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "disconnected")
        }
    };

    (
        status,
        Json(HealthDto {
            db,
            uptime: state.started_at.elapsed().as_secs_f64(),
            environment: state.environment.to_string(),
        }),
    )
}

pub(crate) async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}
