use axum::Router;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::http::handlers::system::{health, index, route_not_found};

pub(crate) mod posts;
pub(crate) mod users;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .nest("/api/users", users::router())
        .nest("/api/posts", posts::router())
        .fallback(route_not_found)
        .with_state(state)
}
