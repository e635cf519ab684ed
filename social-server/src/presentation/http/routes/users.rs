use axum::Router;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::http::handlers::users::{
    create_user, delete_user, follow_user, get_user, list_user_posts, list_users, patch_user,
    unfollow_user, update_user,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user)
                .put(update_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        .route("/{id}/follow", post(follow_user))
        .route("/{id}/unfollow", post(unfollow_user))
        .route("/{id}/posts", get(list_user_posts))
}
