use utoipa::OpenApi;

use crate::presentation::http::envelope::{ApiErrorBody, PageMetaDto};
use crate::presentation::http::handlers::ActorDto;
use crate::presentation::http::handlers::posts::{
    CommentDto, CreateCommentDto, CreatePostDto, LikeResultDto, PatchPostDto, PostDto,
    UpdatePostDto,
};
use crate::presentation::http::handlers::system::{HealthDto, IndexDto, IndexLinksDto};
use crate::presentation::http::handlers::users::{
    CreateUserDto, FollowResultDto, ProfileDto, ProfileInputDto, UpdateUserDto, UserDto,
    UserRefDto,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Social REST API", description = "Users, posts, comments, likes and follows"),
    paths(
        crate::presentation::http::handlers::system::index,
        crate::presentation::http::handlers::system::health,
        crate::presentation::http::handlers::users::list_users,
        crate::presentation::http::handlers::users::get_user,
        crate::presentation::http::handlers::users::create_user,
        crate::presentation::http::handlers::users::update_user,
        crate::presentation::http::handlers::users::patch_user,
        crate::presentation::http::handlers::users::delete_user,
        crate::presentation::http::handlers::users::follow_user,
        crate::presentation::http::handlers::users::unfollow_user,
        crate::presentation::http::handlers::users::list_user_posts,
        crate::presentation::http::handlers::posts::list_posts,
        crate::presentation::http::handlers::posts::get_post,
        crate::presentation::http::handlers::posts::create_post,
        crate::presentation::http::handlers::posts::update_post,
        crate::presentation::http::handlers::posts::patch_post,
        crate::presentation::http::handlers::posts::delete_post,
        crate::presentation::http::handlers::posts::add_comment,
        crate::presentation::http::handlers::posts::toggle_like
    ),
    components(
        schemas(
            ApiErrorBody,
            PageMetaDto,
            ActorDto,
            ProfileDto,
            ProfileInputDto,
            UserRefDto,
            UserDto,
            CreateUserDto,
            UpdateUserDto,
            FollowResultDto,
            CommentDto,
            PostDto,
            CreatePostDto,
            UpdatePostDto,
            PatchPostDto,
            CreateCommentDto,
            LikeResultDto,
            HealthDto,
            IndexDto,
            IndexLinksDto
        )
    ),
    tags(
        (name = "system", description = "Service index and health"),
        (name = "users", description = "Users and the follow graph"),
        (name = "posts", description = "Posts, comments and likes")
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/",
            "/health",
            "/api/users",
            "/api/users/{id}",
            "/api/users/{id}/follow",
            "/api/users/{id}/unfollow",
            "/api/users/{id}/posts",
            "/api/posts",
            "/api/posts/{id}",
            "/api/posts/{id}/comments",
            "/api/posts/{id}/like",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
