use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::data::post_repository::LikeToggle;
use crate::domain::error::DomainError;
use crate::domain::post::{
    AddCommentRequest, Comment, CreatePostRequest, PatchPostRequest, Post, UpdatePostRequest,
};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::envelope::{ApiErrorBody, ApiResponse, PageDto};
use crate::presentation::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::presentation::http::handlers::users::UserRefDto;
use crate::presentation::http::handlers::{ActorDto, ListQuery};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) text: String,
    /// `null` once the author account has been deleted.
    pub(crate) author: Option<UserRefDto>,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) excerpt: String,
    pub(crate) author: UserRefDto,
    pub(crate) likes: Vec<i64>,
    pub(crate) likes_count: usize,
    pub(crate) views: i64,
    pub(crate) published_at: DateTime<Utc>,
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) comments_count: usize,
    /// Minutes, at 200 characters per minute.
    pub(crate) reading_time: usize,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LikeResultDto {
    pub(crate) liked: bool,
    pub(crate) likes_count: usize,
    pub(crate) post: PostDto,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    /// Author user id.
    pub(crate) author: i64,
    #[validate(length(max = 300))]
    pub(crate) excerpt: Option<String>,
    pub(crate) published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdatePostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: String,
    #[validate(length(min = 1))]
    pub(crate) content: String,
    /// Acting user; must be the post author.
    pub(crate) user_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatchPostDto {
    #[validate(length(min = 1, max = 255))]
    pub(crate) title: Option<String>,
    #[validate(length(min = 1))]
    pub(crate) content: Option<String>,
    /// Acting user; must be the post author.
    pub(crate) user_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct CreateCommentDto {
    pub(crate) text: Option<String>,
    /// Commenting user id.
    pub(crate) author: Option<i64>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author.map(UserRefDto::from),
            created_at: comment.created_at,
        }
    }
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            likes_count: post.likes_count(),
            comments_count: post.comments_count(),
            reading_time: post.reading_time(),
            id: post.id,
            title: post.title,
            content: post.content,
            excerpt: post.excerpt,
            author: post.author.into(),
            likes: post.likes,
            views: post.views,
            published_at: post.published_at,
            comments: post.comments.into_iter().map(CommentDto::from).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

impl From<LikeToggle> for LikeResultDto {
    fn from(toggle: LikeToggle) -> Self {
        Self {
            liked: toggle.liked,
            likes_count: toggle.post.likes_count(),
            post: toggle.post.into(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "posts",
    params(ListQuery),
    responses(
        (status = 200, description = "Posts listed", body = ApiResponse<PageDto<PostDto>>),
        (status = 400, description = "Invalid pagination", body = ApiErrorBody),
        (status = 503, description = "Database unavailable", body = ApiErrorBody)
    )
)]
pub(crate) async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<(StatusCode, Json<ApiResponse<PageDto<PostDto>>>)> {
    let page = query.page_request()?;
    let result = state.post_service.list_posts(query.search, page).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(PageDto::from_page(result, PostDto::from))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found, view counted", body = ApiResponse<PostDto>),
        (status = 400, description = "Invalid ID format", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDto>>)> {
    let post = state.post_service.get_post(id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(post.into()))))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = ApiResponse<PostDto>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 404, description = "Author not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    ApiJson(dto): ApiJson<CreatePostDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDto>>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        title: dto.title,
        content: dto.content,
        author_id: dto.author,
        excerpt: dto.excerpt,
        published_at: dto.published_at,
    };

    let post = state.post_service.create_post(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(post.into()))))
}

#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = UpdatePostDto,
    responses(
        (status = 200, description = "Post updated", body = ApiResponse<PostDto>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Not the author", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn update_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<UpdatePostDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDto>>)> {
    dto.validate()?;
    let actor_id = ActorDto {
        user_id: dto.user_id,
    }
    .required()?;
    let req = UpdatePostRequest {
        title: dto.title,
        content: dto.content,
    };

    let post = state.post_service.update_post(actor_id, id, req).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(post.into()))))
}

#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = PatchPostDto,
    responses(
        (status = 200, description = "Post patched", body = ApiResponse<PostDto>),
        (status = 400, description = "Empty body or validation error", body = ApiErrorBody),
        (status = 403, description = "Not the author", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn patch_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<PatchPostDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDto>>)> {
    dto.validate()?;
    let req = PatchPostRequest {
        title: dto.title,
        content: dto.content,
    };
    if req.is_empty() {
        return Err(DomainError::bad_request("request body must not be empty").into());
    }
    let actor_id = ActorDto {
        user_id: dto.user_id,
    }
    .required()?;

    let post = state.post_service.patch_post(actor_id, id, req).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(post.into()))))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id"),
        ("userId" = i64, Query, description = "Acting user; must be the post author")
    ),
    responses(
        (status = 200, description = "Post deleted, last state returned", body = ApiResponse<PostDto>),
        (status = 400, description = "Missing userId", body = ApiErrorBody),
        (status = 403, description = "Not the author", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(actor): ApiQuery<ActorDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDto>>)> {
    let actor_id = actor.required()?;
    let post = state.post_service.delete_post(actor_id, id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(post.into()))))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/comments",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment appended", body = ApiResponse<PostDto>),
        (status = 400, description = "Missing author or empty text", body = ApiErrorBody),
        (status = 404, description = "Post or author not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn add_comment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<PostDto>>)> {
    let req = AddCommentRequest {
        text: dto.text,
        author_id: dto.author,
    };

    let post = state.post_service.add_comment(id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(post.into()))))
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    request_body = ActorDto,
    responses(
        (status = 200, description = "Like toggled", body = ApiResponse<LikeResultDto>),
        (status = 400, description = "Missing userId", body = ApiErrorBody),
        (status = 404, description = "Post or user not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(actor): ApiJson<ActorDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<LikeResultDto>>)> {
    let toggle = state.post_service.toggle_like(id, actor.user_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(toggle.into()))))
}
