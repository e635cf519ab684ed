use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::user_service::FollowOutcome;
use crate::domain::user::{
    CreateUserRequest, Profile, ProfileInput, UpdateUserRequest, User, UserRef,
};
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppResult;
use crate::presentation::http::envelope::{ApiErrorBody, ApiResponse, PageDto};
use crate::presentation::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::presentation::http::handlers::posts::PostDto;
use crate::presentation::http::handlers::{ActorDto, ListQuery, PageQuery};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileDto {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) bio: Option<String>,
}

/// Public projection of a user referenced from another resource.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub(crate) struct UserRefDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) profile: ProfileDto,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) profile: ProfileDto,
    pub(crate) followers: Vec<UserRefDto>,
    pub(crate) following: Vec<UserRefDto>,
    pub(crate) followers_count: usize,
    pub(crate) following_count: usize,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FollowResultDto {
    pub(crate) follower: UserDto,
    pub(crate) target: UserDto,
    /// `true` when this request created the relationship.
    pub(crate) followed: bool,
    pub(crate) followers_count: usize,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileInputDto {
    #[validate(length(max = 64))]
    pub(crate) first_name: Option<String>,
    #[validate(length(max = 64))]
    pub(crate) last_name: Option<String>,
    #[validate(length(max = 500))]
    pub(crate) bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateUserDto {
    #[validate(length(min = 1, max = 64))]
    pub(crate) username: String,
    pub(crate) email: String,
    #[validate(length(min = 6, max = 128))]
    pub(crate) password: String,
    #[validate(nested)]
    pub(crate) profile: Option<ProfileInputDto>,
}

/// Every field is optional; an empty string clears a profile field.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateUserDto {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    #[validate(length(min = 6, max = 128))]
    pub(crate) password: Option<String>,
    #[validate(nested)]
    pub(crate) profile: Option<ProfileInputDto>,
}

impl From<Profile> for ProfileDto {
    fn from(profile: Profile) -> Self {
        Self {
            first_name: profile.first_name,
            last_name: profile.last_name,
            bio: profile.bio,
        }
    }
}

impl From<UserRef> for UserRefDto {
    fn from(user: UserRef) -> Self {
        Self {
            id: user.id,
            username: user.username,
            profile: user.profile.into(),
        }
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            followers_count: user.followers_count(),
            following_count: user.following_count(),
            id: user.id,
            username: user.username,
            email: user.email,
            profile: user.profile.into(),
            followers: user.followers.into_iter().map(UserRefDto::from).collect(),
            following: user.following.into_iter().map(UserRefDto::from).collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<FollowOutcome> for FollowResultDto {
    fn from(outcome: FollowOutcome) -> Self {
        Self {
            followers_count: outcome.target.followers_count(),
            followed: outcome.followed,
            follower: outcome.follower.into(),
            target: outcome.target.into(),
        }
    }
}

impl From<ProfileInputDto> for ProfileInput {
    fn from(dto: ProfileInputDto) -> Self {
        Self {
            first_name: dto.first_name,
            last_name: dto.last_name,
            bio: dto.bio,
        }
    }
}

impl From<UpdateUserDto> for UpdateUserRequest {
    fn from(dto: UpdateUserDto) -> Self {
        Self {
            username: dto.username,
            email: dto.email,
            password: dto.password,
            profile: dto.profile.map(ProfileInput::from),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(ListQuery),
    responses(
        (status = 200, description = "Users listed", body = ApiResponse<PageDto<UserDto>>),
        (status = 400, description = "Invalid pagination", body = ApiErrorBody),
        (status = 503, description = "Database unavailable", body = ApiErrorBody)
    )
)]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> AppResult<(StatusCode, Json<ApiResponse<PageDto<UserDto>>>)> {
    let page = query.page_request()?;
    let result = state.user_service.list_users(query.search, page).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(PageDto::from_page(result, UserDto::from))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserDto>),
        (status = 400, description = "Invalid ID format", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserDto>>)> {
    let user = state.user_service.get_user(id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(user.into()))))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 409, description = "Username or email already taken", body = ApiErrorBody)
    )
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    ApiJson(dto): ApiJson<CreateUserDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserDto>>)> {
    dto.validate()?;
    let req = CreateUserRequest {
        username: dto.username,
        email: dto.email,
        password: dto.password,
        profile: dto.profile.map(ProfileInput::from),
    };

    let user = state.user_service.create_user(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody),
        (status = 409, description = "Username or email already taken", body = ApiErrorBody)
    )
)]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<UpdateUserDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserDto>>)> {
    dto.validate()?;
    let user = state.user_service.update_user(id, dto.into()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(user.into()))))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User patched", body = ApiResponse<UserDto>),
        (status = 400, description = "Empty body or validation error", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody),
        (status = 409, description = "Username or email already taken", body = ApiErrorBody)
    )
)]
pub(crate) async fn patch_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(dto): ApiJson<UpdateUserDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserDto>>)> {
    dto.validate()?;
    let user = state.user_service.patch_user(id, dto.into()).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(user.into()))))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User id")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    state.user_service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User to follow")
    ),
    request_body = ActorDto,
    responses(
        (status = 201, description = "Now following", body = ApiResponse<FollowResultDto>),
        (status = 200, description = "Already following", body = ApiResponse<FollowResultDto>),
        (status = 400, description = "Missing userId or self-follow", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn follow_user(
    State(state): State<AppState>,
    ApiPath(target_id): ApiPath<i64>,
    ApiJson(actor): ApiJson<ActorDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<FollowResultDto>>)> {
    let follower_id = actor.required()?;
    let outcome = state.user_service.follow(follower_id, target_id).await?;

    let status = if outcome.followed {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::ok(outcome.into()))))
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/unfollow",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User to unfollow")
    ),
    request_body = ActorDto,
    responses(
        (status = 200, description = "Not following anymore", body = ApiResponse<FollowResultDto>),
        (status = 400, description = "Missing userId or self-unfollow", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn unfollow_user(
    State(state): State<AppState>,
    ApiPath(target_id): ApiPath<i64>,
    ApiJson(actor): ApiJson<ActorDto>,
) -> AppResult<(StatusCode, Json<ApiResponse<FollowResultDto>>)> {
    let follower_id = actor.required()?;
    let outcome = state.user_service.unfollow(follower_id, target_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(outcome.into()))))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}/posts",
    tag = "users",
    params(
        ("id" = i64, Path, description = "Author id"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Posts by the user", body = ApiResponse<PageDto<PostDto>>),
        (status = 400, description = "Invalid pagination", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
pub(crate) async fn list_user_posts(
    State(state): State<AppState>,
    ApiPath(author_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<(StatusCode, Json<ApiResponse<PageDto<PostDto>>>)> {
    let page = query.page_request()?;
    let result = state.post_service.list_by_author(author_id, page).await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(PageDto::from_page(result, PostDto::from))),
    ))
}
