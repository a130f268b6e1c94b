use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{Json, Query};
use crate::api::middleware::auth::{ACCESS_COOKIE, CurrentUser, REFRESH_COOKIE, Viewer};
use crate::api::response::ApiResponse;
use crate::models::{PublicUser, TokenPair};
use crate::services::account::NewAccount;
use crate::services::aggregation::{PageQuery, PageResult};
use crate::services::subscriptions::{ChannelProfile, SubscriptionService};
use crate::services::videos::{VideoItem, VideoService};
use axum::{
    Extension,
    extract::{Path, State},
};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// URI returned by the media upload step
    #[validate(length(min = 1, message = "Avatar is required"))]
    pub avatar: String,
    pub cover_image: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 100))]
    pub full_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateAvatarRequest {
    #[validate(length(min = 1, message = "Avatar is required"))]
    pub avatar: String,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCoverImageRequest {
    #[validate(length(min = 1, message = "Cover image is required"))]
    pub cover_image: String,
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn with_session_cookies(jar: CookieJar, pair: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, pair.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh_token.clone(), secure))
}

fn without_session_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = PublicUser),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email taken")
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    payload.validate()?;

    let user = state
        .accounts
        .register(NewAccount {
            username: payload.username,
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
            avatar: payload.avatar,
            cover_image: payload.cover_image,
        })
        .await?;

    Ok(ApiResponse::created(user, "User registered successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookies set", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "User does not exist")
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    payload.validate()?;

    let identifier = payload
        .username
        .or(payload.email)
        .ok_or_else(|| AppError::InvalidArgument("Username or email is required".to_string()))?;

    let (user, pair) = state.sessions.login(&identifier, &payload.password).await?;
    let jar = with_session_cookies(jar, &pair, state.config.cookie_secure);

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user,
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Logged out; session cookies cleared"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<(CookieJar, ApiResponse<serde_json::Value>), AppError> {
    state.sessions.revoke(&user.id).await?;
    Ok((
        without_session_cookies(jar),
        ApiResponse::ok(serde_json::json!({}), "User logged out"),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair; session cookies replaced", body = TokenPair),
        (status = 401, description = "Refresh token missing, invalid, expired or already used")
    ),
    tag = "users"
)]
pub async fn refresh_access_token(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshTokenRequest>>,
) -> Result<(CookieJar, ApiResponse<TokenPair>), AppError> {
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| payload.and_then(|Json(body)| body.refresh_token))
        .ok_or_else(|| AppError::Unauthorized("Unauthorized request".to_string()))?;

    let pair = state.sessions.rotate_refresh(&incoming).await?;
    let jar = with_session_cookies(jar, &pair, state.config.cookie_secure);

    Ok((jar, ApiResponse::ok(pair, "Access token refreshed")))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Old password incorrect"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    payload.validate()?;
    state
        .accounts
        .change_password(&user.id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(ApiResponse::ok(
        serde_json::json!({}),
        "Password changed successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    responses(
        (status = 200, description = "The authenticated user", body = PublicUser),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResponse<PublicUser> {
    ApiResponse::ok(user, "Current user fetched successfully")
}

#[utoipa::path(
    get,
    path = "/api/v1/users/history",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of videos the caller has watched"),
        (status = 400, description = "Invalid pagination"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn watch_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<PageResult<VideoItem>>, AppError> {
    let request = page.resolve(state.config.default_page_size, state.config.max_page_size)?;
    let history = VideoService::watch_history(&state.db, &user.id, &request).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = PublicUser),
        (status = 409, description = "Email already in use")
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn update_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    payload.validate()?;
    let user = state
        .accounts
        .update_account(&user.id, payload.full_name, payload.email)
        .await?;
    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    request_body = UpdateAvatarRequest,
    responses(
        (status = 200, description = "Avatar updated", body = PublicUser)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn update_avatar(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateAvatarRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    payload.validate()?;
    let user = state.accounts.update_avatar(&user.id, &payload.avatar).await?;
    Ok(ApiResponse::ok(user, "Avatar updated successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    request_body = UpdateCoverImageRequest,
    responses(
        (status = 200, description = "Cover image updated", body = PublicUser)
    ),
    security(("jwt" = [])),
    tag = "users"
)]
pub async fn update_cover_image(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateCoverImageRequest>,
) -> Result<ApiResponse<PublicUser>, AppError> {
    payload.validate()?;
    let user = state
        .accounts
        .update_cover_image(&user.id, &payload.cover_image)
        .await?;
    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/channel/{username}",
    params(("username" = String, Path, description = "Channel owner's username")),
    responses(
        (status = 200, description = "Channel profile", body = ChannelProfile),
        (status = 404, description = "Channel does not exist")
    ),
    tag = "users"
)]
pub async fn channel_profile(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>, AppError> {
    let profile = SubscriptionService::channel_profile(&state.db, &username, viewer.id()).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}
