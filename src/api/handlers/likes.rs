use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::Query;
use crate::api::middleware::auth::CurrentUser;
use crate::api::response::ApiResponse;
use crate::entities::likes::LikeTarget;
use crate::services::aggregation::{PageQuery, PageResult};
use crate::services::likes::{LikeService, ToggleLikeResponse};
use crate::services::videos::VideoItem;
use axum::{
    Extension,
    extract::{Path, State},
};

async fn toggle(
    state: &AppState,
    kind: LikeTarget,
    target_id: &str,
    user_id: &str,
) -> Result<ApiResponse<ToggleLikeResponse>, AppError> {
    let outcome = LikeService::toggle(&state.db, kind, target_id, user_id).await?;
    let message = if outcome.is_liked {
        format!("{} liked", kind.label())
    } else {
        format!("{} unliked", kind.label())
    };
    Ok(ApiResponse::ok(outcome, message))
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/v/{video_id}",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = ToggleLikeResponse),
        (status = 404, description = "Video not found")
    ),
    security(("jwt" = [])),
    tag = "likes"
)]
pub async fn toggle_video_like(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<ToggleLikeResponse>, AppError> {
    toggle(&state, LikeTarget::Video, &video_id, &user.id).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = ToggleLikeResponse),
        (status = 404, description = "Comment not found")
    ),
    security(("jwt" = [])),
    tag = "likes"
)]
pub async fn toggle_comment_like(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<ToggleLikeResponse>, AppError> {
    toggle(&state, LikeTarget::Comment, &comment_id, &user.id).await
}

#[utoipa::path(
    post,
    path = "/api/v1/likes/toggle/t/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = ToggleLikeResponse),
        (status = 404, description = "Tweet not found")
    ),
    security(("jwt" = [])),
    tag = "likes"
)]
pub async fn toggle_tweet_like(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<ToggleLikeResponse>, AppError> {
    toggle(&state, LikeTarget::Tweet, &tweet_id, &user.id).await
}

#[utoipa::path(
    get,
    path = "/api/v1/likes/videos",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of videos the caller liked"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "likes"
)]
pub async fn get_liked_videos(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<PageResult<VideoItem>>, AppError> {
    let request = page.resolve(state.config.default_page_size, state.config.max_page_size)?;
    let videos = LikeService::liked_videos(&state.db, &user.id, &request).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
