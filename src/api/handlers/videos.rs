use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{Json, Query};
use crate::api::middleware::auth::{CurrentUser, Viewer};
use crate::api::response::ApiResponse;
use crate::entities::videos;
use crate::services::aggregation::{PageQuery, PageResult};
use crate::services::videos::{NewVideo, VideoChanges, VideoFilter, VideoItem, VideoService};
use axum::{
    Extension,
    extract::{Path, State},
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct VideoSearchQuery {
    /// Case-insensitive title substring
    pub query: Option<String>,
    /// Only videos owned by this user
    pub user_id: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishVideoRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    /// URI returned by the media upload step
    #[validate(length(min = 1, message = "Video file is required"))]
    pub video_file: String,
    #[validate(length(min = 1, message = "Thumbnail is required"))]
    pub thumbnail: String,
    /// Seconds, as reported by the media provider
    #[validate(range(min = 0.0, message = "Duration must be non-negative"))]
    pub duration: f64,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/videos",
    params(PageQuery, VideoSearchQuery),
    responses(
        (status = 200, description = "One page of videos visible to the caller"),
        (status = 400, description = "Invalid pagination or sort parameters")
    ),
    tag = "videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(page): Query<PageQuery>,
    Query(search): Query<VideoSearchQuery>,
) -> Result<ApiResponse<PageResult<VideoItem>>, AppError> {
    let request = page.resolve(state.config.default_page_size, state.config.max_page_size)?;
    let filter = VideoFilter {
        owner_id: search.user_id,
        query: search.query,
    };
    let videos = VideoService::list(&state.db, filter, viewer.id(), &request).await?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/videos",
    request_body = PublishVideoRequest,
    responses(
        (status = 201, description = "Video published"),
        (status = 400, description = "Missing or invalid fields")
    ),
    security(("jwt" = [])),
    tag = "videos"
)]
pub async fn publish_video(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<PublishVideoRequest>,
) -> Result<ApiResponse<videos::Model>, AppError> {
    payload.validate()?;
    let video = VideoService::publish(
        &state.db,
        &user.id,
        NewVideo {
            title: payload.title,
            description: payload.description,
            video_file: payload.video_file,
            thumbnail: payload.thumbnail,
            duration: payload.duration,
        },
    )
    .await?;
    Ok(ApiResponse::created(video, "Video published successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{video_id}",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video with owner and like state", body = VideoItem),
        (status = 404, description = "Video not found")
    ),
    tag = "videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoItem>, AppError> {
    let video = VideoService::get(&state.db, &video_id, viewer.id()).await?;
    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/{video_id}",
    params(("video_id" = String, Path, description = "Video ID")),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Video updated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    ),
    security(("jwt" = [])),
    tag = "videos"
)]
pub async fn update_video(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<ApiResponse<videos::Model>, AppError> {
    payload.validate()?;
    let video = VideoService::update(
        &state.db,
        &video_id,
        &user.id,
        VideoChanges {
            title: payload.title,
            description: payload.description,
            thumbnail: payload.thumbnail,
        },
    )
    .await?;
    Ok(ApiResponse::ok(video, "Video updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/videos/{video_id}",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Video not found")
    ),
    security(("jwt" = [])),
    tag = "videos"
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    VideoService::delete(&state.db, &video_id, &user.id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "Video deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/videos/toggle/publish/{video_id}",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Publish status flipped"),
        (status = 403, description = "Not the owner")
    ),
    security(("jwt" = [])),
    tag = "videos"
)]
pub async fn toggle_publish_status(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<videos::Model>, AppError> {
    let video = VideoService::toggle_publish(&state.db, &video_id, &user.id).await?;
    Ok(ApiResponse::ok(video, "Publish status toggled"))
}
