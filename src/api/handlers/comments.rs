use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{Json, Query};
use crate::api::middleware::auth::{CurrentUser, Viewer};
use crate::api::response::ApiResponse;
use crate::entities::comments;
use crate::services::aggregation::{PageQuery, PageResult};
use crate::services::comments::{CommentItem, CommentService};
use axum::{
    Extension,
    extract::{Path, State},
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CommentRequest {
    pub content: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/comments/{video_id}",
    params(("video_id" = String, Path, description = "Video ID"), PageQuery),
    responses(
        (status = 200, description = "One page of comments with owner and like state"),
        (status = 400, description = "Invalid video ID or pagination"),
        (status = 404, description = "Video not found")
    ),
    tag = "comments"
)]
pub async fn get_video_comments(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(video_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<PageResult<CommentItem>>, AppError> {
    let request = page.resolve(state.config.default_page_size, state.config.max_page_size)?;
    let comments =
        CommentService::list_for_video(&state.db, &video_id, viewer.id(), &request).await?;
    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments/{video_id}",
    params(("video_id" = String, Path, description = "Video ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added"),
        (status = 404, description = "Video not found")
    ),
    security(("jwt" = [])),
    tag = "comments"
)]
pub async fn add_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<ApiResponse<comments::Model>, AppError> {
    let comment =
        CommentService::add(&state.db, &video_id, &user.id, payload.content.as_deref()).await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/comments/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Comment not found")
    ),
    security(("jwt" = [])),
    tag = "comments"
)]
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<ApiResponse<comments::Model>, AppError> {
    let comment =
        CommentService::update(&state.db, &comment_id, &user.id, payload.content.as_deref())
            .await?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/c/{comment_id}",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Comment not found")
    ),
    security(("jwt" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    CommentService::delete(&state.db, &comment_id, &user.id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "Comment deleted successfully"))
}
