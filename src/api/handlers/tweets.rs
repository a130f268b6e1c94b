use crate::AppState;
use crate::api::error::AppError;
use crate::api::extract::{Json, Query};
use crate::api::middleware::auth::{CurrentUser, Viewer};
use crate::api::response::ApiResponse;
use crate::entities::tweets;
use crate::services::aggregation::{PageQuery, PageResult};
use crate::services::tweets::{TweetItem, TweetService};
use axum::{
    Extension,
    extract::{Path, State},
};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct TweetRequest {
    pub content: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/tweets",
    request_body = TweetRequest,
    responses(
        (status = 201, description = "Tweet created"),
        (status = 400, description = "Content is required")
    ),
    security(("jwt" = [])),
    tag = "tweets"
)]
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<TweetRequest>,
) -> Result<ApiResponse<tweets::Model>, AppError> {
    let tweet = TweetService::create(&state.db, &user.id, payload.content.as_deref()).await?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tweets/user/{user_id}",
    params(("user_id" = String, Path, description = "Author's user ID"), PageQuery),
    responses(
        (status = 200, description = "One page of tweets with owner and like state"),
        (status = 404, description = "User not found")
    ),
    tag = "tweets"
)]
pub async fn get_user_tweets(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<ApiResponse<PageResult<TweetItem>>, AppError> {
    let request = page.resolve(state.config.default_page_size, state.config.max_page_size)?;
    let tweets = TweetService::list_for_user(&state.db, &user_id, viewer.id(), &request).await?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/tweets/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    request_body = TweetRequest,
    responses(
        (status = 200, description = "Tweet updated"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Tweet not found")
    ),
    security(("jwt" = [])),
    tag = "tweets"
)]
pub async fn update_tweet(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
    Json(payload): Json<TweetRequest>,
) -> Result<ApiResponse<tweets::Model>, AppError> {
    let tweet =
        TweetService::update(&state.db, &tweet_id, &user.id, payload.content.as_deref()).await?;
    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tweets/{tweet_id}",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Tweet deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Tweet not found")
    ),
    security(("jwt" = [])),
    tag = "tweets"
)]
pub async fn delete_tweet(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, AppError> {
    TweetService::delete(&state.db, &tweet_id, &user.id).await?;
    Ok(ApiResponse::ok(serde_json::json!({}), "Tweet deleted successfully"))
}
