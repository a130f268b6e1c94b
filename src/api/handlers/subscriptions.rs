use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::auth::CurrentUser;
use crate::api::response::ApiResponse;
use crate::services::subscriptions::{SubscriptionService, ToggleSubscriptionResponse};
use axum::{
    Extension,
    extract::{Path, State},
};

#[utoipa::path(
    post,
    path = "/api/v1/subscriptions/c/{channel_id}",
    params(("channel_id" = String, Path, description = "Channel owner's user ID")),
    responses(
        (status = 200, description = "Subscription state after the toggle", body = ToggleSubscriptionResponse),
        (status = 400, description = "Cannot subscribe to yourself"),
        (status = 404, description = "Channel not found")
    ),
    security(("jwt" = [])),
    tag = "subscriptions"
)]
pub async fn toggle_subscription(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<ToggleSubscriptionResponse>, AppError> {
    let outcome = SubscriptionService::toggle(&state.db, &channel_id, &user.id).await?;
    let message = if outcome.is_subscribed {
        "Subscribed"
    } else {
        "Unsubscribed"
    };
    Ok(ApiResponse::ok(outcome, message))
}
