use crate::AppState;
use crate::api::response::ApiResponse;
use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    responses(
        (status = 200, description = "System health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    let db_status = if state.db.ping().await.is_ok() {
        "connected"
    } else {
        "disconnected"
    };

    ApiResponse::ok(
        HealthResponse {
            status: "ok".to_string(),
            database: db_status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        "Health check passed",
    )
}
