#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;
use videotube_backend::config::AppConfig;
use videotube_backend::infrastructure::database;
use videotube_backend::{AppState, create_app};

pub const PASSWORD: &str = "correct-horse-battery";

pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

pub async fn setup_app() -> (Router, AppState) {
    setup_app_with(AppConfig::development()).await
}

pub async fn setup_app_with(config: AppConfig) -> (Router, AppState) {
    let db = setup_test_db().await;
    let state = AppState::new(db, config);
    (create_app(state.clone()), state)
}

pub async fn send_raw(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = send_raw(app, req).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Registers a user and returns its id.
pub async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "fullName": format!("{} Example", username),
            "email": format!("{}@example.com", username),
            "username": username,
            "password": PASSWORD,
            "avatar": format!("https://cdn.example.com/{}.png", username),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {}: {}", username, body);
    body["data"]["id"].as_str().unwrap().to_string()
}

/// Logs in and returns `(access_token, refresh_token)`.
pub async fn login(app: &Router, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": username, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login {}: {}", username, body);
    (
        body["data"]["accessToken"].as_str().unwrap().to_string(),
        body["data"]["refreshToken"].as_str().unwrap().to_string(),
    )
}

/// Registers and logs in; returns `(user_id, access_token)`.
pub async fn signed_in(app: &Router, username: &str) -> (String, String) {
    let id = register(app, username).await;
    let (access, _) = login(app, username).await;
    (id, access)
}

pub async fn publish_video(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/videos",
        Some(token),
        Some(json!({
            "title": title,
            "description": format!("About {}", title),
            "videoFile": "https://cdn.example.com/v.mp4",
            "thumbnail": "https://cdn.example.com/t.png",
            "duration": 42.5,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "publish: {}", body);
    body["data"]["id"].as_str().unwrap().to_string()
}
