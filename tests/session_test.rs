mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use common::*;
use sea_orm::EntityTrait;
use serde_json::json;
use videotube_backend::api::error::AppError;
use videotube_backend::config::AppConfig;
use videotube_backend::entities::prelude::Users;

#[tokio::test]
async fn test_login_rotate_and_logout_flow() {
    let (app, _) = setup_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;

    let (access1, refresh1) = login(&app, "alice").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/users/current-user",
        Some(&access1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");

    // First rotation succeeds and returns a different pair.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let access2 = body["data"]["accessToken"].as_str().unwrap().to_string();
    let refresh2 = body["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(refresh1, refresh2);

    // Replaying the old refresh token is rejected.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/v1/users/logout", Some(&access2), None).await;
    assert_eq!(status, StatusCode::OK);

    // After logout the current refresh token is dead too.
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": refresh2 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Access tokens stay valid until they expire.
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users/current-user",
        Some(&access2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_identity_never_exposes_credentials() {
    let (app, _) = setup_app().await;
    register(&app, "carol").await;
    let (access, _) = login(&app, "carol").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/users/current-user",
        Some(&access),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user = body["data"].as_object().unwrap();
    for forbidden in [
        "password",
        "passwordHash",
        "password_hash",
        "refreshToken",
        "refresh_token",
        "sessionVersion",
    ] {
        assert!(!user.contains_key(forbidden), "leaked {}", forbidden);
    }
    assert_eq!(user["email"], "carol@example.com");
}

#[tokio::test]
async fn test_login_sets_http_only_cookies_and_cookie_auth_works() {
    let (app, _) = setup_app().await;
    register(&app, "dave").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": "DAVE@example.com", "password": PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = send_raw(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    let access_cookie = cookies
        .iter()
        .find(|c| c.starts_with("accessToken="))
        .expect("access cookie");
    assert!(access_cookie.contains("HttpOnly"));
    assert!(cookies.iter().any(|c| c.starts_with("refreshToken=")));

    let pair = access_cookie.split(';').next().unwrap().to_string();
    let req = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/users/current-user")
        .header(header::COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = send_raw(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_read_from_cookie() {
    let (app, _) = setup_app().await;
    register(&app, "erin").await;
    let (_, refresh) = login(&app, "erin").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/users/refresh-token")
        .header(header::COOKIE, format!("refreshToken={}", refresh))
        .body(Body::empty())
        .unwrap();
    let response = send_raw(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/api/v1/users/refresh-token", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_rejects_missing_and_malformed_tokens() {
    let (app, _) = setup_app().await;
    register(&app, "frank").await;
    let (access, refresh) = login(&app, "frank").await;

    let (status, _) = send(&app, Method::GET, "/api/v1/users/current-user", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users/current-user",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A refresh token is not an access token, and vice versa.
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users/current-user",
        Some(&refresh),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/refresh-token",
        None,
        Some(json!({ "refreshToken": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_access_token_is_rejected() {
    let config = AppConfig {
        access_token_expiry_minutes: -1,
        ..AppConfig::development()
    };
    let (app, state) = setup_app_with(config).await;
    register(&app, "gina").await;

    let (_, pair) = state.sessions.login("gina", PASSWORD).await.unwrap();
    let err = state.sessions.verify_access(&pair.access_token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/users/current-user",
        Some(&pair.access_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_refresh_token_is_rejected() {
    let config = AppConfig {
        refresh_token_expiry_days: -1,
        ..AppConfig::development()
    };
    let (app, state) = setup_app_with(config).await;
    register(&app, "hank").await;

    let (_, pair) = state.sessions.login("hank", PASSWORD).await.unwrap();
    let err = state.sessions.rotate_refresh(&pair.refresh_token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_login_failures_keep_their_kinds() {
    let (app, _) = setup_app().await;
    register(&app, "ivan").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "nobody", "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let not_found_message = body["message"].clone();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/login",
        None,
        Some(json!({ "username": "ivan", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], not_found_message);
}

#[tokio::test]
async fn test_register_validation_and_conflicts() {
    let (app, _) = setup_app().await;
    register(&app, "judy").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "fullName": "Other Judy",
            "email": "judy2@example.com",
            "username": "JUDY",
            "password": PASSWORD,
            "avatar": "https://cdn.example.com/a.png",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users/register",
        None,
        Some(json!({
            "fullName": "Kim",
            "email": "not-an-email",
            "username": "kim",
            "password": "short",
            "avatar": "https://cdn.example.com/k.png",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_new_login_invalidates_previous_refresh_token() {
    let (app, state) = setup_app().await;
    register(&app, "leo").await;

    let (_, first) = state.sessions.login("leo", PASSWORD).await.unwrap();
    let (_, second) = state.sessions.login("leo", PASSWORD).await.unwrap();

    assert!(state.sessions.rotate_refresh(&first.refresh_token).await.is_err());
    assert!(state.sessions.rotate_refresh(&second.refresh_token).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_rotation_has_single_winner() {
    let (app, state) = setup_app().await;
    register(&app, "mona").await;
    let (_, pair) = state.sessions.login("mona", PASSWORD).await.unwrap();

    let sessions_a = state.sessions.clone();
    let sessions_b = state.sessions.clone();
    let token_a = pair.refresh_token.clone();
    let token_b = pair.refresh_token.clone();

    let (a, b) = tokio::join!(
        tokio::spawn(async move { sessions_a.rotate_refresh(&token_a).await }),
        tokio::spawn(async move { sessions_b.rotate_refresh(&token_b).await }),
    );
    let results = [a.unwrap(), b.unwrap()];

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(AppError::Unauthorized(_))))
    );

    // The stored slot holds the winner's token.
    let users = Users::find().all(&state.db).await.unwrap();
    let stored = users[0].refresh_token.clone().unwrap();
    assert_eq!(stored, winners[0].refresh_token);
}

#[tokio::test]
async fn test_change_password_and_update_account() {
    let (app, state) = setup_app().await;
    register(&app, "nina").await;
    register(&app, "oscar").await;
    let (access, _) = login(&app, "nina").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/change-password",
        Some(&access),
        Some(json!({ "oldPassword": "not-my-password", "newPassword": "another-long-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/users/change-password",
        Some(&access),
        Some(json!({ "oldPassword": PASSWORD, "newPassword": "another-long-one" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.sessions.authenticate("nina", "another-long-one").await.is_ok());

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/update-account",
        Some(&access),
        Some(json!({ "email": "oscar@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/update-account",
        Some(&access),
        Some(json!({ "fullName": "Nina Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], "Nina Renamed");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/users/avatar",
        Some(&access),
        Some(json!({ "avatar": "https://cdn.example.com/new.png" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["avatar"], "https://cdn.example.com/new.png");
}

#[tokio::test]
async fn test_viewer_lookup_failure_is_not_downgraded_to_anonymous() {
    use sea_orm::ConnectionTrait;

    let (app, state) = setup_app().await;
    let (_, token) = signed_in(&app, "rhea").await;
    let video = publish_video(&app, &token, "Store outage").await;
    let uri = format!("/api/v1/comments/{}", video);

    state
        .db
        .execute_unprepared("ALTER TABLE users RENAME TO users_offline")
        .await
        .unwrap();

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Internal Server Error");

    // Without a token the viewer lookup is skipped entirely.
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["totalItems"], 0);
}
