mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::{Duration, TimeZone, Utc};
use common::*;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{Value, json};
use std::collections::HashSet;
use videotube_backend::entities::{comments, tweets};
use videotube_backend::services::aggregation::PageRequest;
use videotube_backend::services::comments::CommentService;
use videotube_backend::utils::validation::new_id;

async fn insert_comment(
    db: &sea_orm::DatabaseConnection,
    video_id: &str,
    owner_id: &str,
    content: &str,
    minutes: i64,
) -> String {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
    let comment = comments::ActiveModel {
        id: Set(new_id()),
        video_id: Set(video_id.to_string()),
        owner_id: Set(owner_id.to_string()),
        content: Set(content.to_string()),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await
    .unwrap();
    comment.id
}

async fn insert_tweet(db: &sea_orm::DatabaseConnection, owner_id: &str, minutes: i64) -> String {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
    let tweet = tweets::ActiveModel {
        id: Set(new_id()),
        owner_id: Set(owner_id.to_string()),
        content: Set(format!("tweet {}", minutes)),
        created_at: Set(at),
        updated_at: Set(at),
    }
    .insert(db)
    .await
    .unwrap();
    tweet.id
}

fn item_by_id<'a>(page: &'a Value, id: &str) -> &'a Value {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["id"] == id)
        .unwrap_or_else(|| panic!("{} not on page: {}", id, page))
}

#[tokio::test]
async fn test_comment_page_with_viewer_scoped_likes() {
    let (app, state) = setup_app().await;
    let (x, x_token) = signed_in(&app, "xavier").await;
    let (y, y_token) = signed_in(&app, "yolanda").await;
    let z = register(&app, "zed").await;

    let video = publish_video(&app, &x_token, "Intro").await;
    let c1 = insert_comment(&state.db, &video, &x, "first", 1).await;
    let c2 = insert_comment(&state.db, &video, &y, "second", 2).await;
    let c3 = insert_comment(&state.db, &video, &z, "third", 3).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/likes/toggle/c/{}", c2),
        Some(&x_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/v1/comments/{}?page=1&limit=2", video);
    let (status, body) = send(&app, Method::GET, &uri, Some(&x_token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let page = &body["data"];
    assert_eq!(page["totalItems"], 3);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["hasNextPage"], true);
    assert_eq!(page["hasPrevPage"], false);

    // Newest first.
    let ids: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec![c3.as_str(), c2.as_str()]);

    let liked = item_by_id(page, &c2);
    assert_eq!(liked["likesCount"], 1);
    assert_eq!(liked["isLiked"], true);
    assert_eq!(liked["owner"]["username"], "yolanda");
    let other = item_by_id(page, &c3);
    assert_eq!(other["likesCount"], 0);
    assert_eq!(other["isLiked"], false);

    // Same page for Y: the like is counted but not Y's own.
    let (_, body) = send(&app, Method::GET, &uri, Some(&y_token), None).await;
    let liked = item_by_id(&body["data"], &c2);
    assert_eq!(liked["likesCount"], 1);
    assert_eq!(liked["isLiked"], false);

    // Anonymous viewers never see isLiked.
    let (status, body) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_by_id(&body["data"], &c2)["isLiked"], false);

    // A broken token on a public read falls back to anonymous.
    let (status, body) = send(&app, Method::GET, &uri, Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_by_id(&body["data"], &c2)["isLiked"], false);

    let uri = format!("/api/v1/comments/{}?page=2&limit=2", video);
    let (_, body) = send(&app, Method::GET, &uri, Some(&x_token), None).await;
    let page = &body["data"];
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["items"][0]["id"], c1);
    assert_eq!(page["hasNextPage"], false);
    assert_eq!(page["hasPrevPage"], true);
}

#[tokio::test]
async fn test_owner_projection_is_public_fields_only() {
    let (app, state) = setup_app().await;
    let (x, token) = signed_in(&app, "olivia").await;
    let video = publish_video(&app, &token, "Projection").await;
    insert_comment(&state.db, &video, &x, "hello", 1).await;

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/comments/{}", video),
        None,
        None,
    )
    .await;
    let owner = body["data"]["items"][0]["owner"].as_object().unwrap();
    let keys: HashSet<&str> = owner.keys().map(String::as_str).collect();
    assert_eq!(keys, HashSet::from(["id", "username", "fullName", "avatar"]));
}

#[tokio::test]
async fn test_filter_target_is_validated_before_aggregation() {
    let (app, _) = setup_app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/comments/not-an-id", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid video ID");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/comments/{}", new_id()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/tweets/user/{}", new_id()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_pagination_parameters() {
    let (app, _) = setup_app().await;
    let (user, _) = signed_in(&app, "paula").await;

    for query in [
        "page=0",
        "limit=0",
        "sortType=sideways",
        "sortBy=password",
        "page=abc",
        "page=-1",
        "limit=ten",
    ] {
        let uri = format!("/api/v1/tweets/user/{}?{}", user, query);
        let (status, body) = send(&app, Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", query);
        assert_eq!(body["success"], false, "{}", query);
        assert!(body["message"].is_string(), "{}", query);
    }
}

#[tokio::test]
async fn test_malformed_json_body_is_rejected_with_envelope() {
    let (app, _) = setup_app().await;
    let (_, token) = signed_in(&app, "quinn").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/tweets")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"content\": "))
        .unwrap();
    let response = send_raw(&app, req).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body")
    );
}

#[tokio::test]
async fn test_pages_partition_the_result_set() {
    let (app, state) = setup_app().await;
    let (user, _) = signed_in(&app, "quinn").await;

    let mut expected = HashSet::new();
    for minute in 0..7 {
        // Two tweets share each timestamp to exercise the id tiebreak.
        expected.insert(insert_tweet(&state.db, &user, minute / 2).await);
    }

    for sort_type in ["asc", "desc"] {
        let mut seen = Vec::new();
        for page in 1..=3 {
            let uri = format!(
                "/api/v1/tweets/user/{}?page={}&limit=3&sortType={}",
                user, page, sort_type
            );
            let (status, body) = send(&app, Method::GET, &uri, None, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["data"]["totalPages"], 3);
            assert_eq!(body["data"]["hasNextPage"], page < 3);
            for item in body["data"]["items"].as_array().unwrap() {
                seen.push(item["id"].as_str().unwrap().to_string());
            }
        }
        let unique: HashSet<String> = seen.iter().cloned().collect();
        assert_eq!(seen.len(), 7, "no item repeats across pages");
        assert_eq!(unique, expected);
    }

    let uri = format!("/api/v1/tweets/user/{}?page=9&limit=3", user);
    let (_, body) = send(&app, Method::GET, &uri, None, None).await;
    assert!(body["data"]["items"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["currentPage"], 9);
    assert_eq!(body["data"]["hasNextPage"], false);
}

#[tokio::test]
async fn test_empty_result_set() {
    let (app, state) = setup_app().await;
    let (_, token) = signed_in(&app, "rita").await;
    let video = publish_video(&app, &token, "Quiet").await;

    let page = CommentService::list_for_video(&state.db, &video, None, &PageRequest::new(1, 10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 0);
    assert!(!page.has_next_page);
    assert!(!page.has_prev_page);
}

#[tokio::test]
async fn test_toggle_like_twice_restores_state() {
    let (app, _) = setup_app().await;
    let (_, token) = signed_in(&app, "sam").await;
    let video = publish_video(&app, &token, "Toggle").await;
    let uri = format!("/api/v1/likes/toggle/v/{}", video);

    let (_, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["isLiked"], true);
    assert_eq!(body["data"]["likesCount"], 1);

    let (_, body) = send(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(body["data"]["isLiked"], false);
    assert_eq!(body["data"]["likesCount"], 0);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/likes/toggle/t/{}", new_id()),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::POST, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_liked_videos_lists_only_viewer_likes() {
    let (app, _) = setup_app().await;
    let (_, owner_token) = signed_in(&app, "tara").await;
    let (_, fan_token) = signed_in(&app, "uma").await;
    let liked = publish_video(&app, &owner_token, "Liked").await;
    publish_video(&app, &owner_token, "Ignored").await;

    send(
        &app,
        Method::POST,
        &format!("/api/v1/likes/toggle/v/{}", liked),
        Some(&fan_token),
        None,
    )
    .await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/likes/videos",
        Some(&fan_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], liked);
    assert_eq!(items[0]["isLiked"], true);
    assert_eq!(items[0]["owner"]["username"], "tara");

    let (_, body) = send(&app, Method::GET, "/api/v1/likes/videos", Some(&owner_token), None).await;
    assert_eq!(body["data"]["totalItems"], 0);
}

#[tokio::test]
async fn test_comment_and_tweet_ownership() {
    let (app, _) = setup_app().await;
    let (_, author) = signed_in(&app, "victor").await;
    let (_, other) = signed_in(&app, "wendy").await;
    let video = publish_video(&app, &author, "Owned").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/comments/{}", video),
        Some(&author),
        Some(json!({ "content": "mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment = body["data"]["id"].as_str().unwrap().to_string();

    let comment_uri = format!("/api/v1/comments/c/{}", comment);
    let (status, _) = send(
        &app,
        Method::PATCH,
        &comment_uri,
        Some(&other),
        Some(json!({ "content": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &comment_uri,
        Some(&author),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &comment_uri,
        Some(&author),
        Some(json!({ "content": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "edited");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/tweets",
        Some(&author),
        Some(json!({ "content": "hello world" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let tweet_uri = format!("/api/v1/tweets/{}", body["data"]["id"].as_str().unwrap());

    let (status, _) = send(&app, Method::DELETE, &tweet_uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &tweet_uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, &tweet_uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &comment_uri, Some(&author), None).await;
    assert_eq!(status, StatusCode::OK);
}
