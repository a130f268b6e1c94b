pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers::{comments, health, likes, subscriptions, tweets, users, videos};
use crate::api::middleware::auth::{optional_auth, require_auth};
use crate::config::AppConfig;
use crate::services::account::AccountService;
use crate::services::identity_store::{IdentityStore, SeaOrmIdentityStore};
use crate::services::session::SessionManager;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        users::register,
        users::login,
        users::logout,
        users::refresh_access_token,
        users::change_password,
        users::current_user,
        users::watch_history,
        users::update_account,
        users::update_avatar,
        users::update_cover_image,
        users::channel_profile,
        videos::list_videos,
        videos::publish_video,
        videos::get_video,
        videos::update_video,
        videos::delete_video,
        videos::toggle_publish_status,
        comments::get_video_comments,
        comments::add_comment,
        comments::update_comment,
        comments::delete_comment,
        tweets::create_tweet,
        tweets::get_user_tweets,
        tweets::update_tweet,
        tweets::delete_tweet,
        likes::toggle_video_like,
        likes::toggle_comment_like,
        likes::toggle_tweet_like,
        likes::get_liked_videos,
        subscriptions::toggle_subscription,
    ),
    components(
        schemas(
            health::HealthResponse,
            users::RegisterRequest,
            users::LoginRequest,
            users::LoginResponse,
            users::RefreshTokenRequest,
            users::ChangePasswordRequest,
            users::UpdateAccountRequest,
            users::UpdateAvatarRequest,
            users::UpdateCoverImageRequest,
            videos::PublishVideoRequest,
            videos::UpdateVideoRequest,
            comments::CommentRequest,
            tweets::TweetRequest,
            models::PublicUser,
            models::OwnerProfile,
            models::TokenPair,
            services::videos::VideoItem,
            services::comments::CommentItem,
            services::tweets::TweetItem,
            services::likes::ToggleLikeResponse,
            services::subscriptions::ToggleSubscriptionResponse,
            services::subscriptions::ChannelProfile,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "videos", description = "Video catalogue"),
        (name = "comments", description = "Video comments"),
        (name = "tweets", description = "Short posts"),
        (name = "likes", description = "Likes on videos, comments and tweets"),
        (name = "subscriptions", description = "Channel subscriptions")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub sessions: SessionManager,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let store: Arc<dyn IdentityStore> = Arc::new(SeaOrmIdentityStore::new(db.clone()));
        Self {
            sessions: SessionManager::new(store.clone(), &config),
            accounts: AccountService::new(store),
            db,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    // Credentials are required for the session cookies, so origins are listed explicitly.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn create_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/healthcheck", get(health::health_check))
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/refresh-token", post(users::refresh_access_token));

    let viewer_scoped = Router::new()
        .route("/users/channel/:username", get(users::channel_profile))
        .route("/videos", get(videos::list_videos))
        .route("/videos/:video_id", get(videos::get_video))
        .route("/comments/:video_id", get(comments::get_video_comments))
        .route("/tweets/user/:user_id", get(tweets::get_user_tweets))
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    let protected = Router::new()
        .route("/users/logout", post(users::logout))
        .route("/users/change-password", post(users::change_password))
        .route("/users/current-user", get(users::current_user))
        .route("/users/history", get(users::watch_history))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .route("/videos", post(videos::publish_video))
        .route(
            "/videos/:video_id",
            patch(videos::update_video).delete(videos::delete_video),
        )
        .route(
            "/videos/toggle/publish/:video_id",
            patch(videos::toggle_publish_status),
        )
        .route("/comments/:video_id", post(comments::add_comment))
        .route(
            "/comments/c/:comment_id",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/tweets", post(tweets::create_tweet))
        .route(
            "/tweets/:tweet_id",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        .route("/likes/toggle/v/:video_id", post(likes::toggle_video_like))
        .route("/likes/toggle/c/:comment_id", post(likes::toggle_comment_like))
        .route("/likes/toggle/t/:tweet_id", post(likes::toggle_tweet_like))
        .route("/likes/videos", get(likes::get_liked_videos))
        .route(
            "/subscriptions/c/:channel_id",
            post(subscriptions::toggle_subscription),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let api = public.merge(viewer_scoped).merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_secs,
        )))
        .layer(cors_layer(&state.config))
        .with_state(state)
}
