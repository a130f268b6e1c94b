use crate::AppState;
use crate::api::error::AppError;
use crate::models::PublicUser;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

/// The authenticated caller on routes behind [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

/// The caller on routes behind [`optional_auth`]; `None` when anonymous.
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<PublicUser>);

impl Viewer {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.id.as_str())
    }
}

/// Bearer header first, then the access cookie.
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            let jar = CookieJar::from_headers(headers);
            jar.get(ACCESS_COOKIE)
                .map(|cookie| cookie.value().to_string())
                .filter(|t| !t.is_empty())
        })
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_access_token(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized request".to_string()))?;

    let user = state.sessions.verify_access(&token).await?;
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// Like [`require_auth`] but lets anonymous callers through. A token that
/// fails verification is treated as no token; store failures still surface.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let viewer = match extract_access_token(req.headers()) {
        Some(token) => match state.sessions.verify_access(&token).await {
            Ok(user) => Some(user),
            Err(AppError::Unauthorized(_)) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };
    req.extensions_mut().insert(Viewer(viewer));

    Ok(next.run(req).await)
}
