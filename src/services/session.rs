//! Access/refresh token lifecycle.
//!
//! Access tokens are stateless: a valid signature and an unexpired `exp` are
//! enough. Refresh tokens are additionally bound to the single slot stored on
//! the user record, so clearing or replacing that slot revokes them.

use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::users;
use crate::models::{PublicUser, TokenPair};
use crate::services::identity_store::{IdentityStore, SlotWrite};
use crate::utils::{auth, password, validation};
use chrono::Duration;
use std::sync::Arc;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid user credentials";
const INVALID_ACCESS_TOKEN: &str = "Invalid access token";
const INVALID_REFRESH_TOKEN: &str = "Refresh token is expired or used";

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn IdentityStore>,
    access_secret: String,
    refresh_secret: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn IdentityStore>, config: &AppConfig) -> Self {
        Self {
            store,
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl: Duration::minutes(config.access_token_expiry_minutes),
            refresh_ttl: Duration::days(config.refresh_token_expiry_days),
        }
    }

    fn mint(&self, user: &users::Model) -> Result<TokenPair, AppError> {
        let access_token = auth::create_access_token(user, &self.access_secret, self.access_ttl)?;
        let refresh_token =
            auth::create_refresh_token(&user.id, &self.refresh_secret, self.refresh_ttl)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Mints a fresh pair and overwrites the user's stored refresh token.
    /// Any refresh token issued earlier for this user stops working; access
    /// tokens already handed out stay valid until they expire.
    pub async fn issue_token_pair(&self, user: &users::Model) -> Result<TokenPair, AppError> {
        let pair = self.mint(user)?;

        let written = self
            .store
            .write_refresh_token(&user.id, SlotWrite::Overwrite, Some(pair.refresh_token.clone()))
            .await?;
        if !written {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(pair)
    }

    async fn check_credentials(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let identifier = validation::normalize_identity(identifier);
        if identifier.is_empty() {
            return Err(AppError::InvalidArgument(
                "Username or email is required".to_string(),
            ));
        }

        let user = self
            .store
            .find_by_username_or_email(&identifier)
            .await?
            .ok_or_else(|| {
                info!(target: "auth", "Login attempt for unknown identity");
                AppError::NotFound(INVALID_CREDENTIALS.to_string())
            })?;

        if !password::verify_password(password, &user.password_hash)? {
            warn!(target: "auth", user_id = %user.id, "Login failed: bad password");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        Ok(user)
    }

    /// Looks a user up by username or email and checks the password.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<PublicUser, AppError> {
        self.check_credentials(identifier, password)
            .await
            .map(PublicUser::from)
    }

    /// `authenticate` followed by `issue_token_pair`.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<(PublicUser, TokenPair), AppError> {
        let user = self.check_credentials(identifier, password).await?;
        let pair = self.issue_token_pair(&user).await?;
        info!(target: "auth", user_id = %user.id, "User logged in");
        Ok((PublicUser::from(user), pair))
    }

    /// Resolves an access token to the live user it was issued for.
    pub async fn verify_access(&self, token: &str) -> Result<PublicUser, AppError> {
        let unauthorized = || AppError::Unauthorized(INVALID_ACCESS_TOKEN.to_string());

        let claims = auth::validate_access_token(token, &self.access_secret).map_err(|e| {
            tracing::debug!(target: "auth", "Access token rejected: {}", e);
            unauthorized()
        })?;

        let user = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(unauthorized)?;

        Ok(PublicUser::from(user))
    }

    /// Exchanges a refresh token for a new pair. The incoming token must be
    /// the one currently stored for the user; the swap is a single
    /// compare-and-write, so of two concurrent rotations only one succeeds.
    pub async fn rotate_refresh(&self, incoming: &str) -> Result<TokenPair, AppError> {
        let rejected = || AppError::Unauthorized(INVALID_REFRESH_TOKEN.to_string());

        let claims = auth::validate_refresh_token(incoming, &self.refresh_secret).map_err(|e| {
            tracing::debug!(target: "auth", "Refresh token rejected: {}", e);
            rejected()
        })?;

        let user = self
            .store
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(rejected)?;

        if user.refresh_token.as_deref() != Some(incoming) {
            warn!(target: "auth", user_id = %user.id, "Stale refresh token presented");
            return Err(rejected());
        }

        let pair = self.mint(&user)?;
        let swapped = self
            .store
            .write_refresh_token(
                &user.id,
                SlotWrite::IfCurrent {
                    token: incoming.to_string(),
                    version: user.session_version,
                },
                Some(pair.refresh_token.clone()),
            )
            .await?;

        if !swapped {
            warn!(target: "auth", user_id = %user.id, "Refresh token lost a concurrent rotation");
            return Err(rejected());
        }

        info!(target: "auth", user_id = %user.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Clears the stored refresh token (logout).
    pub async fn revoke(&self, user_id: &str) -> Result<(), AppError> {
        let written = self
            .store
            .write_refresh_token(user_id, SlotWrite::Overwrite, None)
            .await?;
        if !written {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        info!(target: "auth", user_id = %user_id, "Refresh token revoked");
        Ok(())
    }
}
