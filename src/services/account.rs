use crate::api::error::AppError;
use crate::models::PublicUser;
use crate::services::identity_store::{IdentityStore, NewUser, ProfileChanges};
use crate::utils::{password, validation};
use std::sync::Arc;
use tracing::info;

pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Registration and profile maintenance. Credentials never leave this
/// service; callers only see [`PublicUser`].
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn IdentityStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn register(&self, account: NewAccount) -> Result<PublicUser, AppError> {
        let username = validation::normalize_identity(&account.username);
        let email = validation::normalize_identity(&account.email);
        let full_name = validation::require_text(Some(&account.full_name), "Full name")?;
        let avatar = validation::require_text(Some(&account.avatar), "Avatar")?;
        if username.is_empty() || email.is_empty() {
            return Err(AppError::InvalidArgument(
                "Username and email are required".to_string(),
            ));
        }

        if self
            .store
            .find_conflicting(Some(&username), Some(&email), None)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let password_hash = password::hash_password(&account.password)?;
        let user = self
            .store
            .create_user(NewUser {
                id: validation::new_id(),
                username,
                email,
                full_name,
                password_hash,
                avatar,
                cover_image: account.cover_image.filter(|c| !c.trim().is_empty()),
            })
            .await?;

        info!(target: "auth", user_id = %user.id, username = %user.username, "User registered");
        Ok(PublicUser::from(user))
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !password::verify_password(old_password, &user.password_hash)? {
            return Err(AppError::InvalidArgument("Invalid old password".to_string()));
        }

        let hash = password::hash_password(new_password)?;
        self.store.update_password(user_id, hash).await?;
        info!(target: "auth", user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn update_account(
        &self,
        user_id: &str,
        full_name: Option<String>,
        email: Option<String>,
    ) -> Result<PublicUser, AppError> {
        let full_name = full_name
            .map(|name| validation::require_text(Some(&name), "Full name"))
            .transpose()?;
        let email = email.map(|e| validation::normalize_identity(&e)).filter(|e| !e.is_empty());

        if full_name.is_none() && email.is_none() {
            return Err(AppError::InvalidArgument(
                "Full name or email is required".to_string(),
            ));
        }

        if let Some(ref email) = email
            && self
                .store
                .find_conflicting(None, Some(email), Some(user_id))
                .await?
                .is_some()
        {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }

        let user = self
            .store
            .update_profile(
                user_id,
                ProfileChanges {
                    full_name,
                    email,
                    ..Default::default()
                },
            )
            .await?;
        Ok(PublicUser::from(user))
    }

    /// `uri` is produced by the external upload step.
    pub async fn update_avatar(&self, user_id: &str, uri: &str) -> Result<PublicUser, AppError> {
        let avatar = validation::require_text(Some(uri), "Avatar")?;
        let user = self
            .store
            .update_profile(
                user_id,
                ProfileChanges {
                    avatar: Some(avatar),
                    ..Default::default()
                },
            )
            .await?;
        Ok(PublicUser::from(user))
    }

    pub async fn update_cover_image(
        &self,
        user_id: &str,
        uri: &str,
    ) -> Result<PublicUser, AppError> {
        let cover_image = validation::require_text(Some(uri), "Cover image")?;
        let user = self
            .store
            .update_profile(
                user_id,
                ProfileChanges {
                    cover_image: Some(cover_image),
                    ..Default::default()
                },
            )
            .await?;
        Ok(PublicUser::from(user))
    }
}
