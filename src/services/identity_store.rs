use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set, SqlErr, sea_query::Expr,
};

pub struct NewUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

#[derive(Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

/// Precondition for a write to the refresh-token slot.
#[derive(Debug, Clone)]
pub enum SlotWrite {
    /// Replace whatever is stored (login, logout).
    Overwrite,
    /// Replace only if the slot still holds `token` at `version` (rotation).
    IfCurrent { token: String, version: i64 },
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<users::Model>, AppError>;
    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<users::Model>, AppError>;
    /// Any user other than `exclude_id` holding this username or email.
    async fn find_conflicting(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<Option<users::Model>, AppError>;
    async fn create_user(&self, user: NewUser) -> Result<users::Model, AppError>;
    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChanges,
    ) -> Result<users::Model, AppError>;
    async fn update_password(&self, user_id: &str, password_hash: String) -> Result<(), AppError>;
    /// Writes the refresh-token slot and bumps `session_version`.
    /// Returns `false` when the precondition did not hold and nothing was written.
    async fn write_refresh_token(
        &self,
        user_id: &str,
        precondition: SlotWrite,
        token: Option<String>,
    ) -> Result<bool, AppError>;
}

pub struct SeaOrmIdentityStore {
    db: DatabaseConnection,
}

impl SeaOrmIdentityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn map_unique_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User with email or username already exists".to_string())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl IdentityStore for SeaOrmIdentityStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<users::Model>, AppError> {
        Ok(Users::find_by_id(id).one(&self.db).await?)
    }

    async fn find_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<users::Model>, AppError> {
        let user = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(identifier))
                    .add(users::Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_conflicting(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        exclude_id: Option<&str>,
    ) -> Result<Option<users::Model>, AppError> {
        let mut any = Condition::any();
        if let Some(username) = username {
            any = any.add(users::Column::Username.eq(username));
        }
        if let Some(email) = email {
            any = any.add(users::Column::Email.eq(email));
        }
        if any.is_empty() {
            return Ok(None);
        }

        let mut cond = Condition::all().add(any);
        if let Some(id) = exclude_id {
            cond = cond.add(users::Column::Id.ne(id));
        }

        Ok(Users::find().filter(cond).one(&self.db).await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<users::Model, AppError> {
        let now = Utc::now();
        let model = users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username),
            email: Set(user.email),
            full_name: Set(user.full_name),
            password_hash: Set(user.password_hash),
            avatar: Set(user.avatar),
            cover_image: Set(user.cover_image),
            refresh_token: Set(None),
            session_version: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        model.insert(&self.db).await.map_err(map_unique_violation)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        changes: ProfileChanges,
    ) -> Result<users::Model, AppError> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = Set(avatar);
        }
        if let Some(cover_image) = changes.cover_image {
            active.cover_image = Set(Some(cover_image));
        }
        active.updated_at = Set(Utc::now());

        active.update(&self.db).await.map_err(map_unique_violation)
    }

    async fn update_password(&self, user_id: &str, password_hash: String) -> Result<(), AppError> {
        let result = Users::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn write_refresh_token(
        &self,
        user_id: &str,
        precondition: SlotWrite,
        token: Option<String>,
    ) -> Result<bool, AppError> {
        let mut update = Users::update_many()
            .col_expr(users::Column::RefreshToken, Expr::value(token))
            .col_expr(
                users::Column::SessionVersion,
                Expr::col(users::Column::SessionVersion).add(1),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(user_id));

        if let SlotWrite::IfCurrent { token, version } = precondition {
            update = update
                .filter(users::Column::RefreshToken.eq(token))
                .filter(users::Column::SessionVersion.eq(version));
        }

        let result = update.exec(&self.db).await?;
        Ok(result.rows_affected == 1)
    }
}
