use crate::api::error::AppError;
use crate::entities::{prelude::*, subscriptions, users};
use crate::utils::validation;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr,
};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSubscriptionResponse {
    pub is_subscribed: bool,
    pub subscribers_count: u64,
}

/// A user's public page as seen by `viewer`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subscribers_count: u64,
    pub channels_subscribed_to_count: u64,
    pub is_subscribed: bool,
}

pub struct SubscriptionService;

impl SubscriptionService {
    async fn subscribers_count(db: &DatabaseConnection, channel_id: &str) -> Result<u64, AppError> {
        Ok(Subscriptions::find()
            .filter(subscriptions::Column::ChannelId.eq(channel_id))
            .count(db)
            .await?)
    }

    pub async fn toggle(
        db: &DatabaseConnection,
        channel_id: &str,
        subscriber_id: &str,
    ) -> Result<ToggleSubscriptionResponse, AppError> {
        let channel_id = validation::parse_id(channel_id, "channel")?;
        if channel_id == subscriber_id {
            return Err(AppError::InvalidArgument(
                "You cannot subscribe to your own channel".to_string(),
            ));
        }

        Users::find_by_id(&channel_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

        let existing = Subscriptions::find()
            .filter(subscriptions::Column::SubscriberId.eq(subscriber_id))
            .filter(subscriptions::Column::ChannelId.eq(&channel_id))
            .one(db)
            .await?;

        let is_subscribed = match existing {
            Some(subscription) => {
                subscription.delete(db).await?;
                false
            }
            None => {
                let subscription = subscriptions::ActiveModel {
                    id: Set(validation::new_id()),
                    subscriber_id: Set(subscriber_id.to_string()),
                    channel_id: Set(channel_id.clone()),
                    created_at: Set(Utc::now()),
                };
                match subscription.insert(db).await {
                    Ok(_) => true,
                    Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                        true
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        debug!(
            subscriber_id = %subscriber_id,
            channel_id = %channel_id,
            is_subscribed,
            "Subscription toggled"
        );

        Ok(ToggleSubscriptionResponse {
            is_subscribed,
            subscribers_count: Self::subscribers_count(db, &channel_id).await?,
        })
    }

    pub async fn channel_profile(
        db: &DatabaseConnection,
        username: &str,
        viewer: Option<&str>,
    ) -> Result<ChannelProfile, AppError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(AppError::InvalidArgument("Username is missing".to_string()));
        }

        let channel = Users::find()
            .filter(users::Column::Username.eq(&username))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel does not exist".to_string()))?;

        let subscribers_count = Self::subscribers_count(db, &channel.id).await?;
        let channels_subscribed_to_count = Subscriptions::find()
            .filter(subscriptions::Column::SubscriberId.eq(&channel.id))
            .count(db)
            .await?;
        let is_subscribed = match viewer {
            Some(viewer) => {
                Subscriptions::find()
                    .filter(subscriptions::Column::SubscriberId.eq(viewer))
                    .filter(subscriptions::Column::ChannelId.eq(&channel.id))
                    .count(db)
                    .await?
                    > 0
            }
            None => false,
        };

        Ok(ChannelProfile {
            id: channel.id,
            username: channel.username,
            full_name: channel.full_name,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
            created_at: channel.created_at,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        })
    }
}
