use crate::api::error::AppError;
use crate::entities::likes::LikeTarget;
use crate::entities::{prelude::*, tweets};
use crate::models::OwnerProfile;
use crate::services::aggregation::{self, LikeState, PageRequest, PageResult, ViewResource};
use crate::services::likes::LikeService;
use crate::utils::validation;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Set,
    TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TweetItem {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Option<OwnerProfile>,
    pub likes_count: u64,
    pub is_liked: bool,
}

pub struct TweetView;

impl ViewResource for TweetView {
    type Entity = Tweets;
    type Item = TweetItem;

    const LIKE_TARGET: LikeTarget = LikeTarget::Tweet;

    fn id_column() -> tweets::Column {
        tweets::Column::Id
    }

    fn sort_column(field: &str) -> Option<tweets::Column> {
        match field {
            "createdAt" => Some(tweets::Column::CreatedAt),
            "updatedAt" => Some(tweets::Column::UpdatedAt),
            _ => None,
        }
    }

    fn record_id(model: &tweets::Model) -> &str {
        &model.id
    }

    fn owner_id(model: &tweets::Model) -> &str {
        &model.owner_id
    }

    fn project(model: tweets::Model, owner: Option<OwnerProfile>, likes: LikeState) -> TweetItem {
        TweetItem {
            id: model.id,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
            owner,
            likes_count: likes.likes_count,
            is_liked: likes.is_liked,
        }
    }
}

pub struct TweetService;

impl TweetService {
    async fn owned_tweet(
        db: &DatabaseConnection,
        tweet_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<tweets::Model, AppError> {
        let tweet_id = validation::parse_id(tweet_id, "tweet")?;
        let tweet = Tweets::find_by_id(&tweet_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Tweet not found".to_string()))?;

        if tweet.owner_id != user_id {
            return Err(AppError::Forbidden(format!(
                "You can only {} your own tweets",
                action
            )));
        }
        Ok(tweet)
    }

    pub async fn create(
        db: &DatabaseConnection,
        owner_id: &str,
        content: Option<&str>,
    ) -> Result<tweets::Model, AppError> {
        let content = validation::require_text(content, "Content")?;
        let now = Utc::now();
        let tweet = tweets::ActiveModel {
            id: Set(validation::new_id()),
            owner_id: Set(owner_id.to_string()),
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(tweet.insert(db).await?)
    }

    pub async fn list_for_user(
        db: &DatabaseConnection,
        user_id: &str,
        viewer: Option<&str>,
        request: &PageRequest,
    ) -> Result<PageResult<TweetItem>, AppError> {
        let user_id = validation::parse_id(user_id, "user")?;
        Users::find_by_id(&user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let filter = Condition::all().add(tweets::Column::OwnerId.eq(user_id));
        aggregation::build_view::<TweetView>(db, filter, viewer, request).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        tweet_id: &str,
        user_id: &str,
        content: Option<&str>,
    ) -> Result<tweets::Model, AppError> {
        let content = validation::require_text(content, "Content")?;
        let tweet = Self::owned_tweet(db, tweet_id, user_id, "edit").await?;

        let mut active: tweets::ActiveModel = tweet.into();
        active.content = Set(content);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn delete(
        db: &DatabaseConnection,
        tweet_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let tweet = Self::owned_tweet(db, tweet_id, user_id, "delete").await?;
        let txn = db.begin().await?;
        LikeService::purge_target(&txn, LikeTarget::Tweet, &tweet.id).await?;
        Tweets::delete_by_id(&tweet.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
