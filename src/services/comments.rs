use crate::api::error::AppError;
use crate::entities::likes::LikeTarget;
use crate::entities::{comments, prelude::*};
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
pub struct CommentItem {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerProfile>,
    pub likes_count: u64,
    pub is_liked: bool,
}

pub struct CommentView;

impl ViewResource for CommentView {
    type Entity = Comments;
    type Item = CommentItem;

    const LIKE_TARGET: LikeTarget = LikeTarget::Comment;

    fn id_column() -> comments::Column {
        comments::Column::Id
    }

    fn sort_column(field: &str) -> Option<comments::Column> {
        match field {
            "createdAt" => Some(comments::Column::CreatedAt),
            "updatedAt" => Some(comments::Column::UpdatedAt),
            _ => None,
        }
    }

    fn record_id(model: &comments::Model) -> &str {
        &model.id
    }

    fn owner_id(model: &comments::Model) -> &str {
        &model.owner_id
    }

    fn project(
        model: comments::Model,
        owner: Option<OwnerProfile>,
        likes: LikeState,
    ) -> CommentItem {
        CommentItem {
            id: model.id,
            content: model.content,
            created_at: model.created_at,
            owner,
            likes_count: likes.likes_count,
            is_liked: likes.is_liked,
        }
    }
}

pub struct CommentService;

impl CommentService {
    async fn require_video(db: &DatabaseConnection, video_id: &str) -> Result<(), AppError> {
        Videos::find_by_id(video_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
        Ok(())
    }

    async fn owned_comment(
        db: &DatabaseConnection,
        comment_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<comments::Model, AppError> {
        let comment_id = validation::parse_id(comment_id, "comment")?;
        let comment = Comments::find_by_id(&comment_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.owner_id != user_id {
            return Err(AppError::Forbidden(format!(
                "You can only {} your own comments",
                action
            )));
        }
        Ok(comment)
    }

    /// Comments on a video, newest first by default.
    pub async fn list_for_video(
        db: &DatabaseConnection,
        video_id: &str,
        viewer: Option<&str>,
        request: &PageRequest,
    ) -> Result<PageResult<CommentItem>, AppError> {
        let video_id = validation::parse_id(video_id, "video")?;
        Self::require_video(db, &video_id).await?;

        let filter = Condition::all().add(comments::Column::VideoId.eq(video_id));
        aggregation::build_view::<CommentView>(db, filter, viewer, request).await
    }

    pub async fn add(
        db: &DatabaseConnection,
        video_id: &str,
        owner_id: &str,
        content: Option<&str>,
    ) -> Result<comments::Model, AppError> {
        let content = validation::require_text(content, "Content")?;
        let video_id = validation::parse_id(video_id, "video")?;
        Self::require_video(db, &video_id).await?;

        let now = Utc::now();
        let comment = comments::ActiveModel {
            id: Set(validation::new_id()),
            video_id: Set(video_id),
            owner_id: Set(owner_id.to_string()),
            content: Set(content),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(comment.insert(db).await?)
    }

    pub async fn update(
        db: &DatabaseConnection,
        comment_id: &str,
        user_id: &str,
        content: Option<&str>,
    ) -> Result<comments::Model, AppError> {
        let content = validation::require_text(content, "Content")?;
        let comment = Self::owned_comment(db, comment_id, user_id, "edit").await?;

        let mut active: comments::ActiveModel = comment.into();
        active.content = Set(content);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn delete(
        db: &DatabaseConnection,
        comment_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let comment = Self::owned_comment(db, comment_id, user_id, "delete").await?;
        let txn = db.begin().await?;
        LikeService::purge_target(&txn, LikeTarget::Comment, &comment.id).await?;
        Comments::delete_by_id(&comment.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}
