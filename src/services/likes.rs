use crate::api::error::AppError;
use crate::entities::likes::{self, LikeTarget};
use crate::entities::{prelude::*, videos};
use crate::services::aggregation::{self, PageRequest, PageResult};
use crate::services::videos::{VideoItem, VideoView};
use crate::utils::validation;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    Condition, PaginatorTrait, QueryFilter, Set, SqlErr,
    sea_query::{Query, SelectStatement},
};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub is_liked: bool,
    pub likes_count: u64,
}

pub struct LikeService;

impl LikeService {
    async fn target_exists(
        db: &DatabaseConnection,
        kind: LikeTarget,
        target_id: &str,
    ) -> Result<bool, AppError> {
        let found = match kind {
            LikeTarget::Video => Videos::find_by_id(target_id).count(db).await?,
            LikeTarget::Comment => Comments::find_by_id(target_id).count(db).await?,
            LikeTarget::Tweet => Tweets::find_by_id(target_id).count(db).await?,
        };
        Ok(found > 0)
    }

    pub async fn count_for(
        db: &DatabaseConnection,
        kind: LikeTarget,
        target_id: &str,
    ) -> Result<u64, AppError> {
        Ok(Likes::find()
            .filter(likes::Column::TargetKind.eq(kind))
            .filter(likes::Column::TargetId.eq(target_id))
            .count(db)
            .await?)
    }

    /// Removes the viewer's like if present, creates it otherwise.
    pub async fn toggle(
        db: &DatabaseConnection,
        kind: LikeTarget,
        target_id: &str,
        user_id: &str,
    ) -> Result<ToggleLikeResponse, AppError> {
        let what = kind.label().to_lowercase();
        let target_id = validation::parse_id(target_id, &what)?;

        if !Self::target_exists(db, kind, &target_id).await? {
            return Err(AppError::NotFound(format!("{} not found", kind.label())));
        }

        let existing = Likes::find()
            .filter(likes::Column::TargetKind.eq(kind))
            .filter(likes::Column::TargetId.eq(&target_id))
            .filter(likes::Column::LikedBy.eq(user_id))
            .one(db)
            .await?;

        let is_liked = match existing {
            Some(like) => {
                like.delete(db).await?;
                false
            }
            None => {
                let like = likes::ActiveModel {
                    id: Set(validation::new_id()),
                    liked_by: Set(user_id.to_string()),
                    target_kind: Set(kind),
                    target_id: Set(target_id.clone()),
                    created_at: Set(Utc::now()),
                };
                match like.insert(db).await {
                    Ok(_) => true,
                    // A concurrent toggle created it first; the pair is liked either way.
                    Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                        true
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        debug!(user_id = %user_id, target_id = %target_id, ?kind, is_liked, "Like toggled");

        Ok(ToggleLikeResponse {
            is_liked,
            likes_count: Self::count_for(db, kind, &target_id).await?,
        })
    }

    /// Drops every like pointing at a deleted record.
    pub async fn purge_target<C: ConnectionTrait>(
        db: &C,
        kind: LikeTarget,
        target_id: &str,
    ) -> Result<u64, AppError> {
        let result = Likes::delete_many()
            .filter(likes::Column::TargetKind.eq(kind))
            .filter(likes::Column::TargetId.eq(target_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Drops likes on every `kind` record whose id `target_ids` selects.
    pub async fn purge_targets_in<C: ConnectionTrait>(
        db: &C,
        kind: LikeTarget,
        target_ids: SelectStatement,
    ) -> Result<u64, AppError> {
        let result = Likes::delete_many()
            .filter(likes::Column::TargetKind.eq(kind))
            .filter(likes::Column::TargetId.in_subquery(target_ids))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Videos the user has liked, with the usual owner and like fields.
    pub async fn liked_videos(
        db: &DatabaseConnection,
        user_id: &str,
        request: &PageRequest,
    ) -> Result<PageResult<VideoItem>, AppError> {
        let liked_ids = Query::select()
            .column(likes::Column::TargetId)
            .from(likes::Entity)
            .and_where(likes::Column::LikedBy.eq(user_id))
            .and_where(likes::Column::TargetKind.eq(LikeTarget::Video))
            .to_owned();

        let filter = Condition::all().add(videos::Column::Id.in_subquery(liked_ids));
        aggregation::build_view::<VideoView>(db, filter, Some(user_id), request).await
    }
}
