use crate::api::error::AppError;
use crate::entities::likes::LikeTarget;
use crate::entities::{comments, prelude::*, videos, watch_history};
use crate::models::OwnerProfile;
use crate::services::aggregation::{self, LikeState, PageRequest, PageResult, ViewResource};
use crate::services::likes::LikeService;
use crate::utils::validation;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    Set, SqlErr, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub owner: Option<OwnerProfile>,
    pub likes_count: u64,
    pub is_liked: bool,
}

pub struct VideoView;

impl ViewResource for VideoView {
    type Entity = Videos;
    type Item = VideoItem;

    const LIKE_TARGET: LikeTarget = LikeTarget::Video;

    fn id_column() -> videos::Column {
        videos::Column::Id
    }

    fn sort_column(field: &str) -> Option<videos::Column> {
        match field {
            "createdAt" => Some(videos::Column::CreatedAt),
            "views" => Some(videos::Column::Views),
            "duration" => Some(videos::Column::Duration),
            "title" => Some(videos::Column::Title),
            _ => None,
        }
    }

    fn record_id(model: &videos::Model) -> &str {
        &model.id
    }

    fn owner_id(model: &videos::Model) -> &str {
        &model.owner_id
    }

    fn project(model: videos::Model, owner: Option<OwnerProfile>, likes: LikeState) -> VideoItem {
        VideoItem {
            id: model.id,
            video_file: model.video_file,
            thumbnail: model.thumbnail,
            title: model.title,
            description: model.description,
            duration: model.duration,
            views: model.views,
            is_published: model.is_published,
            created_at: model.created_at,
            owner,
            likes_count: likes.likes_count,
            is_liked: likes.is_liked,
        }
    }
}

/// Metadata for a new video. File and thumbnail URIs come from the upload
/// step; this service only records them.
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: f64,
}

#[derive(Debug, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Default)]
pub struct VideoFilter {
    pub owner_id: Option<String>,
    pub query: Option<String>,
}

/// Only published videos are visible, except to their owner.
fn visible_to(viewer: Option<&str>) -> Condition {
    let published = Condition::any().add(videos::Column::IsPublished.eq(true));
    match viewer {
        Some(viewer) => published.add(videos::Column::OwnerId.eq(viewer)),
        None => published,
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub struct VideoService;

impl VideoService {
    async fn owned_video(
        db: &DatabaseConnection,
        video_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<videos::Model, AppError> {
        let video_id = validation::parse_id(video_id, "video")?;
        let video = Videos::find_by_id(&video_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

        if video.owner_id != user_id {
            return Err(AppError::Forbidden(format!(
                "You can only {} your own videos",
                action
            )));
        }
        Ok(video)
    }

    pub async fn publish(
        db: &DatabaseConnection,
        owner_id: &str,
        video: NewVideo,
    ) -> Result<videos::Model, AppError> {
        let title = validation::require_text(Some(&video.title), "Title")?;
        let description = validation::require_text(Some(&video.description), "Description")?;
        let video_file = validation::require_text(Some(&video.video_file), "Video file")?;
        let thumbnail = validation::require_text(Some(&video.thumbnail), "Thumbnail")?;
        if !video.duration.is_finite() || video.duration < 0.0 {
            return Err(AppError::InvalidArgument(
                "Duration must be a non-negative number".to_string(),
            ));
        }

        let now = Utc::now();
        let model = videos::ActiveModel {
            id: Set(validation::new_id()),
            owner_id: Set(owner_id.to_string()),
            video_file: Set(video_file),
            thumbnail: Set(thumbnail),
            title: Set(title),
            description: Set(description),
            duration: Set(video.duration),
            views: Set(0),
            is_published: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(video_id = %model.id, owner_id = %owner_id, "Video published");
        Ok(model)
    }

    pub async fn list(
        db: &DatabaseConnection,
        filter: VideoFilter,
        viewer: Option<&str>,
        request: &PageRequest,
    ) -> Result<PageResult<VideoItem>, AppError> {
        let mut condition = Condition::all().add(visible_to(viewer));

        if let Some(owner_id) = filter.owner_id.as_deref() {
            let owner_id = validation::parse_id(owner_id, "user")?;
            Users::find_by_id(&owner_id)
                .one(db)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
            condition = condition.add(videos::Column::OwnerId.eq(owner_id));
        }

        if let Some(query) = filter.query.as_deref().map(str::trim)
            && !query.is_empty()
        {
            let pattern = format!("%{}%", escape_like(&query.to_lowercase()));
            condition = condition
                .add(Expr::expr(Func::lower(Expr::col(videos::Column::Title)))
                    .like(LikeExpr::new(pattern).escape('\\')));
        }

        aggregation::build_view::<VideoView>(db, condition, viewer, request).await
    }

    /// Fetches one video as the viewer sees it and counts the view.
    pub async fn get(
        db: &DatabaseConnection,
        video_id: &str,
        viewer: Option<&str>,
    ) -> Result<VideoItem, AppError> {
        let video_id = validation::parse_id(video_id, "video")?;
        let condition = Condition::all()
            .add(videos::Column::Id.eq(&video_id))
            .add(visible_to(viewer));

        let updated = Videos::update_many()
            .col_expr(videos::Column::Views, Expr::col(videos::Column::Views).add(1))
            .filter(condition.clone())
            .exec(db)
            .await?;
        if updated.rows_affected == 0 {
            return Err(AppError::NotFound("Video not found".to_string()));
        }
        if let Some(viewer) = viewer {
            Self::record_watch(db, viewer, &video_id).await?;
        }

        let page =
            aggregation::build_view::<VideoView>(db, condition, viewer, &PageRequest::new(1, 1))
                .await?;
        page.items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Video not found".to_string()))
    }

    /// Moves the (user, video) history entry to now, creating it on first watch.
    async fn record_watch(
        db: &DatabaseConnection,
        user_id: &str,
        video_id: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let refreshed = WatchHistory::update_many()
            .col_expr(watch_history::Column::WatchedAt, Expr::value(now))
            .filter(watch_history::Column::UserId.eq(user_id))
            .filter(watch_history::Column::VideoId.eq(video_id))
            .exec(db)
            .await?;
        if refreshed.rows_affected > 0 {
            return Ok(());
        }

        let entry = watch_history::ActiveModel {
            id: Set(validation::new_id()),
            user_id: Set(user_id.to_string()),
            video_id: Set(video_id.to_string()),
            watched_at: Set(now),
        };
        match entry.insert(db).await {
            Ok(_) => {}
            // A parallel request for the same pair inserted first.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {}
            Err(e) => return Err(e.into()),
        }
        debug!(user_id = %user_id, video_id = %video_id, "Added to watch history");
        Ok(())
    }

    /// Videos the user has opened, limited to those still visible to them.
    pub async fn watch_history(
        db: &DatabaseConnection,
        user_id: &str,
        request: &PageRequest,
    ) -> Result<PageResult<VideoItem>, AppError> {
        let watched_ids = Query::select()
            .column(watch_history::Column::VideoId)
            .from(watch_history::Entity)
            .and_where(watch_history::Column::UserId.eq(user_id))
            .to_owned();

        let filter = Condition::all()
            .add(videos::Column::Id.in_subquery(watched_ids))
            .add(visible_to(Some(user_id)));
        aggregation::build_view::<VideoView>(db, filter, Some(user_id), request).await
    }

    pub async fn update(
        db: &DatabaseConnection,
        video_id: &str,
        user_id: &str,
        changes: VideoChanges,
    ) -> Result<videos::Model, AppError> {
        let title = changes
            .title
            .map(|t| validation::require_text(Some(&t), "Title"))
            .transpose()?;
        let description = changes
            .description
            .map(|d| validation::require_text(Some(&d), "Description"))
            .transpose()?;
        let thumbnail = changes
            .thumbnail
            .map(|t| validation::require_text(Some(&t), "Thumbnail"))
            .transpose()?;
        if title.is_none() && description.is_none() && thumbnail.is_none() {
            return Err(AppError::InvalidArgument("Nothing to update".to_string()));
        }

        let video = Self::owned_video(db, video_id, user_id, "edit").await?;
        let mut active: videos::ActiveModel = video.into();
        if let Some(title) = title {
            active.title = Set(title);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        if let Some(thumbnail) = thumbnail {
            active.thumbnail = Set(thumbnail);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    pub async fn toggle_publish(
        db: &DatabaseConnection,
        video_id: &str,
        user_id: &str,
    ) -> Result<videos::Model, AppError> {
        let video = Self::owned_video(db, video_id, user_id, "modify").await?;
        let is_published = !video.is_published;
        let mut active: videos::ActiveModel = video.into();
        active.is_published = Set(is_published);
        active.updated_at = Set(Utc::now());
        Ok(active.update(db).await?)
    }

    /// Deletes a video with its comments, history entries and every like
    /// pointing at the video or its comments.
    pub async fn delete(
        db: &DatabaseConnection,
        video_id: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let video = Self::owned_video(db, video_id, user_id, "delete").await?;

        let comment_ids = Query::select()
            .column(comments::Column::Id)
            .from(comments::Entity)
            .and_where(comments::Column::VideoId.eq(&video.id))
            .to_owned();

        let txn = db.begin().await?;
        LikeService::purge_targets_in(&txn, LikeTarget::Comment, comment_ids).await?;
        let removed = Comments::delete_many()
            .filter(comments::Column::VideoId.eq(&video.id))
            .exec(&txn)
            .await?;
        LikeService::purge_target(&txn, LikeTarget::Video, &video.id).await?;
        WatchHistory::delete_many()
            .filter(watch_history::Column::VideoId.eq(&video.id))
            .exec(&txn)
            .await?;
        Videos::delete_by_id(&video.id).exec(&txn).await?;
        txn.commit().await?;

        info!(video_id = %video.id, comments = removed.rows_affected, "Video deleted");
        Ok(())
    }
}
