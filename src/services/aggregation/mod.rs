//! Viewer-scoped read models.
//!
//! Every list endpoint that shows owner details and like state goes through
//! [`build_view`]: filter, sort and paginate in the database, then batch-load
//! owners and like counts for just the rows on the page.

pub mod pagination;

use crate::api::error::AppError;
use crate::entities::likes::{self, LikeTarget};
use crate::entities::{prelude::*, users};
use crate::models::OwnerProfile;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub use pagination::{PageQuery, PageRequest, PageResult, SortDirection};

/// Like-derived fields attached to every projected item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeState {
    pub likes_count: u64,
    pub is_liked: bool,
}

type ModelOf<R> = <<R as ViewResource>::Entity as EntityTrait>::Model;
type ColumnOf<R> = <<R as ViewResource>::Entity as EntityTrait>::Column;

/// A record type that can be listed through [`build_view`].
pub trait ViewResource {
    type Entity: EntityTrait;
    type Item: Serialize + Send;

    /// Kind stored on like records pointing at this resource.
    const LIKE_TARGET: LikeTarget;

    fn id_column() -> ColumnOf<Self>;

    /// Maps a client-facing sort field to a column; `None` if not sortable.
    fn sort_column(field: &str) -> Option<ColumnOf<Self>>;

    fn record_id(model: &ModelOf<Self>) -> &str;

    fn owner_id(model: &ModelOf<Self>) -> &str;

    fn project(model: ModelOf<Self>, owner: Option<OwnerProfile>, likes: LikeState) -> Self::Item;
}

/// Runs the read pipeline for one page of `R` matching `filter`.
///
/// `filter` must already be validated; existence checks for the filter
/// target belong to the caller so that they fail before any aggregation.
/// With no `viewer`, `is_liked` is always false.
pub async fn build_view<R>(
    db: &DatabaseConnection,
    filter: Condition,
    viewer: Option<&str>,
    request: &PageRequest,
) -> Result<PageResult<R::Item>, AppError>
where
    R: ViewResource,
    ModelOf<R>: Send + Sync + 'static,
{
    let sort_column = R::sort_column(&request.sort_by).ok_or_else(|| {
        AppError::InvalidArgument(format!("Unsupported sortBy: {}", request.sort_by))
    })?;
    let order: Order = request.direction.into();

    let total_items = R::Entity::find()
        .filter(filter.clone())
        .count(db)
        .await?;

    if request.offset() >= total_items {
        return Ok(PageResult::new(Vec::new(), total_items, request));
    }

    let models = R::Entity::find()
        .filter(filter)
        .order_by(sort_column, order.clone())
        .order_by(R::id_column(), order)
        .offset(request.offset())
        .limit(request.limit)
        .all(db)
        .await?;

    let owners = load_owners(db, models.iter().map(|m| R::owner_id(m))).await?;

    let ids: Vec<String> = models.iter().map(|m| R::record_id(m).to_string()).collect();
    let like_states = load_like_states(db, R::LIKE_TARGET, &ids, viewer).await?;

    let items = models
        .into_iter()
        .map(|model| {
            let owner = owners.get(R::owner_id(&model)).cloned();
            let likes = like_states
                .get(R::record_id(&model))
                .copied()
                .unwrap_or_default();
            R::project(model, owner, likes)
        })
        .collect();

    tracing::debug!(
        target: "aggregation",
        total_items,
        page = request.page,
        limit = request.limit,
        "Built view"
    );

    Ok(PageResult::new(items, total_items, request))
}

/// Public profile fields for each distinct owner id. Credential columns are
/// never read through this path.
pub async fn load_owners<'a>(
    db: &DatabaseConnection,
    owner_ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, OwnerProfile>, AppError> {
    let ids: HashSet<&str> = owner_ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let owners = Users::find()
        .select_only()
        .columns([
            users::Column::Id,
            users::Column::Username,
            users::Column::FullName,
            users::Column::Avatar,
        ])
        .filter(users::Column::Id.is_in(ids))
        .into_tuple::<(String, String, String, String)>()
        .all(db)
        .await?;

    Ok(owners
        .into_iter()
        .map(|(id, username, full_name, avatar)| {
            (
                id.clone(),
                OwnerProfile {
                    id,
                    username,
                    full_name,
                    avatar,
                },
            )
        })
        .collect())
}

/// Like count per target id, plus whether `viewer` liked it.
pub async fn load_like_states(
    db: &DatabaseConnection,
    kind: LikeTarget,
    ids: &[String],
    viewer: Option<&str>,
) -> Result<HashMap<String, LikeState>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let counts = Likes::find()
        .select_only()
        .column(likes::Column::TargetId)
        .column_as(Expr::col(likes::Column::Id).count(), "likes_count")
        .filter(likes::Column::TargetKind.eq(kind))
        .filter(likes::Column::TargetId.is_in(ids.iter().cloned()))
        .group_by(likes::Column::TargetId)
        .into_tuple::<(String, i64)>()
        .all(db)
        .await?;

    let liked_by_viewer: HashSet<String> = match viewer {
        Some(viewer) => Likes::find()
            .select_only()
            .column(likes::Column::TargetId)
            .filter(likes::Column::TargetKind.eq(kind))
            .filter(likes::Column::TargetId.is_in(ids.iter().cloned()))
            .filter(likes::Column::LikedBy.eq(viewer))
            .into_tuple::<String>()
            .all(db)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    Ok(counts
        .into_iter()
        .map(|(id, count)| {
            let is_liked = liked_by_viewer.contains(&id);
            (
                id,
                LikeState {
                    likes_count: count.max(0) as u64,
                    is_liked,
                },
            )
        })
        .collect())
}
