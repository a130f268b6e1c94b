use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of record a like points at. Stored as a short string so that one
/// table covers videos, comments and tweets.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum LikeTarget {
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "tweet")]
    Tweet,
}

impl LikeTarget {
    pub fn label(self) -> &'static str {
        match self {
            LikeTarget::Video => "Video",
            LikeTarget::Comment => "Comment",
            LikeTarget::Tweet => "Tweet",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "likes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub liked_by: String,
    pub target_kind: LikeTarget,
    #[sea_orm(indexed)]
    pub target_id: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::LikedBy",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    LikedBy,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LikedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
