//! Append-only audit trail for posts.
//!
//! One entry per create/edit/resolve action. Entries are never mutated or
//! deleted; the `changes` payload is a free-form JSON description of what
//! the editor did.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostHistory {
    pub id: i64,
    pub post_id: Uuid,
    pub editor_id: Uuid,
    pub changes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "post_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub post_id: String,
    pub editor_id: String,
    pub changes: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::PostId",
        to = "super::posts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Posts,
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for PostHistory {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            post_id: Uuid::parse_str(&model.post_id)
                .map_err(|_| EngineError::InvalidId("invalid history post id".to_string()))?,
            editor_id: Uuid::parse_str(&model.editor_id)
                .map_err(|_| EngineError::InvalidId("invalid history editor id".to_string()))?,
            changes: model.changes,
            created_at: model.created_at,
        })
    }
}
