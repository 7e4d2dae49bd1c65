//! Post splits.
//!
//! A [`PostSplit`] is a single member's owed-amount line attached to a
//! [`Post`](crate::Post).
//!
//! Amounts are stored as signed integer **cents**:
//! - for an `expense` post, the splits sum exactly to the post total
//! - for a `settlement` post, there is exactly one split, whose ower is
//!   the recipient of the payment
//!
//! In the engine, *every* balance effect flows through splits.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSplit {
    pub id: Uuid,
    pub post_id: Uuid,
    pub ower_id: Uuid,
    pub amount: MoneyCents,
}

impl PostSplit {
    pub fn new(post_id: Uuid, ower_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            ower_id,
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "post_splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub post_id: String,
    pub ower_id: String,
    pub amount_minor: i64,
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

impl From<&PostSplit> for ActiveModel {
    fn from(split: &PostSplit) -> Self {
        Self {
            id: ActiveValue::Set(split.id.to_string()),
            post_id: ActiveValue::Set(split.post_id.to_string()),
            ower_id: ActiveValue::Set(split.ower_id.to_string()),
            amount_minor: ActiveValue::Set(split.amount.cents()),
        }
    }
}

impl TryFrom<Model> for PostSplit {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid split id".to_string()))?,
            post_id: Uuid::parse_str(&model.post_id)
                .map_err(|_| EngineError::InvalidId("invalid split post id".to_string()))?,
            ower_id: Uuid::parse_str(&model.ower_id)
                .map_err(|_| EngineError::InvalidId("invalid split ower id".to_string()))?,
            amount: MoneyCents::new(model.amount_minor),
        })
    }
}
