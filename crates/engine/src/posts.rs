//! Post primitives.
//!
//! A `Post` is an atomic ledger entry: an expense, a settlement payment, or
//! the summary of a simplification run. Balance effects always come from
//! the post's [`PostSplit`](crate::PostSplit)s, and only posts with status
//! [`PostStatus::Active`] count towards balances.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

use super::post_splits;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostKind {
    Expense,
    Settlement,
    SimplificationEvent,
}

impl PostKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Settlement => "settlement",
            Self::SimplificationEvent => "simplification_event",
        }
    }
}

impl TryFrom<&str> for PostKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "settlement" => Ok(Self::Settlement),
            "simplification_event" => Ok(Self::SimplificationEvent),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid post kind: {other}"
            ))),
        }
    }
}

/// Post lifecycle status.
///
/// Only `Active` posts are counted by the balance aggregator:
/// - `PendingAmount`: an expense whose total is not known yet
/// - `PendingConfirmation`: a settlement awaiting the recipient
/// - `Invalid`: a denied settlement, kept for history only
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Active,
    PendingAmount,
    PendingConfirmation,
    Invalid,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingAmount => "pending_amount",
            Self::PendingConfirmation => "pending_confirmation",
            Self::Invalid => "invalid",
        }
    }
}

impl TryFrom<&str> for PostStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "pending_amount" => Ok(Self::PendingAmount),
            "pending_confirmation" => Ok(Self::PendingConfirmation),
            "invalid" => Ok(Self::Invalid),
            other => Err(EngineError::InvalidStatus(format!(
                "invalid post status: {other}"
            ))),
        }
    }
}

/// Resolution of a pending settlement by its recipient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementAction {
    Confirm,
    Deny,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub group_id: Uuid,
    pub author_id: Uuid,
    pub kind: PostKind,
    pub title: Option<String>,
    pub total_amount: Option<MoneyCents>,
    pub payer_id: Uuid,
    pub status: PostStatus,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub splits: Vec<post_splits::PostSplit>,
}

impl Post {
    pub fn new(
        group_id: Uuid,
        author_id: Uuid,
        kind: PostKind,
        title: Option<String>,
        total_amount: Option<MoneyCents>,
        payer_id: Uuid,
        status: PostStatus,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if let Some(total) = total_amount
            && !total.is_positive()
        {
            return Err(EngineError::InvalidAmount(
                "total_amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            group_id,
            author_id,
            kind,
            title,
            total_amount,
            payer_id,
            status,
            metadata: None,
            created_at,
            splits: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub group_id: String,
    pub author_id: String,
    pub kind: String,
    pub title: Option<String>,
    pub total_amount_minor: Option<i64>,
    pub payer_id: String,
    pub status: String,
    pub metadata: Option<Json>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post_splits::Entity")]
    PostSplits,
    #[sea_orm(
        belongs_to = "super::groups::Entity",
        from = "Column::GroupId",
        to = "super::groups::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Groups,
}

impl Related<super::post_splits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostSplits.def()
    }
}

impl Related<super::groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Groups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Post> for ActiveModel {
    fn from(post: &Post) -> Self {
        Self {
            id: ActiveValue::Set(post.id.to_string()),
            group_id: ActiveValue::Set(post.group_id.to_string()),
            author_id: ActiveValue::Set(post.author_id.to_string()),
            kind: ActiveValue::Set(post.kind.as_str().to_string()),
            title: ActiveValue::Set(post.title.clone()),
            total_amount_minor: ActiveValue::Set(post.total_amount.map(MoneyCents::cents)),
            payer_id: ActiveValue::Set(post.payer_id.to_string()),
            status: ActiveValue::Set(post.status.as_str().to_string()),
            metadata: ActiveValue::Set(post.metadata.clone()),
            created_at: ActiveValue::Set(post.created_at),
        }
    }
}

impl TryFrom<Model> for Post {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::InvalidId("invalid post id".to_string()))?,
            group_id: Uuid::parse_str(&model.group_id)
                .map_err(|_| EngineError::InvalidId("invalid group id".to_string()))?,
            author_id: Uuid::parse_str(&model.author_id)
                .map_err(|_| EngineError::InvalidId("invalid author id".to_string()))?,
            kind: PostKind::try_from(model.kind.as_str())?,
            title: model.title,
            total_amount: model.total_amount_minor.map(MoneyCents::new),
            payer_id: Uuid::parse_str(&model.payer_id)
                .map_err(|_| EngineError::InvalidId("invalid payer id".to_string()))?,
            status: PostStatus::try_from(model.status.as_str())?,
            metadata: model.metadata,
            created_at: model.created_at,
            splits: Vec::new(),
        })
    }
}
