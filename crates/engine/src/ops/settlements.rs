use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use serde_json::json;
use uuid::Uuid;

use crate::{
    CreateSettlementCmd, EngineError, Post, PostKind, PostSplit, PostStatus, ResultEngine,
    SettlementAction, post_splits, posts, util::parse_uuid,
};

use super::{Engine, with_tx};

impl Engine {
    /// Records a payment the acting user made to another member.
    ///
    /// The post starts in `pending_confirmation` and does not touch
    /// balances until the recipient confirms it.
    pub async fn create_settlement(&self, cmd: CreateSettlementCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, cmd.group_id).await?;
            self.require_active_member(&db_tx, cmd.group_id, cmd.user_id)
                .await?;
            if cmd.recipient_id == cmd.user_id {
                return Err(EngineError::InvalidAmount(
                    "payer and recipient must differ".to_string(),
                ));
            }
            self.require_participant(&db_tx, cmd.group_id, cmd.recipient_id)
                .await?;

            let post = Post::new(
                cmd.group_id,
                cmd.user_id,
                PostKind::Settlement,
                None,
                Some(cmd.amount),
                cmd.user_id,
                PostStatus::PendingConfirmation,
                cmd.created_at,
            )?;

            posts::ActiveModel::from(&post).insert(&db_tx).await?;
            let split = PostSplit::new(post.id, cmd.recipient_id, cmd.amount);
            post_splits::ActiveModel::from(&split).insert(&db_tx).await?;
            self.append_history(
                &db_tx,
                post.id,
                cmd.user_id,
                json!({
                    "action": "created",
                    "kind": PostKind::Settlement.as_str(),
                    "total_amount": cmd.amount.to_string(),
                }),
                cmd.created_at,
            )
            .await?;

            tracing::info!(
                group_id = %cmd.group_id,
                post_id = %post.id,
                "settlement recorded"
            );
            Ok(post.id)
        })
    }

    /// Confirms or denies a pending settlement.
    ///
    /// Only the recipient (the single split's ower) may resolve it;
    /// resolving a post that is not `pending_confirmation` fails instead
    /// of double-applying.
    pub async fn resolve_settlement(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        action: SettlementAction,
        resolved_at: DateTime<Utc>,
    ) -> ResultEngine<Post> {
        with_tx!(self, |db_tx| {
            let model = self.require_post(&db_tx, post_id).await?;
            if PostKind::try_from(model.kind.as_str())? != PostKind::Settlement {
                return Err(EngineError::InvalidStatus(
                    "only settlement posts can be resolved".to_string(),
                ));
            }
            if PostStatus::try_from(model.status.as_str())? != PostStatus::PendingConfirmation {
                return Err(EngineError::InvalidStatus(
                    "settlement already resolved".to_string(),
                ));
            }

            let splits = self.post_split_rows(&db_tx, post_id).await?;
            let recipient_id = match splits.as_slice() {
                [split] => split.ower_id,
                _ => {
                    return Err(EngineError::InvalidSplit(
                        "a settlement must have exactly one split".to_string(),
                    ));
                }
            };
            if user_id != recipient_id {
                return Err(EngineError::Unauthorized(
                    "only the recipient can resolve a settlement".to_string(),
                ));
            }

            let status = match action {
                SettlementAction::Confirm => PostStatus::Active,
                SettlementAction::Deny => PostStatus::Invalid,
            };
            let group_id = parse_uuid(&model.group_id, "group")?;

            let post_update = posts::ActiveModel {
                id: ActiveValue::Set(post_id.to_string()),
                status: ActiveValue::Set(status.as_str().to_string()),
                ..Default::default()
            };
            let updated = post_update.update(&db_tx).await?;

            self.append_history(
                &db_tx,
                post_id,
                user_id,
                json!({
                    "action": "resolved",
                    "resolution": match action {
                        SettlementAction::Confirm => "confirmed",
                        SettlementAction::Deny => "denied",
                    },
                }),
                resolved_at,
            )
            .await?;

            tracing::info!(
                group_id = %group_id,
                post_id = %post_id,
                status = status.as_str(),
                "settlement resolved"
            );
            self.load_post(&db_tx, updated).await
        })
    }
}
