use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use serde_json::json;
use uuid::Uuid;

use crate::{
    CreateExpenseCmd, EditExpenseCmd, EngineError, MoneyCents, Post, PostKind, PostSplit,
    PostStatus, ResultEngine, post_splits, posts,
    util::{parse_uuid, validate_expense_splits},
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Creates an expense post with its splits and the first history entry,
    /// atomically.
    ///
    /// Without a total the post is created `pending_amount` with no splits;
    /// it joins the balances once an edit supplies the total.
    pub async fn create_expense(&self, cmd: CreateExpenseCmd) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, cmd.group_id).await?;
            self.require_active_member(&db_tx, cmd.group_id, cmd.user_id)
                .await?;
            self.require_participant(&db_tx, cmd.group_id, cmd.payer_id)
                .await?;

            let status = match cmd.total_amount {
                Some(total) => {
                    validate_expense_splits(total, &cmd.splits)?;
                    for split in &cmd.splits {
                        self.require_participant(&db_tx, cmd.group_id, split.ower_id)
                            .await?;
                    }
                    PostStatus::Active
                }
                None => {
                    if !cmd.splits.is_empty() {
                        return Err(EngineError::InvalidSplit(
                            "an amount-pending expense cannot carry splits".to_string(),
                        ));
                    }
                    PostStatus::PendingAmount
                }
            };

            let title = normalize_optional_text(cmd.title.as_deref());
            let post = Post::new(
                cmd.group_id,
                cmd.user_id,
                PostKind::Expense,
                title,
                cmd.total_amount,
                cmd.payer_id,
                status,
                cmd.created_at,
            )?;

            posts::ActiveModel::from(&post).insert(&db_tx).await?;
            for split in &cmd.splits {
                let split = PostSplit::new(post.id, split.ower_id, split.amount);
                post_splits::ActiveModel::from(&split).insert(&db_tx).await?;
            }
            self.append_history(
                &db_tx,
                post.id,
                cmd.user_id,
                json!({
                    "action": "created",
                    "kind": PostKind::Expense.as_str(),
                    "total_amount": cmd.total_amount.map(|t| t.to_string()),
                }),
                cmd.created_at,
            )
            .await?;

            tracing::info!(
                group_id = %cmd.group_id,
                post_id = %post.id,
                "expense created"
            );
            Ok(post.id)
        })
    }

    /// Edits an expense: title/total/payer as requested, splits replaced
    /// wholesale, one history entry appended.
    ///
    /// Supplying a total promotes an amount-pending expense to `active`.
    pub async fn edit_expense(&self, cmd: EditExpenseCmd) -> ResultEngine<Post> {
        with_tx!(self, |db_tx| {
            let model = self.require_post(&db_tx, cmd.post_id).await?;
            if PostKind::try_from(model.kind.as_str())? != PostKind::Expense {
                return Err(EngineError::InvalidStatus(
                    "only expense posts can be edited".to_string(),
                ));
            }
            let group_id = parse_uuid(&model.group_id, "group")?;
            self.require_active_member(&db_tx, group_id, cmd.user_id)
                .await?;

            let payer_id = match cmd.payer_id {
                Some(payer_id) => {
                    self.require_participant(&db_tx, group_id, payer_id).await?;
                    payer_id
                }
                None => parse_uuid(&model.payer_id, "payer")?,
            };

            let total_amount = cmd
                .total_amount
                .or(model.total_amount_minor.map(MoneyCents::new));
            let status = match total_amount {
                Some(total) => {
                    if !total.is_positive() {
                        return Err(EngineError::InvalidAmount(
                            "total_amount must be > 0".to_string(),
                        ));
                    }
                    validate_expense_splits(total, &cmd.splits)?;
                    for split in &cmd.splits {
                        self.require_participant(&db_tx, group_id, split.ower_id)
                            .await?;
                    }
                    PostStatus::Active
                }
                None => {
                    if !cmd.splits.is_empty() {
                        return Err(EngineError::InvalidSplit(
                            "an amount-pending expense cannot carry splits".to_string(),
                        ));
                    }
                    PostStatus::PendingAmount
                }
            };

            let title = match cmd.title.as_deref() {
                Some(title) => normalize_optional_text(Some(title)),
                None => model.title.clone(),
            };

            let post_update = posts::ActiveModel {
                id: ActiveValue::Set(cmd.post_id.to_string()),
                title: ActiveValue::Set(title),
                total_amount_minor: ActiveValue::Set(total_amount.map(MoneyCents::cents)),
                payer_id: ActiveValue::Set(payer_id.to_string()),
                status: ActiveValue::Set(status.as_str().to_string()),
                ..Default::default()
            };
            let updated = post_update.update(&db_tx).await?;

            // Replace the splits wholesale: the new set fully describes who
            // owes what, the old set must leave no residual effect.
            post_splits::Entity::delete_many()
                .filter(post_splits::Column::PostId.eq(cmd.post_id.to_string()))
                .exec(&db_tx)
                .await?;
            for split in &cmd.splits {
                let split = PostSplit::new(cmd.post_id, split.ower_id, split.amount);
                post_splits::ActiveModel::from(&split).insert(&db_tx).await?;
            }

            self.append_history(
                &db_tx,
                cmd.post_id,
                cmd.user_id,
                json!({
                    "action": "edited",
                    "total_amount": total_amount.map(|t| t.to_string()),
                    "splits_replaced": !cmd.splits.is_empty(),
                }),
                cmd.edited_at,
            )
            .await?;

            tracing::info!(
                group_id = %group_id,
                post_id = %cmd.post_id,
                "expense edited"
            );
            self.load_post(&db_tx, updated).await
        })
    }
}
