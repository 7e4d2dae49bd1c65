use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use serde_json::json;
use uuid::Uuid;

use crate::{
    MoneyCents, Post, PostKind, PostSplit, PostStatus, ResultEngine, post_splits, posts,
};

use super::{Engine, with_tx};

impl Engine {
    /// Replaces the group's web of debts with a direct set of settling
    /// payments.
    ///
    /// Debtors and creditors are each sorted once by magnitude descending
    /// (ties by member id ascending); the algorithm then repeatedly matches
    /// the head of each list, transfers `min` of the two magnitudes, and
    /// advances past a side when its residual reaches zero — head-only
    /// adjustment, no re-sort between steps. This zeroes every balance; it
    /// does not promise the globally minimal payment count.
    ///
    /// Each payment is persisted as an `active` settlement post (no
    /// recipient confirmation: the payments are derived from the ledger the
    /// recipients already agreed to), followed by one summary post whose
    /// metadata lists the payments by display name. Everything happens in a
    /// single store transaction; on failure the caller observes no new
    /// posts at all.
    ///
    /// Returns the summary post id, or `None` when the group was already
    /// settled (nothing is written in that case).
    pub async fn simplify_debts(
        &self,
        group_id: Uuid,
        user_id: Uuid,
        run_at: DateTime<Utc>,
    ) -> ResultEngine<Option<Uuid>> {
        with_tx!(self, |db_tx| {
            self.require_group(&db_tx, group_id).await?;
            self.require_active_member(&db_tx, group_id, user_id).await?;

            let net = self.net_balances(&db_tx, group_id).await?;
            let mut debtors: Vec<(Uuid, MoneyCents)> = net
                .iter()
                .filter(|(_, balance)| balance.is_negative())
                .map(|&(member_id, balance)| (member_id, balance.abs()))
                .collect();
            let mut creditors: Vec<(Uuid, MoneyCents)> = net
                .iter()
                .filter(|(_, balance)| balance.is_positive())
                .map(|&(member_id, balance)| (member_id, balance))
                .collect();
            debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            if debtors.is_empty() && creditors.is_empty() {
                return Ok(None);
            }

            let mut payments: Vec<(Uuid, Uuid, MoneyCents)> = Vec::new();
            let (mut di, mut ci) = (0, 0);
            while di < debtors.len() && ci < creditors.len() {
                let payment = debtors[di].1.min(creditors[ci].1);
                payments.push((debtors[di].0, creditors[ci].0, payment));
                debtors[di].1 -= payment;
                creditors[ci].1 -= payment;
                if debtors[di].1.is_zero() {
                    di += 1;
                }
                if creditors[ci].1.is_zero() {
                    ci += 1;
                }
            }

            for &(debtor, creditor, amount) in &payments {
                let post = Post::new(
                    group_id,
                    user_id,
                    PostKind::Settlement,
                    None,
                    Some(amount),
                    debtor,
                    PostStatus::Active,
                    run_at,
                )?;
                posts::ActiveModel::from(&post).insert(&db_tx).await?;
                let split = PostSplit::new(post.id, creditor, amount);
                post_splits::ActiveModel::from(&split).insert(&db_tx).await?;
                self.append_history(
                    &db_tx,
                    post.id,
                    user_id,
                    json!({
                        "action": "created",
                        "kind": PostKind::Settlement.as_str(),
                        "source": "simplification",
                        "total_amount": amount.to_string(),
                    }),
                    run_at,
                )
                .await?;
            }

            // The summary metadata is for humans reading the feed later:
            // display names only, no system identifiers.
            let mut names: HashMap<Uuid, String> = HashMap::new();
            let mut recorded = Vec::with_capacity(payments.len());
            for &(debtor, creditor, amount) in &payments {
                let from = self.cached_display_name(&db_tx, &mut names, debtor).await?;
                let to = self.cached_display_name(&db_tx, &mut names, creditor).await?;
                recorded.push(json!({
                    "from": from,
                    "to": to,
                    "amount": amount.to_string(),
                }));
            }

            let mut summary = Post::new(
                group_id,
                user_id,
                PostKind::SimplificationEvent,
                None,
                None,
                user_id,
                PostStatus::Active,
                run_at,
            )?;
            summary.metadata = Some(json!({ "payments": recorded }));
            posts::ActiveModel::from(&summary).insert(&db_tx).await?;
            self.append_history(
                &db_tx,
                summary.id,
                user_id,
                json!({
                    "action": "created",
                    "kind": PostKind::SimplificationEvent.as_str(),
                    "payments": payments.len(),
                }),
                run_at,
            )
            .await?;

            tracing::info!(
                group_id = %group_id,
                post_id = %summary.id,
                payments = payments.len(),
                "debts simplified"
            );
            Ok(Some(summary.id))
        })
    }

    async fn cached_display_name(
        &self,
        db: &DatabaseTransaction,
        names: &mut HashMap<Uuid, String>,
        member_id: Uuid,
    ) -> ResultEngine<String> {
        if let Some(name) = names.get(&member_id) {
            return Ok(name.clone());
        }
        let name = self.display_name(db, member_id).await?;
        names.insert(member_id, name.clone());
        Ok(name)
    }
}
