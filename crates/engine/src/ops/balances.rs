use std::collections::HashMap;

use sea_orm::{
    DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    MoneyCents, PostKind, PostStatus, ResultEngine, post_splits, posts, util::parse_uuid,
};

use super::{Engine, with_tx};

/// A member's overall position within a group: positive = owed to them,
/// negative = they owe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberBalance {
    pub member_id: Uuid,
    pub net: MoneyCents,
}

/// The position between one member and the requesting user: positive = the
/// member owes the user, negative = the user owes the member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairwiseBalance {
    pub member_id: Uuid,
    pub balance: MoneyCents,
}

impl Engine {
    /// Loads `(payer, ower, amount)` for every split of every `active`
    /// expense/settlement post of the group.
    ///
    /// This is the raw material of every balance figure; posts in
    /// `pending_amount`, `pending_confirmation`, or `invalid` contribute
    /// nothing.
    async fn active_split_rows(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<(Uuid, Uuid, MoneyCents)>> {
        let rows: Vec<(post_splits::Model, Option<posts::Model>)> = post_splits::Entity::find()
            .filter(posts::Column::GroupId.eq(group_id.to_string()))
            .filter(posts::Column::Status.eq(PostStatus::Active.as_str()))
            .filter(posts::Column::Kind.is_in([
                PostKind::Expense.as_str(),
                PostKind::Settlement.as_str(),
            ]))
            .find_also_related(posts::Entity)
            .all(db)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (split_model, post_model) in rows {
            let Some(post_model) = post_model else { continue };
            let payer = parse_uuid(&post_model.payer_id, "payer")?;
            let ower = parse_uuid(&split_model.ower_id, "ower")?;
            out.push((payer, ower, MoneyCents::new(split_model.amount_minor)));
        }
        Ok(out)
    }

    /// Net balances for the whole roster, derived fresh from the ledger.
    ///
    /// Every split where ower ≠ payer moves `amount` from the ower to the
    /// payer; self-splits (the payer's own share of an expense) cancel out
    /// and are skipped. The resulting map always sums to zero.
    pub(super) async fn net_balances(
        &self,
        db: &DatabaseTransaction,
        group_id: Uuid,
    ) -> ResultEngine<Vec<(Uuid, MoneyCents)>> {
        let roster = self.group_roster(db, group_id).await?;
        let mut balances: HashMap<Uuid, MoneyCents> = roster
            .iter()
            .map(|m| (m.user_id, MoneyCents::ZERO))
            .collect();

        for (payer, ower, amount) in self.active_split_rows(db, group_id).await? {
            if ower == payer {
                continue;
            }
            *balances.entry(payer).or_default() += amount;
            *balances.entry(ower).or_default() -= amount;
        }

        let mut out: Vec<(Uuid, MoneyCents)> = balances.into_iter().collect();
        out.sort_by_key(|&(member_id, _)| member_id);
        Ok(out)
    }

    /// Net balance of every member of the group, ordered by member id.
    ///
    /// Former (inactive) members stay in the output: one of them may still
    /// owe or be owed, and conservation of the group's money must stay
    /// visible to the caller.
    pub async fn group_balances(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Vec<MemberBalance>> {
        with_tx!(self, |db_tx| {
            self.require_member_read(&db_tx, group_id, user_id).await?;
            let balances = self.net_balances(&db_tx, group_id).await?;
            Ok(balances
                .into_iter()
                .map(|(member_id, net)| MemberBalance { member_id, net })
                .collect())
        })
    }

    /// The user's balance versus every other member of the group, ordered
    /// by member id.
    pub async fn pairwise_balances(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Vec<PairwiseBalance>> {
        with_tx!(self, |db_tx| {
            self.require_member_read(&db_tx, group_id, user_id).await?;
            let roster = self.group_roster(&db_tx, group_id).await?;

            let mut balances: HashMap<Uuid, MoneyCents> = roster
                .iter()
                .filter(|m| m.user_id != user_id)
                .map(|m| (m.user_id, MoneyCents::ZERO))
                .collect();

            for (payer, ower, amount) in self.active_split_rows(&db_tx, group_id).await? {
                if payer == user_id && ower != user_id {
                    *balances.entry(ower).or_default() += amount;
                } else if ower == user_id && payer != user_id {
                    *balances.entry(payer).or_default() -= amount;
                }
            }

            let mut out: Vec<PairwiseBalance> = balances
                .into_iter()
                .map(|(member_id, balance)| PairwiseBalance { member_id, balance })
                .collect();
            out.sort_by_key(|b| b.member_id);
            Ok(out)
        })
    }
}
