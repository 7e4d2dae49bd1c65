//! Split calculation.
//!
//! Converts a total amount plus a roster of members into per-member owed
//! amounts. Modeled as an explicit state machine: a [`SplitPlan`] holds the
//! current state, [`SplitAction`]s transition it, and the full set of
//! amounts is recomputed from scratch after every transition. Recomputation
//! is a pure function of the current state, never an incremental patch, so
//! the amounts cannot drift from the inputs.
//!
//! Two modes:
//! - [`SplitMode::Even`]: each member is contributing or not; the total is
//!   divided over the contributing members.
//! - [`SplitMode::Custom`]: members with an entered amount are "locked";
//!   the remainder auto-fills evenly across the unlocked members.
//!
//! Cent remainders that do not divide evenly go one cent each to the first
//! members in roster order, so valid plans sum to the total exactly.

use uuid::Uuid;

use crate::{MoneyCents, SplitInput};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitMode {
    #[default]
    Even,
    Custom,
}

/// One member's line in a [`SplitPlan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberShare {
    pub member_id: Uuid,
    /// Even mode: whether the member takes part in the split.
    pub contributing: bool,
    /// Custom mode: the explicitly entered amount, if any.
    pub locked: Option<MoneyCents>,
    /// The computed owed amount under the current state.
    pub amount: MoneyCents,
}

impl MemberShare {
    fn new(member_id: Uuid) -> Self {
        Self {
            member_id,
            contributing: true,
            locked: None,
            amount: MoneyCents::ZERO,
        }
    }
}

/// State transition for a [`SplitPlan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SplitAction {
    /// Replace the roster; all state for members no longer present is
    /// dropped, new members start contributing and unlocked.
    SetMembers(Vec<Uuid>),
    SetTotal(MoneyCents),
    SetMode(SplitMode),
    /// Even mode: mark a member as taking part or not.
    SetContributing {
        member_id: Uuid,
        contributing: bool,
    },
    /// Custom mode: lock a member to an explicit amount. Idempotent.
    EnterAmount {
        member_id: Uuid,
        value: MoneyCents,
    },
    /// Custom mode: unlock a member back to auto-fill. Idempotent.
    ClearAmount {
        member_id: Uuid,
    },
}

/// Split calculator state.
///
/// ```rust
/// use engine::{MoneyCents, SplitAction, SplitPlan};
/// use uuid::Uuid;
///
/// let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
/// let mut plan = SplitPlan::new(&[a, b, c]);
/// plan.apply(SplitAction::SetTotal(MoneyCents::new(90_00)));
/// assert!(plan.is_valid());
/// assert!(plan.shares().iter().all(|s| s.amount == MoneyCents::new(30_00)));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitPlan {
    total: MoneyCents,
    mode: SplitMode,
    shares: Vec<MemberShare>,
}

impl SplitPlan {
    /// A fresh even-mode plan over `members`, everyone contributing.
    #[must_use]
    pub fn new(members: &[Uuid]) -> Self {
        let mut plan = Self {
            total: MoneyCents::ZERO,
            mode: SplitMode::Even,
            shares: members.iter().copied().map(MemberShare::new).collect(),
        };
        plan.recalculate();
        plan
    }

    /// A custom-mode plan seeded from previously persisted amounts, with
    /// every persisted value locked so it is honored until the caller
    /// changes it. Used when editing an existing expense.
    #[must_use]
    pub fn seeded(total: MoneyCents, amounts: &[(Uuid, MoneyCents)]) -> Self {
        let shares = amounts
            .iter()
            .map(|&(member_id, amount)| MemberShare {
                member_id,
                contributing: true,
                locked: Some(amount),
                amount,
            })
            .collect();
        let mut plan = Self {
            total,
            mode: SplitMode::Custom,
            shares,
        };
        plan.recalculate();
        plan
    }

    #[must_use]
    pub fn total(&self) -> MoneyCents {
        self.total
    }

    #[must_use]
    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    #[must_use]
    pub fn shares(&self) -> &[MemberShare] {
        &self.shares
    }

    /// Applies one transition, then recomputes every amount.
    pub fn apply(&mut self, action: SplitAction) {
        match action {
            SplitAction::SetMembers(members) => {
                let old = std::mem::take(&mut self.shares);
                self.shares = members
                    .into_iter()
                    .map(|member_id| {
                        old.iter()
                            .find(|s| s.member_id == member_id)
                            .cloned()
                            .unwrap_or_else(|| MemberShare::new(member_id))
                    })
                    .collect();
            }
            SplitAction::SetTotal(total) => self.total = total,
            SplitAction::SetMode(mode) => self.mode = mode,
            SplitAction::SetContributing {
                member_id,
                contributing,
            } => {
                if let Some(share) = self.share_mut(member_id) {
                    share.contributing = contributing;
                }
            }
            SplitAction::EnterAmount { member_id, value } => {
                if let Some(share) = self.share_mut(member_id) {
                    share.locked = Some(value);
                }
            }
            SplitAction::ClearAmount { member_id } => {
                if let Some(share) = self.share_mut(member_id) {
                    share.locked = None;
                }
            }
        }
        self.recalculate();
    }

    /// Sum of the computed amounts.
    #[must_use]
    pub fn split_total(&self) -> MoneyCents {
        self.shares.iter().map(|s| s.amount).sum()
    }

    /// A plan is valid when its amounts sum to the total exactly, every
    /// amount is non-negative, and the total itself is not negative.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.total.is_negative()
            && self.split_total() == self.total
            && self.shares.iter().all(|s| !s.amount.is_negative())
    }

    /// The computed amounts as persistence-ready inputs.
    #[must_use]
    pub fn split_inputs(&self) -> Vec<SplitInput> {
        self.shares
            .iter()
            .map(|s| SplitInput {
                ower_id: s.member_id,
                amount: s.amount,
            })
            .collect()
    }

    fn share_mut(&mut self, member_id: Uuid) -> Option<&mut MemberShare> {
        self.shares.iter_mut().find(|s| s.member_id == member_id)
    }

    /// Pure recomputation of every amount from the current state.
    fn recalculate(&mut self) {
        match self.mode {
            SplitMode::Even => {
                let contributing = self.shares.iter().filter(|s| s.contributing).count();
                if contributing == 0 {
                    for share in &mut self.shares {
                        share.amount = MoneyCents::ZERO;
                    }
                    return;
                }
                let amounts = divide_evenly(self.total, contributing);
                let mut next = amounts.into_iter();
                for share in &mut self.shares {
                    share.amount = if share.contributing {
                        next.next().unwrap_or(MoneyCents::ZERO)
                    } else {
                        MoneyCents::ZERO
                    };
                }
            }
            SplitMode::Custom => {
                let locked_total: MoneyCents =
                    self.shares.iter().filter_map(|s| s.locked).sum();
                let unlocked = self.shares.iter().filter(|s| s.locked.is_none()).count();
                let remainder = self.total - locked_total;

                // A negative remainder means the locked amounts already
                // exceed the total; auto-filled members get 0 and the plan
                // reports invalid rather than owing negative money.
                let amounts = if unlocked > 0 && !remainder.is_negative() {
                    divide_evenly(remainder, unlocked)
                } else {
                    vec![MoneyCents::ZERO; unlocked]
                };
                let mut next = amounts.into_iter();
                for share in &mut self.shares {
                    share.amount = match share.locked {
                        Some(value) => value,
                        None => next.next().unwrap_or(MoneyCents::ZERO),
                    };
                }
            }
        }
    }
}

/// Splits `total` into `count` non-negative parts differing by at most one
/// cent, larger parts first. The parts always sum to `total` exactly.
fn divide_evenly(total: MoneyCents, count: usize) -> Vec<MoneyCents> {
    debug_assert!(count > 0);
    let count_i64 = count as i64;
    let base = total.cents().div_euclid(count_i64);
    let remainder = total.cents().rem_euclid(count_i64);
    (0..count_i64)
        .map(|i| MoneyCents::new(if i < remainder { base + 1 } else { base }))
        .collect()
}

/// One-shot split computation without driving the state machine by hand.
///
/// `locked_values` is ignored in even mode; in custom mode the listed
/// members are locked to their values and everyone else auto-fills.
#[must_use]
pub fn compute_split(
    total: MoneyCents,
    members: &[Uuid],
    mode: SplitMode,
    locked_values: &[(Uuid, MoneyCents)],
) -> Vec<(Uuid, MoneyCents)> {
    let mut plan = SplitPlan::new(members);
    plan.apply(SplitAction::SetTotal(total));
    plan.apply(SplitAction::SetMode(mode));
    if mode == SplitMode::Custom {
        for &(member_id, value) in locked_values {
            plan.apply(SplitAction::EnterAmount { member_id, value });
        }
    }
    plan.shares()
        .iter()
        .map(|s| (s.member_id, s.amount))
        .collect()
}
