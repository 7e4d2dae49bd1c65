//! Command structs for engine operations.
//!
//! These types group parameters for write operations (create/edit expense,
//! create settlement), keeping call sites readable and avoiding long
//! argument lists. Timestamps are supplied by the caller so operations stay
//! deterministic.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::MoneyCents;

/// One member's owed amount, ready to persist as a post split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitInput {
    pub ower_id: Uuid,
    pub amount: MoneyCents,
}

/// Create an expense post.
///
/// Leaving `total_amount` unset creates an amount-pending expense: no
/// splits yet, excluded from balances until an edit supplies the total.
#[derive(Clone, Debug)]
pub struct CreateExpenseCmd {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub payer_id: Uuid,
    pub title: Option<String>,
    pub total_amount: Option<MoneyCents>,
    pub splits: Vec<SplitInput>,
    pub created_at: DateTime<Utc>,
}

impl CreateExpenseCmd {
    #[must_use]
    pub fn new(group_id: Uuid, user_id: Uuid, payer_id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            group_id,
            user_id,
            payer_id,
            title: None,
            total_amount: None,
            splits: Vec::new(),
            created_at,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn total_amount(mut self, total_amount: MoneyCents) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    #[must_use]
    pub fn splits(mut self, splits: Vec<SplitInput>) -> Self {
        self.splits = splits;
        self
    }

    #[must_use]
    pub fn split(mut self, ower_id: Uuid, amount: MoneyCents) -> Self {
        self.splits.push(SplitInput { ower_id, amount });
        self
    }
}

/// Edit an existing expense post.
///
/// Unset fields keep their stored value; `splits` always replaces the
/// stored splits wholesale.
#[derive(Clone, Debug)]
pub struct EditExpenseCmd {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub total_amount: Option<MoneyCents>,
    pub payer_id: Option<Uuid>,
    pub splits: Vec<SplitInput>,
    pub edited_at: DateTime<Utc>,
}

impl EditExpenseCmd {
    #[must_use]
    pub fn new(post_id: Uuid, user_id: Uuid, edited_at: DateTime<Utc>) -> Self {
        Self {
            post_id,
            user_id,
            title: None,
            total_amount: None,
            payer_id: None,
            splits: Vec::new(),
            edited_at,
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn total_amount(mut self, total_amount: MoneyCents) -> Self {
        self.total_amount = Some(total_amount);
        self
    }

    #[must_use]
    pub fn payer_id(mut self, payer_id: Uuid) -> Self {
        self.payer_id = Some(payer_id);
        self
    }

    #[must_use]
    pub fn splits(mut self, splits: Vec<SplitInput>) -> Self {
        self.splits = splits;
        self
    }

    #[must_use]
    pub fn split(mut self, ower_id: Uuid, amount: MoneyCents) -> Self {
        self.splits.push(SplitInput { ower_id, amount });
        self
    }
}

/// Record a settlement payment made by the acting user.
///
/// The post is created in `pending_confirmation`; only the recipient can
/// confirm or deny it.
#[derive(Clone, Debug)]
pub struct CreateSettlementCmd {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: MoneyCents,
    pub created_at: DateTime<Utc>,
}

impl CreateSettlementCmd {
    #[must_use]
    pub fn new(
        group_id: Uuid,
        user_id: Uuid,
        recipient_id: Uuid,
        amount: MoneyCents,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            group_id,
            user_id,
            recipient_id,
            amount,
            created_at,
        }
    }
}
