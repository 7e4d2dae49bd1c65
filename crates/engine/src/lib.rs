//! Shared-tab ledger engine.
//!
//! Groups of people post expenses and settlements; the engine derives who
//! owes whom from the stored ledger and can collapse the debt graph into a
//! minimal set of settling payments.
//!
//! Everything balance-related is *derived* at read time from `posts` +
//! `post_splits`; balances are never stored, so they can never drift from
//! the ledger.

pub use commands::{CreateExpenseCmd, CreateSettlementCmd, EditExpenseCmd, SplitInput};
pub use error::EngineError;
pub use group_members::{GroupRole, MemberStatus};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, MemberBalance, PairwiseBalance};
pub use post_history::PostHistory;
pub use post_splits::PostSplit;
pub use posts::{Post, PostKind, PostStatus, SettlementAction};
pub use split::{MemberShare, SplitAction, SplitMode, SplitPlan, compute_split};

mod commands;
mod error;
mod group_members;
mod groups;
mod money;
mod ops;
mod post_history;
mod post_splits;
mod posts;
mod profiles;
mod split;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
