//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent
//! invariants.

use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, SplitInput};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Validate an expense split set against its total.
///
/// The invariants are the ones the balance aggregator depends on: at least
/// one split, no negative amounts, and a sum equal to the total.
pub(crate) fn validate_expense_splits(
    total: MoneyCents,
    splits: &[SplitInput],
) -> ResultEngine<()> {
    if splits.is_empty() {
        return Err(EngineError::InvalidSplit(
            "an expense needs at least one split".to_string(),
        ));
    }
    if splits.iter().any(|s| s.amount.is_negative()) {
        return Err(EngineError::InvalidSplit(
            "split amounts must not be negative".to_string(),
        ));
    }
    let mut seen: Vec<Uuid> = Vec::with_capacity(splits.len());
    for split in splits {
        if seen.contains(&split.ower_id) {
            return Err(EngineError::InvalidSplit(format!(
                "duplicate split for member {}",
                split.ower_id
            )));
        }
        seen.push(split.ower_id);
    }
    let sum: MoneyCents = splits.iter().map(|s| s.amount).sum();
    if sum != total {
        return Err(EngineError::InvalidSplit(format!(
            "splits sum to {sum}, expected {total}"
        )));
    }
    Ok(())
}
