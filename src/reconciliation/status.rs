//! Transition rules for [`ReconciliationStatus`]
//!
//! The permitted transitions are:
//!
//! ```text
//! unmatched ----> auto-matched ----> manually-confirmed
//!     |               |        \--> manually-rejected
//!     |               \-----------> ignored
//!     |--> manually-confirmed
//!     |--> manually-rejected
//!     \--> ignored
//!
//! manually-confirmed / manually-rejected / ignored --reopen--> unmatched
//! ```
//!
//! Terminal statuses can only be left through an explicit reopen; nothing
//! re-opens them automatically.

use crate::types::{BudgetError, BudgetResult, ReconciliationStatus};

fn invalid(from: &ReconciliationStatus, to: &str) -> BudgetError {
    BudgetError::InvalidTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

/// Record an automatic match with the given confidence
///
/// Re-matching an already auto-matched activity is permitted so a fresher
/// ranking can replace the previous confidence.
pub fn auto_match(
    current: &ReconciliationStatus,
    confidence: f64,
) -> BudgetResult<ReconciliationStatus> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(BudgetError::InvalidInput(format!(
            "Confidence {confidence} is outside [0, 1]"
        )));
    }
    match current {
        ReconciliationStatus::Unmatched | ReconciliationStatus::AutoMatched { .. } => {
            Ok(ReconciliationStatus::AutoMatched { confidence })
        }
        _ => Err(invalid(current, "auto-matched")),
    }
}

/// Confirm the current match as correct
pub fn confirm(current: &ReconciliationStatus) -> BudgetResult<ReconciliationStatus> {
    match current {
        ReconciliationStatus::Unmatched | ReconciliationStatus::AutoMatched { .. } => {
            Ok(ReconciliationStatus::ManuallyConfirmed)
        }
        _ => Err(invalid(current, "manually-confirmed")),
    }
}

/// Reject the current match
pub fn reject(current: &ReconciliationStatus) -> BudgetResult<ReconciliationStatus> {
    match current {
        ReconciliationStatus::Unmatched | ReconciliationStatus::AutoMatched { .. } => {
            Ok(ReconciliationStatus::ManuallyRejected)
        }
        _ => Err(invalid(current, "manually-rejected")),
    }
}

/// Exclude the activity from reconciliation
pub fn ignore(current: &ReconciliationStatus) -> BudgetResult<ReconciliationStatus> {
    match current {
        ReconciliationStatus::Unmatched | ReconciliationStatus::AutoMatched { .. } => {
            Ok(ReconciliationStatus::Ignored)
        }
        _ => Err(invalid(current, "ignored")),
    }
}

/// Explicitly reopen a terminal status back to unmatched
pub fn reopen(current: &ReconciliationStatus) -> BudgetResult<ReconciliationStatus> {
    if current.is_terminal() {
        Ok(ReconciliationStatus::Unmatched)
    } else {
        Err(invalid(current, "unmatched"))
    }
}
