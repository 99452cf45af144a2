//! Read-only reconciliation statistics

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{PaymentActivity, StatusKind};

/// Aggregate counts and amount totals per reconciliation status
///
/// A projection over the current activity set, recomputed on demand and never
/// persisted. Activities without an amount are counted but contribute nothing
/// to the totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStats {
    /// Number of activities per status kind
    pub counts: HashMap<StatusKind, usize>,
    /// Sum of activity amounts per status kind
    pub amounts: HashMap<StatusKind, BigDecimal>,
    /// Total number of activities considered
    pub total_count: usize,
    /// Sum of all activity amounts
    pub total_amount: BigDecimal,
}

impl ReconciliationStats {
    /// Compute statistics over a set of activities
    pub fn from_activities<'a, I>(activities: I) -> Self
    where
        I: IntoIterator<Item = &'a PaymentActivity>,
    {
        let mut stats = Self::default();

        for activity in activities {
            let kind = activity.status.kind();
            *stats.counts.entry(kind).or_default() += 1;
            stats.total_count += 1;

            if let Some(ref amount) = activity.amount {
                *stats.amounts.entry(kind).or_default() += amount;
                stats.total_amount += amount;
            }
        }

        stats
    }

    /// Number of activities with the given status kind
    pub fn count(&self, kind: StatusKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Total amount of activities with the given status kind
    pub fn amount(&self, kind: StatusKind) -> BigDecimal {
        self.amounts
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Activities carrying an active match (auto-matched or confirmed)
    pub fn matched_count(&self) -> usize {
        self.count(StatusKind::AutoMatched) + self.count(StatusKind::ManuallyConfirmed)
    }

    /// Activities still awaiting a decision
    pub fn unmatched_count(&self) -> usize {
        self.count(StatusKind::Unmatched)
    }
}
