//! Candidate scoring and ranking for payment activities

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use crate::types::*;

/// Tunable weights and thresholds for the reconciliation matcher
///
/// The weights do not need to sum to one; they are normalized by their sum
/// when signals are combined, so a candidate agreeing perfectly on every
/// signal always scores exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Weight of the amount-agreement signal
    pub amount_weight: f64,
    /// Weight of the date-proximity signal
    pub date_weight: f64,
    /// Weight of the description-similarity signal
    pub description_weight: f64,
    /// Candidates dated more than this many days from the activity are excluded
    pub date_window_days: i64,
    /// Relative amount deviation at or beyond which a candidate is not viable
    pub amount_tolerance: f64,
    /// Candidates scoring below this are dropped from the ranked output
    pub min_score: f64,
    /// Minimum score at which the engine applies a match automatically
    pub auto_match_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            amount_weight: 0.5,
            date_weight: 0.3,
            description_weight: 0.2,
            date_window_days: 7,
            amount_tolerance: 0.25,
            min_score: 0.05,
            auto_match_threshold: 0.9,
        }
    }
}

impl MatcherConfig {
    /// Check that the configuration is usable
    pub fn validate(&self) -> BudgetResult<()> {
        let weights = [
            self.amount_weight,
            self.date_weight,
            self.description_weight,
        ];
        if weights.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(BudgetError::Validation(
                "Matcher weights must be finite and non-negative".to_string(),
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(BudgetError::Validation(
                "At least one matcher weight must be positive".to_string(),
            ));
        }
        if self.date_window_days <= 0 {
            return Err(BudgetError::Validation(
                "Date window must be at least one day".to_string(),
            ));
        }
        if self.amount_tolerance <= 0.0 || !self.amount_tolerance.is_finite() {
            return Err(BudgetError::Validation(
                "Amount tolerance must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(BudgetError::Validation(
                "Minimum score must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.auto_match_threshold) {
            return Err(BudgetError::Validation(
                "Auto-match threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Pure scoring of candidate transactions against a payment activity
///
/// Ranking has no side effects and is deterministic: identical inputs always
/// produce the identical ordered output. Scores are recomputed on every call
/// and are never cached.
#[derive(Debug, Clone)]
pub struct ReconciliationMatcher {
    config: MatcherConfig,
}

impl Default for ReconciliationMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationMatcher {
    /// Create a matcher with default weights and thresholds
    pub fn new() -> Self {
        Self {
            config: MatcherConfig::default(),
        }
    }

    /// Create a matcher with a custom configuration
    pub fn with_config(config: MatcherConfig) -> BudgetResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Rank candidates for an activity, descending by confidence
    ///
    /// Ties are broken by the closer date, then by the lower transaction id,
    /// so repeated calls over identical input produce the same ordering.
    /// Candidates beyond the date window, with a wildly mismatched amount, in
    /// a different currency, or below the minimum score are excluded. A
    /// missing amount or date anywhere in the input fails the whole call with
    /// [`BudgetError::InvalidInput`] and produces no candidates.
    pub fn rank_candidates(
        &self,
        activity: &PaymentActivity,
        candidates: &[CandidateTransaction],
    ) -> BudgetResult<Vec<CandidateMatch>> {
        let activity_amount = activity.amount.as_ref().ok_or_else(|| {
            BudgetError::InvalidInput(format!("Activity '{}' has no amount", activity.id))
        })?;
        let activity_date = activity.booking_date.ok_or_else(|| {
            BudgetError::InvalidInput(format!("Activity '{}' has no booking date", activity.id))
        })?;

        // Malformed candidates fail the operation up front; partial data must
        // never be silently interpreted as zero.
        for candidate in candidates {
            if candidate.amount.is_none() {
                return Err(BudgetError::InvalidInput(format!(
                    "Candidate transaction '{}' has no amount",
                    candidate.id
                )));
            }
            if candidate.date.is_none() {
                return Err(BudgetError::InvalidInput(format!(
                    "Candidate transaction '{}' has no date",
                    candidate.id
                )));
            }
        }

        let weight_sum =
            self.config.amount_weight + self.config.date_weight + self.config.description_weight;

        let mut matches = Vec::new();
        for candidate in candidates {
            let (candidate_amount, candidate_date) = match (&candidate.amount, candidate.date) {
                (Some(amount), Some(date)) => (amount, date),
                // Checked above
                _ => continue,
            };

            if !candidate.currency.eq_ignore_ascii_case(&activity.currency) {
                continue;
            }

            let date_distance_days = (activity_date - candidate_date).num_days().abs();
            if date_distance_days > self.config.date_window_days {
                continue;
            }

            let amount_signal = match self.amount_signal(activity_amount, candidate_amount) {
                Some(signal) => signal,
                None => continue,
            };
            let date_signal =
                1.0 - (date_distance_days as f64) / (self.config.date_window_days as f64);
            let description_signal =
                description_similarity(&activity.description, &candidate.description);

            let score = (self.config.amount_weight * amount_signal
                + self.config.date_weight * date_signal
                + self.config.description_weight * description_signal)
                / weight_sum;

            if score < self.config.min_score {
                continue;
            }

            matches.push(CandidateMatch {
                transaction_id: candidate.id.clone(),
                score,
                date_distance_days,
                signals: MatchSignals {
                    amount: amount_signal,
                    date: date_signal,
                    description: description_signal,
                },
            });
        }

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.date_distance_days.cmp(&b.date_distance_days))
                .then(a.transaction_id.cmp(&b.transaction_id))
        });

        Ok(matches)
    }

    /// Amount agreement in [0, 1], or None when the deviation disqualifies
    /// the candidate
    fn amount_signal(&self, activity: &BigDecimal, candidate: &BigDecimal) -> Option<f64> {
        if activity == candidate {
            return Some(1.0);
        }

        let reference = std::cmp::max(activity.abs(), candidate.abs());
        if reference == BigDecimal::from(0) {
            return Some(1.0);
        }

        let deviation = ((activity - candidate).abs() / reference)
            .to_f64()
            .unwrap_or(f64::INFINITY);
        if deviation >= self.config.amount_tolerance {
            return None;
        }

        Some(1.0 - deviation / self.config.amount_tolerance)
    }
}

/// Normalized similarity between two counterparty descriptions in [0, 1]
///
/// Token-overlap over lowercased alphanumeric words: identical token sets
/// score 1.0, disjoint sets 0.0.
pub fn description_similarity(a: &str, b: &str) -> f64 {
    let tokens_a = tokenize(a);
    let tokens_b = tokenize(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn activity(amount: &str, date: (i32, u32, u32), description: &str) -> PaymentActivity {
        PaymentActivity::new(
            "act-1".to_string(),
            "acc-1".to_string(),
            amount.parse().unwrap(),
            "EUR".to_string(),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description.to_string(),
        )
    }

    fn candidate(
        id: &str,
        amount: &str,
        date: (i32, u32, u32),
        description: &str,
    ) -> CandidateTransaction {
        CandidateTransaction::new(
            id.to_string(),
            amount.parse().unwrap(),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            description.to_string(),
            "EUR".to_string(),
        )
    }

    #[test]
    fn identical_candidate_scores_maximum() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let cands = vec![candidate("txn-1", "12.50", (2024, 3, 1), "Coffee Co")];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
        assert_eq!(ranked[0].signals.amount, 1.0);
        assert_eq!(ranked[0].signals.date, 1.0);
        assert_eq!(ranked[0].signals.description, 1.0);
    }

    #[test]
    fn ranked_output_is_descending() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let cands = vec![
            candidate("txn-2", "12.00", (2024, 3, 5), "Coffee"),
            candidate("txn-1", "12.50", (2024, 3, 1), "Coffee Co"),
        ];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].transaction_id, "txn-1");
        assert_eq!(ranked[1].transaction_id, "txn-2");
        assert!(ranked[0].score > ranked[1].score);
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
        assert!(ranked[1].score < 0.8);
    }

    #[test]
    fn candidates_beyond_date_window_are_excluded() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let cands = vec![candidate("txn-1", "12.50", (2024, 3, 15), "Coffee Co")];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        assert!(ranked.is_empty());
    }

    #[test]
    fn candidate_at_window_edge_is_kept_with_zero_date_signal() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let cands = vec![candidate("txn-1", "12.50", (2024, 3, 8), "Coffee Co")];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].signals.date, 0.0);
    }

    #[test]
    fn wildly_mismatched_amount_is_not_viable() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let cands = vec![candidate("txn-1", "250.00", (2024, 3, 1), "Coffee Co")];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        assert!(ranked.is_empty());
    }

    #[test]
    fn currency_mismatch_is_excluded() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let mut other = candidate("txn-1", "12.50", (2024, 3, 1), "Coffee Co");
        other.currency = "USD".to_string();

        let ranked = matcher.rank_candidates(&act, &[other]).unwrap();

        assert!(ranked.is_empty());
    }

    #[test]
    fn equal_scores_tie_break_by_date_then_id() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 3), "Coffee Co");
        let cands = vec![
            candidate("txn-b", "12.50", (2024, 3, 3), "Coffee Co"),
            candidate("txn-a", "12.50", (2024, 3, 3), "Coffee Co"),
            candidate("txn-c", "12.50", (2024, 3, 3), "Coffee Co"),
        ];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        let ids: Vec<&str> = ranked.iter().map(|m| m.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["txn-a", "txn-b", "txn-c"]);
    }

    #[test]
    fn equal_scores_prefer_closer_date() {
        // With a zero date weight, different date distances can still produce
        // equal scores; the closer candidate must come first.
        let config = MatcherConfig {
            date_weight: 0.0,
            ..MatcherConfig::default()
        };
        let matcher = ReconciliationMatcher::with_config(config).unwrap();
        let act = activity("12.50", (2024, 3, 3), "Coffee Co");
        let cands = vec![
            candidate("txn-far", "12.50", (2024, 3, 6), "Coffee Co"),
            candidate("txn-near", "12.50", (2024, 3, 4), "Coffee Co"),
        ];

        let ranked = matcher.rank_candidates(&act, &cands).unwrap();

        assert!((ranked[0].score - ranked[1].score).abs() < 1e-9);
        assert_eq!(ranked[0].transaction_id, "txn-near");
    }

    #[test]
    fn ranking_is_stable_across_repeated_calls() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let cands = vec![
            candidate("txn-1", "12.40", (2024, 3, 2), "Coffee Co espresso"),
            candidate("txn-2", "12.50", (2024, 3, 3), "Coffee"),
            candidate("txn-3", "12.50", (2024, 3, 1), "Bakery"),
        ];

        let first = matcher.rank_candidates(&act, &cands).unwrap();
        let second = matcher.rank_candidates(&act, &cands).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn missing_activity_amount_is_invalid_input() {
        let matcher = ReconciliationMatcher::new();
        let mut act = activity("12.50", (2024, 3, 1), "Coffee Co");
        act.amount = None;
        let cands = vec![candidate("txn-1", "12.50", (2024, 3, 1), "Coffee Co")];

        let result = matcher.rank_candidates(&act, &cands);

        assert!(matches!(result, Err(BudgetError::InvalidInput(_))));
    }

    #[test]
    fn missing_candidate_date_is_invalid_input() {
        let matcher = ReconciliationMatcher::new();
        let act = activity("12.50", (2024, 3, 1), "Coffee Co");
        let mut bad = candidate("txn-1", "12.50", (2024, 3, 1), "Coffee Co");
        bad.date = None;

        let result = matcher.rank_candidates(&act, &[bad]);

        assert!(matches!(result, Err(BudgetError::InvalidInput(_))));
    }

    #[test]
    fn description_similarity_bounds() {
        assert_eq!(description_similarity("Coffee Co", "COFFEE co"), 1.0);
        assert_eq!(description_similarity("Coffee Co", "Hardware Store"), 0.0);
        let partial = description_similarity("Coffee Co", "Coffee");
        assert!(partial > 0.0 && partial < 1.0);
        assert_eq!(description_similarity("", "Coffee"), 0.0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = MatcherConfig {
            amount_weight: -1.0,
            ..MatcherConfig::default()
        };
        assert!(ReconciliationMatcher::with_config(config).is_err());

        let config = MatcherConfig {
            date_window_days: 0,
            ..MatcherConfig::default()
        };
        assert!(ReconciliationMatcher::with_config(config).is_err());
    }
}
