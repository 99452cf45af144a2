//! Reconciliation orchestrator over a storage backend
//!
//! The engine glues the pure matcher onto storage: it loads the activity and
//! its window-scoped candidates, ranks them, and owns the only state-changing
//! entry points. Storage is authoritative: every mutation re-reads the stored
//! status first, so a decision raced by another session fails with an invalid
//! transition instead of clobbering the newer state.

use chrono::Duration;

use crate::reconciliation::matcher::ReconciliationMatcher;
use crate::reconciliation::stats::ReconciliationStats;
use crate::reconciliation::status;
use crate::session::{Permission, SessionClaims};
use crate::traits::BudgetStorage;
use crate::types::*;

/// Reconciliation engine coordinating matcher and storage
pub struct ReconciliationEngine<S: BudgetStorage> {
    storage: S,
    matcher: ReconciliationMatcher,
}

impl<S: BudgetStorage> ReconciliationEngine<S> {
    /// Create an engine with the default matcher configuration
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            matcher: ReconciliationMatcher::new(),
        }
    }

    /// Create an engine with a custom matcher
    pub fn with_matcher(storage: S, matcher: ReconciliationMatcher) -> Self {
        Self { storage, matcher }
    }

    /// The matcher in use
    pub fn matcher(&self) -> &ReconciliationMatcher {
        &self.matcher
    }

    async fn get_activity_required(&self, activity_id: &str) -> BudgetResult<PaymentActivity> {
        self.storage
            .get_activity(activity_id)
            .await?
            .ok_or_else(|| BudgetError::ActivityNotFound(activity_id.to_string()))
    }

    /// Rank candidate transactions for an activity, descending by confidence
    ///
    /// Candidates are scoped to the matcher's date window around the
    /// activity's booking date. Pure read; nothing is mutated or cached.
    pub async fn rank_candidates(&self, activity_id: &str) -> BudgetResult<Vec<CandidateMatch>> {
        let activity = self.get_activity_required(activity_id).await?;
        let booking_date = activity.booking_date.ok_or_else(|| {
            BudgetError::InvalidInput(format!("Activity '{}' has no booking date", activity.id))
        })?;

        let window = Duration::days(self.matcher.config().date_window_days);
        let candidates = self
            .storage
            .list_transactions(Some(booking_date - window), Some(booking_date + window))
            .await?;

        self.matcher.rank_candidates(&activity, &candidates)
    }

    /// Apply the best candidate automatically when it clears the threshold
    ///
    /// Returns the applied match, or `None` when no candidate is confident
    /// enough. Only unmatched (or previously auto-matched) activities can be
    /// auto-matched.
    pub async fn auto_match(&mut self, activity_id: &str) -> BudgetResult<Option<CandidateMatch>> {
        let ranked = self.rank_candidates(activity_id).await?;
        let top = match ranked.into_iter().next() {
            Some(top) if top.score >= self.matcher.config().auto_match_threshold => top,
            _ => return Ok(None),
        };

        let mut activity = self.get_activity_required(activity_id).await?;
        let next = status::auto_match(&activity.status, top.score)?;
        activity.set_status(next);
        activity.matched_transaction_id = Some(top.transaction_id.clone());
        self.storage.update_activity(&activity).await?;

        Ok(Some(top))
    }

    /// Confirm a candidate as the match for an activity
    ///
    /// Replaces any previous active match, keeping the at-most-one-active-match
    /// invariant. Requires [`Permission::Reconcile`].
    pub async fn confirm_match(
        &mut self,
        claims: &SessionClaims,
        activity_id: &str,
        transaction_id: &str,
    ) -> BudgetResult<PaymentActivity> {
        claims.require(Permission::Reconcile)?;

        if self.storage.get_transaction(transaction_id).await?.is_none() {
            return Err(BudgetError::TransactionNotFound(transaction_id.to_string()));
        }

        let mut activity = self.get_activity_required(activity_id).await?;
        let next = status::confirm(&activity.status)?;
        activity.set_status(next);
        activity.matched_transaction_id = Some(transaction_id.to_string());
        self.storage.update_activity(&activity).await?;

        Ok(activity)
    }

    /// Reject the current match for an activity
    pub async fn reject_match(
        &mut self,
        claims: &SessionClaims,
        activity_id: &str,
    ) -> BudgetResult<PaymentActivity> {
        claims.require(Permission::Reconcile)?;

        let mut activity = self.get_activity_required(activity_id).await?;
        let next = status::reject(&activity.status)?;
        activity.set_status(next);
        activity.matched_transaction_id = None;
        self.storage.update_activity(&activity).await?;

        Ok(activity)
    }

    /// Exclude an activity from reconciliation
    pub async fn ignore_activity(
        &mut self,
        claims: &SessionClaims,
        activity_id: &str,
    ) -> BudgetResult<PaymentActivity> {
        claims.require(Permission::Reconcile)?;

        let mut activity = self.get_activity_required(activity_id).await?;
        let next = status::ignore(&activity.status)?;
        activity.set_status(next);
        activity.matched_transaction_id = None;
        self.storage.update_activity(&activity).await?;

        Ok(activity)
    }

    /// Explicitly reopen a terminally-decided activity
    pub async fn reopen(
        &mut self,
        claims: &SessionClaims,
        activity_id: &str,
    ) -> BudgetResult<PaymentActivity> {
        claims.require(Permission::Reconcile)?;

        let mut activity = self.get_activity_required(activity_id).await?;
        let next = status::reopen(&activity.status)?;
        activity.set_status(next);
        activity.matched_transaction_id = None;
        self.storage.update_activity(&activity).await?;

        Ok(activity)
    }

    /// Compute reconciliation statistics over the filtered activity set
    pub async fn stats(&self, filter: &ActivityFilter) -> BudgetResult<ReconciliationStats> {
        let activities = self.storage.list_activities(filter).await?;
        Ok(ReconciliationStats::from_activities(&activities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use crate::utils::memory_storage::MemoryStorage;
    use chrono::{NaiveDate, Utc};

    fn member_claims() -> SessionClaims {
        SessionClaims::new(
            "user-1".to_string(),
            vec![Role::Member],
            Utc::now() + Duration::hours(1),
        )
    }

    fn viewer_claims() -> SessionClaims {
        SessionClaims::new(
            "user-2".to_string(),
            vec![Role::Viewer],
            Utc::now() + Duration::hours(1),
        )
    }

    async fn seeded_engine() -> ReconciliationEngine<MemoryStorage> {
        let mut storage = MemoryStorage::new();

        let activity = PaymentActivity::new(
            "act-1".to_string(),
            "acc-1".to_string(),
            "12.50".parse().unwrap(),
            "EUR".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Coffee Co".to_string(),
        );
        storage.save_activity(&activity).await.unwrap();

        let exact = CandidateTransaction::new(
            "txn-1".to_string(),
            "12.50".parse().unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "Coffee Co".to_string(),
            "EUR".to_string(),
        );
        let loose = CandidateTransaction::new(
            "txn-2".to_string(),
            "12.00".parse().unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            "Coffee".to_string(),
            "EUR".to_string(),
        );
        storage.save_transaction(&exact).await.unwrap();
        storage.save_transaction(&loose).await.unwrap();

        ReconciliationEngine::new(storage)
    }

    #[tokio::test]
    async fn auto_match_applies_top_candidate() {
        let mut engine = seeded_engine().await;

        let applied = engine.auto_match("act-1").await.unwrap().unwrap();
        assert_eq!(applied.transaction_id, "txn-1");

        let ranked = engine.rank_candidates("act-1").await.unwrap();
        assert_eq!(ranked[0].transaction_id, "txn-1");
    }

    #[tokio::test]
    async fn confirm_then_reject_is_invalid() {
        let mut engine = seeded_engine().await;
        let claims = member_claims();

        let confirmed = engine
            .confirm_match(&claims, "act-1", "txn-1")
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReconciliationStatus::ManuallyConfirmed);
        assert_eq!(confirmed.matched_transaction_id.as_deref(), Some("txn-1"));

        let result = engine.reject_match(&claims, "act-1").await;
        assert!(matches!(
            result,
            Err(BudgetError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn reopen_clears_match_and_allows_new_decision() {
        let mut engine = seeded_engine().await;
        let claims = member_claims();

        engine
            .confirm_match(&claims, "act-1", "txn-1")
            .await
            .unwrap();
        let reopened = engine.reopen(&claims, "act-1").await.unwrap();
        assert_eq!(reopened.status, ReconciliationStatus::Unmatched);
        assert_eq!(reopened.matched_transaction_id, None);

        let rejected = engine.reject_match(&claims, "act-1").await.unwrap();
        assert_eq!(rejected.status, ReconciliationStatus::ManuallyRejected);
    }

    #[tokio::test]
    async fn viewer_cannot_mutate() {
        let mut engine = seeded_engine().await;
        let claims = viewer_claims();

        let result = engine.confirm_match(&claims, "act-1", "txn-1").await;
        assert!(matches!(result, Err(BudgetError::Forbidden(_))));
    }

    #[tokio::test]
    async fn confirming_unknown_transaction_fails_before_mutation() {
        let mut engine = seeded_engine().await;
        let claims = member_claims();

        let result = engine.confirm_match(&claims, "act-1", "txn-missing").await;
        assert!(matches!(result, Err(BudgetError::TransactionNotFound(_))));

        let ranked = engine.rank_candidates("act-1").await.unwrap();
        assert!(!ranked.is_empty());
    }

    #[tokio::test]
    async fn stats_reflect_decisions() {
        let mut engine = seeded_engine().await;
        let claims = member_claims();
        engine
            .confirm_match(&claims, "act-1", "txn-1")
            .await
            .unwrap();

        let stats = engine
            .stats(&ActivityFilter::for_account("acc-1"))
            .await
            .unwrap();
        assert_eq!(stats.count(StatusKind::ManuallyConfirmed), 1);
        assert_eq!(stats.total_count, 1);
    }
}
