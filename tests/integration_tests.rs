//! Integration tests for coffee-budget-core

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};
use coffee_budget_core::{
    utils::MemoryStorage, AccountManager, ActivityFilter, BudgetError, CandidateTransaction,
    MatcherConfig, PaymentActivity, Permission, ReconciliationEngine, ReconciliationMatcher,
    ReconciliationStatus, Role, SessionClaims, StatusKind, SyncManager, SyncStatus,
};

fn member() -> SessionClaims {
    SessionClaims::new(
        "user-1".to_string(),
        vec![Role::Member],
        Utc::now() + Duration::hours(1),
    )
}

fn activity(id: &str, account_id: &str, amount: &str, day: u32, desc: &str) -> PaymentActivity {
    PaymentActivity::new(
        id.to_string(),
        account_id.to_string(),
        amount.parse().unwrap(),
        "EUR".to_string(),
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        desc.to_string(),
    )
}

fn candidate(id: &str, amount: &str, day: u32, desc: &str) -> CandidateTransaction {
    CandidateTransaction::new(
        id.to_string(),
        amount.parse().unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        desc.to_string(),
        "EUR".to_string(),
    )
}

#[tokio::test]
async fn test_complete_reconciliation_workflow() {
    let storage = MemoryStorage::new();

    // Link and activate an account
    let mut accounts = AccountManager::new(storage.clone());
    let account = accounts
        .link_account(
            "SANDBOX_FINANCE_SFIN_0000".to_string(),
            "Coffee Checking".to_string(),
            "EUR".to_string(),
        )
        .await
        .unwrap();
    accounts.activate(&account.id).await.unwrap();

    // Import a batch of activities through a sync run
    let mut sync = SyncManager::new(storage.clone());
    let run = sync.start_run(&account.id).await.unwrap();
    let run = sync
        .import_activities(
            &run.id,
            vec![
                activity("act-1", &account.id, "12.50", 1, "Coffee Co"),
                activity("act-2", &account.id, "3.20", 2, "Espresso Bar"),
            ],
        )
        .await
        .unwrap();
    assert_eq!(run.imported_count, 2);
    let run = sync.complete_run(&run.id).await.unwrap();
    assert_eq!(run.status, SyncStatus::Succeeded);

    // Record the user's transactions
    let mut engine = ReconciliationEngine::new(storage.clone());
    {
        use coffee_budget_core::BudgetStorage;
        let mut store = storage.clone();
        store
            .save_transaction(&candidate("txn-1", "12.50", 1, "Coffee Co"))
            .await
            .unwrap();
        store
            .save_transaction(&candidate("txn-2", "12.00", 5, "Coffee"))
            .await
            .unwrap();
    }

    // Rank and auto-match the exact candidate
    let ranked = engine.rank_candidates("act-1").await.unwrap();
    assert_eq!(ranked[0].transaction_id, "txn-1");
    assert!(ranked[0].score > 0.99);

    let applied = engine.auto_match("act-1").await.unwrap().unwrap();
    assert_eq!(applied.transaction_id, "txn-1");

    // The user confirms the auto-match
    let claims = member();
    let confirmed = engine.confirm_match(&claims, "act-1", "txn-1").await.unwrap();
    assert_eq!(confirmed.status, ReconciliationStatus::ManuallyConfirmed);
    assert_eq!(confirmed.matched_transaction_id.as_deref(), Some("txn-1"));

    // Stats reflect the decision
    let stats = engine
        .stats(&ActivityFilter::for_account(account.id.clone()))
        .await
        .unwrap();
    assert_eq!(stats.total_count, 2);
    assert_eq!(stats.count(StatusKind::ManuallyConfirmed), 1);
    assert_eq!(stats.count(StatusKind::Unmatched), 1);
    assert_eq!(
        stats.amount(StatusKind::ManuallyConfirmed),
        "12.50".parse::<BigDecimal>().unwrap()
    );
}

#[tokio::test]
async fn test_reimport_preserves_reconciliation_state() {
    let storage = MemoryStorage::new();
    let mut accounts = AccountManager::new(storage.clone());
    let account = accounts
        .link_account(
            "SANDBOX_FINANCE_SFIN_0000".to_string(),
            "Coffee Checking".to_string(),
            "EUR".to_string(),
        )
        .await
        .unwrap();
    accounts.activate(&account.id).await.unwrap();

    let mut sync = SyncManager::new(storage.clone());
    let run = sync.start_run(&account.id).await.unwrap();
    sync.import_activities(
        &run.id,
        vec![activity("act-1", &account.id, "12.50", 1, "Coffee Co")],
    )
    .await
    .unwrap();
    sync.complete_run(&run.id).await.unwrap();

    // Decide on the activity
    let mut engine = ReconciliationEngine::new(storage.clone());
    let claims = member();
    engine.ignore_activity(&claims, "act-1").await.unwrap();

    // A later run re-fetches the same activity from the bank
    let run = sync.start_run(&account.id).await.unwrap();
    let run = sync
        .import_activities(
            &run.id,
            vec![activity("act-1", &account.id, "12.50", 1, "Coffee Co")],
        )
        .await
        .unwrap();
    assert_eq!(run.imported_count, 0);
    assert_eq!(run.skipped_count, 1);

    // The decision survived the re-import
    use coffee_budget_core::BudgetStorage;
    let stored = storage.get_activity("act-1").await.unwrap().unwrap();
    assert_eq!(stored.status, ReconciliationStatus::Ignored);
}

#[tokio::test]
async fn test_terminal_decisions_require_explicit_reopen() {
    let storage = MemoryStorage::new();

    use coffee_budget_core::BudgetStorage;
    let mut store = storage.clone();
    store
        .save_activity(&activity("act-1", "acc-1", "12.50", 1, "Coffee Co"))
        .await
        .unwrap();
    store
        .save_transaction(&candidate("txn-1", "12.50", 1, "Coffee Co"))
        .await
        .unwrap();

    let mut engine = ReconciliationEngine::new(storage);
    let claims = member();

    engine.reject_match(&claims, "act-1").await.unwrap();

    // Rejected is terminal: no confirm, no auto-match
    let result = engine.confirm_match(&claims, "act-1", "txn-1").await;
    assert!(matches!(result, Err(BudgetError::InvalidTransition { .. })));
    assert!(engine.auto_match("act-1").await.is_err());

    // Reopen and the activity is decidable again
    let reopened = engine.reopen(&claims, "act-1").await.unwrap();
    assert_eq!(reopened.status, ReconciliationStatus::Unmatched);
    let confirmed = engine.confirm_match(&claims, "act-1", "txn-1").await.unwrap();
    assert_eq!(confirmed.status, ReconciliationStatus::ManuallyConfirmed);
}

#[tokio::test]
async fn test_malformed_activity_produces_no_candidates() {
    let storage = MemoryStorage::new();

    use coffee_budget_core::BudgetStorage;
    let mut store = storage.clone();
    let mut broken = activity("act-1", "acc-1", "12.50", 1, "Coffee Co");
    broken.amount = None;
    store.save_activity(&broken).await.unwrap();
    store
        .save_transaction(&candidate("txn-1", "12.50", 1, "Coffee Co"))
        .await
        .unwrap();

    let engine = ReconciliationEngine::new(storage);
    let result = engine.rank_candidates("act-1").await;
    assert!(matches!(result, Err(BudgetError::InvalidInput(_))));
}

#[tokio::test]
async fn test_custom_matcher_threshold_blocks_auto_match() {
    let storage = MemoryStorage::new();

    use coffee_budget_core::BudgetStorage;
    let mut store = storage.clone();
    store
        .save_activity(&activity("act-1", "acc-1", "12.50", 1, "Coffee Co"))
        .await
        .unwrap();
    // Close but not exact: amount off and two days away
    store
        .save_transaction(&candidate("txn-1", "12.40", 3, "Coffee Co"))
        .await
        .unwrap();

    let matcher = ReconciliationMatcher::with_config(MatcherConfig {
        auto_match_threshold: 0.99,
        ..MatcherConfig::default()
    })
    .unwrap();
    let mut engine = ReconciliationEngine::with_matcher(storage, matcher);

    // A viable candidate exists but is below the threshold
    assert!(!engine.rank_candidates("act-1").await.unwrap().is_empty());
    assert_eq!(engine.auto_match("act-1").await.unwrap(), None);
}

#[tokio::test]
async fn test_viewer_session_cannot_decide() {
    let storage = MemoryStorage::new();

    use coffee_budget_core::BudgetStorage;
    let mut store = storage.clone();
    store
        .save_activity(&activity("act-1", "acc-1", "12.50", 1, "Coffee Co"))
        .await
        .unwrap();

    let mut engine = ReconciliationEngine::new(storage);
    let viewer = SessionClaims::new(
        "user-2".to_string(),
        vec![Role::Viewer],
        Utc::now() + Duration::hours(1),
    );
    assert!(viewer.has(Permission::ViewActivities));

    let result = engine.reject_match(&viewer, "act-1").await;
    assert!(matches!(result, Err(BudgetError::Forbidden(_))));
}
