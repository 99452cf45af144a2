//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::sync::SyncRun;
use crate::types::*;

/// Storage abstraction for the budget core
///
/// This trait allows the reconciliation core to work with any storage backend
/// (PostgreSQL, SQLite, a remote API, in-memory, etc.) by implementing these
/// methods. Storage is the arbiter of final state: managers always re-read a
/// record through this trait before mutating it.
#[async_trait]
pub trait BudgetStorage: Send + Sync {
    /// Save a payment account
    async fn save_account(&mut self, account: &PaymentAccount) -> BudgetResult<()>;

    /// Get a payment account by ID
    async fn get_account(&self, account_id: &str) -> BudgetResult<Option<PaymentAccount>>;

    /// List accounts, optionally filtered by connection status
    async fn list_accounts(
        &self,
        status: Option<ConnectionStatus>,
    ) -> BudgetResult<Vec<PaymentAccount>>;

    /// Update a payment account
    async fn update_account(&mut self, account: &PaymentAccount) -> BudgetResult<()>;

    /// Save an imported payment activity
    async fn save_activity(&mut self, activity: &PaymentActivity) -> BudgetResult<()>;

    /// Get a payment activity by ID
    async fn get_activity(&self, activity_id: &str) -> BudgetResult<Option<PaymentActivity>>;

    /// List activities matching the given filter
    async fn list_activities(&self, filter: &ActivityFilter)
        -> BudgetResult<Vec<PaymentActivity>>;

    /// Update a payment activity (reconciliation fields only; imported data
    /// is immutable)
    async fn update_activity(&mut self, activity: &PaymentActivity) -> BudgetResult<()>;

    /// Save a user-recorded candidate transaction
    async fn save_transaction(&mut self, transaction: &CandidateTransaction) -> BudgetResult<()>;

    /// Get a candidate transaction by ID
    async fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> BudgetResult<Option<CandidateTransaction>>;

    /// List candidate transactions within a date range
    async fn list_transactions(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> BudgetResult<Vec<CandidateTransaction>>;

    /// Save a sync run
    async fn save_sync_run(&mut self, run: &SyncRun) -> BudgetResult<()>;

    /// Get a sync run by ID
    async fn get_sync_run(&self, run_id: &str) -> BudgetResult<Option<SyncRun>>;

    /// Update a sync run
    async fn update_sync_run(&mut self, run: &SyncRun) -> BudgetResult<()>;

    /// List sync runs for an account
    async fn list_sync_runs(&self, account_id: &str) -> BudgetResult<Vec<SyncRun>>;
}

/// Trait for implementing custom payment account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &PaymentAccount) -> BudgetResult<()>;
}

/// Trait for implementing custom payment activity validation rules
pub trait ActivityValidator: Send + Sync {
    /// Validate an activity before it is imported
    fn validate_activity(&self, activity: &PaymentActivity) -> BudgetResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &PaymentAccount) -> BudgetResult<()> {
        if account.id.trim().is_empty() {
            return Err(BudgetError::Validation(
                "Account ID cannot be empty".to_string(),
            ));
        }

        if account.institution_id.trim().is_empty() {
            return Err(BudgetError::Validation(
                "Institution ID cannot be empty".to_string(),
            ));
        }

        if account.display_name.trim().is_empty() {
            return Err(BudgetError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default activity validator with basic rules
///
/// Imported activities may legitimately lack an amount or booking date; those
/// records are kept and rejected later by the matcher, not here.
pub struct DefaultActivityValidator;

impl ActivityValidator for DefaultActivityValidator {
    fn validate_activity(&self, activity: &PaymentActivity) -> BudgetResult<()> {
        if activity.id.trim().is_empty() {
            return Err(BudgetError::Validation(
                "Activity ID cannot be empty".to_string(),
            ));
        }

        if activity.account_id.trim().is_empty() {
            return Err(BudgetError::Validation(
                "Activity account ID cannot be empty".to_string(),
            ));
        }

        if activity.currency.trim().is_empty() {
            return Err(BudgetError::Validation(
                "Activity currency cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
