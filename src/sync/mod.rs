//! Synchronization runs and import history

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::traits::{ActivityValidator, BudgetStorage, DefaultActivityValidator};
use crate::types::*;

/// Outcome state of a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Import in progress
    Running,
    /// Import finished without error
    Succeeded,
    /// Import aborted with an error message on the run
    Failed,
}

/// A single data-import run from a linked account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    /// Unique identifier for the run
    pub id: String,
    /// Account the run imports from
    pub account_id: String,
    /// Current run state
    pub status: SyncStatus,
    /// Activities newly imported by this run
    pub imported_count: usize,
    /// Activities skipped because they were already stored
    pub skipped_count: usize,
    /// Error message for failed runs
    pub error: Option<String>,
    /// When the run started
    pub started_at: NaiveDateTime,
    /// When the run finished, if it has
    pub finished_at: Option<NaiveDateTime>,
}

impl SyncRun {
    /// Create a new running sync run for an account
    pub fn new(account_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            account_id,
            status: SyncStatus::Running,
            imported_count: 0,
            skipped_count: 0,
            error: None,
            started_at: chrono::Utc::now().naive_utc(),
            finished_at: None,
        }
    }

    /// Whether the run is still accepting imports
    pub fn is_running(&self) -> bool {
        self.status == SyncStatus::Running
    }
}

/// Manager for sync runs and activity imports
pub struct SyncManager<S: BudgetStorage> {
    storage: S,
    validator: Box<dyn ActivityValidator>,
}

impl<S: BudgetStorage> SyncManager<S> {
    /// Create a new sync manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultActivityValidator),
        }
    }

    /// Create a new sync manager with a custom activity validator
    pub fn with_validator(storage: S, validator: Box<dyn ActivityValidator>) -> Self {
        Self { storage, validator }
    }

    /// Start a sync run for an active account
    pub async fn start_run(&mut self, account_id: &str) -> BudgetResult<SyncRun> {
        let account = self
            .storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| BudgetError::AccountNotFound(account_id.to_string()))?;

        if !account.status.is_active() {
            return Err(BudgetError::Validation(format!(
                "Account '{}' is {} and cannot be synced",
                account.id, account.status
            )));
        }

        let run = SyncRun::new(account.id.clone());
        self.storage.save_sync_run(&run).await?;
        info!(run_id = %run.id, account_id = %run.account_id, "sync run started");

        Ok(run)
    }

    /// Import fetched activities into a running sync run
    ///
    /// Importing the same activity id twice is harmless: already-stored
    /// activities are skipped and tallied, never overwritten, so re-running a
    /// partial import cannot disturb existing reconciliation state.
    pub async fn import_activities(
        &mut self,
        run_id: &str,
        activities: Vec<PaymentActivity>,
    ) -> BudgetResult<SyncRun> {
        let mut run = self.get_run_required(run_id).await?;
        if !run.is_running() {
            return Err(BudgetError::Validation(format!(
                "Sync run '{}' is no longer running",
                run.id
            )));
        }

        for activity in &activities {
            self.validator.validate_activity(activity)?;
            if activity.account_id != run.account_id {
                return Err(BudgetError::Validation(format!(
                    "Activity '{}' belongs to account '{}', not '{}'",
                    activity.id, activity.account_id, run.account_id
                )));
            }
        }

        for activity in activities {
            if self.storage.get_activity(&activity.id).await?.is_some() {
                run.skipped_count += 1;
            } else {
                self.storage.save_activity(&activity).await?;
                run.imported_count += 1;
            }
        }

        self.storage.update_sync_run(&run).await?;
        info!(
            run_id = %run.id,
            imported = run.imported_count,
            skipped = run.skipped_count,
            "activities imported"
        );

        Ok(run)
    }

    /// Mark a running sync run as succeeded
    pub async fn complete_run(&mut self, run_id: &str) -> BudgetResult<SyncRun> {
        self.finish_run(run_id, SyncStatus::Succeeded, None).await
    }

    /// Mark a running sync run as failed with a message
    pub async fn fail_run(&mut self, run_id: &str, message: String) -> BudgetResult<SyncRun> {
        warn!(run_id, error = %message, "sync run failed");
        self.finish_run(run_id, SyncStatus::Failed, Some(message))
            .await
    }

    /// Sync history for an account, newest first
    pub async fn history(&self, account_id: &str) -> BudgetResult<Vec<SyncRun>> {
        let mut runs = self.storage.list_sync_runs(account_id).await?;
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(runs)
    }

    async fn get_run_required(&self, run_id: &str) -> BudgetResult<SyncRun> {
        self.storage
            .get_sync_run(run_id)
            .await?
            .ok_or_else(|| BudgetError::SyncRunNotFound(run_id.to_string()))
    }

    async fn finish_run(
        &mut self,
        run_id: &str,
        status: SyncStatus,
        error: Option<String>,
    ) -> BudgetResult<SyncRun> {
        let mut run = self.get_run_required(run_id).await?;
        if !run.is_running() {
            return Err(BudgetError::Validation(format!(
                "Sync run '{}' is no longer running",
                run.id
            )));
        }

        run.status = status;
        run.error = error;
        run.finished_at = Some(chrono::Utc::now().naive_utc());
        self.storage.update_sync_run(&run).await?;

        Ok(run)
    }
}
