//! In-memory storage implementation for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::sync::SyncRun;
use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Cloning shares the underlying maps, so several managers can operate on the
/// same data set.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    accounts: Arc<RwLock<HashMap<String, PaymentAccount>>>,
    activities: Arc<RwLock<HashMap<String, PaymentActivity>>>,
    transactions: Arc<RwLock<HashMap<String, CandidateTransaction>>>,
    sync_runs: Arc<RwLock<HashMap<String, SyncRun>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.activities.write().unwrap().clear();
        self.transactions.write().unwrap().clear();
        self.sync_runs.write().unwrap().clear();
    }
}

#[async_trait]
impl BudgetStorage for MemoryStorage {
    async fn save_account(&mut self, account: &PaymentAccount) -> BudgetResult<()> {
        self.accounts
            .write()
            .unwrap()
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> BudgetResult<Option<PaymentAccount>> {
        Ok(self.accounts.read().unwrap().get(account_id).cloned())
    }

    async fn list_accounts(
        &self,
        status: Option<ConnectionStatus>,
    ) -> BudgetResult<Vec<PaymentAccount>> {
        let accounts = self.accounts.read().unwrap();
        let filtered: Vec<PaymentAccount> = accounts
            .values()
            .filter(|account| status.as_ref().is_none_or(|s| &account.status == s))
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn update_account(&mut self, account: &PaymentAccount) -> BudgetResult<()> {
        if self.accounts.read().unwrap().contains_key(&account.id) {
            self.accounts
                .write()
                .unwrap()
                .insert(account.id.clone(), account.clone());
            Ok(())
        } else {
            Err(BudgetError::AccountNotFound(account.id.clone()))
        }
    }

    async fn save_activity(&mut self, activity: &PaymentActivity) -> BudgetResult<()> {
        self.activities
            .write()
            .unwrap()
            .insert(activity.id.clone(), activity.clone());
        Ok(())
    }

    async fn get_activity(&self, activity_id: &str) -> BudgetResult<Option<PaymentActivity>> {
        Ok(self.activities.read().unwrap().get(activity_id).cloned())
    }

    async fn list_activities(
        &self,
        filter: &ActivityFilter,
    ) -> BudgetResult<Vec<PaymentActivity>> {
        let activities = self.activities.read().unwrap();
        let filtered: Vec<PaymentActivity> = activities
            .values()
            .filter(|activity| filter.matches(activity))
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn update_activity(&mut self, activity: &PaymentActivity) -> BudgetResult<()> {
        if self.activities.read().unwrap().contains_key(&activity.id) {
            self.activities
                .write()
                .unwrap()
                .insert(activity.id.clone(), activity.clone());
            Ok(())
        } else {
            Err(BudgetError::ActivityNotFound(activity.id.clone()))
        }
    }

    async fn save_transaction(&mut self, transaction: &CandidateTransaction) -> BudgetResult<()> {
        self.transactions
            .write()
            .unwrap()
            .insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn get_transaction(
        &self,
        transaction_id: &str,
    ) -> BudgetResult<Option<CandidateTransaction>> {
        Ok(self
            .transactions
            .read()
            .unwrap()
            .get(transaction_id)
            .cloned())
    }

    async fn list_transactions(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> BudgetResult<Vec<CandidateTransaction>> {
        let transactions = self.transactions.read().unwrap();
        let filtered: Vec<CandidateTransaction> = transactions
            .values()
            .filter(|txn| {
                // Undated transactions only pass an unbounded query
                if let Some(start) = start_date {
                    match txn.date {
                        Some(date) if date >= start => {}
                        _ => return false,
                    }
                }
                if let Some(end) = end_date {
                    match txn.date {
                        Some(date) if date <= end => {}
                        _ => return false,
                    }
                }
                true
            })
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn save_sync_run(&mut self, run: &SyncRun) -> BudgetResult<()> {
        self.sync_runs
            .write()
            .unwrap()
            .insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get_sync_run(&self, run_id: &str) -> BudgetResult<Option<SyncRun>> {
        Ok(self.sync_runs.read().unwrap().get(run_id).cloned())
    }

    async fn update_sync_run(&mut self, run: &SyncRun) -> BudgetResult<()> {
        if self.sync_runs.read().unwrap().contains_key(&run.id) {
            self.sync_runs
                .write()
                .unwrap()
                .insert(run.id.clone(), run.clone());
            Ok(())
        } else {
            Err(BudgetError::SyncRunNotFound(run.id.clone()))
        }
    }

    async fn list_sync_runs(&self, account_id: &str) -> BudgetResult<Vec<SyncRun>> {
        let runs = self.sync_runs.read().unwrap();
        let filtered: Vec<SyncRun> = runs
            .values()
            .filter(|run| run.account_id == account_id)
            .cloned()
            .collect();
        Ok(filtered)
    }
}
