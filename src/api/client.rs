//! HTTP client for the budget backend

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::decode_response;
use crate::sync::SyncRun;
use crate::types::*;
use crate::utils::cache::TtlCache;

/// Default staleness window for cached reads
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// A reconciliation decision submitted to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ReconciliationDecision {
    /// Confirm the given transaction as the match
    Confirm { transaction_id: String },
    /// Reject the current match
    Reject,
    /// Exclude the activity from reconciliation
    Ignore,
    /// Reopen a terminally-decided activity
    Reopen,
}

/// Authenticated client for the budget backend API
///
/// Attaches the session's bearer token to every request. Reads go through a
/// TTL cache keyed by query parameters; every mutation invalidates the
/// affected cache so the next read reflects the backend's state. The backend
/// is the arbiter of final state: mutation responses are returned as-is and
/// there is no client-side retry.
pub struct BackendClient {
    http: Client,
    base_url: String,
    token: String,
    accounts_cache: TtlCache<(), Vec<PaymentAccount>>,
    activities_cache: TtlCache<ActivityFilter, Vec<PaymentActivity>>,
}

impl BackendClient {
    /// Create a client with the default cache staleness window
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_cache_ttl(base_url, token, DEFAULT_CACHE_TTL)
    }

    /// Create a client with a custom cache staleness window
    pub fn with_cache_ttl(
        base_url: impl Into<String>,
        token: impl Into<String>,
        cache_ttl: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: Client::new(),
            base_url,
            token: token.into(),
            accounts_cache: TtlCache::new(cache_ttl),
            activities_cache: TtlCache::new(cache_ttl),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the linked payment accounts
    pub async fn fetch_accounts(&mut self) -> BudgetResult<Vec<PaymentAccount>> {
        if let Some(cached) = self.accounts_cache.get(&()) {
            debug!("payment accounts served from cache");
            return Ok(cached.clone());
        }

        let response = self
            .http
            .get(self.url("/payment-accounts"))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let accounts: Vec<PaymentAccount> = decode_response(response).await?;

        self.accounts_cache.insert((), accounts.clone());
        Ok(accounts)
    }

    /// Fetch payment activities matching the filter
    pub async fn fetch_activities(
        &mut self,
        filter: &ActivityFilter,
    ) -> BudgetResult<Vec<PaymentActivity>> {
        if let Some(cached) = self.activities_cache.get(filter) {
            debug!("payment activities served from cache");
            return Ok(cached.clone());
        }

        let mut request = self
            .http
            .get(self.url("/payment-activities"))
            .bearer_auth(&self.token);
        if let Some(ref account_id) = filter.account_id {
            request = request.query(&[("account_id", account_id.as_str())]);
        }
        if let Some(start) = filter.start_date {
            request = request.query(&[("start_date", start.to_string())]);
        }
        if let Some(end) = filter.end_date {
            request = request.query(&[("end_date", end.to_string())]);
        }
        if let Some(status) = filter.status {
            request = request.query(&[("status", status.to_string())]);
        }

        let response = request.send().await?;
        let activities: Vec<PaymentActivity> = decode_response(response).await?;

        self.activities_cache.insert(filter.clone(), activities.clone());
        Ok(activities)
    }

    /// Submit a reconciliation decision for an activity
    ///
    /// The returned activity is the backend's authoritative state. A
    /// [`BudgetError::Conflict`] means another session decided first; the
    /// caller must drop its optimistic update and re-fetch.
    pub async fn submit_decision(
        &mut self,
        activity_id: &str,
        decision: &ReconciliationDecision,
    ) -> BudgetResult<PaymentActivity> {
        let url = self.url(&format!("/payment-activities/{activity_id}/reconciliation"));
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(decision)
            .send()
            .await?;

        // Cached activity pages are stale regardless of the outcome
        self.activities_cache.clear();

        let result = decode_response(response).await;
        match &result {
            Ok(_) => info!(activity_id, "reconciliation decision accepted"),
            Err(BudgetError::Conflict(message)) => {
                warn!(activity_id, conflict = %message, "decision lost to a concurrent session");
            }
            Err(_) => {}
        }
        result
    }

    /// Ask the backend to start an import run for an account
    pub async fn start_import(&mut self, account_id: &str) -> BudgetResult<SyncRun> {
        #[derive(Serialize)]
        struct StartImportRequest<'a> {
            account_id: &'a str,
        }

        let response = self
            .http
            .post(self.url("/sync-runs"))
            .bearer_auth(&self.token)
            .json(&StartImportRequest { account_id })
            .send()
            .await?;

        // A completed import adds activities
        self.activities_cache.clear();

        let run: SyncRun = decode_response(response).await?;
        info!(run_id = %run.id, account_id, "import run started");
        Ok(run)
    }

    /// Fetch the sync history for an account
    pub async fn fetch_sync_history(&self, account_id: &str) -> BudgetResult<Vec<SyncRun>> {
        let response = self
            .http
            .get(self.url("/sync-runs"))
            .bearer_auth(&self.token)
            .query(&[("account_id", account_id)])
            .send()
            .await?;
        decode_response(response).await
    }

    /// Drop all cached reads
    pub fn invalidate_caches(&mut self) {
        self.accounts_cache.clear();
        self.activities_cache.clear();
    }
}
