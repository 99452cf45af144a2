//! Payment account linking and connection lifecycle

use uuid::Uuid;

use crate::traits::{AccountValidator, BudgetStorage, DefaultAccountValidator};
use crate::types::*;

/// Manager for linked payment accounts
///
/// Owns the connection lifecycle: accounts are linked in the `Pending` state,
/// activated when the GoCardless consent completes, and moved to `Revoked` or
/// `Error` afterwards. Invalid lifecycle moves are rejected.
pub struct AccountManager<S: BudgetStorage> {
    storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: BudgetStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account manager with a custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Link a new account in the `Pending` state
    pub async fn link_account(
        &mut self,
        institution_id: String,
        display_name: String,
        currency: String,
    ) -> BudgetResult<PaymentAccount> {
        let account = PaymentAccount::new(
            Uuid::new_v4().to_string(),
            institution_id,
            display_name,
            currency,
        );

        self.validator.validate_account(&account)?;
        self.storage.save_account(&account).await?;

        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> BudgetResult<Option<PaymentAccount>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> BudgetResult<PaymentAccount> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| BudgetError::AccountNotFound(account_id.to_string()))
    }

    /// List accounts, optionally filtered by connection status
    pub async fn list_accounts(
        &self,
        status: Option<ConnectionStatus>,
    ) -> BudgetResult<Vec<PaymentAccount>> {
        self.storage.list_accounts(status).await
    }

    /// Activate an account once the link consent completes
    ///
    /// Permitted from `Pending` and from `Error` (relink after a failure).
    pub async fn activate(&mut self, account_id: &str) -> BudgetResult<PaymentAccount> {
        self.transition(account_id, ConnectionStatus::Active, |status| {
            matches!(
                status,
                ConnectionStatus::Pending | ConnectionStatus::Error(_)
            )
        })
        .await
    }

    /// Relink an account after a connection failure
    ///
    /// Same rules as [`activate`](Self::activate); offered under the name the
    /// link flow uses when the user re-runs consent.
    pub async fn relink(&mut self, account_id: &str) -> BudgetResult<PaymentAccount> {
        self.activate(account_id).await
    }

    /// Revoke an account's connection; terminal
    pub async fn revoke(&mut self, account_id: &str) -> BudgetResult<PaymentAccount> {
        self.transition(account_id, ConnectionStatus::Revoked, |status| {
            matches!(status, ConnectionStatus::Active | ConnectionStatus::Error(_))
        })
        .await
    }

    /// Record a connection failure reported by the provider
    pub async fn mark_error(
        &mut self,
        account_id: &str,
        message: String,
    ) -> BudgetResult<PaymentAccount> {
        self.transition(account_id, ConnectionStatus::Error(message), |status| {
            matches!(status, ConnectionStatus::Pending | ConnectionStatus::Active)
        })
        .await
    }

    async fn transition(
        &mut self,
        account_id: &str,
        next: ConnectionStatus,
        permitted: impl Fn(&ConnectionStatus) -> bool,
    ) -> BudgetResult<PaymentAccount> {
        let mut account = self.get_account_required(account_id).await?;

        if !permitted(&account.status) {
            return Err(BudgetError::InvalidTransition {
                from: account.status.to_string(),
                to: next.to_string(),
            });
        }

        account.status = next;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;

        Ok(account)
    }
}
