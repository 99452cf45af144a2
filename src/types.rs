//! Core types and data structures for the coffee budget tracker

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Connection lifecycle of a linked payment account
///
/// Accounts are created `Pending` while the GoCardless requisition is open,
/// become `Active` once the link is completed, and end up `Revoked` when the
/// user (or the bank) withdraws consent. `Error` is recoverable by relinking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// Link requisition created, consent not yet granted
    Pending,
    /// Consent granted, activities can be imported
    Active,
    /// Consent withdrawn; terminal
    Revoked,
    /// Connection failed with a provider-reported message
    Error(String),
}

impl ConnectionStatus {
    /// Whether the account can never become active again
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionStatus::Revoked)
    }

    /// Whether activities may be imported from this account
    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionStatus::Active)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Pending => write!(f, "pending"),
            ConnectionStatus::Active => write!(f, "active"),
            ConnectionStatus::Revoked => write!(f, "revoked"),
            ConnectionStatus::Error(_) => write!(f, "error"),
        }
    }
}

/// A linked external bank account, sourced via GoCardless
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAccount {
    /// Unique identifier for the account
    pub id: String,
    /// GoCardless institution the account belongs to
    pub institution_id: String,
    /// Human-readable account name
    pub display_name: String,
    /// ISO 4217 currency code
    pub currency: String,
    /// Current connection lifecycle state
    pub status: ConnectionStatus,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// When the account link was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl PaymentAccount {
    /// Create a new account in the `Pending` state
    pub fn new(id: String, institution_id: String, display_name: String, currency: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            institution_id,
            display_name,
            currency,
            status: ConnectionStatus::Pending,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field-less view of a [`ReconciliationStatus`], usable as a filter and
/// aggregation key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Unmatched,
    AutoMatched,
    ManuallyConfirmed,
    ManuallyRejected,
    Ignored,
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKind::Unmatched => write!(f, "unmatched"),
            StatusKind::AutoMatched => write!(f, "auto-matched"),
            StatusKind::ManuallyConfirmed => write!(f, "manually-confirmed"),
            StatusKind::ManuallyRejected => write!(f, "manually-rejected"),
            StatusKind::Ignored => write!(f, "ignored"),
        }
    }
}

/// Matching state of a payment activity
///
/// `AutoMatched` carries the confidence score that produced the match.
/// `ManuallyConfirmed`, `ManuallyRejected`, and `Ignored` are terminal and can
/// only be left through an explicit reopen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconciliationStatus {
    /// No match recorded
    Unmatched,
    /// Matched automatically with the given confidence in [0, 1]
    AutoMatched { confidence: f64 },
    /// Match confirmed by the user
    ManuallyConfirmed,
    /// Match rejected by the user
    ManuallyRejected,
    /// Activity excluded from reconciliation by the user
    Ignored,
}

impl ReconciliationStatus {
    /// The field-less kind of this status
    pub fn kind(&self) -> StatusKind {
        match self {
            ReconciliationStatus::Unmatched => StatusKind::Unmatched,
            ReconciliationStatus::AutoMatched { .. } => StatusKind::AutoMatched,
            ReconciliationStatus::ManuallyConfirmed => StatusKind::ManuallyConfirmed,
            ReconciliationStatus::ManuallyRejected => StatusKind::ManuallyRejected,
            ReconciliationStatus::Ignored => StatusKind::Ignored,
        }
    }

    /// Whether this status can only be left through an explicit reopen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReconciliationStatus::ManuallyConfirmed
                | ReconciliationStatus::ManuallyRejected
                | ReconciliationStatus::Ignored
        )
    }
}

impl std::fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// A single bank-reported financial event pulled from a linked account
///
/// Amount and booking date are optional because activities arrive as backend
/// JSON: a record missing either field stays representable and is rejected by
/// the matcher instead of being silently read as zero. Everything except the
/// reconciliation fields is immutable once imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentActivity {
    /// Unique identifier for the activity
    pub id: String,
    /// Linked account the activity was imported from
    pub account_id: String,
    /// Reported amount, if present in the source record
    #[serde(default)]
    pub amount: Option<BigDecimal>,
    /// ISO 4217 currency code
    pub currency: String,
    /// Date the bank booked the event, if present in the source record
    #[serde(default)]
    pub booking_date: Option<NaiveDate>,
    /// Counterparty description as reported by the bank
    pub description: String,
    /// Current reconciliation state
    pub status: ReconciliationStatus,
    /// Transaction id of the active match, if any
    #[serde(default)]
    pub matched_transaction_id: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// When the activity was imported
    pub imported_at: NaiveDateTime,
    /// When the reconciliation fields were last updated
    pub updated_at: NaiveDateTime,
}

impl PaymentActivity {
    /// Create a new, unmatched activity
    pub fn new(
        id: String,
        account_id: String,
        amount: BigDecimal,
        currency: String,
        booking_date: NaiveDate,
        description: String,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id,
            account_id,
            amount: Some(amount),
            currency,
            booking_date: Some(booking_date),
            description,
            status: ReconciliationStatus::Unmatched,
            matched_transaction_id: None,
            metadata: HashMap::new(),
            imported_at: now,
            updated_at: now,
        }
    }

    /// Replace the reconciliation state and bump the update timestamp
    pub fn set_status(&mut self, status: ReconciliationStatus) {
        self.status = status;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// A user-recorded transaction or expected payment, offered to the matcher as
/// a candidate for a payment activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Unique identifier for the transaction
    pub id: String,
    /// Recorded amount, if present
    #[serde(default)]
    pub amount: Option<BigDecimal>,
    /// Recorded or expected date, if present
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// User-entered description
    pub description: String,
    /// ISO 4217 currency code
    pub currency: String,
}

impl CandidateTransaction {
    /// Create a new candidate transaction
    pub fn new(
        id: String,
        amount: BigDecimal,
        date: NaiveDate,
        description: String,
        currency: String,
    ) -> Self {
        Self {
            id,
            amount: Some(amount),
            date: Some(date),
            description,
            currency,
        }
    }
}

/// The individual signals that produced a match score, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchSignals {
    /// Amount agreement; 1.0 for an exact match
    pub amount: f64,
    /// Date proximity; decays to 0 at the window edge
    pub date: f64,
    /// Normalized description similarity
    pub description: f64,
}

/// A transient pairing between a payment activity and a candidate transaction
///
/// Matches are recomputed from their inputs on every ranking call and are
/// never persisted or cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Candidate transaction id
    pub transaction_id: String,
    /// Combined confidence score in [0, 1]
    pub score: f64,
    /// Distance in days between activity and candidate dates
    pub date_distance_days: i64,
    /// The signals the score was combined from
    pub signals: MatchSignals,
}

/// Filter for listing payment activities, also used as the cache key for
/// fetched activity pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityFilter {
    /// Restrict to a single account
    pub account_id: Option<String>,
    /// Earliest booking date, inclusive
    pub start_date: Option<NaiveDate>,
    /// Latest booking date, inclusive
    pub end_date: Option<NaiveDate>,
    /// Restrict to a single status kind
    pub status: Option<StatusKind>,
}

impl ActivityFilter {
    /// Filter scoped to one account with no other restrictions
    pub fn for_account(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            ..Self::default()
        }
    }

    /// Whether the given activity passes this filter
    ///
    /// Activities without a booking date fail any date-bounded filter.
    pub fn matches(&self, activity: &PaymentActivity) -> bool {
        if let Some(ref account_id) = self.account_id {
            if &activity.account_id != account_id {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            match activity.booking_date {
                Some(date) if date >= start => {}
                _ => return false,
            }
        }
        if let Some(end) = self.end_date {
            match activity.booking_date {
                Some(date) if date <= end => {}
                _ => return false,
            }
        }
        if let Some(kind) = self.status {
            if activity.status.kind() != kind {
                return false;
            }
        }
        true
    }
}

/// Errors that can occur in the budget core
#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Sync run not found: {0}")]
    SyncRunNotFound(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Session is missing or expired")]
    Unauthorized,
    #[error("Permission denied: {0}")]
    Forbidden(String),
    #[error("Backend reported conflicting state: {0}")]
    Conflict(String),
    #[error("Backend returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for budget core operations
pub type BudgetResult<T> = Result<T, BudgetError>;
