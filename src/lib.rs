//! # Coffee Budget Core
//!
//! Core library for a personal coffee-budget tracker: matches bank-reported
//! payment activities against the transactions a user actually recorded, and
//! tracks the accounts and import runs the activities come from.
//!
//! ## Features
//!
//! - **Reconciliation matching**: weighted confidence scoring of candidate
//!   transactions (amount, date proximity, description similarity) with
//!   deterministic ranking and configurable thresholds
//! - **Status transitions**: auto-match, confirm, reject, ignore, and reopen
//!   with the full transition rules enforced
//! - **Account linking**: GoCardless-backed payment account lifecycle
//!   (pending, active, revoked, error)
//! - **Sync history**: idempotent activity import runs with per-run tallies
//! - **Backend client**: authenticated REST client with TTL-cached reads and
//!   typed permission-gated sessions
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   storage
//!
//! ## Quick Start
//!
//! ```rust
//! use coffee_budget_core::{
//!     CandidateTransaction, PaymentActivity, ReconciliationMatcher,
//! };
//! use chrono::NaiveDate;
//!
//! let matcher = ReconciliationMatcher::new();
//! let activity = PaymentActivity::new(
//!     "act-1".into(),
//!     "acc-1".into(),
//!     "12.50".parse().unwrap(),
//!     "EUR".into(),
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     "Coffee Co".into(),
//! );
//! let candidates = vec![CandidateTransaction::new(
//!     "txn-1".into(),
//!     "12.50".parse().unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//!     "Coffee Co".into(),
//!     "EUR".into(),
//! )];
//!
//! let ranked = matcher.rank_candidates(&activity, &candidates).unwrap();
//! assert!(ranked[0].score > 0.99);
//! ```

pub mod accounts;
pub mod api;
pub mod reconciliation;
pub mod session;
pub mod sync;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use accounts::*;
pub use api::*;
pub use reconciliation::*;
pub use session::*;
pub use sync::*;
pub use traits::*;
pub use types::*;
