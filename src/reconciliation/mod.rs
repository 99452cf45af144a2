//! Reconciliation of bank-reported activities against recorded transactions

pub mod engine;
pub mod matcher;
pub mod stats;
pub mod status;

pub use engine::*;
pub use matcher::*;
pub use stats::*;
