//! Utility modules

pub mod cache;
pub mod memory_storage;
pub mod validation;

pub use cache::*;
pub use memory_storage::*;
pub use validation::*;
