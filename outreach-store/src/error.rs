//! Error types for the outreach-store crate.
//!
//! All store and directory operations return [`StoreError`], which
//! categorizes failures into lookup misses, capacity limits, and internal
//! (lock) errors.

use thiserror::Error;

use outreach_common::id::{CampaignId, LogId};

/// Top-level store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Campaign not found in the store.
    #[error("Campaign not found: {0}")]
    CampaignNotFound(CampaignId),

    /// Log row not found under the given campaign.
    #[error("Campaign log not found: {0}")]
    LogNotFound(LogId),

    /// The backend refused a write because its capacity bound is reached.
    #[error("Store capacity exceeded: limit is {limit} campaigns")]
    Capacity { limit: usize },

    /// Internal error (lock poisoning, etc.).
    #[error("Internal store error: {0}")]
    Lock(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Lock(format!("Lock poisoned: {e}"))
    }
}
