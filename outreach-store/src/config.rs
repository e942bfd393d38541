use std::sync::Arc;

use serde::Deserialize;

use crate::{backends::MemoryStore, r#trait::CampaignStore};

/// Configuration for the campaign store backend
///
/// # Examples
///
/// Memory-backed store with unlimited capacity:
/// ```ron
/// Outreach (
///     store: Memory(),
/// )
/// ```
///
/// Memory-backed store with a capacity limit:
/// ```ron
/// Outreach (
///     store: Memory(
///         capacity: Some(1000),
///     ),
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub enum StoreConfig {
    /// In-memory store (non-persistent)
    ///
    /// Can optionally specify a capacity limit to prevent unbounded growth
    Memory {
        /// Maximum number of campaigns to keep (omit for unlimited)
        #[serde(default)]
        capacity: Option<usize>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Memory { capacity: None }
    }
}

impl StoreConfig {
    /// Convert the configuration into a concrete campaign store
    ///
    /// This consumes the config and returns an Arc'd trait object that can
    /// be used polymorphically throughout the application.
    #[must_use]
    pub fn into_store(self) -> Arc<dyn CampaignStore> {
        match self {
            Self::Memory { capacity } => capacity.map_or_else(
                || Arc::new(MemoryStore::new()),
                |capacity| Arc::new(MemoryStore::with_capacity(capacity)),
            ),
        }
    }
}
