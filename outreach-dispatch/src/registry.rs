//! Per-campaign run tracking and cooperative cancellation
//!
//! One campaign gets at most one live dispatch task; [`RunRegistry`] is
//! the gate that enforces it. Each registered run carries a
//! [`CancelToken`] that a pause command trips and the dispatch loop
//! checks at every iteration boundary.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Notify;

use outreach_common::id::CampaignId;

/// Cooperative cancellation flag for one dispatch run
///
/// Cancellation is observed between sends, never mid-send: a recipient
/// already handed to the sender keeps its outcome.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; wakes a loop parked in [`Self::cancelled`]
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // notify_one stores a permit, so a cancel that lands before the
        // loop reaches its next await is not lost
        self.inner.notify.notify_one();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested
    ///
    /// Raced against the inter-message sleep so a pause lands without
    /// waiting out the remaining throttle delay.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.inner.notify.notified().await;
        }
    }
}

/// Tracks which campaigns currently have a live dispatch task
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    runs: Arc<DashMap<CampaignId, CancelToken>>,
}

impl RunRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a run for `id`
    ///
    /// Returns the run's cancellation token, or `None` if a task is
    /// already registered — the single-writer-per-campaign guard.
    #[must_use]
    pub fn begin(&self, id: CampaignId) -> Option<CancelToken> {
        match self.runs.entry(id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                let token = CancelToken::new();
                slot.insert(token.clone());
                Some(token)
            }
        }
    }

    /// Trip the cancellation token of a live run
    ///
    /// Returns whether a run was actually signalled; pausing a campaign
    /// with no live task is a plain status change.
    pub fn cancel(&self, id: &CampaignId) -> bool {
        if let Some(token) = self.runs.get(id) {
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Drop the run entry once its task has fully stopped
    pub fn finish(&self, id: &CampaignId) {
        self.runs.remove(id);
    }

    #[must_use]
    pub fn is_running(&self, id: &CampaignId) -> bool {
        self.runs.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}
