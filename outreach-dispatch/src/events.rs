//! Dispatch progress notifications
//!
//! The engine reports run progress through an injected [`Notifier`]
//! rather than a process-wide emitter, so the fan-out mechanism
//! (sockets, pub/sub, nothing at all) stays an external collaborator.

use std::fmt::Debug;

use outreach_common::id::{CampaignId, LogId};

/// A single observable step in a campaign's dispatch lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// A dispatch task picked up the campaign's pending queue
    RunStarted {
        campaign: CampaignId,
        pending: usize,
    },
    /// One recipient was accepted by the messaging API
    MessageSent {
        campaign: CampaignId,
        log: LogId,
        message_id: String,
    },
    /// One recipient was refused; the run continues
    MessageFailed {
        campaign: CampaignId,
        log: LogId,
        reason: String,
    },
    /// The run stopped on request with recipients still pending
    RunPaused {
        campaign: CampaignId,
        remaining: usize,
    },
    /// Every pending recipient was attempted
    RunCompleted {
        campaign: CampaignId,
        sent: usize,
        failed: usize,
    },
    /// The run aborted before draining its queue
    RunFailed {
        campaign: CampaignId,
        reason: String,
    },
}

impl DispatchEvent {
    /// The campaign this event belongs to
    #[must_use]
    pub const fn campaign(&self) -> CampaignId {
        match self {
            Self::RunStarted { campaign, .. }
            | Self::MessageSent { campaign, .. }
            | Self::MessageFailed { campaign, .. }
            | Self::RunPaused { campaign, .. }
            | Self::RunCompleted { campaign, .. }
            | Self::RunFailed { campaign, .. } => *campaign,
        }
    }
}

/// Output port for dispatch progress
///
/// Implementations must not block: the dispatch loop calls this inline
/// between sends. Anything slow belongs behind a channel.
pub trait Notifier: Send + Sync + Debug {
    fn notify(&self, event: DispatchEvent);
}

/// Discards every event; the default when no consumer is wired up
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _: DispatchEvent) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_event_reports_its_campaign() {
        let id = CampaignId::generate();

        let event = DispatchEvent::RunCompleted {
            campaign: id,
            sent: 3,
            failed: 1,
        };

        assert_eq!(event.campaign(), id);
    }

    #[test]
    fn test_null_notifier_is_object_safe() {
        let notifier: Arc<dyn Notifier> = Arc::new(NullNotifier);

        notifier.notify(DispatchEvent::RunStarted {
            campaign: CampaignId::generate(),
            pending: 0,
        });
    }
}
