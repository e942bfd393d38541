//! Campaign and log status enums plus the lifecycle guard table
//!
//! Every mutation of a campaign is gated through [`CampaignStatus::guard`],
//! which is the single authority on which operations are legal in which
//! state:
//!
//! - draft → scheduled (schedule)
//! - draft | scheduled → running (execute)
//! - running → paused (pause)
//! - paused → running (resume)
//! - running → completed | failed (written by the run finaliser)
//!
//! Completed and failed are terminal. There is no automatic retry out of
//! failed; re-sending means creating a new campaign.

use serde::{Deserialize, Serialize};

/// Aggregate status of a campaign
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Running,
    Completed,
    Failed,
    Paused,
}

/// Lifecycle operation checked against the guard table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Execute,
    Schedule,
    Pause,
    Resume,
    Update,
    Delete,
}

impl Action {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Execute => "execute",
            Self::Schedule => "schedule",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle operation was attempted in a state that forbids it
///
/// Carries the current status so callers can report exactly why the
/// operation conflicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} campaign while {from}")]
pub struct TransitionError {
    pub action: Action,
    pub from: CampaignStatus,
}

impl CampaignStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Paused => "paused",
        }
    }

    /// Whether this status admits no further lifecycle transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `action` is legal from this status
    #[must_use]
    pub const fn allows(self, action: Action) -> bool {
        match action {
            Action::Execute | Action::Schedule => matches!(self, Self::Draft | Self::Scheduled),
            Action::Pause => matches!(self, Self::Running),
            Action::Resume => matches!(self, Self::Paused),
            Action::Update => !matches!(self, Self::Running | Self::Completed),
            Action::Delete => matches!(self, Self::Draft),
        }
    }

    /// Check `action` against the guard table
    ///
    /// # Errors
    /// Returns a [`TransitionError`] naming the action and the current
    /// status when the operation is not legal from this state.
    pub const fn guard(self, action: Action) -> Result<(), TransitionError> {
        if self.allows(action) {
            Ok(())
        } else {
            Err(TransitionError { action, from: self })
        }
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery status of a single per-recipient log row
///
/// Rows are created pending and leave pending at most once per run.
/// Delivered and read are only ever written by the (out of scope) receipt
/// ingestion path; the dispatcher itself writes sent or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Pending,
    Sent,
    Failed,
    Delivered,
    Read,
}

impl LogStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
