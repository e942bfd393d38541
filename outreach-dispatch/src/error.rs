use thiserror::Error;

use outreach_common::{
    id::{AccountId, CampaignId},
    status::TransitionError,
};
use outreach_store::StoreError;

/// Fatal faults inside a dispatch run
///
/// Any of these aborts the whole run and marks the campaign `failed`.
/// Per-recipient send rejections are not dispatch errors; the engine
/// records them on the log row and keeps going.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The campaign's account has disappeared from the directory
    #[error("account {0} not found")]
    AccountMissing(AccountId),

    /// No sender could be constructed for the account
    #[error("sender unavailable: {0}")]
    Sender(#[from] outreach_sender::SendError),

    /// The store could not be read or written
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors returned synchronously by lifecycle commands
#[derive(Debug, Error)]
pub enum CommandError {
    /// The campaign does not exist (or is not visible to the caller)
    #[error("campaign {0} not found")]
    NotFound(CampaignId),

    /// The campaign's current status forbids the command
    #[error(transparent)]
    Conflict(#[from] TransitionError),

    /// The store could not be read or written
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for CommandError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::CampaignNotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}
