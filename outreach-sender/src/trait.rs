use std::sync::Arc;

use async_trait::async_trait;

use outreach_common::account::Account;

use crate::message::{MessageReceipt, OutboundMessage};

/// A channel capable of delivering one outbound message at a time
///
/// Implementations must be safe to share across tasks; the dispatcher
/// holds one sender for the lifetime of a campaign run.
#[async_trait]
pub trait MessageSender: Send + Sync + std::fmt::Debug {
    /// Deliver `message` and return the provider's receipt
    ///
    /// # Errors
    /// Returns an error if the provider rejects the message or the
    /// transport fails. A failure affects only this message; callers
    /// carry on with the rest of their batch.
    async fn send(&self, message: &OutboundMessage) -> crate::Result<MessageReceipt>;
}

/// Builds a [`MessageSender`] for one account's credentials
pub trait SenderFactory: Send + Sync + std::fmt::Debug {
    /// Build a sender bound to `account`
    ///
    /// # Errors
    /// Returns an error if a client cannot be constructed for the
    /// account, e.g. TLS initialisation failure.
    fn sender_for(&self, account: &Account) -> crate::Result<Arc<dyn MessageSender>>;
}
