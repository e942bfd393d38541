use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::Notify;

use outreach_common::account::Account;

use crate::{
    SendError,
    message::{MessageReceipt, OutboundMessage},
    r#trait::{MessageSender, SenderFactory},
};

/// Mock implementation of [`MessageSender`] for testing
///
/// Records every accepted message and can be scripted to fail for
/// specific recipients. Receipts are deterministic (`wamid.mock.N`).
#[derive(Debug, Clone, Default)]
pub struct MockSender {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    failures: Arc<Mutex<HashMap<String, SendError>>>,
    notify: Arc<Notify>,
}

impl MockSender {
    /// Create a new mock sender
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all accepted messages in send order
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .expect("MockSender sent mutex poisoned")
            .clone()
    }

    /// Get the number of accepted messages
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .expect("MockSender sent mutex poisoned")
            .len()
    }

    /// Get the recipients of accepted messages in send order
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("MockSender sent mutex poisoned")
            .iter()
            .map(|message| message.to().to_owned())
            .collect()
    }

    /// Clear all recorded messages
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    pub fn clear(&self) {
        self.sent
            .lock()
            .expect("MockSender sent mutex poisoned")
            .clear();
    }

    /// Script a one-shot failure for the next send to `to`
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    pub fn fail_for(&self, to: impl Into<String>, error: SendError) {
        self.failures
            .lock()
            .expect("MockSender failures mutex poisoned")
            .insert(to.into(), error);
    }

    /// Wait for the next message to be accepted
    ///
    /// This is useful in tests to ensure sends complete before assertions
    pub async fn wait_for_send(&self) {
        self.notify.notified().await;
    }

    /// Wait for a specific number of accepted messages, with timeout
    ///
    /// # Errors
    /// Returns an error if the timeout is reached before the expected count
    pub async fn wait_for_count(
        &self,
        expected: usize,
        timeout: std::time::Duration,
    ) -> anyhow::Result<()> {
        tokio::time::timeout(timeout, async {
            loop {
                if self.sent_count() >= expected {
                    return;
                }
                self.notify.notified().await;
            }
        })
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageSender for MockSender {
    async fn send(&self, message: &OutboundMessage) -> crate::Result<MessageReceipt> {
        let scripted = self
            .failures
            .lock()
            .expect("MockSender failures mutex poisoned")
            .remove(message.to());
        if let Some(error) = scripted {
            self.notify.notify_waiters();
            return Err(error);
        }

        let count = {
            let mut sent = self.sent.lock().expect("MockSender sent mutex poisoned");
            sent.push(message.clone());
            sent.len()
        };
        self.notify.notify_waiters();

        Ok(MessageReceipt {
            message_id: format!("wamid.mock.{count}"),
        })
    }
}

/// Factory that hands every account the same shared [`MockSender`]
#[derive(Debug, Clone, Default)]
pub struct MockSenderFactory {
    sender: MockSender,
}

impl MockSenderFactory {
    /// Create a factory with a fresh mock sender
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the shared mock, for scripting and assertions
    #[must_use]
    pub fn sender(&self) -> MockSender {
        self.sender.clone()
    }
}

impl SenderFactory for MockSenderFactory {
    fn sender_for(&self, _account: &Account) -> crate::Result<Arc<dyn MessageSender>> {
        Ok(Arc::new(self.sender.clone()))
    }
}
