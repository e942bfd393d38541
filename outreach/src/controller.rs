//! Daemon wiring and lifecycle
//!
//! The [`Outreach`] controller deserializes straight from a RON config
//! file, wires every engine component, and runs the scheduler sweep
//! until a shutdown signal arrives. Embedders that want the API surface
//! instead of the daemon call [`Outreach::into_engine`] and keep the
//! [`CampaignService`] half.

use std::sync::{Arc, LazyLock};

use serde::Deserialize;
use tokio::sync::broadcast;

use outreach_common::{Signal, account::Account, contact::Contact, internal, logging, tracing};
use outreach_dispatch::{
    Dispatcher, NullNotifier, Orchestrator, PacingConfig, RecipientResolver, Scheduler,
    SchedulerConfig,
};
use outreach_sender::{CloudConfig, CloudSenderFactory, SenderFactory};
use outreach_store::{
    AccountDirectory, ContactDirectory, MemoryAccountDirectory, MemoryContactDirectory,
    StoreConfig,
};

use crate::service::CampaignService;

/// Top-level daemon configuration
///
/// Every section has a default, so the minimal config is `Outreach()`.
/// A standalone daemon has no surrounding platform to hand it account
/// and contact directories, so the config seeds them.
///
/// # Examples
///
/// ```ron
/// Outreach (
///     store: Memory(),
///     scheduler: ( poll_interval_secs: 30 ),
///     dispatch: ( message_delay_ms: 1000 ),
///     sender: ( base_url: "https://graph.facebook.com" ),
///     accounts: [
///         (
///             id: 1,
///             owner: 1,
///             phone_number_id: "106540352242922",
///             access_token: "EAAG-redacted",
///             display_name: "Acme Retail",
///         ),
///     ],
///     contacts: [
///         ( id: 1, account_id: 1, name: "Asha", phone_number: "919876543210" ),
///     ],
/// )
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct Outreach {
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    scheduler: SchedulerConfig,
    #[serde(alias = "pacing", default)]
    dispatch: PacingConfig,
    #[serde(default)]
    sender: CloudConfig,
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    contacts: Vec<Contact>,
}

/// The fully wired engine a configuration describes
#[derive(Debug)]
pub struct Engine {
    /// The embeddable API surface
    pub service: CampaignService,
    /// The periodic sweep that starts due scheduled campaigns
    pub scheduler: Scheduler,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered -- Enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!("Terminate Signal received, shutting down");
        }
    };

    let mut receiver = SHUTDOWN_BROADCAST.subscribe();

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    loop {
        tokio::select! {
            sig = receiver.recv() => {
                match sig {
                    Ok(s) => tracing::debug!("Received {s:?}"),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(e) => tracing::debug!("Received: {e:?}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    Ok(())
}

impl Outreach {
    /// Wire the engine this configuration describes
    ///
    /// The service and the scheduler share one store, one sender factory,
    /// and one run registry, so a manual send and a scheduler sweep can
    /// never both dispatch the same campaign.
    #[must_use]
    pub fn into_engine(self) -> Engine {
        let store = self.store.into_store();
        let accounts: Arc<dyn AccountDirectory> =
            Arc::new(MemoryAccountDirectory::with_accounts(self.accounts));
        let contacts: Arc<dyn ContactDirectory> =
            Arc::new(MemoryContactDirectory::with_contacts(self.contacts));
        let factory: Arc<dyn SenderFactory> = Arc::new(CloudSenderFactory::new(self.sender));
        let notifier = Arc::new(NullNotifier);

        let dispatcher = Dispatcher::new(
            store.clone(),
            accounts.clone(),
            factory,
            notifier.clone(),
            self.dispatch,
        );
        let orchestrator = Orchestrator::new(store.clone(), dispatcher, notifier);
        let scheduler = Scheduler::new(store.clone(), orchestrator.clone(), self.scheduler);
        let service = CampaignService::new(
            store,
            accounts,
            RecipientResolver::new(contacts),
            orchestrator,
        );

        Engine { service, scheduler }
    }

    /// Run the scheduler daemon until shutdown
    ///
    /// # Errors
    ///
    /// This function will return an error if signal handlers cannot be
    /// installed or the shutdown broadcast fails.
    pub async fn run(self) -> anyhow::Result<()> {
        logging::init();

        internal!("Campaign engine running");

        let engine = self.into_engine();

        let ret = tokio::select! {
            () = engine.scheduler.serve(SHUTDOWN_BROADCAST.subscribe()) => {
                Ok(())
            }
            r = shutdown() => {
                r
            }
        };

        internal!("Shutting down...");

        ret
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use outreach_common::id::{AccountId, ContactId, UserId};

    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let controller: Outreach = ron::from_str("Outreach()").expect("Failed to parse");

        assert_eq!(controller.dispatch.message_delay_ms, 1000);
        assert_eq!(controller.scheduler.poll_interval_secs, 30);
        assert!(controller.accounts.is_empty());
        assert!(controller.contacts.is_empty());
    }

    #[test]
    fn test_full_config_parses() {
        let controller: Outreach = ron::from_str(
            r#"Outreach (
                store: Memory( capacity: Some(500) ),
                scheduler: ( poll_interval_secs: 5 ),
                pacing: ( message_delay_ms: 250 ),
                sender: ( base_url: "https://graph.example.test", timeout_secs: 10 ),
                accounts: [
                    (
                        id: 1,
                        owner: 7,
                        phone_number_id: "106540352242922",
                        access_token: "EAAG-redacted",
                        display_name: "Acme Retail",
                    ),
                ],
                contacts: [
                    ( id: 1, account_id: 1, name: "Asha", phone_number: "919876543210" ),
                ],
            )"#,
        )
        .expect("Failed to parse");

        assert_eq!(controller.scheduler.poll_interval_secs, 5);
        assert_eq!(controller.dispatch.message_delay_ms, 250);
        assert_eq!(controller.accounts[0].id, AccountId(1));
        assert_eq!(controller.accounts[0].owner, UserId(7));
        assert_eq!(controller.contacts[0].id, ContactId(1));
    }

    #[tokio::test]
    async fn test_engine_wires_seeded_directories() {
        let controller: Outreach = ron::from_str(
            r#"(
                accounts: [
                    (
                        id: 1,
                        owner: 1,
                        phone_number_id: "106540352242922",
                        access_token: "test-token",
                        display_name: "Test Business",
                    ),
                ],
                contacts: [
                    ( id: 1, account_id: 1, name: "Asha", phone_number: "919876543210" ),
                    ( id: 2, account_id: 1, name: "Ravi", phone_number: "919876543211" ),
                ],
            )"#,
        )
        .expect("Failed to parse");

        let engine = controller.into_engine();

        let campaign = engine
            .service
            .create_campaign(
                UserId(1),
                crate::service::NewCampaign {
                    title: "Launch".to_string(),
                    template_name: "launch_offer".to_string(),
                    language_code: "en_US".to_string(),
                    components: Vec::new(),
                    contact_ids: vec![ContactId(1), ContactId(2)],
                    scheduled_at: None,
                },
            )
            .await
            .expect("Failed to create");

        assert_eq!(campaign.contact_count, 2);

        let stats = engine
            .service
            .campaign_stats(UserId(1), &campaign.id)
            .await
            .expect("Failed to fetch stats");
        assert_eq!(stats.pending, 2);
    }
}
