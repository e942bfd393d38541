//! Campaign lifecycle commands and run supervision
//!
//! The orchestrator is the only component that moves a campaign between
//! statuses. Commands check the guard table, claim the run registry,
//! write the status transition, and hand the actual sending to a
//! spawned [`Dispatcher`] task whose outcome is banked back into the
//! campaign row when it finishes.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use outreach_common::{
    id::CampaignId,
    status::{Action, CampaignStatus, TransitionError},
};
use outreach_store::{Campaign, CampaignStore, CampaignUpdate};

use crate::{
    engine::{Dispatcher, RunSummary},
    error::CommandError,
    events::{DispatchEvent, Notifier},
    registry::{CancelToken, RunRegistry},
};

#[derive(Debug, Clone)]
pub struct Orchestrator {
    store: Arc<dyn CampaignStore>,
    dispatcher: Dispatcher,
    registry: RunRegistry,
    notifier: Arc<dyn Notifier>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn CampaignStore>,
        dispatcher: Dispatcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            registry: RunRegistry::new(),
            notifier,
        }
    }

    /// Whether a dispatch task is currently live for `id`
    #[must_use]
    pub fn is_running(&self, id: &CampaignId) -> bool {
        self.registry.is_running(id)
    }

    /// Start sending a draft or scheduled campaign
    ///
    /// Marks the campaign running, stamps `started_at` and spawns the
    /// dispatch task. Returns the updated row as soon as the run is
    /// underway; draining happens in the background.
    ///
    /// # Errors
    /// [`CommandError::Conflict`] when the campaign's status forbids
    /// executing or another run is already live for it.
    pub async fn execute(&self, id: &CampaignId) -> Result<Campaign, CommandError> {
        let campaign = self.store.get_campaign(id).await?;
        campaign.status.guard(Action::Execute)?;

        self.start(campaign, Action::Execute).await
    }

    /// Continue a paused campaign from where it stopped
    ///
    /// Identical to [`Self::execute`] except that only paused campaigns
    /// qualify and the original `started_at` is kept. The new run picks
    /// up exactly the rows still pending.
    ///
    /// # Errors
    /// [`CommandError::Conflict`] when the campaign is not paused or
    /// its previous run has not fully stopped yet.
    pub async fn resume(&self, id: &CampaignId) -> Result<Campaign, CommandError> {
        let campaign = self.store.get_campaign(id).await?;
        campaign.status.guard(Action::Resume)?;

        self.start(campaign, Action::Resume).await
    }

    /// Stop a running campaign at the next recipient boundary
    ///
    /// The status flips to paused immediately; the live task notices
    /// the token at its next iteration and banks what it sent so far.
    /// An in-flight send is never interrupted.
    ///
    /// # Errors
    /// [`CommandError::Conflict`] when the campaign is not running.
    pub async fn pause(&self, id: &CampaignId) -> Result<Campaign, CommandError> {
        let campaign = self.store.get_campaign(id).await?;
        campaign.status.guard(Action::Pause)?;

        let signalled = self.registry.cancel(id);
        debug!(campaign = %id, signalled, "pause requested");

        let paused = self
            .store
            .update_campaign(
                id,
                CampaignUpdate {
                    status: Some(CampaignStatus::Paused),
                    ..CampaignUpdate::default()
                },
            )
            .await?;

        Ok(paused)
    }

    /// Claim the registry, mark the campaign running and spawn its task
    async fn start(&self, campaign: Campaign, action: Action) -> Result<Campaign, CommandError> {
        let Some(token) = self.registry.begin(campaign.id) else {
            // Guard passed on a stale status read; a task is still live
            return Err(CommandError::Conflict(TransitionError {
                action,
                from: CampaignStatus::Running,
            }));
        };

        let update = CampaignUpdate {
            status: Some(CampaignStatus::Running),
            // Resume keeps the timestamp of the original start
            started_at: matches!(action, Action::Execute).then(Utc::now),
            ..CampaignUpdate::default()
        };

        let running = match self.store.update_campaign(&campaign.id, update).await {
            Ok(running) => running,
            Err(error) => {
                self.registry.finish(&campaign.id);
                return Err(error.into());
            }
        };

        self.spawn_run(running.clone(), token);

        Ok(running)
    }

    fn spawn_run(&self, campaign: Campaign, token: CancelToken) {
        let orchestrator = self.clone();

        tokio::spawn(async move {
            orchestrator.run_to_completion(campaign, token).await;
        });
    }

    async fn run_to_completion(&self, campaign: Campaign, token: CancelToken) {
        match self.dispatcher.run(&campaign, &token).await {
            Ok(summary) => self.finalise(&campaign, summary).await,
            Err(run_error) => {
                error!(
                    campaign = %campaign.id,
                    error = %run_error,
                    "dispatch run aborted"
                );

                if let Err(error) = self
                    .store
                    .update_campaign(
                        &campaign.id,
                        CampaignUpdate {
                            status: Some(CampaignStatus::Failed),
                            ..CampaignUpdate::default()
                        },
                    )
                    .await
                {
                    warn!(
                        campaign = %campaign.id,
                        error = %error,
                        "failed to record aborted run"
                    );
                }

                self.notifier.notify(DispatchEvent::RunFailed {
                    campaign: campaign.id,
                    reason: run_error.to_string(),
                });
            }
        }

        self.registry.finish(&campaign.id);
    }

    /// Bank a finished run's deltas and settle the final status
    ///
    /// A cancelled run re-affirms paused; a drained run completes even
    /// if its cancellation arrived after the last send.
    async fn finalise(&self, campaign: &Campaign, summary: RunSummary) {
        let update = if summary.cancelled {
            CampaignUpdate {
                status: Some(CampaignStatus::Paused),
                add_sent: summary.sent,
                add_failed: summary.failed,
                ..CampaignUpdate::default()
            }
        } else {
            CampaignUpdate {
                status: Some(CampaignStatus::Completed),
                completed_at: Some(Utc::now()),
                add_sent: summary.sent,
                add_failed: summary.failed,
                ..CampaignUpdate::default()
            }
        };

        match self.store.update_campaign(&campaign.id, update).await {
            Ok(updated) if summary.cancelled => {
                let remaining = self
                    .store
                    .pending_logs(&campaign.id)
                    .await
                    .map_or(0, |rows| rows.len());

                info!(
                    campaign = %campaign.id,
                    sent = summary.sent,
                    failed = summary.failed,
                    remaining,
                    "run paused"
                );
                self.notifier.notify(DispatchEvent::RunPaused {
                    campaign: updated.id,
                    remaining,
                });
            }
            Ok(updated) => {
                info!(
                    campaign = %campaign.id,
                    sent = updated.messages_sent,
                    failed = updated.messages_failed,
                    "run completed"
                );
                self.notifier.notify(DispatchEvent::RunCompleted {
                    campaign: updated.id,
                    sent: updated.messages_sent,
                    failed: updated.messages_failed,
                });
            }
            Err(error) => {
                warn!(
                    campaign = %campaign.id,
                    error = %error,
                    "failed to finalise run"
                );
            }
        }
    }
}
