//! The dispatch loop: drains one campaign's pending queue

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use outreach_common::status::LogStatus;
use outreach_sender::{OutboundMessage, SenderFactory};
use outreach_store::{AccountDirectory, Campaign, CampaignLog, CampaignStore, LogUpdate};

use crate::{
    error::DispatchError,
    events::{DispatchEvent, Notifier},
    registry::CancelToken,
    throttle::PacingConfig,
};

/// Outcome of one dispatch run
///
/// `sent` and `failed` are this run's deltas, not campaign totals; the
/// caller banks them into the campaign row. `cancelled` is set only
/// when unattempted recipients remain, so a run whose cancellation
/// lands after the last send still counts as drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Sends a campaign's queued messages one at a time, oldest first
///
/// The dispatcher owns no campaign state: it reads the pending snapshot
/// once, settles each log row as it goes, and reports deltas back to
/// the caller. Status transitions and run exclusivity live in the
/// orchestrator.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<dyn CampaignStore>,
    accounts: Arc<dyn AccountDirectory>,
    factory: Arc<dyn SenderFactory>,
    notifier: Arc<dyn Notifier>,
    pacing: PacingConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        store: Arc<dyn CampaignStore>,
        accounts: Arc<dyn AccountDirectory>,
        factory: Arc<dyn SenderFactory>,
        notifier: Arc<dyn Notifier>,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            store,
            accounts,
            factory,
            notifier,
            pacing,
        }
    }

    /// Drain `campaign`'s pending queue until empty or cancelled
    ///
    /// One recipient's refusal never stops the run: the row is settled
    /// as failed and the loop moves on. Cancellation is honoured at
    /// iteration boundaries, so an in-flight send always keeps its
    /// outcome.
    ///
    /// # Errors
    /// Only setup failures abort the run: a missing account, a sender
    /// that cannot be built, or an unreadable queue.
    pub async fn run(
        &self,
        campaign: &Campaign,
        token: &CancelToken,
    ) -> Result<RunSummary, DispatchError> {
        let account = self
            .accounts
            .account(campaign.account_id)
            .await?
            .ok_or(DispatchError::AccountMissing(campaign.account_id))?;
        let sender = self.factory.sender_for(&account)?;

        // Single snapshot: rows queued after this point belong to a
        // later run.
        let queue = self.store.pending_logs(&campaign.id).await?;
        let total = queue.len();

        info!(
            campaign = %campaign.id,
            template = %campaign.template_name,
            pending = total,
            "starting dispatch run"
        );
        self.notifier.notify(DispatchEvent::RunStarted {
            campaign: campaign.id,
            pending: total,
        });

        let mut summary = RunSummary::default();

        for (index, log) in queue.iter().enumerate() {
            if token.is_cancelled() {
                summary.cancelled = true;
                debug!(
                    campaign = %campaign.id,
                    attempted = index,
                    remaining = total - index,
                    "dispatch run cancelled"
                );
                break;
            }

            let message = OutboundMessage::template(
                log.phone_number.clone(),
                campaign.template_name.clone(),
                campaign.language_code.clone(),
                campaign.components.clone(),
            );

            match sender.send(&message).await {
                Ok(receipt) => {
                    summary.sent += 1;
                    self.settle(
                        campaign,
                        log,
                        LogUpdate {
                            status: Some(LogStatus::Sent),
                            message_id: Some(receipt.message_id.clone()),
                            sent_at: Some(Utc::now()),
                            ..LogUpdate::default()
                        },
                    )
                    .await;
                    self.notifier.notify(DispatchEvent::MessageSent {
                        campaign: campaign.id,
                        log: log.id,
                        message_id: receipt.message_id,
                    });
                }
                Err(error) => {
                    summary.failed += 1;
                    let reason = error.to_string();
                    warn!(
                        campaign = %campaign.id,
                        recipient = %log.phone_number,
                        error = %reason,
                        "recipient send failed"
                    );
                    self.settle(
                        campaign,
                        log,
                        LogUpdate {
                            status: Some(LogStatus::Failed),
                            error_message: Some(reason.clone()),
                            ..LogUpdate::default()
                        },
                    )
                    .await;
                    self.notifier.notify(DispatchEvent::MessageFailed {
                        campaign: campaign.id,
                        log: log.id,
                        reason,
                    });
                }
            }

            // Throttle between recipients, never after the last one; a
            // pause request cuts the wait short.
            if index + 1 < total {
                tokio::select! {
                    () = tokio::time::sleep(self.pacing.delay()) => {}
                    () = token.cancelled() => {}
                }
            }
        }

        Ok(summary)
    }

    /// Record one recipient's outcome on its log row
    ///
    /// The send already happened, so a store hiccup here must not fail
    /// the run; the row is left pending and the miss is logged.
    async fn settle(&self, campaign: &Campaign, log: &CampaignLog, update: LogUpdate) {
        if let Err(error) = self.store.update_log(&campaign.id, &log.id, update).await {
            warn!(
                campaign = %campaign.id,
                log = %log.id,
                error = %error,
                "failed to settle recipient outcome"
            );
        }
    }
}
