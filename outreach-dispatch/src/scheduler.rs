//! Background sweep that starts scheduled campaigns when they fall due

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use outreach_common::Signal;
use outreach_store::{CampaignStore, StoreError};

use crate::{error::CommandError, orchestrator::Orchestrator};

const fn default_poll_interval_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between due-campaign sweeps
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Periodically promotes due scheduled campaigns to running
///
/// The sweep is idempotent: executing a campaign flips it out of
/// scheduled, so the next sweep no longer sees it, and a sweep that
/// loses a race to a manual execute just skips the conflict.
#[derive(Debug, Clone)]
pub struct Scheduler {
    store: Arc<dyn CampaignStore>,
    orchestrator: Orchestrator,
    config: SchedulerConfig,
}

impl Scheduler {
    #[must_use]
    pub fn new(
        store: Arc<dyn CampaignStore>,
        orchestrator: Orchestrator,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            config,
        }
    }

    /// Run one sweep: execute every scheduled campaign due at `now`
    ///
    /// Returns how many runs were started. A campaign that conflicts
    /// (already picked up elsewhere) is skipped; a campaign that fails
    /// to start is logged and does not stop the sweep.
    ///
    /// # Errors
    /// Only if the due list itself cannot be read.
    pub async fn poll_due(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let due = self.store.scheduled_due(now).await?;
        let mut started = 0;

        for campaign in due {
            match self.orchestrator.execute(&campaign.id).await {
                Ok(_) => {
                    started += 1;
                    info!(
                        campaign = %campaign.id,
                        title = %campaign.title,
                        "starting scheduled campaign"
                    );
                }
                Err(CommandError::Conflict(conflict)) => {
                    debug!(
                        campaign = %campaign.id,
                        reason = %conflict,
                        "scheduled campaign already picked up"
                    );
                }
                Err(command_error) => {
                    error!(
                        campaign = %campaign.id,
                        error = %command_error,
                        "failed to start scheduled campaign"
                    );
                }
            }
        }

        Ok(started)
    }

    /// Sweep on an interval until shutdown
    pub async fn serve(self, mut shutdown: broadcast::Receiver<Signal>) {
        let mut timer = tokio::time::interval(self.config.poll_interval());

        // Consume the immediate first tick so the first sweep happens
        // one full interval after startup
        timer.tick().await;

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    if let Err(sweep_error) = self.poll_due(Utc::now()).await {
                        error!(error = %sweep_error, "scheduled-campaign sweep failed");
                    }
                }
                sig = shutdown.recv() => {
                    match sig {
                        Ok(Signal::Shutdown) => {
                            info!("scheduler shutting down");
                        }
                        Err(recv_error) => {
                            error!(error = %recv_error, "scheduler shutdown channel error");
                        }
                    }
                    break;
                }
            }
        }
    }
}
