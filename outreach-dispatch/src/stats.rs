//! Per-campaign delivery statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

use outreach_common::{id::CampaignId, status::CampaignStatus};
use outreach_store::{Campaign, StatusCounts};

/// Snapshot of one campaign's delivery progress
///
/// Combines the campaign row's accumulated totals with live log-row
/// tallies. `pending`/`sent`/`failed`/`delivered`/`read` count log
/// rows; `messages_sent`/`messages_failed` are what the runs banked
/// and stay stable even if rows are later rewritten by receipt
/// ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignStats {
    pub campaign_id: CampaignId,
    pub title: String,
    pub status: CampaignStatus,
    pub contact_count: usize,
    pub messages_sent: usize,
    pub messages_failed: usize,
    pub pending: usize,
    pub sent: usize,
    pub failed: usize,
    pub delivered: usize,
    pub read: usize,
    /// Share of recipients sent so far, as a percentage rounded to two
    /// decimals; 0.0 for a campaign with no recipients
    pub success_rate: f64,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CampaignStats {
    #[must_use]
    pub fn collect(campaign: &Campaign, counts: &StatusCounts) -> Self {
        Self {
            campaign_id: campaign.id,
            title: campaign.title.clone(),
            status: campaign.status,
            contact_count: campaign.contact_count,
            messages_sent: campaign.messages_sent,
            messages_failed: campaign.messages_failed,
            pending: counts.pending,
            sent: counts.sent,
            failed: counts.failed,
            delivered: counts.delivered,
            read: counts.read,
            success_rate: success_rate(campaign.messages_sent, campaign.contact_count),
            scheduled_at: campaign.scheduled_at,
            started_at: campaign.started_at,
            completed_at: campaign.completed_at,
        }
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "recipient counts are far below 2^52"
)]
fn success_rate(sent: usize, contacts: usize) -> f64 {
    if contacts == 0 {
        return 0.0;
    }

    let rate = (sent as f64 / contacts as f64) * 100.0;
    (rate * 100.0).round() / 100.0
}
