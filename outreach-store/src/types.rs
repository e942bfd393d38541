//! Record types persisted by the campaign store
//!
//! `Campaign` is the aggregate row; `CampaignLog` is the per-recipient
//! delivery record (exactly one per resolved recipient, created pending).
//! The `*Update` structs are partial patches: only `Some` fields are
//! applied, counters are added, and the store bumps `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outreach_common::{
    id::{AccountId, CampaignId, ContactId, LogId, UserId},
    status::{CampaignStatus, LogStatus},
    template::TemplateComponent,
};

/// A campaign as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub account_id: AccountId,
    pub created_by: UserId,
    pub title: String,
    pub template_name: String,
    pub language_code: String,
    #[serde(default)]
    pub components: Vec<TemplateComponent>,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of resolved recipients; always equals the log row count
    pub contact_count: usize,
    /// Whole-campaign totals, accumulated across pause/resume runs
    pub messages_sent: usize,
    pub messages_failed: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a campaign row; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewCampaignRecord {
    pub account_id: AccountId,
    pub created_by: UserId,
    pub title: String,
    pub template_name: String,
    pub language_code: String,
    pub components: Vec<TemplateComponent>,
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub contact_count: usize,
}

/// Partial patch applied to a campaign row
///
/// `add_sent` / `add_failed` are deltas so concurrent finalisers never
/// clobber earlier totals.
#[derive(Debug, Clone, Default)]
pub struct CampaignUpdate {
    pub title: Option<String>,
    pub template_name: Option<String>,
    pub language_code: Option<String>,
    pub components: Option<Vec<TemplateComponent>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<CampaignStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub contact_count: Option<usize>,
    pub add_sent: usize,
    pub add_failed: usize,
}

/// A per-recipient delivery record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignLog {
    pub id: LogId,
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    /// Denormalised at creation so dispatch never re-reads the directory
    pub phone_number: String,
    pub status: LogStatus,
    /// External message id returned by the Cloud API on success
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for one log row of a bulk insert; rows are created pending
#[derive(Debug, Clone)]
pub struct NewLogRecord {
    pub contact_id: ContactId,
    pub phone_number: String,
}

/// Partial patch applied to a log row; last write wins
#[derive(Debug, Clone, Default)]
pub struct LogUpdate {
    pub status: Option<LogStatus>,
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Account-scoped listing filter
#[derive(Debug, Clone)]
pub struct CampaignFilter {
    pub account: AccountId,
    pub status: Option<CampaignStatus>,
    /// 1-based page number
    pub page: usize,
    pub limit: usize,
}

/// One page of campaigns, newest first
#[derive(Debug, Clone, Serialize)]
pub struct CampaignPage {
    pub campaigns: Vec<Campaign>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// One page of log rows, newest first
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub logs: Vec<CampaignLog>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// Per-status log row counts for one campaign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub sent: usize,
    pub failed: usize,
    pub delivered: usize,
    pub read: usize,
}

impl StatusCounts {
    /// Count one row into the bucket for `status`
    pub const fn record(&mut self, status: LogStatus) {
        match status {
            LogStatus::Pending => self.pending += 1,
            LogStatus::Sent => self.sent += 1,
            LogStatus::Failed => self.failed += 1,
            LogStatus::Delivered => self.delivered += 1,
            LogStatus::Read => self.read += 1,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.sent + self.failed + self.delivered + self.read
    }
}
