use async_trait::async_trait;
use chrono::{DateTime, Utc};

use outreach_common::id::{CampaignId, LogId};

use crate::{
    error::Result,
    types::{
        Campaign, CampaignFilter, CampaignLog, CampaignPage, CampaignUpdate, LogPage, LogUpdate,
        NewCampaignRecord, NewLogRecord, StatusCounts,
    },
};

/// The campaign store contract
///
/// The store is the single source of truth for campaigns and their
/// per-recipient logs. Writes are last-write-wins; concurrency control for
/// dispatch (one live run per campaign) is the run registry's job, not the
/// store's.
#[async_trait]
pub trait CampaignStore: Send + Sync + std::fmt::Debug {
    /// Persist a new campaign row, assigning its id and timestamps
    ///
    /// # Errors
    /// If the backend cannot accept the row (e.g. capacity reached)
    async fn create_campaign(&self, record: NewCampaignRecord) -> Result<Campaign>;

    /// Fetch one campaign
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when no such row exists
    async fn get_campaign(&self, id: &CampaignId) -> Result<Campaign>;

    /// List an account's campaigns, newest first, with the total
    /// matching count
    ///
    /// # Errors
    /// If the backend cannot be read
    async fn list_campaigns(&self, filter: &CampaignFilter) -> Result<CampaignPage>;

    /// Apply a partial patch and return the updated row
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when no such row exists
    async fn update_campaign(&self, id: &CampaignId, update: CampaignUpdate) -> Result<Campaign>;

    /// Remove a campaign and all of its log rows
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when no such row exists
    async fn delete_campaign(&self, id: &CampaignId) -> Result<()>;

    /// Bulk-insert pending log rows for a campaign, preserving input order
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when the campaign does not exist
    async fn insert_logs(
        &self,
        campaign_id: &CampaignId,
        rows: Vec<NewLogRecord>,
    ) -> Result<Vec<CampaignLog>>;

    /// Remove every log row of a campaign, returning how many were removed
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when the campaign does not exist
    async fn delete_logs(&self, campaign_id: &CampaignId) -> Result<usize>;

    /// All pending log rows of a campaign in creation (FIFO) order
    ///
    /// This is the dispatch snapshot source: the run loop calls it once
    /// and never re-reads.
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when the campaign does not exist
    async fn pending_logs(&self, campaign_id: &CampaignId) -> Result<Vec<CampaignLog>>;

    /// Patch one log row and return it
    ///
    /// # Errors
    /// When the campaign or the log row does not exist
    async fn update_log(
        &self,
        campaign_id: &CampaignId,
        log_id: &LogId,
        update: LogUpdate,
    ) -> Result<CampaignLog>;

    /// One page of a campaign's log rows, newest first, with the total
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when the campaign does not exist
    async fn logs_page(&self, campaign_id: &CampaignId, page: usize, limit: usize)
    -> Result<LogPage>;

    /// Per-status counts over a campaign's log rows
    ///
    /// # Errors
    /// `StoreError::CampaignNotFound` when the campaign does not exist
    async fn log_status_counts(&self, campaign_id: &CampaignId) -> Result<StatusCounts>;

    /// Scheduled campaigns whose `scheduled_at` is at or before `now`
    ///
    /// # Errors
    /// If the backend cannot be read
    async fn scheduled_due(&self, now: DateTime<Utc>) -> Result<Vec<Campaign>>;
}
