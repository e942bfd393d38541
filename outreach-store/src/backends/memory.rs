use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use outreach_common::{
    id::{CampaignId, LogId},
    status::{CampaignStatus, LogStatus},
};

use crate::{
    StoreError,
    r#trait::CampaignStore,
    types::{
        Campaign, CampaignFilter, CampaignLog, CampaignPage, CampaignUpdate, LogPage, LogUpdate,
        NewCampaignRecord, NewLogRecord, StatusCounts,
    },
};

/// In-memory campaign store implementation
///
/// Campaigns live in a `HashMap` protected by an `RwLock`; log rows are
/// kept in one insertion-ordered `Vec` per campaign, which is what makes
/// the FIFO dispatch order a structural guarantee rather than a timestamp
/// sort (bulk inserts land within the same millisecond, so neither
/// `created_at` nor ULID order can be trusted for sequencing).
///
/// # Capacity Management
/// An optional capacity bounds the number of campaigns. When the bound is
/// reached, `create_campaign` fails with `StoreError::Capacity`.
///
/// # Concurrency
/// Uses an `RwLock` for interior mutability; writes are last-write-wins.
/// Clones share the underlying state, so handing `MemoryStore` clones to
/// the service, dispatcher, and scheduler observes one set of records.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    /// Maximum number of campaigns to store (None = unlimited)
    capacity: Option<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    campaigns: HashMap<CampaignId, Campaign>,
    /// Creation order of campaigns; newest-first listings iterate this in
    /// reverse
    order: Vec<CampaignId>,
    /// Log rows per campaign in insertion (FIFO) order
    logs: HashMap<CampaignId, Vec<CampaignLog>>,
}

impl MemoryStore {
    /// Create a new empty store with unlimited capacity
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: None,
        }
    }

    /// Create a new store bounded to `capacity` campaigns
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: Some(capacity),
        }
    }

    /// Current number of campaigns
    ///
    /// Recovers gracefully if the lock is poisoned by accessing the
    /// underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .campaigns
            .len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the configured capacity (None = unlimited)
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_campaign_update(campaign: &mut Campaign, update: CampaignUpdate, now: DateTime<Utc>) {
    if let Some(title) = update.title {
        campaign.title = title;
    }
    if let Some(template_name) = update.template_name {
        campaign.template_name = template_name;
    }
    if let Some(language_code) = update.language_code {
        campaign.language_code = language_code;
    }
    if let Some(components) = update.components {
        campaign.components = components;
    }
    if let Some(scheduled_at) = update.scheduled_at {
        campaign.scheduled_at = Some(scheduled_at);
    }
    if let Some(status) = update.status {
        campaign.status = status;
    }
    if let Some(started_at) = update.started_at {
        campaign.started_at = Some(started_at);
    }
    if let Some(completed_at) = update.completed_at {
        campaign.completed_at = Some(completed_at);
    }
    if let Some(contact_count) = update.contact_count {
        campaign.contact_count = contact_count;
    }
    campaign.messages_sent += update.add_sent;
    campaign.messages_failed += update.add_failed;
    campaign.updated_at = now;
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn create_campaign(&self, record: NewCampaignRecord) -> crate::Result<Campaign> {
        let mut inner = self.inner.write()?;

        if let Some(cap) = self.capacity
            && inner.campaigns.len() >= cap
        {
            return Err(StoreError::Capacity { limit: cap });
        }

        let now = Utc::now();
        let campaign = Campaign {
            id: CampaignId::generate(),
            account_id: record.account_id,
            created_by: record.created_by,
            title: record.title,
            template_name: record.template_name,
            language_code: record.language_code,
            components: record.components,
            status: record.status,
            scheduled_at: record.scheduled_at,
            started_at: None,
            completed_at: None,
            contact_count: record.contact_count,
            messages_sent: 0,
            messages_failed: 0,
            created_at: now,
            updated_at: now,
        };

        inner.campaigns.insert(campaign.id, campaign.clone());
        inner.order.push(campaign.id);
        inner.logs.insert(campaign.id, Vec::new());

        Ok(campaign)
    }

    async fn get_campaign(&self, id: &CampaignId) -> crate::Result<Campaign> {
        self.inner
            .read()?
            .campaigns
            .get(id)
            .cloned()
            .ok_or(StoreError::CampaignNotFound(*id))
    }

    async fn list_campaigns(&self, filter: &CampaignFilter) -> crate::Result<CampaignPage> {
        let inner = self.inner.read()?;

        // Newest first: creation order reversed
        let matching: Vec<&Campaign> = inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.campaigns.get(id))
            .filter(|campaign| {
                campaign.account_id == filter.account
                    && filter.status.is_none_or(|status| campaign.status == status)
            })
            .collect();

        let total = matching.len();
        let limit = filter.limit.max(1);
        let page = filter.page.max(1);
        let campaigns = matching
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .cloned()
            .collect();

        Ok(CampaignPage {
            campaigns,
            total,
            page,
            limit,
        })
    }

    async fn update_campaign(
        &self,
        id: &CampaignId,
        update: CampaignUpdate,
    ) -> crate::Result<Campaign> {
        let mut inner = self.inner.write()?;
        let campaign = inner
            .campaigns
            .get_mut(id)
            .ok_or(StoreError::CampaignNotFound(*id))?;

        apply_campaign_update(campaign, update, Utc::now());

        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, id: &CampaignId) -> crate::Result<()> {
        let mut inner = self.inner.write()?;
        inner
            .campaigns
            .remove(id)
            .ok_or(StoreError::CampaignNotFound(*id))?;
        inner.order.retain(|existing| existing != id);
        inner.logs.remove(id);
        Ok(())
    }

    async fn insert_logs(
        &self,
        campaign_id: &CampaignId,
        rows: Vec<NewLogRecord>,
    ) -> crate::Result<Vec<CampaignLog>> {
        let mut inner = self.inner.write()?;
        if !inner.campaigns.contains_key(campaign_id) {
            return Err(StoreError::CampaignNotFound(*campaign_id));
        }

        let now = Utc::now();
        let created: Vec<CampaignLog> = rows
            .into_iter()
            .map(|row| CampaignLog {
                id: LogId::generate(),
                campaign_id: *campaign_id,
                contact_id: row.contact_id,
                phone_number: row.phone_number,
                status: LogStatus::Pending,
                message_id: None,
                error_message: None,
                sent_at: None,
                created_at: now,
                updated_at: now,
            })
            .collect();

        inner
            .logs
            .entry(*campaign_id)
            .or_default()
            .extend(created.iter().cloned());

        Ok(created)
    }

    async fn delete_logs(&self, campaign_id: &CampaignId) -> crate::Result<usize> {
        let mut inner = self.inner.write()?;
        if !inner.campaigns.contains_key(campaign_id) {
            return Err(StoreError::CampaignNotFound(*campaign_id));
        }

        let removed = inner
            .logs
            .insert(*campaign_id, Vec::new())
            .map_or(0, |rows| rows.len());
        Ok(removed)
    }

    async fn pending_logs(&self, campaign_id: &CampaignId) -> crate::Result<Vec<CampaignLog>> {
        let inner = self.inner.read()?;
        let rows = inner
            .logs
            .get(campaign_id)
            .ok_or(StoreError::CampaignNotFound(*campaign_id))?;

        Ok(rows
            .iter()
            .filter(|log| log.status == LogStatus::Pending)
            .cloned()
            .collect())
    }

    async fn update_log(
        &self,
        campaign_id: &CampaignId,
        log_id: &LogId,
        update: LogUpdate,
    ) -> crate::Result<CampaignLog> {
        let mut inner = self.inner.write()?;
        let rows = inner
            .logs
            .get_mut(campaign_id)
            .ok_or(StoreError::CampaignNotFound(*campaign_id))?;
        let log = rows
            .iter_mut()
            .find(|log| log.id == *log_id)
            .ok_or(StoreError::LogNotFound(*log_id))?;

        if let Some(status) = update.status {
            log.status = status;
        }
        if let Some(message_id) = update.message_id {
            log.message_id = Some(message_id);
        }
        if let Some(error_message) = update.error_message {
            log.error_message = Some(error_message);
        }
        if let Some(sent_at) = update.sent_at {
            log.sent_at = Some(sent_at);
        }
        log.updated_at = Utc::now();

        Ok(log.clone())
    }

    async fn logs_page(
        &self,
        campaign_id: &CampaignId,
        page: usize,
        limit: usize,
    ) -> crate::Result<LogPage> {
        let inner = self.inner.read()?;
        let rows = inner
            .logs
            .get(campaign_id)
            .ok_or(StoreError::CampaignNotFound(*campaign_id))?;

        let total = rows.len();
        let limit = limit.max(1);
        let page = page.max(1);
        let logs = rows
            .iter()
            .rev()
            .skip((page - 1) * limit)
            .take(limit)
            .cloned()
            .collect();

        Ok(LogPage {
            logs,
            total,
            page,
            limit,
        })
    }

    async fn log_status_counts(&self, campaign_id: &CampaignId) -> crate::Result<StatusCounts> {
        let inner = self.inner.read()?;
        let rows = inner
            .logs
            .get(campaign_id)
            .ok_or(StoreError::CampaignNotFound(*campaign_id))?;

        let mut counts = StatusCounts::default();
        for log in rows {
            counts.record(log.status);
        }
        Ok(counts)
    }

    async fn scheduled_due(&self, now: DateTime<Utc>) -> crate::Result<Vec<Campaign>> {
        let inner = self.inner.read()?;

        let mut due: Vec<Campaign> = inner
            .campaigns
            .values()
            .filter(|campaign| {
                campaign.status == CampaignStatus::Scheduled
                    && campaign.scheduled_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();

        // Earliest due first; ids break ties deterministically
        due.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(due)
    }
}
