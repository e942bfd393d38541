//! The campaign API surface
//!
//! [`CampaignService`] is what an embedding application calls: every
//! operation takes the acting user, resolves their WhatsApp account, and
//! scopes all reads and writes to it. A campaign belonging to another
//! account is reported as missing, never as forbidden, so callers cannot
//! probe for foreign campaign ids.
//!
//! The service owns validation and ownership; status rules live in the
//! guard table and dispatch mechanics in the orchestrator it wraps.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use outreach_common::{
    account::Account,
    id::{CampaignId, ContactId, UserId},
    status::{Action, CampaignStatus, TransitionError},
    template::TemplateComponent,
};
use outreach_dispatch::{
    CampaignStats, CommandError, Orchestrator, PartialSetError, RecipientResolver, ResolveError,
};
use outreach_store::{
    AccountDirectory, Campaign, CampaignFilter, CampaignPage, CampaignStore, CampaignUpdate,
    LogPage, NewCampaignRecord, NewLogRecord, StoreError,
};

/// Conventional first page for listings
pub const DEFAULT_PAGE: usize = 1;

/// Conventional page size for listings
pub const DEFAULT_LIMIT: usize = 10;

/// Input for creating a campaign
#[derive(Debug, Clone, Deserialize)]
pub struct NewCampaign {
    pub title: String,
    pub template_name: String,
    /// Template language; `en_US` when not supplied
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default)]
    pub components: Vec<TemplateComponent>,
    /// Target audience; duplicates collapse to one recipient
    pub contact_ids: Vec<ContactId>,
    /// When set, the campaign is created scheduled instead of draft
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

fn default_language_code() -> String {
    "en_US".to_owned()
}

/// Partial update for a campaign; only `Some` fields change
///
/// Replacing `contact_ids` re-resolves the audience and recreates the
/// pending log rows from scratch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub template_name: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub components: Option<Vec<TemplateComponent>>,
    #[serde(default)]
    pub contact_ids: Option<Vec<ContactId>>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Rejected input, before anything touches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("campaign title must not be empty")]
    EmptyTitle,

    #[error("campaign must target at least one contact")]
    NoRecipients,

    #[error("scheduled time must be in the future")]
    ScheduleInPast,
}

/// Errors surfaced by the campaign service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The caller has no WhatsApp account connected
    #[error("no WhatsApp account connected for this user")]
    AccountNotFound,

    /// The campaign does not exist within the caller's account
    #[error("campaign {0} not found")]
    CampaignNotFound(CampaignId),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The campaign's current status forbids the operation
    #[error(transparent)]
    Conflict(#[from] TransitionError),

    /// One or more requested contacts do not exist in the account
    #[error(transparent)]
    Recipients(#[from] PartialSetError),

    /// The underlying store failed
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::CampaignNotFound(id) => Self::CampaignNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<CommandError> for ServiceError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::NotFound(id) => Self::CampaignNotFound(id),
            CommandError::Conflict(conflict) => Self::Conflict(conflict),
            CommandError::Store(store) => Self::Store(store),
        }
    }
}

impl From<ResolveError> for ServiceError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::PartialSet(partial) => Self::Recipients(partial),
            ResolveError::Store(store) => store.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Multi-tenant campaign operations
#[derive(Debug, Clone)]
pub struct CampaignService {
    store: Arc<dyn CampaignStore>,
    accounts: Arc<dyn AccountDirectory>,
    resolver: RecipientResolver,
    orchestrator: Orchestrator,
}

impl CampaignService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CampaignStore>,
        accounts: Arc<dyn AccountDirectory>,
        resolver: RecipientResolver,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            store,
            accounts,
            resolver,
            orchestrator,
        }
    }

    /// Create a campaign and its per-recipient log rows
    ///
    /// The campaign is created draft, or scheduled when `scheduled_at`
    /// is set. Recipient resolution is all-or-nothing: if any contact id
    /// is unknown within the caller's account, nothing is persisted.
    ///
    /// # Errors
    /// Validation failures, unresolvable contacts, a missing account, or
    /// a store refusal.
    pub async fn create_campaign(&self, owner: UserId, input: NewCampaign) -> Result<Campaign> {
        let account = self.require_account(owner).await?;

        if input.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        if input.contact_ids.is_empty() {
            return Err(ValidationError::NoRecipients.into());
        }
        if let Some(at) = input.scheduled_at
            && at <= Utc::now()
        {
            return Err(ValidationError::ScheduleInPast.into());
        }

        let contacts = self.resolver.resolve(account.id, &input.contact_ids).await?;

        let status = if input.scheduled_at.is_some() {
            CampaignStatus::Scheduled
        } else {
            CampaignStatus::Draft
        };

        let campaign = self
            .store
            .create_campaign(NewCampaignRecord {
                account_id: account.id,
                created_by: owner,
                title: input.title,
                template_name: input.template_name,
                language_code: input.language_code,
                components: input.components,
                status,
                scheduled_at: input.scheduled_at,
                contact_count: contacts.len(),
            })
            .await?;

        let rows = contacts
            .into_iter()
            .map(|contact| NewLogRecord {
                contact_id: contact.id,
                phone_number: contact.phone_number,
            })
            .collect();
        self.store.insert_logs(&campaign.id, rows).await?;

        Ok(campaign)
    }

    /// One page of the caller's campaigns, newest first
    ///
    /// # Errors
    /// A missing account or an unreadable store.
    pub async fn list_campaigns(
        &self,
        owner: UserId,
        page: usize,
        limit: usize,
        status: Option<CampaignStatus>,
    ) -> Result<CampaignPage> {
        let account = self.require_account(owner).await?;

        let page = self
            .store
            .list_campaigns(&CampaignFilter {
                account: account.id,
                status,
                page,
                limit,
            })
            .await?;

        Ok(page)
    }

    /// Fetch one of the caller's campaigns
    ///
    /// # Errors
    /// [`ServiceError::CampaignNotFound`] when the campaign is missing or
    /// belongs to another account.
    pub async fn get_campaign(&self, owner: UserId, id: &CampaignId) -> Result<Campaign> {
        let account = self.require_account(owner).await?;
        self.require_campaign(&account, id).await
    }

    /// Apply a partial update to a campaign
    ///
    /// Rejected while the campaign is running or completed. Replacing
    /// `contact_ids` re-resolves the audience (all-or-nothing), throws
    /// away the existing log rows, and recreates them pending.
    ///
    /// # Errors
    /// Validation failures, a status conflict, unresolvable contacts, or
    /// a missing campaign.
    pub async fn update_campaign(
        &self,
        owner: UserId,
        id: &CampaignId,
        patch: CampaignPatch,
    ) -> Result<Campaign> {
        let account = self.require_account(owner).await?;
        let campaign = self.require_campaign(&account, id).await?;
        campaign.status.guard(Action::Update)?;

        if let Some(title) = &patch.title
            && title.trim().is_empty()
        {
            return Err(ValidationError::EmptyTitle.into());
        }
        if let Some(at) = patch.scheduled_at
            && at <= Utc::now()
        {
            return Err(ValidationError::ScheduleInPast.into());
        }

        // Resolve before mutating anything, so a bad audience leaves the
        // campaign and its logs exactly as they were
        let replacement = match &patch.contact_ids {
            Some(ids) if ids.is_empty() => return Err(ValidationError::NoRecipients.into()),
            Some(ids) => Some(self.resolver.resolve(account.id, ids).await?),
            None => None,
        };

        let mut update = CampaignUpdate {
            title: patch.title,
            template_name: patch.template_name,
            language_code: patch.language_code,
            components: patch.components,
            scheduled_at: patch.scheduled_at,
            ..CampaignUpdate::default()
        };

        if let Some(contacts) = replacement {
            self.store.delete_logs(id).await?;
            let rows = contacts
                .iter()
                .map(|contact| NewLogRecord {
                    contact_id: contact.id,
                    phone_number: contact.phone_number.clone(),
                })
                .collect();
            self.store.insert_logs(id, rows).await?;
            update.contact_count = Some(contacts.len());
        }

        Ok(self.store.update_campaign(id, update).await?)
    }

    /// Delete a draft campaign and its log rows
    ///
    /// # Errors
    /// A status conflict for anything past draft, or a missing campaign.
    pub async fn delete_campaign(&self, owner: UserId, id: &CampaignId) -> Result<()> {
        let account = self.require_account(owner).await?;
        let campaign = self.require_campaign(&account, id).await?;
        campaign.status.guard(Action::Delete)?;

        self.store.delete_campaign(id).await?;
        Ok(())
    }

    /// Start sending immediately
    ///
    /// Returns the running campaign as soon as the dispatch task is
    /// spawned; delivery proceeds in the background and is observed
    /// through [`Self::campaign_stats`] and [`Self::campaign_logs`].
    ///
    /// # Errors
    /// A status conflict unless the campaign is draft or scheduled, or a
    /// missing campaign.
    pub async fn send_campaign(&self, owner: UserId, id: &CampaignId) -> Result<Campaign> {
        let account = self.require_account(owner).await?;
        self.require_campaign(&account, id).await?;

        Ok(self.orchestrator.execute(id).await?)
    }

    /// Schedule (or re-schedule) a campaign for a future time
    ///
    /// # Errors
    /// [`ValidationError::ScheduleInPast`] for a timestamp not in the
    /// future, a status conflict unless draft or scheduled, or a missing
    /// campaign.
    pub async fn schedule_campaign(
        &self,
        owner: UserId,
        id: &CampaignId,
        at: DateTime<Utc>,
    ) -> Result<Campaign> {
        let account = self.require_account(owner).await?;
        let campaign = self.require_campaign(&account, id).await?;
        campaign.status.guard(Action::Schedule)?;

        if at <= Utc::now() {
            return Err(ValidationError::ScheduleInPast.into());
        }

        let scheduled = self
            .store
            .update_campaign(
                id,
                CampaignUpdate {
                    scheduled_at: Some(at),
                    status: Some(CampaignStatus::Scheduled),
                    ..CampaignUpdate::default()
                },
            )
            .await?;

        Ok(scheduled)
    }

    /// Pause a running campaign at the next recipient boundary
    ///
    /// # Errors
    /// A status conflict unless the campaign is running, or a missing
    /// campaign.
    pub async fn pause_campaign(&self, owner: UserId, id: &CampaignId) -> Result<Campaign> {
        let account = self.require_account(owner).await?;
        self.require_campaign(&account, id).await?;

        Ok(self.orchestrator.pause(id).await?)
    }

    /// Continue a paused campaign over its remaining pending recipients
    ///
    /// # Errors
    /// A status conflict unless the campaign is paused, or a missing
    /// campaign.
    pub async fn resume_campaign(&self, owner: UserId, id: &CampaignId) -> Result<Campaign> {
        let account = self.require_account(owner).await?;
        self.require_campaign(&account, id).await?;

        Ok(self.orchestrator.resume(id).await?)
    }

    /// One page of a campaign's delivery log, newest first
    ///
    /// # Errors
    /// A missing campaign or account.
    pub async fn campaign_logs(
        &self,
        owner: UserId,
        id: &CampaignId,
        page: usize,
        limit: usize,
    ) -> Result<LogPage> {
        let account = self.require_account(owner).await?;
        self.require_campaign(&account, id).await?;

        Ok(self.store.logs_page(id, page, limit).await?)
    }

    /// Progress roll-up for one campaign
    ///
    /// # Errors
    /// A missing campaign or account.
    pub async fn campaign_stats(&self, owner: UserId, id: &CampaignId) -> Result<CampaignStats> {
        let account = self.require_account(owner).await?;
        let campaign = self.require_campaign(&account, id).await?;

        let counts = self.store.log_status_counts(id).await?;
        Ok(CampaignStats::collect(&campaign, &counts))
    }

    async fn require_account(&self, owner: UserId) -> Result<Account> {
        self.accounts
            .account_by_owner(owner)
            .await?
            .ok_or(ServiceError::AccountNotFound)
    }

    async fn require_campaign(&self, account: &Account, id: &CampaignId) -> Result<Campaign> {
        let campaign = self.store.get_campaign(id).await?;
        if campaign.account_id != account.id {
            // A foreign campaign must be indistinguishable from a missing one
            return Err(ServiceError::CampaignNotFound(*id));
        }
        Ok(campaign)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use outreach_common::{account::Account, contact::Contact, id::AccountId};
    use outreach_dispatch::{Dispatcher, NullNotifier, PacingConfig};
    use outreach_sender::MockSenderFactory;
    use outreach_store::{MemoryAccountDirectory, MemoryContactDirectory, MemoryStore};

    use super::*;

    fn account(id: u64, owner: u64) -> Account {
        Account {
            id: AccountId(id),
            owner: UserId(owner),
            phone_number_id: format!("10653035224292{id}"),
            access_token: format!("token-{id}"),
            api_version: None,
            display_name: format!("Business {id}"),
        }
    }

    fn contact(id: u64, account: u64) -> Contact {
        Contact {
            id: ContactId(id),
            account_id: AccountId(account),
            name: format!("Contact {id}"),
            phone_number: format!("91987654{id:04}"),
        }
    }

    fn service() -> CampaignService {
        let store = Arc::new(MemoryStore::new());
        let accounts = Arc::new(MemoryAccountDirectory::with_accounts([
            account(1, 1),
            account(2, 2),
        ]));
        let contacts = Arc::new(MemoryContactDirectory::with_contacts([
            contact(1, 1),
            contact(2, 1),
            contact(3, 1),
            contact(4, 2),
        ]));

        let factory = Arc::new(MockSenderFactory::new());
        let notifier = Arc::new(NullNotifier);
        let dispatcher = Dispatcher::new(
            store.clone(),
            accounts.clone(),
            factory,
            notifier.clone(),
            PacingConfig { message_delay_ms: 0 },
        );
        let orchestrator = Orchestrator::new(store.clone(), dispatcher, notifier);

        CampaignService::new(
            store,
            accounts,
            RecipientResolver::new(contacts),
            orchestrator,
        )
    }

    fn new_campaign(contact_ids: Vec<ContactId>) -> NewCampaign {
        NewCampaign {
            title: "Diwali promo".to_string(),
            template_name: "diwali_offer".to_string(),
            language_code: "en_US".to_string(),
            components: Vec::new(),
            contact_ids,
            scheduled_at: None,
        }
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let service = service();

        let error = service
            .create_campaign(
                UserId(1),
                NewCampaign {
                    title: "   ".to_string(),
                    ..new_campaign(vec![ContactId(1)])
                },
            )
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "campaign title must not be empty");
    }

    #[tokio::test]
    async fn test_empty_audience_is_rejected() {
        let service = service();

        let error = service
            .create_campaign(UserId(1), new_campaign(Vec::new()))
            .await
            .unwrap_err();

        assert_eq!(
            error.to_string(),
            "campaign must target at least one contact"
        );
    }

    #[tokio::test]
    async fn test_past_schedule_is_rejected() {
        let service = service();

        let error = service
            .create_campaign(
                UserId(1),
                NewCampaign {
                    scheduled_at: Some(Utc::now() - chrono::Duration::minutes(5)),
                    ..new_campaign(vec![ContactId(1)])
                },
            )
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "scheduled time must be in the future");
    }

    #[tokio::test]
    async fn test_unconnected_user_gets_account_not_found() {
        let service = service();

        let error = service
            .create_campaign(UserId(99), new_campaign(vec![ContactId(1)]))
            .await
            .unwrap_err();

        assert!(matches!(error, ServiceError::AccountNotFound));
        assert_eq!(
            error.to_string(),
            "no WhatsApp account connected for this user"
        );
    }

    #[tokio::test]
    async fn test_language_code_defaults_via_serde() {
        let input: NewCampaign = ron::from_str(
            r#"(
                title: "Promo",
                template_name: "promo",
                contact_ids: [1, 2],
            )"#,
        )
        .expect("Failed to parse");

        assert_eq!(input.language_code, "en_US");
        assert_eq!(input.contact_ids, vec![ContactId(1), ContactId(2)]);
    }

    #[tokio::test]
    async fn test_foreign_campaign_reads_as_missing() {
        let service = service();

        let campaign = service
            .create_campaign(UserId(1), new_campaign(vec![ContactId(1)]))
            .await
            .expect("Failed to create");

        // User 2 owns account 2; account 1's campaign must look absent
        let error = service
            .get_campaign(UserId(2), &campaign.id)
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::CampaignNotFound(id) if id == campaign.id));

        // And the owner still sees it
        let found = service
            .get_campaign(UserId(1), &campaign.id)
            .await
            .expect("Failed to get");
        assert_eq!(found.id, campaign.id);
    }

    #[tokio::test]
    async fn test_schedule_requires_future_timestamp() {
        let service = service();

        let campaign = service
            .create_campaign(UserId(1), new_campaign(vec![ContactId(1)]))
            .await
            .expect("Failed to create");

        let error = service
            .schedule_campaign(
                UserId(1),
                &campaign.id,
                Utc::now() - chrono::Duration::seconds(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            ServiceError::Validation(ValidationError::ScheduleInPast)
        ));

        let at = Utc::now() + chrono::Duration::hours(2);
        let scheduled = service
            .schedule_campaign(UserId(1), &campaign.id, at)
            .await
            .expect("Failed to schedule");
        assert_eq!(scheduled.status, CampaignStatus::Scheduled);
        assert_eq!(scheduled.scheduled_at, Some(at));
    }
}
