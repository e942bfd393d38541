//! Contact and account lookup
//!
//! Campaigns reference contacts and sending credentials by id; the
//! directories answer those lookups. Contact reads are always scoped to
//! an account so one tenant can never resolve another tenant's numbers.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use outreach_common::{
    account::Account,
    contact::Contact,
    id::{AccountId, ContactId, UserId},
};

/// Read access to the contact book
#[async_trait]
pub trait ContactDirectory: Send + Sync + std::fmt::Debug {
    /// Look up contacts by id within `account`
    ///
    /// Returns only the contacts that exist and belong to `account`,
    /// preserving the order of `ids`. Callers that need the full set
    /// compare the result length against the request.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read
    async fn contacts(
        &self,
        account: AccountId,
        ids: &[ContactId],
    ) -> crate::Result<Vec<Contact>>;
}

/// Read access to sending credentials
#[async_trait]
pub trait AccountDirectory: Send + Sync + std::fmt::Debug {
    /// Look up an account by id
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read
    async fn account(&self, id: AccountId) -> crate::Result<Option<Account>>;

    /// Look up the account owned by `owner`
    ///
    /// Every exposed operation resolves the caller's account through this
    /// before touching any campaign.
    ///
    /// # Errors
    /// Returns an error if the underlying storage cannot be read
    async fn account_by_owner(&self, owner: UserId) -> crate::Result<Option<Account>>;
}

/// In-memory contact directory
///
/// Clones share the underlying map, so the service and the dispatcher can
/// hold handles to the same contact book.
#[derive(Debug, Clone, Default)]
pub struct MemoryContactDirectory {
    contacts: Arc<RwLock<HashMap<ContactId, Contact>>>,
}

impl MemoryContactDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory from an existing contact list
    #[must_use]
    pub fn with_contacts(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let directory = Self::new();
        for contact in contacts {
            directory.insert(contact);
        }
        directory
    }

    /// Add or replace a contact
    pub fn insert(&self, contact: Contact) {
        self.contacts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(contact.id, contact);
    }

    /// Current number of contacts
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Check if the directory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContactDirectory for MemoryContactDirectory {
    async fn contacts(
        &self,
        account: AccountId,
        ids: &[ContactId],
    ) -> crate::Result<Vec<Contact>> {
        let contacts = self.contacts.read()?;

        Ok(ids
            .iter()
            .filter_map(|id| contacts.get(id))
            .filter(|contact| contact.account_id == account)
            .cloned()
            .collect())
    }
}

/// In-memory account directory
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountDirectory {
    accounts: Arc<RwLock<HashMap<AccountId, Account>>>,
}

impl MemoryAccountDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the directory from an existing account list
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let directory = Self::new();
        for account in accounts {
            directory.insert(account);
        }
        directory
    }

    /// Add or replace an account
    pub fn insert(&self, account: Account) {
        self.accounts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(account.id, account);
    }
}

#[async_trait]
impl AccountDirectory for MemoryAccountDirectory {
    async fn account(&self, id: AccountId) -> crate::Result<Option<Account>> {
        Ok(self.accounts.read()?.get(&id).cloned())
    }

    async fn account_by_owner(&self, owner: UserId) -> crate::Result<Option<Account>> {
        Ok(self
            .accounts
            .read()?
            .values()
            .find(|account| account.owner == owner)
            .cloned())
    }
}
