//! All-or-nothing contact resolution
//!
//! Campaign creation names its audience as a list of contact ids. The
//! resolver turns that list into full contact records, and refuses to
//! resolve at all if any id is unknown within the account. Without this a
//! campaign would silently target fewer recipients than the caller asked
//! for.

use std::{collections::HashSet, sync::Arc};

use thiserror::Error;

use outreach_common::{
    contact::Contact,
    id::{AccountId, ContactId},
};
use outreach_store::{ContactDirectory, StoreError};

/// One or more requested contacts do not exist within the account
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("contacts not found in this account: {}", .missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
pub struct PartialSetError {
    pub missing: Vec<ContactId>,
}

/// Errors from recipient resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    PartialSet(#[from] PartialSetError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves a campaign's target contact ids into recipient records
#[derive(Debug, Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn ContactDirectory>,
}

impl RecipientResolver {
    #[must_use]
    pub fn new(directory: Arc<dyn ContactDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve every requested contact within `account`, or fail without
    /// resolving any
    ///
    /// Duplicate ids are collapsed (first occurrence wins), so the result
    /// length is the number of distinct recipients and each contact is
    /// messaged at most once per campaign.
    ///
    /// # Errors
    /// Returns [`ResolveError::PartialSet`] naming every id that did not
    /// resolve, or a store error if the directory cannot be read.
    pub async fn resolve(
        &self,
        account: AccountId,
        ids: &[ContactId],
    ) -> Result<Vec<Contact>, ResolveError> {
        let mut seen = HashSet::with_capacity(ids.len());
        let distinct: Vec<ContactId> = ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        let contacts = self.directory.contacts(account, &distinct).await?;
        if contacts.len() != distinct.len() {
            let found: HashSet<ContactId> = contacts.iter().map(|contact| contact.id).collect();
            let missing = distinct
                .into_iter()
                .filter(|id| !found.contains(id))
                .collect();
            return Err(PartialSetError { missing }.into());
        }

        Ok(contacts)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use outreach_store::MemoryContactDirectory;

    use super::*;

    fn directory() -> Arc<MemoryContactDirectory> {
        let contacts = (1..=3).map(|id| Contact {
            id: ContactId(id),
            account_id: AccountId(1),
            name: format!("Contact {id}"),
            phone_number: format!("9198765432{id:02}"),
        });
        Arc::new(MemoryContactDirectory::with_contacts(contacts))
    }

    #[tokio::test]
    async fn test_resolves_full_set_in_request_order() {
        let resolver = RecipientResolver::new(directory());

        let contacts = resolver
            .resolve(AccountId(1), &[ContactId(3), ContactId(1), ContactId(2)])
            .await
            .expect("Failed to resolve");

        assert_eq!(
            contacts.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![ContactId(3), ContactId(1), ContactId(2)]
        );
    }

    #[tokio::test]
    async fn test_unknown_id_fails_whole_set() {
        let resolver = RecipientResolver::new(directory());

        let error = resolver
            .resolve(
                AccountId(1),
                &[ContactId(1), ContactId(2), ContactId(999)],
            )
            .await
            .unwrap_err();

        let ResolveError::PartialSet(partial) = error else {
            panic!("expected a partial-set error");
        };
        assert_eq!(partial.missing, vec![ContactId(999)]);
        assert_eq!(
            partial.to_string(),
            "contacts not found in this account: 999"
        );
    }

    #[tokio::test]
    async fn test_foreign_account_contact_counts_as_missing() {
        let resolver = RecipientResolver::new(directory());

        // Contact 1 exists, but under account 1; account 2 cannot see it
        let error = resolver
            .resolve(AccountId(2), &[ContactId(1)])
            .await
            .unwrap_err();

        assert!(matches!(error, ResolveError::PartialSet(partial) if partial.missing == vec![ContactId(1)]));
    }

    #[tokio::test]
    async fn test_duplicates_collapse_to_one_recipient() {
        let resolver = RecipientResolver::new(directory());

        let contacts = resolver
            .resolve(
                AccountId(1),
                &[ContactId(2), ContactId(2), ContactId(1), ContactId(2)],
            )
            .await
            .expect("Failed to resolve");

        assert_eq!(
            contacts.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![ContactId(2), ContactId(1)]
        );
    }

    #[tokio::test]
    async fn test_empty_request_resolves_empty() {
        let resolver = RecipientResolver::new(directory());

        let contacts = resolver
            .resolve(AccountId(1), &[])
            .await
            .expect("Failed to resolve");
        assert!(contacts.is_empty());
    }
}
