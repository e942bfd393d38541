use serde::{Deserialize, Serialize};

use crate::id::{AccountId, ContactId};

/// A recipient known to the surrounding platform
///
/// Contacts are owned by the contact directory; the engine only ever reads
/// them during recipient resolution and denormalises the phone number onto
/// the per-recipient log row at campaign creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    /// Account the contact belongs to; resolution is scoped by this
    pub account_id: AccountId,
    pub name: String,
    /// E.164-style number without the leading `+`, as the Cloud API expects
    pub phone_number: String,
}
