use serde::{Deserialize, Serialize};

use crate::id::{AccountId, UserId};

/// Graph API version the campaign send path targets when an account does
/// not pin its own
pub const DEFAULT_API_VERSION: &str = "v18.0";

/// WhatsApp Business account credentials
///
/// The bundle a per-account sender is constructed from. Every account is
/// owned by exactly one user; ownership checks resolve the caller's
/// account first and then require the campaign to belong to it. A
/// campaign whose account has disappeared by dispatch time fails the
/// whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// The user this account belongs to
    pub owner: UserId,
    /// Cloud API phone number id the account sends from
    pub phone_number_id: String,
    pub access_token: String,
    /// Graph API version override; [`DEFAULT_API_VERSION`] when absent
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

impl Account {
    /// The Graph API version this account sends against
    #[must_use]
    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }
}
