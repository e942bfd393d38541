use thiserror::Error;

/// Errors that can occur when handing a message to the Cloud API
#[derive(Debug, Error)]
pub enum SendError {
    /// The Graph API rejected the request
    #[error("WhatsApp API error [{code}]: {message}")]
    Api { code: i64, message: String },

    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API accepted the request but returned no message id
    #[error("response contained no message id")]
    MissingReceipt,
}

impl SendError {
    /// Operator-facing hint for well-known Graph API rejection codes
    ///
    /// 131047 is the closed re-engagement window, 131026 a malformed or
    /// unreachable recipient number, 100 a bad template parameter.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Api { code: 131047, .. } => {
                Some("re-engagement window closed; the recipient must message first or receive an approved template")
            }
            Self::Api { code: 131026, .. } => {
                Some("phone number must include the country code without a leading '+'")
            }
            Self::Api { code: 100, .. } => Some("check the template name and component parameters"),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SendError>;
