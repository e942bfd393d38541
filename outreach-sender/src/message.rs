use outreach_common::template::TemplateComponent;

/// A message ready to leave the engine
///
/// Campaign dispatch always produces `Template` messages; `Text` and
/// `Media` exist for free-form sends inside an open 24-hour session
/// window.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// A pre-approved template message
    Template {
        /// Recipient in international format without a leading '+'
        to: String,
        name: String,
        language_code: String,
        components: Vec<TemplateComponent>,
    },
    /// A free-form session message
    Text {
        to: String,
        body: String,
        preview_url: bool,
    },
    /// An image, video, audio clip, or document attachment
    Media {
        to: String,
        kind: MediaKind,
        source: MediaSource,
        caption: Option<String>,
        /// Display name shown for documents
        filename: Option<String>,
    },
}

/// Attachment kinds accepted by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

/// Where the attachment content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// An id handed back by the media upload endpoint
    Uploaded(String),
    /// A publicly reachable URL the platform fetches itself
    Link(String),
}

impl OutboundMessage {
    #[must_use]
    pub fn template(
        to: impl Into<String>,
        name: impl Into<String>,
        language_code: impl Into<String>,
        components: Vec<TemplateComponent>,
    ) -> Self {
        Self::Template {
            to: to.into(),
            name: name.into(),
            language_code: language_code.into(),
            components,
        }
    }

    #[must_use]
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Text {
            to: to.into(),
            body: body.into(),
            preview_url: false,
        }
    }

    #[must_use]
    pub fn media(to: impl Into<String>, kind: MediaKind, source: MediaSource) -> Self {
        Self::Media {
            to: to.into(),
            kind,
            source,
            caption: None,
            filename: None,
        }
    }

    /// The recipient phone number
    #[must_use]
    pub fn to(&self) -> &str {
        match self {
            Self::Template { to, .. } | Self::Text { to, .. } | Self::Media { to, .. } => to,
        }
    }
}

/// Acknowledgement returned by the Cloud API for an accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageReceipt {
    /// External message id (`wamid.*`), later matched by status webhooks
    pub message_id: String,
}
