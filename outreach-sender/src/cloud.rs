//! WhatsApp Cloud API sender
//!
//! Posts messages to `{base}/{version}/{phone_number_id}/messages` with
//! bearer authentication. Each account gets its own [`CloudSender`] bound
//! to that account's phone number id, token, and API version.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use outreach_common::{account::Account, outgoing, template::TemplateComponent};

use crate::{
    SendError,
    message::{MediaKind, MediaSource, MessageReceipt, OutboundMessage},
    r#trait::{MessageSender, SenderFactory},
};

/// Configuration for the Cloud API client
#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    /// Graph API origin, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://graph.facebook.com".to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// A sender bound to one account's credentials
#[derive(Debug, Clone)]
pub struct CloudSender {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl CloudSender {
    /// Build a sender for `account`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(config: &CloudConfig, account: &Account) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = format!(
            "{}/{}/{}/messages",
            config.base_url.trim_end_matches('/'),
            account.api_version(),
            account.phone_number_id,
        );

        Ok(Self {
            client,
            endpoint,
            access_token: account.access_token.clone(),
        })
    }
}

#[async_trait::async_trait]
impl MessageSender for CloudSender {
    async fn send(&self, message: &OutboundMessage) -> crate::Result<MessageReceipt> {
        outgoing!("posting {} message to {}", kind(message), message.to());

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&payload(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error = response.json::<GraphErrorEnvelope>().await.map_or_else(
                |_| SendError::Api {
                    code: i64::from(status.as_u16()),
                    message: status.to_string(),
                },
                |envelope| SendError::Api {
                    code: envelope.error.code,
                    message: envelope.error.message,
                },
            );

            if let Some(hint) = error.hint() {
                outgoing!(level = WARN, "send to {} rejected: {hint}", message.to());
            }

            return Err(error);
        }

        let body: GraphResponse = response.json().await?;
        body.messages
            .into_iter()
            .next()
            .map(|message| MessageReceipt {
                message_id: message.id,
            })
            .ok_or(SendError::MissingReceipt)
    }
}

/// Builds a [`CloudSender`] per account
#[derive(Debug, Clone, Default)]
pub struct CloudSenderFactory {
    config: CloudConfig,
}

impl CloudSenderFactory {
    #[must_use]
    pub const fn new(config: CloudConfig) -> Self {
        Self { config }
    }
}

impl SenderFactory for CloudSenderFactory {
    fn sender_for(&self, account: &Account) -> crate::Result<Arc<dyn MessageSender>> {
        Ok(Arc::new(CloudSender::new(&self.config, account)?))
    }
}

const fn kind(message: &OutboundMessage) -> &'static str {
    match message {
        OutboundMessage::Template { .. } => "template",
        OutboundMessage::Text { .. } => "text",
        OutboundMessage::Media { kind, .. } => kind.as_str(),
    }
}

fn payload(message: &OutboundMessage) -> Payload<'_> {
    match message {
        OutboundMessage::Template {
            to,
            name,
            language_code,
            components,
        } => Payload::Template(TemplatePayload {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to,
            kind: "template",
            template: TemplateBody {
                name,
                language: Language {
                    code: language_code,
                },
                components,
            },
        }),
        OutboundMessage::Text {
            to,
            body,
            preview_url,
        } => Payload::Text(TextPayload {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody {
                body,
                preview_url: *preview_url,
            },
        }),
        OutboundMessage::Media {
            to,
            kind,
            source,
            caption,
            filename,
        } => {
            let (id, link) = match source {
                MediaSource::Uploaded(id) => (Some(id.as_str()), None),
                MediaSource::Link(url) => (None, Some(url.as_str())),
            };
            let body = MediaBody {
                id,
                link,
                caption: caption.as_deref(),
                // The platform only accepts a display name on documents
                filename: match kind {
                    MediaKind::Document => filename.as_deref(),
                    MediaKind::Image | MediaKind::Video | MediaKind::Audio => None,
                },
            };

            Payload::Media(MediaPayload {
                messaging_product: "whatsapp",
                recipient_type: "individual",
                to,
                kind: kind.as_str(),
                media: match kind {
                    MediaKind::Image => MediaEnvelope::Image(body),
                    MediaKind::Video => MediaEnvelope::Video(body),
                    MediaKind::Audio => MediaEnvelope::Audio(body),
                    MediaKind::Document => MediaEnvelope::Document(body),
                },
            })
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Payload<'a> {
    Template(TemplatePayload<'a>),
    Text(TextPayload<'a>),
    Media(MediaPayload<'a>),
}

#[derive(Debug, Serialize)]
struct TemplatePayload<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    template: TemplateBody<'a>,
}

#[derive(Debug, Serialize)]
struct TemplateBody<'a> {
    name: &'a str,
    language: Language<'a>,
    components: &'a [TemplateComponent],
}

#[derive(Debug, Serialize)]
struct Language<'a> {
    code: &'a str,
}

/// Session messages go without `recipient_type`
#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

#[derive(Debug, Serialize)]
struct TextBody<'a> {
    body: &'a str,
    #[serde(skip_serializing_if = "is_false")]
    preview_url: bool,
}

const fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Serialize)]
struct MediaPayload<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    media: MediaEnvelope<'a>,
}

/// The attachment object sits under a key named after its kind
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum MediaEnvelope<'a> {
    Image(MediaBody<'a>),
    Video(MediaBody<'a>),
    Audio(MediaBody<'a>),
    Document(MediaBody<'a>),
}

#[derive(Debug, Serialize)]
struct MediaBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    #[serde(default)]
    messages: Vec<GraphMessageId>,
}

#[derive(Debug, Deserialize)]
struct GraphMessageId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}
