//! Template component bindings for Cloud API template sends
//!
//! These types serialize directly into the `template.components` section of
//! the Cloud API message payload, so the sender never rebuilds them. Each
//! parameter is a tagged variant carrying only the fields valid for its
//! kind.

use serde::{Deserialize, Serialize};

/// Section of the template a component binds parameters into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Header,
    Body,
    Footer,
    Button,
}

/// One component of a template message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    /// Button components carry a sub type (`quick_reply` or `url`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    /// Button position, serialized as a string per the Cloud API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<TemplateParameter>,
}

impl TemplateComponent {
    #[must_use]
    pub const fn body(parameters: Vec<TemplateParameter>) -> Self {
        Self {
            kind: ComponentKind::Body,
            sub_type: None,
            index: None,
            parameters,
        }
    }

    #[must_use]
    pub const fn header(parameters: Vec<TemplateParameter>) -> Self {
        Self {
            kind: ComponentKind::Header,
            sub_type: None,
            index: None,
            parameters,
        }
    }

    #[must_use]
    pub fn button(sub_type: impl Into<String>, index: usize) -> Self {
        Self {
            kind: ComponentKind::Button,
            sub_type: Some(sub_type.into()),
            index: Some(index.to_string()),
            parameters: Vec::new(),
        }
    }
}

/// A single template parameter, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateParameter {
    Text { text: String },
    Currency { currency: CurrencyValue },
    DateTime { date_time: DateTimeValue },
    Image { image: MediaLink },
    Video { video: MediaLink },
    Document { document: MediaLink },
}

impl TemplateParameter {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn image(link: impl Into<String>) -> Self {
        Self::Image {
            image: MediaLink { link: link.into() },
        }
    }
}

/// Hosted media referenced by link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaLink {
    pub link: String,
}

/// Localised currency amount; `amount_1000` is the value times 1000
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyValue {
    pub fallback_value: String,
    pub code: String,
    pub amount_1000: i64,
}

/// Localised timestamp with a fallback rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimeValue {
    pub fallback_value: String,
}
