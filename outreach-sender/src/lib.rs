//! Message sending boundary
//!
//! Everything that leaves the engine goes through a [`MessageSender`].
//! The production implementation talks to the WhatsApp Cloud API over
//! HTTPS; tests swap in [`MockSender`] to capture traffic instead.
//!
//! Senders are built per account by a [`SenderFactory`], since each
//! tenant carries its own phone number id and access token.

pub mod cloud;
pub mod error;
pub mod message;
pub mod mock;
pub mod r#trait;

pub use cloud::{CloudConfig, CloudSender, CloudSenderFactory};
pub use error::{Result, SendError};
pub use message::{MediaKind, MediaSource, MessageReceipt, OutboundMessage};
pub use mock::{MockSender, MockSenderFactory};
pub use r#trait::{MessageSender, SenderFactory};
