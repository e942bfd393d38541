//! WhatsApp Business campaign dispatch engine
//!
//! Ties the engine crates together behind two entry points:
//!
//! - [`service::CampaignService`] — the embeddable, multi-tenant API for
//!   creating, scheduling, sending, and inspecting campaigns
//! - [`controller::Outreach`] — the RON-configured daemon that runs the
//!   scheduler sweep until shutdown

pub mod controller;
pub mod service;

pub use controller::{Engine, Outreach};
pub use service::{
    CampaignPatch, CampaignService, DEFAULT_LIMIT, DEFAULT_PAGE, NewCampaign, ServiceError,
    ValidationError,
};
