//! Campaign dispatch engine
//!
//! The pieces that move a campaign from a pile of pending log rows to a
//! terminal status:
//!
//! - [`resolver`] — all-or-nothing contact resolution at creation time
//! - [`engine`] — the rate-limited FIFO send loop for one run
//! - [`orchestrator`] — state transitions, run spawning, finalisation
//! - [`scheduler`] — the periodic sweep that starts due campaigns
//! - [`registry`] — per-campaign cancellation and the single-writer guard
//! - [`stats`] — the read-side roll-up callers poll for progress
//!
//! A dispatch run is fire-and-forget: `execute` returns once the run is
//! spawned, and progress is observed through stats and logs.

pub mod engine;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod stats;
pub mod throttle;

pub use engine::{Dispatcher, RunSummary};
pub use error::{CommandError, DispatchError};
pub use events::{DispatchEvent, Notifier, NullNotifier};
pub use orchestrator::Orchestrator;
pub use registry::{CancelToken, RunRegistry};
pub use resolver::{PartialSetError, RecipientResolver, ResolveError};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use stats::CampaignStats;
pub use throttle::PacingConfig;
