pub mod account;
pub mod contact;
pub mod id;
pub mod logging;
pub mod status;
pub mod template;

pub use tracing;

/// Lifecycle signal broadcast to every long-running loop in the engine
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    Shutdown,
}
