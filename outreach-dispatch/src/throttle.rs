use std::time::Duration;

use serde::Deserialize;

/// Pacing between consecutive sends within one dispatch run
///
/// A fixed delay, not an adaptive one: predictable pressure on the
/// Cloud API rate limit matters more here than throughput.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PacingConfig {
    /// Milliseconds to wait between consecutive recipients
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,
}

const fn default_message_delay_ms() -> u64 {
    1000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            message_delay_ms: default_message_delay_ms(),
        }
    }
}

impl PacingConfig {
    /// The inter-message delay as a [`Duration`]
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.message_delay_ms)
    }
}
