//! Provider and reconciliation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the provider API client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL for the provider REST API.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.hetzner.com/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Polling budget for eventually-visible provider resources.
///
/// With the defaults the engine waits 2s, 4s, 8s, 16s, 32s (~62s total)
/// before degrading to a placeholder record. Tests shrink the base delay to
/// milliseconds.
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    pub poll_attempts: u32,
    pub poll_base_delay: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 5,
            poll_base_delay: Duration::from_secs(2),
        }
    }
}

impl ReconcileConfig {
    /// Delay before the given zero-based poll attempt: `base * 2^attempt`.
    pub fn poll_delay(&self, attempt: u32) -> Duration {
        self.poll_base_delay * 2u32.saturating_pow(attempt)
    }
}
