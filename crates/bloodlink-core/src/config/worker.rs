//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Retry and expiry worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between retry sweeps.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Seconds to wait for in-flight sends during shutdown.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            poll_interval_seconds: default_poll_interval(),
            drain_timeout_seconds: default_drain_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5
}

fn default_drain_timeout() -> u64 {
    30
}
