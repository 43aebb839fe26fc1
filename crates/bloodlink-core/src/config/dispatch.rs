//! Alert dispatch configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::channel::DeliveryChannel;

/// Fan-out, timeout, and retry settings for alert dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Channels every audience donor is notified on.
    #[serde(default = "default_channels")]
    pub channels: Vec<DeliveryChannel>,
    /// Maximum concurrent gateway calls.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Timeout for a single gateway call in milliseconds.
    #[serde(default = "default_gateway_timeout_ms")]
    pub gateway_timeout_ms: u64,
    /// Maximum send attempts per delivery before it is marked dead.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the first retry in milliseconds; doubles per attempt.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    /// Upper bound on the retry backoff in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl DispatchConfig {
    /// Gateway call timeout as a [`Duration`].
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    /// Lease held on a delivery while a send is in flight.
    ///
    /// Twice the gateway timeout, so a crashed sender's claim lapses and the
    /// delivery becomes eligible again.
    pub fn claim_lease(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms.saturating_mul(2))
    }

    /// Backoff to wait before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let millis = self
            .base_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            concurrency: default_concurrency(),
            gateway_timeout_ms: default_gateway_timeout_ms(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_channels() -> Vec<DeliveryChannel> {
    vec![DeliveryChannel::Push, DeliveryChannel::Sms]
}

fn default_concurrency() -> usize {
    16
}

fn default_gateway_timeout_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    1_000
}

fn default_max_backoff_ms() -> u64 {
    300_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = DispatchConfig {
            base_backoff_ms: 100,
            max_backoff_ms: 1_000,
            ..DispatchConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(4), Duration::from_millis(800));
        assert_eq!(config.backoff(5), Duration::from_millis(1_000));
        assert_eq!(config.backoff(60), Duration::from_millis(1_000));
    }
}
