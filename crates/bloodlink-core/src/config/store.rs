//! Record store configuration.

use serde::{Deserialize, Serialize};

/// Record store backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store provider type. Only `"memory"` is built in.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Initial capacity hint for the in-memory store.
    #[serde(default = "default_initial_capacity")]
    pub initial_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            initial_capacity: default_initial_capacity(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_initial_capacity() -> usize {
    1024
}
