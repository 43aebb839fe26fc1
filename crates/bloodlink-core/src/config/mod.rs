//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field has a default, so an empty configuration is valid.

pub mod app;
pub mod dispatch;
pub mod logging;
pub mod matching;
pub mod store;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::dispatch::DispatchConfig;
pub use self::logging::LoggingConfig;
pub use self::matching::MatchingConfig;
pub use self::store::StoreConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `BLOODLINK__*` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Match scoring settings.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Alert dispatch settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default` with the `config/{env}` overlay and
    /// environment variables prefixed with `BLOODLINK__`, then validates
    /// the result.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("BLOODLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Reject values the engine cannot operate with.
    pub fn validate(&self) -> Result<(), AppError> {
        let d = &self.dispatch;
        if d.channels.is_empty() {
            return Err(AppError::configuration(
                "dispatch.channels must name at least one channel",
            ));
        }
        if d.concurrency == 0 {
            return Err(AppError::configuration("dispatch.concurrency must be > 0"));
        }
        if d.max_attempts == 0 {
            return Err(AppError::configuration("dispatch.max_attempts must be > 0"));
        }
        if d.gateway_timeout_ms == 0 {
            return Err(AppError::configuration(
                "dispatch.gateway_timeout_ms must be > 0",
            ));
        }
        if d.base_backoff_ms > d.max_backoff_ms {
            return Err(AppError::configuration(
                "dispatch.base_backoff_ms must not exceed dispatch.max_backoff_ms",
            ));
        }

        let m = &self.matching;
        let weights = [
            ("exact_match_base", m.exact_match_base),
            ("cross_match_base", m.cross_match_base),
            ("distance_penalty_per_km", m.distance_penalty_per_km),
            ("max_distance_penalty", m.max_distance_penalty),
            ("recency_penalty_max", m.recency_penalty_max),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(AppError::configuration(format!(
                    "matching.{name} must be a non-negative number"
                )));
            }
        }
        if m.cross_match_base > m.exact_match_base {
            return Err(AppError::configuration(
                "matching.cross_match_base must not exceed matching.exact_match_base",
            ));
        }

        if self.worker.poll_interval_seconds == 0 {
            return Err(AppError::configuration(
                "worker.poll_interval_seconds must be > 0",
            ));
        }

        Ok(())
    }
}
