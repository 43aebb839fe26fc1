//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Whether the record store answered its health check.
    pub store: bool,
    /// Send tasks currently running.
    pub in_flight_sends: usize,
    /// Process start time.
    pub started_at: DateTime<Utc>,
    /// Seconds since start.
    pub uptime_seconds: i64,
}
