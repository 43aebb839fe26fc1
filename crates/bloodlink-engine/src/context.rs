//! Request context carrying the calling hospital.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::types::HospitalId;

/// Context for the current request.
///
/// Passed into every service method so that each operation knows *which*
/// hospital is acting. There is no process-wide "current hospital".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The hospital on whose behalf the call is made.
    pub hospital_id: HospitalId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(hospital_id: HospitalId) -> Self {
        Self {
            hospital_id,
            request_time: Utc::now(),
        }
    }

    /// Returns whether the calling hospital owns a resource.
    pub fn owns(&self, owner: HospitalId) -> bool {
        self.hospital_id == owner
    }
}
