//! Hospital entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::types::{GeoPoint, HospitalId};

/// A hospital issuing alerts. Its location centers alerts that are not
/// linked to a specific recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    /// Unique hospital identifier.
    pub id: HospitalId,
    /// Hospital name.
    pub name: String,
    /// Geocoded location.
    pub location: GeoPoint,
    /// When the hospital was registered.
    pub created_at: DateTime<Utc>,
}
