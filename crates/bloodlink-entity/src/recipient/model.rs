//! Recipient entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::types::{GeoPoint, HospitalId, RecipientId};

use crate::blood::BloodGroup;

/// How urgently a recipient needs blood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    /// Routine.
    Low,
    /// Needed soon.
    Medium,
    /// Needed today.
    High,
    /// Life-threatening.
    Critical,
}

impl UrgencyLevel {
    /// Return the level as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a recipient is in the matching workflow. Driven externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    /// Still looking for a donor.
    Waiting,
    /// A donor has been matched.
    Matched,
    /// Transfusion completed.
    Completed,
}

/// A patient in need of blood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Unique recipient identifier.
    pub id: RecipientId,
    /// Hospital treating the recipient.
    pub hospital_id: HospitalId,
    /// Display name.
    pub name: String,
    /// ABO/Rh group.
    pub blood_group: BloodGroup,
    /// Geocoded location (usually the treating hospital).
    pub location: GeoPoint,
    /// Urgency of the need.
    pub urgency_level: UrgencyLevel,
    /// Workflow status.
    pub status: RecipientStatus,
    /// When the recipient was registered.
    pub created_at: DateTime<Utc>,
}
