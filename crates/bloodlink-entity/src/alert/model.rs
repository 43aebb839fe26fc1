//! Alert entity model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::traits::gateway::AlertPayload;
use bloodlink_core::types::{AlertId, DonorId, HospitalId, RecipientId};

use crate::blood::BloodGroup;
use crate::recipient::UrgencyLevel;

use super::state::AlertState;

/// Caller-supplied fields for a new alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDefinition {
    /// Recipient the alert is raised for, if any.
    pub recipient_id: Option<RecipientId>,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Urgency of the request.
    pub urgency_level: UrgencyLevel,
    /// Blood groups to target; empty means all groups.
    #[serde(default)]
    pub target_blood_groups: BTreeSet<BloodGroup>,
    /// Radius around the recipient (or hospital) in kilometres.
    pub max_distance_km: f64,
    /// When the alert stops being dispatchable.
    pub expires_at: DateTime<Utc>,
    /// Create the alert in `Draft` instead of `Active`.
    #[serde(default)]
    pub draft: bool,
}

/// Radius used by an audience preview that names none.
pub const DEFAULT_REACH_RADIUS_KM: f64 = 50.0;

/// The part of an alert that decides who it reaches.
///
/// Used both to select a dispatched alert's audience and to preview the
/// reach of an alert that has not been created yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceCriteria {
    /// Recipient whose group donors must be compatible with, if any.
    #[serde(default)]
    pub recipient_id: Option<RecipientId>,
    /// Blood groups to target; empty means all groups.
    #[serde(default)]
    pub target_blood_groups: BTreeSet<BloodGroup>,
    /// Radius around the recipient (or hospital) in kilometres.
    #[serde(default = "default_reach_radius_km")]
    pub max_distance_km: f64,
}

fn default_reach_radius_km() -> f64 {
    DEFAULT_REACH_RADIUS_KM
}

impl AudienceCriteria {
    /// Whether donors of `group` are targeted.
    pub fn targets(&self, group: BloodGroup) -> bool {
        self.target_blood_groups.is_empty() || self.target_blood_groups.contains(&group)
    }
}

impl From<&AlertDefinition> for AudienceCriteria {
    fn from(definition: &AlertDefinition) -> Self {
        Self {
            recipient_id: definition.recipient_id,
            target_blood_groups: definition.target_blood_groups.clone(),
            max_distance_km: definition.max_distance_km,
        }
    }
}

impl From<&Alert> for AudienceCriteria {
    fn from(alert: &Alert) -> Self {
        Self {
            recipient_id: alert.recipient_id,
            target_blood_groups: alert.target_blood_groups.clone(),
            max_distance_km: alert.max_distance_km,
        }
    }
}

/// An urgent request broadcast to a donor audience.
///
/// Owned by the issuing hospital. Only `state` changes after activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique alert identifier.
    pub id: AlertId,
    /// Recipient the alert is raised for, if any.
    pub recipient_id: Option<RecipientId>,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Urgency of the request.
    pub urgency_level: UrgencyLevel,
    /// Blood groups to target; empty means all groups.
    pub target_blood_groups: BTreeSet<BloodGroup>,
    /// Audience radius in kilometres.
    pub max_distance_km: f64,
    /// Issuing hospital.
    pub hospital_id: HospitalId,
    /// Lifecycle state.
    pub state: AlertState,
    /// When the alert was created.
    pub created_at: DateTime<Utc>,
    /// When the alert stops being dispatchable.
    pub expires_at: DateTime<Utc>,
    /// When the state last changed.
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Check if the alert has passed its expiry time at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Build the gateway payload for one donor.
    pub fn payload_for(&self, donor_id: DonorId) -> AlertPayload {
        AlertPayload {
            alert_id: self.id,
            donor_id,
            title: self.title.clone(),
            message: self.message.clone(),
            urgency: self.urgency_level.as_str().to_string(),
        }
    }
}
