//! Results and outcomes exchanged with the dispatcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use bloodlink_core::types::{AlertId, DeliveryChannel};
use bloodlink_entity::alert::AlertState;
use bloodlink_entity::blood::BloodGroup;
use bloodlink_entity::delivery::{AlertDelivery, DeliverySummary};
use bloodlink_entity::response::{DonorResponse, ResponseSummary};

/// What a dispatch call did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResult {
    /// The dispatched alert.
    pub alert_id: AlertId,
    /// Number of donors selected.
    pub audience_size: usize,
    /// One record per (donor, channel), as found or created.
    pub deliveries: Vec<AlertDelivery>,
    /// Send tasks started by this call. Deliveries already queued by an
    /// earlier call are not counted again.
    pub attempts_issued: usize,
}

/// Delivery progress of one alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// The alert.
    pub alert_id: AlertId,
    /// Its current state.
    pub alert_state: AlertState,
    /// Per-state counts.
    pub summary: DeliverySummary,
    /// Every delivery, ordered by donor then channel.
    pub deliveries: Vec<AlertDelivery>,
    /// Response counts against the donors reached.
    pub response_summary: ResponseSummary,
    /// Latest response of each donor who answered, ordered by donor.
    pub responses: Vec<DonorResponse>,
}

/// Who an alert would reach if dispatched now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudienceEstimate {
    /// Donors that would be selected.
    pub audience_size: usize,
    /// Those donors per blood group. Groups with no donor are omitted.
    pub by_blood_group: BTreeMap<BloodGroup, usize>,
    /// Channels each donor would be notified on.
    pub channels: Vec<DeliveryChannel>,
    /// Delivery records a dispatch would create.
    pub expected_deliveries: usize,
}

/// Asynchronous delivery result reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryOutcome {
    /// The message reached the donor.
    Delivered,
    /// The message could not be delivered.
    Failed {
        /// Gateway-supplied reason.
        reason: String,
        /// Whether retrying cannot help.
        #[serde(default)]
        permanent: bool,
    },
}

/// Why a send attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendFailure {
    /// Rate limit, timeout, or gateway outage.
    #[error("transient send failure: {0}")]
    Transient(String),
    /// Bad contact details or a refusal retrying cannot fix.
    #[error("permanent send failure: {0}")]
    Permanent(String),
}

impl SendFailure {
    /// Whether the failure is permanent.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent(_))
    }

    /// The failure reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::Transient(reason) | Self::Permanent(reason) => reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_wire_format() {
        let delivered: DeliveryOutcome = serde_json::from_str(r#"{"status":"delivered"}"#).unwrap();
        assert_eq!(delivered, DeliveryOutcome::Delivered);

        let failed: DeliveryOutcome =
            serde_json::from_str(r#"{"status":"failed","reason":"handset off"}"#).unwrap();
        assert_eq!(
            failed,
            DeliveryOutcome::Failed {
                reason: "handset off".to_string(),
                permanent: false
            }
        );
    }
}
