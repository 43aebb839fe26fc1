//! Alert delivery entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::types::{AlertId, DeliveryChannel, DeliveryId, DonorId};

use super::state::DeliveryState;

/// One notification of one donor on one channel for one alert.
///
/// The (alert_id, donor_id, channel) tuple is unique and is the
/// idempotency key; the record is created once and then only moved
/// through [`DeliveryState`] transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDelivery {
    /// Unique delivery identifier.
    pub id: DeliveryId,
    /// Alert being delivered.
    pub alert_id: AlertId,
    /// Donor being notified.
    pub donor_id: DonorId,
    /// Transport.
    pub channel: DeliveryChannel,
    /// Current state.
    pub state: DeliveryState,
    /// Number of send attempts whose outcome has been recorded.
    pub attempt_count: u32,
    /// When the last attempt was issued.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// When the gateway accepted the message.
    pub sent_at: Option<DateTime<Utc>>,
    /// When delivery was confirmed.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Earliest time the next attempt may be issued.
    pub next_attempt_at: Option<DateTime<Utc>>,
    /// A sender holds this delivery until this time.
    pub claimed_until: Option<DateTime<Utc>>,
    /// Times a sender has claimed this delivery; identifies the current claim.
    #[serde(default)]
    pub claim_count: u32,
    /// Reason of the most recent failure.
    pub last_error: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl AlertDelivery {
    /// Create a fresh `Pending` delivery.
    pub fn new(
        alert_id: AlertId,
        donor_id: DonorId,
        channel: DeliveryChannel,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DeliveryId::new(),
            alert_id,
            donor_id,
            channel,
            state: DeliveryState::Pending,
            attempt_count: 0,
            last_attempt_at: None,
            sent_at: None,
            delivered_at: None,
            next_attempt_at: None,
            claimed_until: None,
            claim_count: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a sender may claim this delivery at `now`.
    ///
    /// Fresh `Pending` records and `Failed` records waiting out their
    /// backoff are both claimable once no other sender holds them.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.state, DeliveryState::Pending | DeliveryState::Failed)
            && self.next_attempt_at.is_none_or(|t| t <= now)
            && self.claimed_until.is_none_or(|t| t <= now)
    }
}

/// Per-state counts of an alert's deliveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySummary {
    /// Total records.
    pub total: usize,
    /// Records in `Pending`.
    pub pending: usize,
    /// Records in `Sent`.
    pub sent: usize,
    /// Records in `Delivered`.
    pub delivered: usize,
    /// Records in `Failed`.
    pub failed: usize,
    /// Records in `Dead`.
    pub dead: usize,
}

impl DeliverySummary {
    /// Tally a set of deliveries.
    pub fn from_deliveries<'a>(deliveries: impl IntoIterator<Item = &'a AlertDelivery>) -> Self {
        let mut summary = Self::default();
        for d in deliveries {
            summary.total += 1;
            match d.state {
                DeliveryState::Pending => summary.pending += 1,
                DeliveryState::Sent => summary.sent += 1,
                DeliveryState::Delivered => summary.delivered += 1,
                DeliveryState::Failed => summary.failed += 1,
                DeliveryState::Dead => summary.dead += 1,
            }
        }
        summary
    }
}
