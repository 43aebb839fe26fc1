//! Notification gateway trait for the outbound SMS, push and email transport.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;
use crate::types::channel::DeliveryChannel;
use crate::types::id::{AlertId, DonorId};

/// Message handed to the gateway for one donor on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Alert being delivered.
    pub alert_id: AlertId,
    /// Donor being notified.
    pub donor_id: DonorId,
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub message: String,
    /// Urgency label (`low`, `medium`, `high`, `critical`).
    pub urgency: String,
}

/// Classification of a gateway rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionKind {
    /// Rate limit or temporary outage. Worth retrying.
    Transient,
    /// Invalid number or address. Retrying cannot succeed.
    Permanent,
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Permanent => write!(f, "permanent"),
        }
    }
}

/// Synchronous answer of the gateway to a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayResponse {
    /// The gateway took the message; delivery is confirmed later.
    Accepted,
    /// The gateway refused the message.
    Rejected {
        /// Whether retrying may help.
        kind: RejectionKind,
        /// Gateway-supplied reason.
        reason: String,
    },
}

/// Outbound notification transport.
///
/// An `Err` from [`send`](Self::send) means the call itself failed
/// (connection reset, 5xx) and is treated as transient by the dispatcher.
/// Delivery confirmation arrives asynchronously through the dispatcher's
/// delivery-result callback.
#[async_trait]
pub trait NotificationGateway: Send + Sync + std::fmt::Debug + 'static {
    /// Submit one message.
    async fn send(
        &self,
        channel: DeliveryChannel,
        contact: &str,
        payload: &AlertPayload,
    ) -> AppResult<GatewayResponse>;
}
