//! Gateway that writes alerts to the log instead of a provider.

use async_trait::async_trait;
use tracing::info;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::gateway::{AlertPayload, GatewayResponse, NotificationGateway};
use bloodlink_core::types::DeliveryChannel;

/// Accepts every message and logs it.
///
/// Used when no SMS/push/email provider is wired in, e.g. local runs.
#[derive(Debug, Clone, Default)]
pub struct LoggingGateway;

impl LoggingGateway {
    /// Creates a logging gateway.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationGateway for LoggingGateway {
    async fn send(
        &self,
        channel: DeliveryChannel,
        contact: &str,
        payload: &AlertPayload,
    ) -> AppResult<GatewayResponse> {
        info!(
            channel = %channel,
            contact,
            alert_id = %payload.alert_id,
            donor_id = %payload.donor_id,
            urgency = %payload.urgency,
            title = %payload.title,
            "Notification accepted by logging gateway"
        );
        Ok(GatewayResponse::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink_core::types::{AlertId, DonorId};

    #[tokio::test]
    async fn test_accepts_everything() {
        let payload = AlertPayload {
            alert_id: AlertId::new(),
            donor_id: DonorId::new(),
            title: "t".to_string(),
            message: "m".to_string(),
            urgency: "critical".to_string(),
        };
        let response = LoggingGateway::new()
            .send(DeliveryChannel::Sms, "+94770000000", &payload)
            .await
            .unwrap();
        assert_eq!(response, GatewayResponse::Accepted);
    }
}
