//! Record key builders for all BloodLink entities.
//!
//! Centralising key construction keeps the prefix layout in one place:
//! every entity type lives under its own prefix so it can be listed with a
//! single prefix scan, and delivery keys embed the idempotency tuple.

use bloodlink_core::types::{
    AlertId, DeliveryChannel, DonorId, HospitalId, MatchId, RecipientId,
};

/// Prefix applied to all BloodLink keys.
const PREFIX: &str = "bloodlink";

// ── Directory keys ─────────────────────────────────────────

/// Key of a donor record.
pub fn donor(id: DonorId) -> String {
    format!("{PREFIX}:donor:{id}")
}

/// Prefix covering every donor.
pub fn donors() -> String {
    format!("{PREFIX}:donor:")
}

/// Key of a recipient record.
pub fn recipient(id: RecipientId) -> String {
    format!("{PREFIX}:recipient:{id}")
}

/// Prefix covering every recipient.
pub fn recipients() -> String {
    format!("{PREFIX}:recipient:")
}

/// Key of a hospital record.
pub fn hospital(id: HospitalId) -> String {
    format!("{PREFIX}:hospital:{id}")
}

// ── Alert keys ─────────────────────────────────────────────

/// Key of an alert record.
pub fn alert(id: AlertId) -> String {
    format!("{PREFIX}:alert:{id}")
}

/// Prefix covering every alert.
pub fn alerts() -> String {
    format!("{PREFIX}:alert:")
}

// ── Delivery keys ──────────────────────────────────────────

/// Key of the delivery for one (alert, donor, channel) tuple.
pub fn delivery(alert_id: AlertId, donor_id: DonorId, channel: DeliveryChannel) -> String {
    format!("{PREFIX}:delivery:{alert_id}:{donor_id}:{channel}")
}

/// Prefix covering every delivery of one alert.
pub fn alert_deliveries(alert_id: AlertId) -> String {
    format!("{PREFIX}:delivery:{alert_id}:")
}

// ── Response keys ──────────────────────────────────────────

/// Key of one donor's response to one alert.
pub fn response(alert_id: AlertId, donor_id: DonorId) -> String {
    format!("{PREFIX}:response:{alert_id}:{donor_id}")
}

/// Prefix covering every response to one alert.
pub fn alert_responses(alert_id: AlertId) -> String {
    format!("{PREFIX}:response:{alert_id}:")
}

// ── Match keys ─────────────────────────────────────────────

/// Key of an audited match.
pub fn matched(recipient_id: RecipientId, match_id: MatchId) -> String {
    format!("{PREFIX}:match:{recipient_id}:{match_id}")
}

/// Prefix covering every audited match of one recipient.
pub fn recipient_matches(recipient_id: RecipientId) -> String {
    format!("{PREFIX}:match:{recipient_id}:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_delivery_key() {
        let alert = AlertId::from_uuid(Uuid::nil());
        let donor = DonorId::from_uuid(Uuid::nil());
        assert_eq!(
            delivery(alert, donor, DeliveryChannel::Sms),
            "bloodlink:delivery:00000000-0000-0000-0000-000000000000:00000000-0000-0000-0000-000000000000:sms"
        );
        assert!(delivery(alert, donor, DeliveryChannel::Push).starts_with(&alert_deliveries(alert)));
    }

    #[test]
    fn test_response_keys_scoped_by_alert() {
        let alert = AlertId::new();
        let key = response(alert, DonorId::new());
        assert!(key.starts_with(&alert_responses(alert)));
        assert!(!key.starts_with(&alert_responses(AlertId::new())));
        assert!(!key.starts_with(&alert_deliveries(alert)));
    }

    #[test]
    fn test_prefixes_do_not_overlap() {
        let id = DonorId::new();
        assert!(donor(id).starts_with(&donors()));
        assert!(!donor(id).starts_with(&recipients()));
    }
}
