//! Request DTOs with validation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::types::{AlertId, DeliveryChannel, DonorId, RecipientId};
use bloodlink_engine::DeliveryOutcome;
use bloodlink_entity::alert::{AlertDefinition, AudienceCriteria, DEFAULT_REACH_RADIUS_KM};
use bloodlink_entity::blood::BloodGroup;
use bloodlink_entity::recipient::UrgencyLevel;
use bloodlink_entity::response::ResponseKind;

/// Run `validator` checks and map failures to a validation error.
pub fn validated<T: Validate>(request: T) -> AppResult<T> {
    request
        .validate()
        .map_err(|e| AppError::validation(format!("Invalid request: {e}")))?;
    Ok(request)
}

/// Match search request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    /// Optional search radius in kilometres.
    #[validate(range(min = 0.0, message = "max_distance_km must not be negative"))]
    pub max_distance_km: Option<f64>,
}

/// Alert creation request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAlertRequest {
    /// Recipient the alert is raised for, if any.
    pub recipient_id: Option<Uuid>,
    /// Short title.
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    /// Message body.
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,
    /// Urgency.
    pub urgency_level: UrgencyLevel,
    /// Blood groups to notify, e.g. `["O-", "O+"]`. Empty means all groups.
    #[serde(default)]
    pub target_blood_groups: Vec<String>,
    /// Radius around the recipient or hospital.
    #[validate(range(exclusive_min = 0.0, message = "max_distance_km must be positive"))]
    pub max_distance_km: f64,
    /// When the alert stops being dispatchable.
    pub expires_at: DateTime<Utc>,
    /// Create as a draft instead of publishing immediately.
    #[serde(default)]
    pub draft: bool,
}

impl CreateAlertRequest {
    /// Convert into an engine alert definition, parsing blood groups.
    pub fn into_definition(self) -> AppResult<AlertDefinition> {
        let target_blood_groups = parse_groups(&self.target_blood_groups)?;

        Ok(AlertDefinition {
            recipient_id: self.recipient_id.map(RecipientId::from_uuid),
            title: self.title,
            message: self.message,
            urgency_level: self.urgency_level,
            target_blood_groups,
            max_distance_km: self.max_distance_km,
            expires_at: self.expires_at,
            draft: self.draft,
        })
    }
}

/// Reach preview request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EstimateAudienceRequest {
    /// Recipient donors must be compatible with, if any.
    pub recipient_id: Option<Uuid>,
    /// Blood groups to count. Empty means all groups.
    #[serde(default)]
    pub target_blood_groups: Vec<String>,
    /// Radius; 50 km when omitted.
    #[validate(range(exclusive_min = 0.0, message = "max_distance_km must be positive"))]
    pub max_distance_km: Option<f64>,
}

impl EstimateAudienceRequest {
    /// Convert into audience criteria, parsing blood groups.
    pub fn into_criteria(self) -> AppResult<AudienceCriteria> {
        Ok(AudienceCriteria {
            recipient_id: self.recipient_id.map(RecipientId::from_uuid),
            target_blood_groups: parse_groups(&self.target_blood_groups)?,
            max_distance_km: self.max_distance_km.unwrap_or(DEFAULT_REACH_RADIUS_KM),
        })
    }
}

/// A donor's answer to an alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorResponseRequest {
    /// Donor answering.
    pub donor_id: Uuid,
    /// `yes`, `no` or `unavailable`.
    pub response: String,
}

impl DonorResponseRequest {
    /// Parsed donor id and answer.
    pub fn parts(&self) -> AppResult<(DonorId, ResponseKind)> {
        Ok((
            DonorId::from_uuid(self.donor_id),
            self.response.parse::<ResponseKind>()?,
        ))
    }
}

/// Delivery result posted by the notification gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCallbackRequest {
    /// Alert the message belonged to.
    pub alert_id: Uuid,
    /// Donor the message was sent to.
    pub donor_id: Uuid,
    /// Channel name: `push`, `sms` or `email`.
    pub channel: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: DeliveryOutcome,
}

impl DeliveryCallbackRequest {
    /// Parsed delivery key.
    pub fn key(&self) -> AppResult<(AlertId, DonorId, DeliveryChannel)> {
        let channel = self.channel.parse::<DeliveryChannel>()?;
        Ok((
            AlertId::from_uuid(self.alert_id),
            DonorId::from_uuid(self.donor_id),
            channel,
        ))
    }
}

fn parse_groups(groups: &[String]) -> AppResult<BTreeSet<BloodGroup>> {
    groups.iter().map(|g| g.parse::<BloodGroup>()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink_core::error::ErrorKind;

    fn request(groups: &[&str]) -> CreateAlertRequest {
        CreateAlertRequest {
            recipient_id: None,
            title: "Need O-".to_string(),
            message: "Come to the blood bank".to_string(),
            urgency_level: UrgencyLevel::High,
            target_blood_groups: groups.iter().map(|g| g.to_string()).collect(),
            max_distance_km: 15.0,
            expires_at: Utc::now(),
            draft: false,
        }
    }

    #[test]
    fn test_unknown_blood_group_rejected() {
        let err = request(&["O-", "Z+"]).into_definition().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_groups_parsed() {
        let def = request(&["O-", "AB+", "O-"]).into_definition().unwrap();
        assert_eq!(def.target_blood_groups.len(), 2);
        assert!(def.target_blood_groups.contains(&BloodGroup::AbPos));
    }

    #[test]
    fn test_validation_rules() {
        let mut r = request(&[]);
        r.title = String::new();
        assert!(validated(r).is_err());

        let mut r = request(&[]);
        r.max_distance_km = 0.0;
        assert!(validated(r).is_err());

        assert!(validated(FindMatchesRequest { max_distance_km: Some(-5.0) }).is_err());
        assert!(validated(FindMatchesRequest::default()).is_ok());
    }

    #[test]
    fn test_estimate_defaults_radius() {
        let req: EstimateAudienceRequest =
            serde_json::from_value(serde_json::json!({ "target_blood_groups": ["O-"] })).unwrap();
        let criteria = validated(req).unwrap().into_criteria().unwrap();
        assert_eq!(criteria.max_distance_km, DEFAULT_REACH_RADIUS_KM);
        assert!(criteria.targets(BloodGroup::ONeg));

        let bad = EstimateAudienceRequest {
            max_distance_km: Some(0.0),
            ..EstimateAudienceRequest::default()
        };
        assert!(validated(bad).is_err());
    }

    #[test]
    fn test_unknown_response_rejected() {
        let req = DonorResponseRequest {
            donor_id: Uuid::new_v4(),
            response: "later".to_string(),
        };
        assert_eq!(req.parts().unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn test_callback_body() {
        let body = serde_json::json!({
            "alert_id": Uuid::new_v4(),
            "donor_id": Uuid::new_v4(),
            "channel": "sms",
            "status": "failed",
            "reason": "number unreachable",
            "permanent": true
        });
        let req: DeliveryCallbackRequest = serde_json::from_value(body).unwrap();
        let (_, _, channel) = req.key().unwrap();
        assert_eq!(channel, DeliveryChannel::Sms);
        assert_eq!(
            req.outcome,
            DeliveryOutcome::Failed {
                reason: "number unreachable".to_string(),
                permanent: true
            }
        );
    }
}
