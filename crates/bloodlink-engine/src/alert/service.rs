//! Alert creation and state transitions.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use bloodlink_core::error::{AppError, ErrorKind};
use bloodlink_core::result::AppResult;
use bloodlink_core::types::AlertId;
use bloodlink_entity::alert::{Alert, AlertDefinition, AlertState};
use bloodlink_store::repositories::{AlertRepository, HospitalRepository, RecipientRepository};

use crate::context::RequestContext;

/// Attempts at a contended compare-and-set before giving up.
const MAX_CAS_RETRIES: usize = 16;

/// Creates alerts and drives them through their states.
#[derive(Debug, Clone)]
pub struct AlertService {
    alerts: AlertRepository,
    recipients: RecipientRepository,
    hospitals: HospitalRepository,
}

impl AlertService {
    /// Creates a new alert service.
    pub fn new(
        alerts: AlertRepository,
        recipients: RecipientRepository,
        hospitals: HospitalRepository,
    ) -> Self {
        Self {
            alerts,
            recipients,
            hospitals,
        }
    }

    /// Create an alert owned by the calling hospital.
    ///
    /// The alert starts `Active` unless the definition asks for a draft.
    pub async fn create_alert(
        &self,
        ctx: &RequestContext,
        definition: AlertDefinition,
    ) -> AppResult<Alert> {
        let now = Utc::now();
        validate_definition(&definition, now)?;

        if self.hospitals.find_by_id(ctx.hospital_id).await?.is_none() {
            return Err(AppError::not_found(format!(
                "Hospital {} not found",
                ctx.hospital_id
            )));
        }

        if let Some(recipient_id) = definition.recipient_id {
            let recipient = self
                .recipients
                .find_by_id(recipient_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Recipient {recipient_id} not found"))
                })?;
            if !ctx.owns(recipient.hospital_id) {
                return Err(AppError::authorization(format!(
                    "Recipient {recipient_id} belongs to another hospital"
                )));
            }
        }

        let state = if definition.draft {
            AlertState::Draft
        } else {
            AlertState::Active
        };

        let alert = Alert {
            id: AlertId::new(),
            recipient_id: definition.recipient_id,
            title: definition.title.trim().to_string(),
            message: definition.message.trim().to_string(),
            urgency_level: definition.urgency_level,
            target_blood_groups: definition.target_blood_groups,
            max_distance_km: definition.max_distance_km,
            hospital_id: ctx.hospital_id,
            state,
            created_at: now,
            expires_at: definition.expires_at,
            updated_at: now,
        };
        self.alerts.create(&alert).await?;

        info!(
            alert_id = %alert.id,
            hospital_id = %alert.hospital_id,
            state = %alert.state,
            urgency = alert.urgency_level.as_str(),
            expires_at = %alert.expires_at,
            "Alert created"
        );
        Ok(alert)
    }

    /// Fetch an alert owned by the calling hospital.
    pub async fn get_alert(&self, ctx: &RequestContext, alert_id: AlertId) -> AppResult<Alert> {
        let alert = self.find(alert_id).await?;
        authorize(ctx, &alert)?;
        Ok(alert)
    }

    /// Every alert of the calling hospital.
    pub async fn list_alerts(&self, ctx: &RequestContext) -> AppResult<Vec<Alert>> {
        let alerts = self.alerts.list_all().await?;
        Ok(alerts
            .into_iter()
            .filter(|a| ctx.owns(a.hospital_id))
            .collect())
    }

    /// Publish a draft alert.
    pub async fn activate(&self, ctx: &RequestContext, alert_id: AlertId) -> AppResult<Alert> {
        let alert = self.get_alert(ctx, alert_id).await?;
        if alert.is_expired_at(Utc::now()) {
            return Err(AppError::alert_expired(format!(
                "Alert {alert_id} expired at {}",
                alert.expires_at
            )));
        }
        self.transition(alert_id, AlertState::Active).await
    }

    /// Cancel an alert. Cancelling an already cancelled alert is a no-op.
    ///
    /// Delivery records are left as they are; pending sends are skipped.
    pub async fn cancel(&self, ctx: &RequestContext, alert_id: AlertId) -> AppResult<Alert> {
        let alert = self.get_alert(ctx, alert_id).await?;
        if alert.state == AlertState::Cancelled {
            return Ok(alert);
        }
        let cancelled = self.transition(alert_id, AlertState::Cancelled).await?;
        info!(alert_id = %alert_id, "Alert cancelled");
        Ok(cancelled)
    }

    /// Move an active alert to `Expired`.
    pub async fn expire(&self, alert_id: AlertId) -> AppResult<Alert> {
        let expired = self.transition(alert_id, AlertState::Expired).await?;
        info!(alert_id = %alert_id, expires_at = %expired.expires_at, "Alert expired");
        Ok(expired)
    }

    /// Expire every active alert whose expiry time has passed.
    ///
    /// Returns how many alerts this call expired.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut expired = 0;
        for alert in self.alerts.list_all().await? {
            if alert.state != AlertState::Active || !alert.is_expired_at(now) {
                continue;
            }
            match self.expire(alert.id).await {
                Ok(_) => expired += 1,
                // Lost a race with a cancel or another expirer.
                Err(e) if e.kind == ErrorKind::Conflict => {
                    debug!(alert_id = %alert.id, error = %e, "Alert changed before expiry");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(expired)
    }

    async fn find(&self, alert_id: AlertId) -> AppResult<Alert> {
        self.alerts
            .find_by_id(alert_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))
    }

    async fn transition(&self, alert_id: AlertId, target: AlertState) -> AppResult<Alert> {
        for _ in 0..MAX_CAS_RETRIES {
            let current = self
                .alerts
                .find_versioned(alert_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))?;

            if !current.state.can_transition_to(target) {
                return Err(AppError::conflict(format!(
                    "Alert {alert_id} cannot move from {} to {target}",
                    current.state
                )));
            }

            let mut next = current.value.clone();
            next.state = target;
            next.updated_at = Utc::now();

            if self.alerts.replace(&current, &next).await? {
                return Ok(next);
            }
        }

        warn!(alert_id = %alert_id, target = %target, "Alert transition kept losing races");
        Err(AppError::conflict(format!(
            "Alert {alert_id} is under heavy contention"
        )))
    }
}

/// Reject an alert owned by another hospital.
pub(crate) fn authorize(ctx: &RequestContext, alert: &Alert) -> AppResult<()> {
    if ctx.owns(alert.hospital_id) {
        Ok(())
    } else {
        Err(AppError::authorization(format!(
            "Alert {} belongs to another hospital",
            alert.id
        )))
    }
}

fn validate_definition(definition: &AlertDefinition, now: DateTime<Utc>) -> AppResult<()> {
    if definition.title.trim().is_empty() {
        return Err(AppError::validation("Alert title must not be empty"));
    }
    if definition.message.trim().is_empty() {
        return Err(AppError::validation("Alert message must not be empty"));
    }
    if !definition.max_distance_km.is_finite() || definition.max_distance_km <= 0.0 {
        return Err(AppError::validation(format!(
            "max_distance_km must be a positive number, got {}",
            definition.max_distance_km
        )));
    }
    if definition.expires_at <= now {
        return Err(AppError::validation("Alert must expire in the future"));
    }
    Ok(())
}
