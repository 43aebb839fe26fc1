//! Alert dispatcher: audience selection, idempotent fan-out, retries.
//!
//! `dispatch` returns once delivery records exist and the initial sends are
//! issued. Sends run on tracked background tasks bounded by a semaphore, and
//! each gateway call is wrapped in a timeout. `drain` waits for in-flight
//! sends, which shutdown and tests rely on.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashSet;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use bloodlink_core::config::{DispatchConfig, MatchingConfig};
use bloodlink_core::error::{AppError, ErrorKind};
use bloodlink_core::result::AppResult;
use bloodlink_core::traits::gateway::NotificationGateway;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::{AlertId, DeliveryChannel, DonorId, HospitalId, RecipientId};
use bloodlink_entity::alert::{Alert, AlertState, AudienceCriteria};
use bloodlink_entity::delivery::{AlertDelivery, DeliveryState, DeliverySummary};
use bloodlink_entity::recipient::Recipient;
use bloodlink_entity::response::{DonorResponse, ResponseKind, ResponseSummary};
use bloodlink_store::repositories::{
    AlertRepository, DeliveryRepository, DonorRepository, HospitalRepository, RecipientRepository,
    ResponseRepository,
};

use super::outcome::{AudienceEstimate, DeliveryOutcome, DeliveryReport, DispatchResult};
use super::sender::Sender;
use crate::alert::AlertService;
use crate::alert::service::authorize;
use crate::audience::{AudienceAnchor, select_audience};
use crate::context::RequestContext;
use crate::delivery::{DeliveryKey, DeliveryTracker};

/// Fans alerts out to donors and tracks every delivery.
#[derive(Debug)]
pub struct AlertDispatcher {
    alert_service: AlertService,
    alerts: AlertRepository,
    recipients: RecipientRepository,
    hospitals: HospitalRepository,
    donors: DonorRepository,
    responses: ResponseRepository,
    sender: Arc<Sender>,
    channels: Vec<DeliveryChannel>,
    require_verified: bool,
    tasks: TaskTracker,
}

impl AlertDispatcher {
    /// Creates a dispatcher over a record store and a gateway.
    pub fn new(
        store: Arc<dyn RecordStore>,
        gateway: Arc<dyn NotificationGateway>,
        dispatch: DispatchConfig,
        matching: &MatchingConfig,
    ) -> Self {
        let alerts = AlertRepository::new(Arc::clone(&store));
        let recipients = RecipientRepository::new(Arc::clone(&store));
        let hospitals = HospitalRepository::new(Arc::clone(&store));
        let donors = DonorRepository::new(Arc::clone(&store));
        let responses = ResponseRepository::new(Arc::clone(&store));
        let tracker = DeliveryTracker::new(DeliveryRepository::new(store), dispatch.clone());

        let sender = Sender {
            alerts: alerts.clone(),
            donors: donors.clone(),
            tracker,
            gateway,
            timeout: dispatch.gateway_timeout(),
            permits: Semaphore::new(dispatch.concurrency.max(1)),
            queued: DashSet::new(),
        };

        Self {
            alert_service: AlertService::new(alerts.clone(), recipients.clone(), hospitals.clone()),
            alerts,
            recipients,
            hospitals,
            donors,
            responses,
            sender: Arc::new(sender),
            channels: dispatch.channels,
            require_verified: matching.require_verified_donors,
            tasks: TaskTracker::new(),
        }
    }

    /// The delivery tracker used by this dispatcher.
    pub fn tracker(&self) -> &DeliveryTracker {
        &self.sender.tracker
    }

    /// Dispatch an active alert of the calling hospital.
    ///
    /// Safe to call repeatedly: delivery records are created at most once
    /// per (donor, channel), and only due deliveries are sent.
    pub async fn dispatch(
        &self,
        ctx: &RequestContext,
        alert_id: AlertId,
    ) -> AppResult<DispatchResult> {
        let now = Utc::now();
        let alert = self.load_alert(alert_id).await?;
        authorize(ctx, &alert)?;
        self.ensure_dispatchable(&alert, now).await?;

        let anchor = self.anchor(alert.hospital_id, alert.recipient_id).await?;
        let donors = self.donors.list_all().await?;
        let audience = select_audience(
            &AudienceCriteria::from(&alert),
            &anchor,
            &donors,
            self.require_verified,
        );
        let donor_ids: Vec<DonorId> = audience.iter().map(|d| d.id).collect();

        let deliveries = self
            .sender
            .tracker
            .ensure_deliveries(alert.id, &donor_ids, &self.channels)
            .await?;
        let attempts_issued = self.issue(&deliveries, now);

        info!(
            alert_id = %alert.id,
            hospital_id = %ctx.hospital_id,
            audience = audience.len(),
            deliveries = deliveries.len(),
            attempts_issued,
            "Alert dispatched"
        );

        Ok(DispatchResult {
            alert_id: alert.id,
            audience_size: audience.len(),
            deliveries,
            attempts_issued,
        })
    }

    /// Preview who an alert with `criteria` would reach, without creating
    /// anything.
    ///
    /// Uses the same selection as [`Self::dispatch`]. A linked recipient
    /// must belong to the calling hospital.
    pub async fn estimate_audience(
        &self,
        ctx: &RequestContext,
        criteria: &AudienceCriteria,
    ) -> AppResult<AudienceEstimate> {
        if !criteria.max_distance_km.is_finite() || criteria.max_distance_km <= 0.0 {
            return Err(AppError::validation(format!(
                "max_distance_km must be a positive number, got {}",
                criteria.max_distance_km
            )));
        }
        let anchor = match criteria.recipient_id {
            Some(recipient_id) => {
                let recipient = self.load_recipient(recipient_id).await?;
                if !ctx.owns(recipient.hospital_id) {
                    return Err(AppError::authorization(format!(
                        "Recipient {recipient_id} belongs to another hospital"
                    )));
                }
                AudienceAnchor::recipient(&recipient)
            }
            None => self.anchor(ctx.hospital_id, None).await?,
        };
        let donors = self.donors.list_all().await?;
        let audience = select_audience(criteria, &anchor, &donors, self.require_verified);

        let mut by_blood_group = BTreeMap::new();
        for donor in &audience {
            *by_blood_group.entry(donor.blood_group).or_insert(0) += 1;
        }
        let channels = unique_channels(&self.channels);

        debug!(
            hospital_id = %ctx.hospital_id,
            audience = audience.len(),
            "Estimated alert reach"
        );
        Ok(AudienceEstimate {
            audience_size: audience.len(),
            expected_deliveries: audience.len() * channels.len(),
            by_blood_group,
            channels,
        })
    }

    /// Record a donor's answer to an alert.
    ///
    /// The alert must still be active and the donor must have been reached
    /// on at least one channel. Answering again replaces the earlier answer.
    pub async fn record_response(
        &self,
        alert_id: AlertId,
        donor_id: DonorId,
        response: ResponseKind,
    ) -> AppResult<DonorResponse> {
        let now = Utc::now();
        let alert = self.load_alert(alert_id).await?;
        self.ensure_dispatchable(&alert, now).await?;

        let deliveries = self.sender.tracker.list(alert_id).await?;
        let reached = deliveries
            .iter()
            .any(|d| d.donor_id == donor_id && reached_donor(d));
        if !reached {
            return Err(AppError::not_found(format!(
                "Donor {donor_id} was not reached by alert {alert_id}"
            )));
        }

        let first_responded_at = self
            .responses
            .find(alert_id, donor_id)
            .await?
            .map_or(now, |earlier| earlier.first_responded_at);
        let recorded = DonorResponse {
            alert_id,
            donor_id,
            response,
            first_responded_at,
            responded_at: now,
        };
        self.responses.save(&recorded).await?;

        info!(
            alert_id = %alert_id,
            donor_id = %donor_id,
            response = %response,
            "Donor responded"
        );
        Ok(recorded)
    }

    /// Apply an asynchronous delivery result from the gateway.
    ///
    /// Results for deliveries already in a terminal state are rejected with
    /// a conflict and leave the record unchanged.
    pub async fn on_delivery_result(
        &self,
        alert_id: AlertId,
        donor_id: DonorId,
        channel: DeliveryChannel,
        outcome: DeliveryOutcome,
    ) -> AppResult<AlertDelivery> {
        let key = DeliveryKey::new(alert_id, donor_id, channel);
        let tracker = &self.sender.tracker;
        let updated = match outcome {
            DeliveryOutcome::Delivered => tracker.mark_delivered(key).await?,
            DeliveryOutcome::Failed { reason, permanent } => {
                tracker
                    .record_delivery_failure(key, &reason, permanent)
                    .await?
            }
        };

        debug!(
            delivery_id = %updated.id,
            state = %updated.state,
            "Applied delivery result"
        );
        Ok(updated)
    }

    /// Start sends for every due delivery of active alerts, fresh or
    /// waiting to be retried.
    ///
    /// Returns the number of sends started.
    pub async fn retry_due(&self) -> AppResult<usize> {
        let now = Utc::now();
        let mut issued = 0;

        for alert in self.alerts.list_all().await? {
            if alert.state != AlertState::Active || alert.is_expired_at(now) {
                continue;
            }
            let deliveries = self.sender.tracker.list(alert.id).await?;
            issued += self.issue(&deliveries, now);
        }

        if issued > 0 {
            debug!(issued, "Issued retry sends");
        }
        Ok(issued)
    }

    /// Deliveries and per-state counts for an alert of the calling hospital.
    pub async fn delivery_status(
        &self,
        ctx: &RequestContext,
        alert_id: AlertId,
    ) -> AppResult<DeliveryReport> {
        let alert = self.load_alert(alert_id).await?;
        authorize(ctx, &alert)?;

        let deliveries = self.sender.tracker.list(alert_id).await?;
        let responses = self.responses.list_by_alert(alert_id).await?;
        let reached: BTreeSet<DonorId> = deliveries
            .iter()
            .filter(|d| reached_donor(d))
            .map(|d| d.donor_id)
            .collect();
        Ok(DeliveryReport {
            alert_id,
            alert_state: alert.state,
            summary: DeliverySummary::from_deliveries(&deliveries),
            deliveries,
            response_summary: ResponseSummary::from_responses(&responses, reached.len()),
            responses,
        })
    }

    /// Per-state delivery counts for an alert of the calling hospital.
    pub async fn delivery_summary(
        &self,
        ctx: &RequestContext,
        alert_id: AlertId,
    ) -> AppResult<DeliverySummary> {
        let alert = self.load_alert(alert_id).await?;
        authorize(ctx, &alert)?;
        self.sender.tracker.summary(alert_id).await
    }

    /// Number of send tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every in-flight send to finish.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    /// Like [`Self::drain`], giving up after `timeout`.
    ///
    /// Returns `false` if sends were still running when time ran out.
    pub async fn drain_timeout(&self, timeout: Duration) -> bool {
        let drained = tokio::time::timeout(timeout, self.drain()).await.is_ok();
        if !drained {
            warn!(in_flight = self.in_flight(), "Timed out draining sends");
            self.tasks.reopen();
        }
        drained
    }

    async fn load_alert(&self, alert_id: AlertId) -> AppResult<Alert> {
        self.alerts
            .find_by_id(alert_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Alert {alert_id} not found")))
    }

    async fn ensure_dispatchable(&self, alert: &Alert, now: DateTime<Utc>) -> AppResult<()> {
        match alert.state {
            AlertState::Active if alert.is_expired_at(now) => {
                match self.alert_service.expire(alert.id).await {
                    Ok(_) => {}
                    Err(e) if e.kind == ErrorKind::Conflict => {}
                    Err(e) => return Err(e),
                }
                Err(AppError::alert_expired(format!(
                    "Alert {} expired at {}",
                    alert.id, alert.expires_at
                )))
            }
            AlertState::Active => Ok(()),
            AlertState::Expired => Err(AppError::alert_expired(format!(
                "Alert {} expired at {}",
                alert.id, alert.expires_at
            ))),
            AlertState::Draft | AlertState::Cancelled => Err(AppError::alert_not_active(format!(
                "Alert {} is {}",
                alert.id, alert.state
            ))),
        }
    }

    async fn load_recipient(&self, recipient_id: RecipientId) -> AppResult<Recipient> {
        self.recipients
            .find_by_id(recipient_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipient {recipient_id} not found")))
    }

    /// Centre on the linked recipient, or on the hospital when there is none.
    async fn anchor(
        &self,
        hospital_id: HospitalId,
        recipient_id: Option<RecipientId>,
    ) -> AppResult<AudienceAnchor> {
        if let Some(recipient_id) = recipient_id {
            let recipient = self.load_recipient(recipient_id).await?;
            return Ok(AudienceAnchor::recipient(&recipient));
        }
        let hospital = self
            .hospitals
            .find_by_id(hospital_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Hospital {hospital_id} not found")))?;
        Ok(AudienceAnchor::hospital(&hospital))
    }

    /// Spawn one send task for each due delivery not already queued here.
    ///
    /// The task claims the delivery once it holds a send permit.
    fn issue(&self, deliveries: &[AlertDelivery], now: DateTime<Utc>) -> usize {
        let mut issued = 0;
        for delivery in deliveries.iter().filter(|d| d.is_due(now)) {
            let key = DeliveryKey::from(delivery);
            if !self.sender.enqueue(key) {
                continue;
            }

            let sender = Arc::clone(&self.sender);
            self.tasks.spawn(async move { sender.send(key).await });
            issued += 1;
        }
        issued
    }
}

/// Whether a delivery got the alert to its donor.
fn reached_donor(delivery: &AlertDelivery) -> bool {
    matches!(delivery.state, DeliveryState::Sent | DeliveryState::Delivered)
}

/// Configured channels without repeats, in configured order.
fn unique_channels(channels: &[DeliveryChannel]) -> Vec<DeliveryChannel> {
    let mut unique = Vec::with_capacity(channels.len());
    for channel in channels {
        if !unique.contains(channel) {
            unique.push(*channel);
        }
    }
    unique
}
