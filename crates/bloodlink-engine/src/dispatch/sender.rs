//! A single send attempt for a due delivery.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashSet;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info, warn};

use bloodlink_core::traits::gateway::{GatewayResponse, NotificationGateway, RejectionKind};
use bloodlink_entity::alert::AlertState;
use bloodlink_store::repositories::{AlertRepository, DonorRepository};

use super::outcome::SendFailure;
use crate::delivery::{Claim, DeliveryKey, DeliveryTracker};

/// Result of one attempt before it is recorded.
#[derive(Debug)]
enum Attempt {
    /// Nothing was sent; the claim should be released.
    Skipped(String),
    /// The claim was taken over before the gateway was called.
    Lost,
    /// The gateway accepted the message.
    Accepted,
    /// The attempt failed.
    Failed(SendFailure),
}

/// Shared by every send task of a dispatcher.
#[derive(Debug)]
pub(crate) struct Sender {
    pub(crate) alerts: AlertRepository,
    pub(crate) donors: DonorRepository,
    pub(crate) tracker: DeliveryTracker,
    pub(crate) gateway: Arc<dyn NotificationGateway>,
    pub(crate) timeout: Duration,
    pub(crate) permits: Semaphore,
    /// Deliveries with a send task waiting or running in this process.
    pub(crate) queued: DashSet<DeliveryKey>,
}

/// Removes a key from the queued set when its task ends.
struct Queued<'a> {
    set: &'a DashSet<DeliveryKey>,
    key: DeliveryKey,
}

impl Drop for Queued<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.key);
    }
}

impl Sender {
    /// Reserve `key` for one send task. `false` if a task already has it.
    pub(crate) fn enqueue(&self, key: DeliveryKey) -> bool {
        self.queued.insert(key)
    }

    /// Wait for a permit, claim the delivery, then perform and record one
    /// attempt.
    ///
    /// The lease starts only once the permit is held, so time spent queued
    /// behind other sends never eats into it.
    pub(crate) async fn send(&self, key: DeliveryKey) {
        let _queued = Queued {
            set: &self.queued,
            key,
        };
        let Ok(_permit) = self.permits.acquire().await else {
            return;
        };

        let claim = match self.tracker.claim(key, Utc::now()).await {
            Ok(Some(claim)) => claim,
            Ok(None) => {
                debug!(
                    alert_id = %key.alert_id,
                    donor_id = %key.donor_id,
                    channel = %key.channel,
                    "Delivery no longer due"
                );
                return;
            }
            Err(e) => {
                error!(
                    alert_id = %key.alert_id,
                    donor_id = %key.donor_id,
                    error = %e,
                    "Failed to claim delivery"
                );
                return;
            }
        };
        let delivery = claim.delivery();

        let recorded = match self.attempt(&claim).await {
            Attempt::Skipped(why) => {
                debug!(delivery_id = %delivery.id, why = %why, "Send skipped");
                self.tracker.release(&claim).await
            }
            Attempt::Lost => {
                debug!(delivery_id = %delivery.id, "Claim taken over, not sending");
                Ok(())
            }
            Attempt::Accepted => self.tracker.mark_sent(&claim).await.map(|d| {
                info!(
                    delivery_id = %d.id,
                    donor_id = %d.donor_id,
                    channel = %d.channel,
                    attempt = d.attempt_count,
                    "Alert sent"
                );
            }),
            Attempt::Failed(err) => {
                warn!(
                    delivery_id = %delivery.id,
                    channel = %delivery.channel,
                    error = %err,
                    "Send attempt failed"
                );
                self.tracker
                    .record_send_failure(&claim, err.reason(), err.is_permanent())
                    .await
                    .map(|_| ())
            }
        };

        if let Err(e) = recorded {
            error!(delivery_id = %delivery.id, error = %e, "Failed to record send attempt");
        }
    }

    async fn attempt(&self, claim: &Claim) -> Attempt {
        let delivery = claim.delivery();
        // The alert may have been cancelled or expired since the claim.
        let alert = match self.alerts.find_by_id(delivery.alert_id).await {
            Ok(Some(alert)) => alert,
            Ok(None) => return Attempt::Skipped("alert no longer exists".to_string()),
            Err(e) => return Attempt::Skipped(format!("alert lookup failed: {e}")),
        };
        if alert.state != AlertState::Active || alert.is_expired_at(Utc::now()) {
            return Attempt::Skipped(format!("alert is {}", alert.state));
        }

        let donor = match self.donors.find_by_id(delivery.donor_id).await {
            Ok(Some(donor)) => donor,
            Ok(None) => {
                return Attempt::Failed(SendFailure::Permanent(format!(
                    "donor {} no longer exists",
                    delivery.donor_id
                )));
            }
            Err(e) => return Attempt::Skipped(format!("donor lookup failed: {e}")),
        };
        let Some(contact) = donor.contact_for(delivery.channel) else {
            return Attempt::Failed(SendFailure::Permanent(format!(
                "donor has no {} contact on file",
                delivery.channel
            )));
        };

        // Another sender may have taken over while the lookups ran.
        match self.tracker.holds(claim).await {
            Ok(true) => {}
            Ok(false) => return Attempt::Lost,
            Err(e) => return Attempt::Skipped(format!("claim check failed: {e}")),
        }

        let payload = alert.payload_for(donor.id);
        let call = self.gateway.send(delivery.channel, contact, &payload);
        match time::timeout(self.timeout, call).await {
            Ok(Ok(GatewayResponse::Accepted)) => Attempt::Accepted,
            Ok(Ok(GatewayResponse::Rejected { kind, reason })) => match kind {
                RejectionKind::Permanent => Attempt::Failed(SendFailure::Permanent(reason)),
                RejectionKind::Transient => Attempt::Failed(SendFailure::Transient(reason)),
            },
            Ok(Err(e)) => Attempt::Failed(SendFailure::Transient(e.to_string())),
            Err(_) => Attempt::Failed(SendFailure::Transient(format!(
                "gateway did not answer within {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
