//! Idempotent creation and guarded transitions of delivery records.
//!
//! Every change is a compare-and-set against the stored record, so two
//! writers racing on the same delivery can never both win, and a record in
//! a terminal state never moves again. Writes on the send path also carry
//! the sender's [`Claim`] and are refused once that claim has been taken
//! over, so at most one sender ever records an attempt for a lease.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{debug, warn};

use bloodlink_core::config::DispatchConfig;
use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::types::{AlertId, DeliveryChannel, DonorId};
use bloodlink_entity::delivery::{AlertDelivery, DeliveryState, DeliverySummary};
use bloodlink_store::repositories::DeliveryRepository;

/// Attempts at a contended compare-and-set before giving up.
const MAX_CAS_RETRIES: usize = 16;

/// The idempotency key of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeliveryKey {
    /// Alert being delivered.
    pub alert_id: AlertId,
    /// Donor being notified.
    pub donor_id: DonorId,
    /// Channel used.
    pub channel: DeliveryChannel,
}

impl DeliveryKey {
    /// Creates a delivery key.
    pub fn new(alert_id: AlertId, donor_id: DonorId, channel: DeliveryChannel) -> Self {
        Self {
            alert_id,
            donor_id,
            channel,
        }
    }
}

impl From<&AlertDelivery> for DeliveryKey {
    fn from(d: &AlertDelivery) -> Self {
        Self::new(d.alert_id, d.donor_id, d.channel)
    }
}

/// A sender's lease on one delivery, as returned by [`DeliveryTracker::claim`].
///
/// The claim is identified by the claim counter it wrote. Once the record is
/// released or claimed again after the lease lapsed, the counter no longer
/// matches and every write made under the old claim is refused.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    delivery: AlertDelivery,
}

impl Claim {
    /// The delivery as it was when claimed.
    pub fn delivery(&self) -> &AlertDelivery {
        &self.delivery
    }

    /// Key of the claimed delivery.
    pub fn key(&self) -> DeliveryKey {
        DeliveryKey::from(&self.delivery)
    }

    fn is_held_in(&self, current: &AlertDelivery) -> bool {
        current.state == DeliveryState::Pending
            && current.claimed_until.is_some()
            && current.claim_count == self.delivery.claim_count
    }
}

/// Where an update takes a delivery, optionally through an intermediate
/// state that is checked but never stored.
#[derive(Debug, Clone, Copy)]
struct Route {
    via: Option<DeliveryState>,
    target: DeliveryState,
}

impl Route {
    fn to(target: DeliveryState) -> Self {
        Self { via: None, target }
    }

    fn via(via: DeliveryState, target: DeliveryState) -> Self {
        Self {
            via: Some(via),
            target,
        }
    }

    fn is_legal_from(&self, from: DeliveryState) -> bool {
        match self.via {
            Some(via) => from.can_transition_to(via) && via.can_transition_to(self.target),
            None => from.can_transition_to(self.target),
        }
    }
}

/// Owns every write to delivery records.
#[derive(Debug, Clone)]
pub struct DeliveryTracker {
    repo: DeliveryRepository,
    config: DispatchConfig,
}

impl DeliveryTracker {
    /// Creates a tracker over the delivery repository.
    pub fn new(repo: DeliveryRepository, config: DispatchConfig) -> Self {
        Self { repo, config }
    }

    /// Make sure a record exists for every (donor, channel) pair.
    ///
    /// Existing records are returned untouched, whatever their state, so
    /// calling this any number of times (concurrently or not) leaves exactly
    /// one record per tuple.
    pub async fn ensure_deliveries(
        &self,
        alert_id: AlertId,
        donors: &[DonorId],
        channels: &[DeliveryChannel],
    ) -> AppResult<Vec<AlertDelivery>> {
        let mut unique_channels: Vec<DeliveryChannel> = Vec::with_capacity(channels.len());
        for channel in channels {
            if !unique_channels.contains(channel) {
                unique_channels.push(*channel);
            }
        }

        let now = Utc::now();
        let mut deliveries = Vec::with_capacity(donors.len() * unique_channels.len());
        let mut created = 0usize;

        for donor_id in donors {
            for channel in &unique_channels {
                if let Some(existing) = self.repo.find(alert_id, *donor_id, *channel).await? {
                    deliveries.push(existing.into_inner());
                    continue;
                }

                let fresh = AlertDelivery::new(alert_id, *donor_id, *channel, now);
                if self.repo.insert_if_absent(&fresh).await? {
                    created += 1;
                    deliveries.push(fresh);
                } else {
                    let winner = self
                        .repo
                        .find(alert_id, *donor_id, *channel)
                        .await?
                        .ok_or_else(|| {
                            AppError::internal(format!(
                                "Delivery for alert {alert_id} donor {donor_id} via {channel} vanished"
                            ))
                        })?;
                    deliveries.push(winner.into_inner());
                }
            }
        }

        debug!(
            alert_id = %alert_id,
            total = deliveries.len(),
            created,
            "Ensured delivery records"
        );
        Ok(deliveries)
    }

    /// Current record for a key.
    pub async fn get(&self, key: DeliveryKey) -> AppResult<AlertDelivery> {
        self.repo
            .find(key.alert_id, key.donor_id, key.channel)
            .await?
            .map(|v| v.into_inner())
            .ok_or_else(|| not_found(key))
    }

    /// Move a delivery to `target`, applying `update` to the new record.
    ///
    /// Fails with a conflict if the current stored state may not move to
    /// `target`. The check and the write happen against the same version.
    pub async fn transition<F>(
        &self,
        key: DeliveryKey,
        target: DeliveryState,
        update: F,
    ) -> AppResult<AlertDelivery>
    where
        F: Fn(&mut AlertDelivery),
    {
        self.apply(key, None, |d| {
            update(d);
            Route::to(target)
        })
        .await
    }

    /// Compare-and-set loop shared by every state change.
    ///
    /// `plan` edits a copy of the current record and names the route it
    /// takes. When `claim` is given, the write only happens while that claim
    /// is still the one stored on the record.
    async fn apply<F>(
        &self,
        key: DeliveryKey,
        claim: Option<&Claim>,
        plan: F,
    ) -> AppResult<AlertDelivery>
    where
        F: Fn(&mut AlertDelivery) -> Route,
    {
        for _ in 0..MAX_CAS_RETRIES {
            let current = self
                .repo
                .find(key.alert_id, key.donor_id, key.channel)
                .await?
                .ok_or_else(|| not_found(key))?;

            if claim.is_some_and(|c| !c.is_held_in(&current)) {
                return Err(lapsed(&current));
            }

            let mut next = current.value.clone();
            next.updated_at = Utc::now();
            let route = plan(&mut next);
            if !route.is_legal_from(current.state) {
                return Err(AppError::conflict(format!(
                    "Delivery {} cannot move from {} to {}",
                    current.id, current.state, route.target
                )));
            }
            next.state = route.target;

            if self.repo.replace(&current, &next).await? {
                debug!(
                    delivery_id = %next.id,
                    from = %current.state,
                    to = %route.target,
                    "Delivery transitioned"
                );
                return Ok(next);
            }
        }

        Err(contended(key))
    }

    /// Lease a due delivery for one send attempt.
    ///
    /// A `Failed` delivery whose backoff has elapsed moves back to `Pending`
    /// as part of the claim. Returns `None` when the delivery is not due
    /// (held by another sender, waiting out its backoff, or settled).
    pub async fn claim(&self, key: DeliveryKey, now: DateTime<Utc>) -> AppResult<Option<Claim>> {
        let lease = self.config.claim_lease();

        for _ in 0..MAX_CAS_RETRIES {
            let Some(current) = self
                .repo
                .find(key.alert_id, key.donor_id, key.channel)
                .await?
            else {
                return Ok(None);
            };
            if !current.is_due(now) {
                return Ok(None);
            }

            let mut next = current.value.clone();
            next.state = DeliveryState::Pending;
            next.claimed_until = Some(offset(now, lease));
            next.claim_count = current.claim_count.saturating_add(1);
            next.last_attempt_at = Some(now);
            next.updated_at = now;

            if self.repo.replace(&current, &next).await? {
                return Ok(Some(Claim { delivery: next }));
            }
        }

        Err(contended(key))
    }

    /// Whether `claim` is still the lease stored on the record.
    pub async fn holds(&self, claim: &Claim) -> AppResult<bool> {
        let key = claim.key();
        Ok(self
            .repo
            .find(key.alert_id, key.donor_id, key.channel)
            .await?
            .is_some_and(|current| claim.is_held_in(&current)))
    }

    /// Drop a claim without recording an attempt.
    ///
    /// A claim that has already been taken over is left alone.
    pub async fn release(&self, claim: &Claim) -> AppResult<()> {
        let key = claim.key();
        for _ in 0..MAX_CAS_RETRIES {
            let Some(current) = self
                .repo
                .find(key.alert_id, key.donor_id, key.channel)
                .await?
            else {
                return Ok(());
            };
            if !claim.is_held_in(&current) {
                return Ok(());
            }

            let mut next = current.value.clone();
            next.claimed_until = None;
            next.updated_at = Utc::now();

            if self.repo.replace(&current, &next).await? {
                return Ok(());
            }
        }

        Err(contended(key))
    }

    /// The gateway accepted a send: `Pending → Sent`.
    ///
    /// Refused with a conflict if `claim` no longer holds the delivery.
    pub async fn mark_sent(&self, claim: &Claim) -> AppResult<AlertDelivery> {
        let now = Utc::now();
        self.apply(claim.key(), Some(claim), |d| {
            d.attempt_count += 1;
            d.sent_at = Some(now);
            d.claimed_until = None;
            d.next_attempt_at = None;
            d.last_error = None;
            Route::to(DeliveryState::Sent)
        })
        .await
    }

    /// The gateway confirmed delivery: `Sent → Delivered`.
    pub async fn mark_delivered(&self, key: DeliveryKey) -> AppResult<AlertDelivery> {
        let now = Utc::now();
        self.transition(key, DeliveryState::Delivered, |d| {
            d.delivered_at = Some(now);
        })
        .await
    }

    /// A send attempt under `claim` failed.
    ///
    /// The attempt is counted and the outcome written in one update: `Dead`
    /// for a permanent failure or an exhausted budget, otherwise `Failed`
    /// with the next retry time. Refused if the claim has lapsed.
    pub async fn record_send_failure(
        &self,
        claim: &Claim,
        reason: &str,
        permanent: bool,
    ) -> AppResult<AlertDelivery> {
        let now = Utc::now();
        let settled = self
            .apply(claim.key(), Some(claim), |d| {
                d.attempt_count += 1;
                d.claimed_until = None;
                d.last_error = Some(reason.to_string());
                self.settle(d, permanent, now)
            })
            .await?;
        self.log_settled(&settled, permanent);
        Ok(settled)
    }

    /// The gateway reported that an accepted message was not delivered.
    ///
    /// The send already counted as an attempt, so the budget is not charged
    /// again here.
    pub async fn record_delivery_failure(
        &self,
        key: DeliveryKey,
        reason: &str,
        permanent: bool,
    ) -> AppResult<AlertDelivery> {
        let now = Utc::now();
        let settled = self
            .apply(key, None, |d| {
                d.last_error = Some(reason.to_string());
                self.settle(d, permanent, now)
            })
            .await?;
        self.log_settled(&settled, permanent);
        Ok(settled)
    }

    /// Schedule a retry with backoff, or retire the delivery once it failed
    /// permanently or `max_attempts` attempts have been recorded.
    fn settle(&self, d: &mut AlertDelivery, permanent: bool, now: DateTime<Utc>) -> Route {
        if permanent || d.attempt_count >= self.config.max_attempts {
            d.next_attempt_at = None;
            return Route::via(DeliveryState::Failed, DeliveryState::Dead);
        }
        d.next_attempt_at = Some(offset(now, self.config.backoff(d.attempt_count)));
        Route::to(DeliveryState::Failed)
    }

    fn log_settled(&self, d: &AlertDelivery, permanent: bool) {
        match d.state {
            DeliveryState::Dead if permanent => warn!(
                delivery_id = %d.id,
                channel = %d.channel,
                reason = d.last_error.as_deref().unwrap_or_default(),
                "Delivery failed permanently"
            ),
            DeliveryState::Dead => warn!(
                delivery_id = %d.id,
                attempts = d.attempt_count,
                "Delivery exhausted its attempts"
            ),
            _ => debug!(
                delivery_id = %d.id,
                attempt = d.attempt_count,
                retry_at = ?d.next_attempt_at,
                "Scheduling delivery retry"
            ),
        }
    }

    /// Every delivery of an alert, ordered by donor then channel.
    pub async fn list(&self, alert_id: AlertId) -> AppResult<Vec<AlertDelivery>> {
        self.repo.list_by_alert(alert_id).await
    }

    /// Per-state counts for an alert.
    pub async fn summary(&self, alert_id: AlertId) -> AppResult<DeliverySummary> {
        let deliveries = self.list(alert_id).await?;
        Ok(DeliverySummary::from_deliveries(&deliveries))
    }
}

fn offset(from: DateTime<Utc>, by: std::time::Duration) -> DateTime<Utc> {
    ChronoDuration::from_std(by)
        .ok()
        .and_then(|by| from.checked_add_signed(by))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn not_found(key: DeliveryKey) -> AppError {
    AppError::not_found(format!(
        "No delivery for alert {} donor {} via {}",
        key.alert_id, key.donor_id, key.channel
    ))
}

fn lapsed(current: &AlertDelivery) -> AppError {
    AppError::conflict(format!(
        "Claim on delivery {} has lapsed (now {}, held until {:?})",
        current.id, current.state, current.claimed_until
    ))
}

fn contended(key: DeliveryKey) -> AppError {
    AppError::conflict(format!(
        "Delivery for alert {} donor {} via {} is under heavy contention",
        key.alert_id, key.donor_id, key.channel
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use bloodlink_core::error::ErrorKind;
    use bloodlink_core::traits::store::RecordStore;
    use bloodlink_store::memory::MemoryRecordStore;

    /// Memory store whose next compare-and-set can be made to fail.
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryRecordStore,
        fail_next_swap: AtomicBool,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: &str) -> AppResult<()> {
            self.inner.put(key, value).await
        }

        async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
            self.inner.scan_prefix(prefix).await
        }

        async fn put_if_absent(&self, key: &str, value: &str) -> AppResult<bool> {
            self.inner.put_if_absent(key, value).await
        }

        async fn compare_and_set(&self, key: &str, expected: &str, value: &str) -> AppResult<bool> {
            if self.fail_next_swap.swap(false, Ordering::SeqCst) {
                return Err(AppError::store("connection dropped"));
            }
            self.inner.compare_and_set(key, expected, value).await
        }

        async fn health_check(&self) -> AppResult<bool> {
            self.inner.health_check().await
        }
    }

    fn config(max_attempts: u32) -> DispatchConfig {
        DispatchConfig {
            max_attempts,
            base_backoff_ms: 0,
            ..DispatchConfig::default()
        }
    }

    fn tracker(max_attempts: u32) -> DeliveryTracker {
        let repo = DeliveryRepository::new(Arc::new(MemoryRecordStore::new()));
        DeliveryTracker::new(repo, config(max_attempts))
    }

    async fn one_delivery(t: &DeliveryTracker, channel: DeliveryChannel) -> DeliveryKey {
        let alert = AlertId::new();
        let donor = DonorId::new();
        t.ensure_deliveries(alert, &[donor], &[channel]).await.unwrap();
        DeliveryKey::new(alert, donor, channel)
    }

    fn after_lease(t: &DeliveryTracker, from: DateTime<Utc>) -> DateTime<Utc> {
        offset(from, t.config.claim_lease()) + ChronoDuration::milliseconds(1)
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let t = tracker(3);
        let alert = AlertId::new();
        let donors = vec![DonorId::new(), DonorId::new()];
        let channels = [DeliveryChannel::Push, DeliveryChannel::Sms, DeliveryChannel::Sms];

        let first = t.ensure_deliveries(alert, &donors, &channels).await.unwrap();
        let second = t.ensure_deliveries(alert, &donors, &channels).await.unwrap();

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
        assert_eq!(t.list(alert).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_happy_path() {
        let t = tracker(3);
        let key = one_delivery(&t, DeliveryChannel::Sms).await;

        let claim = t.claim(key, Utc::now()).await.unwrap().unwrap();
        assert!(t.holds(&claim).await.unwrap());
        let sent = t.mark_sent(&claim).await.unwrap();
        assert_eq!(sent.state, DeliveryState::Sent);
        assert_eq!(sent.attempt_count, 1);
        assert!(sent.sent_at.is_some());
        assert!(sent.claimed_until.is_none());
        assert!(!t.holds(&claim).await.unwrap());

        let delivered = t.mark_delivered(key).await.unwrap();
        assert_eq!(delivered.state, DeliveryState::Delivered);
        assert!(delivered.delivered_at.is_some());
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let t = tracker(3);
        let key = one_delivery(&t, DeliveryChannel::Push).await;
        let now = Utc::now();

        let claim = t.claim(key, now).await.unwrap().unwrap();
        assert!(t.claim(key, now).await.unwrap().is_none());

        t.release(&claim).await.unwrap();
        let again = t.claim(key, now).await.unwrap().unwrap();
        assert!(t.holds(&again).await.unwrap());
        assert!(!t.holds(&claim).await.unwrap());
    }

    #[tokio::test]
    async fn test_lapsed_claim_cannot_record() {
        let t = tracker(3);
        let key = one_delivery(&t, DeliveryChannel::Sms).await;
        let now = Utc::now();

        let stale = t.claim(key, now).await.unwrap().unwrap();
        let fresh = t.claim(key, after_lease(&t, now)).await.unwrap().unwrap();
        assert!(!t.holds(&stale).await.unwrap());
        assert!(t.holds(&fresh).await.unwrap());

        let err = t.mark_sent(&stale).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        let err = t.record_send_failure(&stale, "timeout", false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        // Releasing the stale claim leaves the new holder in place.
        t.release(&stale).await.unwrap();
        assert!(t.holds(&fresh).await.unwrap());

        let sent = t.mark_sent(&fresh).await.unwrap();
        assert_eq!(sent.attempt_count, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_end_dead() {
        let t = tracker(2);
        let key = one_delivery(&t, DeliveryChannel::Sms).await;

        let claim = t.claim(key, Utc::now()).await.unwrap().unwrap();
        let first = t.record_send_failure(&claim, "rate limited", false).await.unwrap();
        assert_eq!(first.state, DeliveryState::Failed);
        assert_eq!(first.attempt_count, 1);
        assert!(first.next_attempt_at.is_some());
        assert!(first.claimed_until.is_none());

        // The retry claim picks the failed record back up.
        let retry = t.claim(key, Utc::now()).await.unwrap().unwrap();
        assert_eq!(retry.delivery().state, DeliveryState::Pending);

        let second = t.record_send_failure(&retry, "rate limited", false).await.unwrap();
        assert_eq!(second.state, DeliveryState::Dead);
        assert_eq!(second.attempt_count, 2);
        assert_eq!(second.last_error.as_deref(), Some("rate limited"));
        assert!(t.claim(key, Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_is_a_single_write() {
        let store = Arc::new(FlakyStore::default());
        let t = DeliveryTracker::new(DeliveryRepository::new(store.clone()), config(3));
        let key = one_delivery(&t, DeliveryChannel::Sms).await;
        let now = Utc::now();
        let claim = t.claim(key, now).await.unwrap().unwrap();

        // The store drops the write: the record keeps the claim and nothing
        // half-applied is left behind.
        store.fail_next_swap.store(true, Ordering::SeqCst);
        let err = t.record_send_failure(&claim, "rate limited", false).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Store);

        let stored = t.get(key).await.unwrap();
        assert_eq!(stored.state, DeliveryState::Pending);
        assert_eq!(stored.attempt_count, 0);
        assert!(t.holds(&claim).await.unwrap());

        // Once the lease lapses the delivery is claimable again.
        assert!(t.claim(key, now).await.unwrap().is_none());
        let retry = t.claim(key, after_lease(&t, now)).await.unwrap().unwrap();

        let settled = t.record_send_failure(&retry, "rate limited", false).await.unwrap();
        assert_eq!(settled.state, DeliveryState::Failed);
        assert_eq!(settled.attempt_count, 1);
        assert_eq!(t.get(key).await.unwrap(), settled);
    }

    #[tokio::test]
    async fn test_terminal_states_reject_transitions() {
        let t = tracker(3);
        let key = one_delivery(&t, DeliveryChannel::Email).await;

        let claim = t.claim(key, Utc::now()).await.unwrap().unwrap();
        let dead = t.record_send_failure(&claim, "no such address", true).await.unwrap();
        assert_eq!(dead.state, DeliveryState::Dead);
        assert_eq!(dead.attempt_count, 1);

        let err = t.mark_delivered(key).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(t.get(key).await.unwrap().state, DeliveryState::Dead);
    }

    #[tokio::test]
    async fn test_callback_failure_after_sent_is_retried() {
        let t = tracker(3);
        let key = one_delivery(&t, DeliveryChannel::Push).await;

        let claim = t.claim(key, Utc::now()).await.unwrap().unwrap();
        t.mark_sent(&claim).await.unwrap();
        let retried = t
            .record_delivery_failure(key, "device offline", false)
            .await
            .unwrap();
        assert_eq!(retried.state, DeliveryState::Failed);
        assert_eq!(retried.attempt_count, 1);
        assert!(retried.next_attempt_at.is_some());

        let claim = t.claim(key, Utc::now()).await.unwrap().unwrap();
        t.mark_sent(&claim).await.unwrap();
        let dead = t
            .record_delivery_failure(key, "token revoked", true)
            .await
            .unwrap();
        assert_eq!(dead.state, DeliveryState::Dead);
        assert_eq!(dead.attempt_count, 2);
    }

    #[tokio::test]
    async fn test_unknown_delivery_is_not_found() {
        let t = tracker(3);
        let key = DeliveryKey::new(AlertId::new(), DonorId::new(), DeliveryChannel::Sms);
        let err = t.mark_delivered(key).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert!(t.claim(key, Utc::now()).await.unwrap().is_none());
    }
}
