//! Alert delivery repository.

use std::sync::Arc;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::{AlertId, DeliveryChannel, DonorId};
use bloodlink_entity::delivery::AlertDelivery;

use super::{Versioned, load_versioned, swap};
use crate::keys;

/// Delivery records keyed by their (alert, donor, channel) tuple.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    store: Arc<dyn RecordStore>,
}

impl DeliveryRepository {
    /// Creates a new delivery repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Find the delivery for one tuple, with its version token.
    pub async fn find(
        &self,
        alert_id: AlertId,
        donor_id: DonorId,
        channel: DeliveryChannel,
    ) -> AppResult<Option<Versioned<AlertDelivery>>> {
        load_versioned(&*self.store, &keys::delivery(alert_id, donor_id, channel)).await
    }

    /// Store `delivery` unless its tuple already has a record.
    /// Returns `true` if this call created the record.
    pub async fn insert_if_absent(&self, delivery: &AlertDelivery) -> AppResult<bool> {
        let key = keys::delivery(delivery.alert_id, delivery.donor_id, delivery.channel);
        let json = serde_json::to_string(delivery)?;
        self.store.put_if_absent(&key, &json).await
    }

    /// Replace `current` with `next` unless the record changed in between.
    pub async fn replace(
        &self,
        current: &Versioned<AlertDelivery>,
        next: &AlertDelivery,
    ) -> AppResult<bool> {
        let key = keys::delivery(current.alert_id, current.donor_id, current.channel);
        swap(&*self.store, &key, current, next).await
    }

    /// Every delivery of an alert, ordered by donor then channel.
    pub async fn list_by_alert(&self, alert_id: AlertId) -> AppResult<Vec<AlertDelivery>> {
        self.store
            .scan_json(&keys::alert_deliveries(alert_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRecordStore;
    use bloodlink_entity::delivery::DeliveryState;
    use chrono::Utc;

    fn repo() -> DeliveryRepository {
        DeliveryRepository::new(Arc::new(MemoryRecordStore::new()))
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first() {
        let repo = repo();
        let now = Utc::now();
        let first = AlertDelivery::new(AlertId::new(), DonorId::new(), DeliveryChannel::Sms, now);
        let mut second = first.clone();
        second.id = bloodlink_core::types::DeliveryId::new();

        assert!(repo.insert_if_absent(&first).await.unwrap());
        assert!(!repo.insert_if_absent(&second).await.unwrap());

        let stored = repo
            .find(first.alert_id, first.donor_id, first.channel)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[tokio::test]
    async fn test_replace_detects_stale_version() {
        let repo = repo();
        let d = AlertDelivery::new(AlertId::new(), DonorId::new(), DeliveryChannel::Push, Utc::now());
        repo.insert_if_absent(&d).await.unwrap();

        let v1 = repo.find(d.alert_id, d.donor_id, d.channel).await.unwrap().unwrap();
        let v1_again = v1.clone();

        let mut sent = v1.value.clone();
        sent.state = DeliveryState::Sent;
        assert!(repo.replace(&v1, &sent).await.unwrap());

        let mut dead = v1_again.value.clone();
        dead.state = DeliveryState::Dead;
        assert!(!repo.replace(&v1_again, &dead).await.unwrap());

        let current = repo.find(d.alert_id, d.donor_id, d.channel).await.unwrap().unwrap();
        assert_eq!(current.state, DeliveryState::Sent);
    }
}
