//! Donor response repository.

use std::sync::Arc;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::{AlertId, DonorId};
use bloodlink_entity::response::DonorResponse;

use crate::keys;

/// Latest response per (alert, donor).
#[derive(Debug, Clone)]
pub struct ResponseRepository {
    store: Arc<dyn RecordStore>,
}

impl ResponseRepository {
    /// Creates a new response repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The donor's current response to an alert.
    pub async fn find(
        &self,
        alert_id: AlertId,
        donor_id: DonorId,
    ) -> AppResult<Option<DonorResponse>> {
        self.store
            .get_json(&keys::response(alert_id, donor_id))
            .await
    }

    /// Store a response, replacing any earlier one from the same donor.
    pub async fn save(&self, response: &DonorResponse) -> AppResult<()> {
        self.store
            .put_json(&keys::response(response.alert_id, response.donor_id), response)
            .await
    }

    /// Every response to an alert, ordered by donor.
    pub async fn list_by_alert(&self, alert_id: AlertId) -> AppResult<Vec<DonorResponse>> {
        self.store
            .scan_json(&keys::alert_responses(alert_id))
            .await
    }
}
