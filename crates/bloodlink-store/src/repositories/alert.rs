//! Alert repository.

use std::sync::Arc;

use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::AlertId;
use bloodlink_entity::alert::Alert;

use super::{Versioned, load_versioned, swap};
use crate::keys;

/// Alert persistence with compare-and-set state updates.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    store: Arc<dyn RecordStore>,
}

impl AlertRepository {
    /// Creates a new alert repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Store a new alert. Fails with a conflict if the id is taken.
    pub async fn create(&self, alert: &Alert) -> AppResult<()> {
        let json = serde_json::to_string(alert)?;
        if self.store.put_if_absent(&keys::alert(alert.id), &json).await? {
            Ok(())
        } else {
            Err(AppError::conflict(format!("Alert {} already exists", alert.id)))
        }
    }

    /// Find an alert by id.
    pub async fn find_by_id(&self, id: AlertId) -> AppResult<Option<Alert>> {
        self.store.get_json(&keys::alert(id)).await
    }

    /// Find an alert together with its version token.
    pub async fn find_versioned(&self, id: AlertId) -> AppResult<Option<Versioned<Alert>>> {
        load_versioned(&*self.store, &keys::alert(id)).await
    }

    /// Replace `current` with `next` unless the alert changed in between.
    pub async fn replace(&self, current: &Versioned<Alert>, next: &Alert) -> AppResult<bool> {
        swap(&*self.store, &keys::alert(current.id), current, next).await
    }

    /// All alerts in id order.
    pub async fn list_all(&self) -> AppResult<Vec<Alert>> {
        self.store.scan_json(&keys::alerts()).await
    }
}
