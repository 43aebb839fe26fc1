//! Hospital directory repository.

use std::sync::Arc;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::HospitalId;
use bloodlink_entity::hospital::Hospital;

use super::check_location;
use crate::keys;

/// Hospital lookups by id.
#[derive(Debug, Clone)]
pub struct HospitalRepository {
    store: Arc<dyn RecordStore>,
}

impl HospitalRepository {
    /// Creates a new hospital repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Find a hospital by id.
    pub async fn find_by_id(&self, id: HospitalId) -> AppResult<Option<Hospital>> {
        let hospital: Option<Hospital> = self.store.get_json(&keys::hospital(id)).await?;
        if let Some(hospital) = &hospital {
            check_location(hospital)?;
        }
        Ok(hospital)
    }

    /// Insert or overwrite a hospital.
    pub async fn save(&self, hospital: &Hospital) -> AppResult<()> {
        check_location(hospital)?;
        self.store
            .put_json(&keys::hospital(hospital.id), hospital)
            .await
    }
}
