//! Donor directory repository.

use std::sync::Arc;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::DonorId;
use bloodlink_entity::donor::Donor;

use super::{check_location, keep_located};
use crate::keys;

/// Donor lookups by id and full scans.
#[derive(Debug, Clone)]
pub struct DonorRepository {
    store: Arc<dyn RecordStore>,
}

impl DonorRepository {
    /// Creates a new donor repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Find a donor by id.
    ///
    /// A stored donor with out-of-range coordinates is a validation error.
    pub async fn find_by_id(&self, id: DonorId) -> AppResult<Option<Donor>> {
        let donor: Option<Donor> = self.store.get_json(&keys::donor(id)).await?;
        if let Some(donor) = &donor {
            check_location(donor)?;
        }
        Ok(donor)
    }

    /// Insert or overwrite a donor.
    pub async fn save(&self, donor: &Donor) -> AppResult<()> {
        check_location(donor)?;
        self.store.put_json(&keys::donor(donor.id), donor).await
    }

    /// All donors, including inactive ones, in id order.
    ///
    /// Donors with out-of-range coordinates are skipped.
    pub async fn list_all(&self) -> AppResult<Vec<Donor>> {
        let donors = self.store.scan_json(&keys::donors()).await?;
        Ok(keep_located(donors))
    }
}
