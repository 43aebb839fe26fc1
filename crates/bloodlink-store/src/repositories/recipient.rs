//! Recipient directory repository.

use std::sync::Arc;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::RecipientId;
use bloodlink_entity::recipient::Recipient;

use super::{check_location, keep_located};
use crate::keys;

/// Recipient lookups by id.
#[derive(Debug, Clone)]
pub struct RecipientRepository {
    store: Arc<dyn RecordStore>,
}

impl RecipientRepository {
    /// Creates a new recipient repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Find a recipient by id.
    pub async fn find_by_id(&self, id: RecipientId) -> AppResult<Option<Recipient>> {
        let recipient: Option<Recipient> = self.store.get_json(&keys::recipient(id)).await?;
        if let Some(recipient) = &recipient {
            check_location(recipient)?;
        }
        Ok(recipient)
    }

    /// Insert or overwrite a recipient.
    pub async fn save(&self, recipient: &Recipient) -> AppResult<()> {
        check_location(recipient)?;
        self.store
            .put_json(&keys::recipient(recipient.id), recipient)
            .await
    }

    /// All recipients in id order.
    pub async fn list_all(&self) -> AppResult<Vec<Recipient>> {
        let recipients = self.store.scan_json(&keys::recipients()).await?;
        Ok(keep_located(recipients))
    }
}
