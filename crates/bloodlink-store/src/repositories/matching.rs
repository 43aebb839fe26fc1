//! Audit trail of computed matches.

use std::sync::Arc;

use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::RecipientId;
use bloodlink_entity::matching::Match;

use crate::keys;

/// Stores computed matches for later inspection.
#[derive(Debug, Clone)]
pub struct MatchRepository {
    store: Arc<dyn RecordStore>,
}

impl MatchRepository {
    /// Creates a new match repository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Persist a batch of matches.
    pub async fn save_all(&self, matches: &[Match]) -> AppResult<()> {
        for m in matches {
            self.store
                .put_json(&keys::matched(m.recipient_id, m.id), m)
                .await?;
        }
        Ok(())
    }

    /// Every audited match of a recipient.
    pub async fn list_by_recipient(&self, recipient_id: RecipientId) -> AppResult<Vec<Match>> {
        self.store
            .scan_json(&keys::recipient_matches(recipient_id))
            .await
    }
}
