//! Match lookups on behalf of a hospital.

use chrono::Utc;
use tracing::{debug, info};

use bloodlink_core::config::MatchingConfig;
use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::types::RecipientId;
use bloodlink_entity::matching::Match;
use bloodlink_entity::recipient::Recipient;
use bloodlink_store::repositories::{DonorRepository, MatchRepository, RecipientRepository};

use super::ranker::MatchRanker;
use crate::context::RequestContext;

/// Finds and optionally records donor matches for recipients.
#[derive(Debug, Clone)]
pub struct MatchService {
    donors: DonorRepository,
    recipients: RecipientRepository,
    matches: MatchRepository,
    ranker: MatchRanker,
    persist: bool,
}

impl MatchService {
    /// Creates a new match service.
    pub fn new(
        donors: DonorRepository,
        recipients: RecipientRepository,
        matches: MatchRepository,
        config: MatchingConfig,
    ) -> Self {
        let persist = config.persist_matches;
        Self {
            donors,
            recipients,
            matches,
            ranker: MatchRanker::new(config),
            persist,
        }
    }

    /// Ranked candidate donors for a recipient of the calling hospital.
    pub async fn find_matches(
        &self,
        ctx: &RequestContext,
        recipient_id: RecipientId,
        max_distance_km: Option<f64>,
    ) -> AppResult<Vec<Match>> {
        let recipient = self.owned_recipient(ctx, recipient_id).await?;
        let donors = self.donors.list_all().await?;

        let matches = self
            .ranker
            .rank(&recipient, &donors, max_distance_km, Utc::now())?;

        info!(
            hospital_id = %ctx.hospital_id,
            recipient_id = %recipient_id,
            blood_group = %recipient.blood_group,
            candidates = donors.len(),
            matches = matches.len(),
            "Ranked donors for recipient"
        );

        if self.persist && !matches.is_empty() {
            self.matches.save_all(&matches).await?;
            debug!(recipient_id = %recipient_id, "Recorded match audit trail");
        }

        Ok(matches)
    }

    /// Previously recorded matches for a recipient.
    pub async fn recorded_matches(
        &self,
        ctx: &RequestContext,
        recipient_id: RecipientId,
    ) -> AppResult<Vec<Match>> {
        self.owned_recipient(ctx, recipient_id).await?;
        self.matches.list_by_recipient(recipient_id).await
    }

    async fn owned_recipient(
        &self,
        ctx: &RequestContext,
        recipient_id: RecipientId,
    ) -> AppResult<Recipient> {
        let recipient = self
            .recipients
            .find_by_id(recipient_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipient {recipient_id} not found")))?;

        if !ctx.owns(recipient.hospital_id) {
            return Err(AppError::authorization(format!(
                "Recipient {recipient_id} belongs to another hospital"
            )));
        }
        Ok(recipient)
    }
}
