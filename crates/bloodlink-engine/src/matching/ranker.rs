//! Ranks compatible donors for a recipient.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use bloodlink_core::config::MatchingConfig;
use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::types::MatchId;
use bloodlink_entity::donor::Donor;
use bloodlink_entity::matching::{Match, MatchQuality};
use bloodlink_entity::recipient::Recipient;

use super::score::Scorer;
use crate::compatibility::compatible_donors;
use crate::distance::distance_km;

/// Produces the ordered candidate list for one recipient.
///
/// Pure over its inputs: the same donors, recipient, radius and `now` always
/// yield the same list, ids included.
#[derive(Debug, Clone)]
pub struct MatchRanker {
    scorer: Scorer,
    require_verified: bool,
}

impl MatchRanker {
    /// Creates a ranker from matching settings.
    pub fn new(config: MatchingConfig) -> Self {
        let require_verified = config.require_verified_donors;
        Self {
            scorer: Scorer::new(config),
            require_verified,
        }
    }

    /// Rank `donors` for `recipient`.
    ///
    /// Donors that are inactive, incompatible, or farther than
    /// `max_distance_km` are dropped. The rest are sorted by score
    /// descending, then distance ascending, then donor id ascending.
    pub fn rank(
        &self,
        recipient: &Recipient,
        donors: &[Donor],
        max_distance_km: Option<f64>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Match>> {
        if let Some(radius) = max_distance_km.filter(|r| !r.is_finite() || *r < 0.0) {
            return Err(AppError::validation(format!(
                "max_distance_km must be a non-negative number, got {radius}"
            )));
        }

        let eligible_groups = compatible_donors(recipient.blood_group);
        let mut matches: Vec<Match> = donors
            .iter()
            .filter(|donor| eligible_groups.contains(&donor.blood_group))
            .filter(|donor| donor.is_active)
            .filter(|donor| !self.require_verified || donor.is_verified())
            .filter_map(|donor| {
                let distance = distance_km(donor.location, recipient.location);
                if max_distance_km.is_some_and(|radius| distance > radius) {
                    return None;
                }
                let score = self
                    .scorer
                    .score(donor, recipient.blood_group, distance, now);
                Some(Match {
                    id: match_id(recipient, donor),
                    donor_id: donor.id,
                    recipient_id: recipient.id,
                    match_score: score,
                    distance_km: distance,
                    compatibility_label: Match::label(donor.blood_group, recipient.blood_group),
                    quality: MatchQuality::from_score(score),
                    created_at: now,
                })
            })
            .collect();

        matches.sort_by(compare);
        Ok(matches)
    }
}

fn compare(a: &Match, b: &Match) -> Ordering {
    b.match_score
        .cmp(&a.match_score)
        .then_with(|| a.distance_km.total_cmp(&b.distance_km))
        .then_with(|| a.donor_id.cmp(&b.donor_id))
}

/// Stable id for a (recipient, donor) pairing.
fn match_id(recipient: &Recipient, donor: &Donor) -> MatchId {
    MatchId::from_uuid(Uuid::new_v5(recipient.id.as_uuid(), donor.id.as_uuid().as_bytes()))
}
