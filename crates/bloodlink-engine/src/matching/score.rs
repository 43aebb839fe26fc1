//! Deterministic match scoring.

use chrono::{DateTime, Utc};

use bloodlink_core::config::MatchingConfig;
use bloodlink_entity::blood::BloodGroup;
use bloodlink_entity::donor::Donor;

/// Computes a 0–100 score for a compatible donor.
///
/// `base − distance penalty − recency penalty`, clamped and rounded:
/// - base is `exact_match_base` for identical groups, otherwise `cross_match_base`
/// - distance penalty grows linearly per km and is capped
/// - recency penalty decays linearly to zero over the donation interval
#[derive(Debug, Clone)]
pub struct Scorer {
    config: MatchingConfig,
}

impl Scorer {
    /// Creates a scorer from matching weights.
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Score `donor` for a recipient of `recipient_group` at `distance_km`.
    pub fn score(
        &self,
        donor: &Donor,
        recipient_group: BloodGroup,
        distance_km: f64,
        now: DateTime<Utc>,
    ) -> u8 {
        let base = if donor.blood_group == recipient_group {
            self.config.exact_match_base
        } else {
            self.config.cross_match_base
        };

        let raw = base - self.distance_penalty(distance_km) - self.recency_penalty(donor, now);
        raw.clamp(0.0, 100.0).round() as u8
    }

    fn distance_penalty(&self, distance_km: f64) -> f64 {
        (distance_km.max(0.0) * self.config.distance_penalty_per_km)
            .min(self.config.max_distance_penalty)
    }

    fn recency_penalty(&self, donor: &Donor, now: DateTime<Utc>) -> f64 {
        let interval = i64::from(self.config.donation_interval_days);
        match donor.days_since_last_donation(now) {
            Some(days) if interval > 0 && days < interval => {
                self.config.recency_penalty_max * (interval - days) as f64 / interval as f64
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloodlink_core::types::{DonorId, GeoPoint, HospitalId};
    use bloodlink_entity::donor::{DonorContact, VerificationStatus};
    use chrono::Duration;

    fn donor(group: BloodGroup, last_donation: Option<DateTime<Utc>>) -> Donor {
        let now = Utc::now();
        Donor {
            id: DonorId::new(),
            hospital_id: HospitalId::new(),
            name: "Nimal".to_string(),
            blood_group: group,
            location: GeoPoint::new(6.9, 79.8).unwrap(),
            is_active: true,
            last_donation_date: last_donation,
            verification_status: VerificationStatus::Verified,
            contact: DonorContact::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_exact_match_at_zero_distance_scores_full() {
        let scorer = Scorer::new(MatchingConfig::default());
        let now = Utc::now();
        assert_eq!(scorer.score(&donor(BloodGroup::APos, None), BloodGroup::APos, 0.0, now), 100);
        assert_eq!(scorer.score(&donor(BloodGroup::ONeg, None), BloodGroup::APos, 0.0, now), 80);
    }

    #[test]
    fn test_distance_penalty_is_capped() {
        let scorer = Scorer::new(MatchingConfig::default());
        let now = Utc::now();
        let d = donor(BloodGroup::APos, None);
        assert_eq!(scorer.score(&d, BloodGroup::APos, 20.0, now), 90);
        assert_eq!(scorer.score(&d, BloodGroup::APos, 10_000.0, now), 60);
    }

    #[test]
    fn test_recent_donation_penalised() {
        let scorer = Scorer::new(MatchingConfig::default());
        let now = Utc::now();
        let fresh = donor(BloodGroup::APos, Some(now));
        let halfway = donor(BloodGroup::APos, Some(now - Duration::days(28)));
        let rested = donor(BloodGroup::APos, Some(now - Duration::days(120)));
        assert_eq!(scorer.score(&fresh, BloodGroup::APos, 0.0, now), 60);
        assert_eq!(scorer.score(&halfway, BloodGroup::APos, 0.0, now), 80);
        assert_eq!(scorer.score(&rested, BloodGroup::APos, 0.0, now), 100);
    }

    #[test]
    fn test_score_never_negative() {
        let config = MatchingConfig {
            cross_match_base: 10.0,
            ..MatchingConfig::default()
        };
        let scorer = Scorer::new(config);
        let now = Utc::now();
        let d = donor(BloodGroup::ONeg, Some(now));
        assert_eq!(scorer.score(&d, BloodGroup::AbPos, 500.0, now), 0);
    }
}
