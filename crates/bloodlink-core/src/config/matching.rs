//! Match scoring configuration.
//!
//! The weights below drive the deterministic match score. Every penalty is
//! capped so a compatible donor never scores below zero.

use serde::{Deserialize, Serialize};

/// Weights and thresholds for donor ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Base score for a donor whose blood group equals the recipient's.
    #[serde(default = "default_exact_match_base")]
    pub exact_match_base: f64,
    /// Base score for a compatible donor of a different blood group.
    #[serde(default = "default_cross_match_base")]
    pub cross_match_base: f64,
    /// Points removed per kilometre between donor and recipient.
    #[serde(default = "default_distance_penalty_per_km")]
    pub distance_penalty_per_km: f64,
    /// Upper bound of the distance penalty.
    #[serde(default = "default_max_distance_penalty")]
    pub max_distance_penalty: f64,
    /// Minimum days between two whole-blood donations.
    #[serde(default = "default_donation_interval_days")]
    pub donation_interval_days: u32,
    /// Penalty applied to a donor who donated today, decaying linearly to
    /// zero at `donation_interval_days`.
    #[serde(default = "default_recency_penalty_max")]
    pub recency_penalty_max: f64,
    /// Exclude donors whose verification is not `verified`.
    #[serde(default)]
    pub require_verified_donors: bool,
    /// Persist computed matches under `match:` keys for audit.
    #[serde(default)]
    pub persist_matches: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            exact_match_base: default_exact_match_base(),
            cross_match_base: default_cross_match_base(),
            distance_penalty_per_km: default_distance_penalty_per_km(),
            max_distance_penalty: default_max_distance_penalty(),
            donation_interval_days: default_donation_interval_days(),
            recency_penalty_max: default_recency_penalty_max(),
            require_verified_donors: false,
            persist_matches: false,
        }
    }
}

fn default_exact_match_base() -> f64 {
    100.0
}

fn default_cross_match_base() -> f64 {
    80.0
}

fn default_distance_penalty_per_km() -> f64 {
    0.5
}

fn default_max_distance_penalty() -> f64 {
    40.0
}

fn default_donation_interval_days() -> u32 {
    56
}

fn default_recency_penalty_max() -> f64 {
    40.0
}
