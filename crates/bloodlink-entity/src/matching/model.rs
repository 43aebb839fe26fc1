//! Match entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::types::{DonorId, MatchId, RecipientId};

use crate::blood::BloodGroup;

/// Coarse label for a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    /// Score of 90 or more.
    Excellent,
    /// Score of 75 to 89.
    Good,
    /// Score of 60 to 74.
    Fair,
    /// Anything lower.
    Poor,
}

impl MatchQuality {
    /// Bucket a 0–100 score.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Self::Excellent,
            75..=89 => Self::Good,
            60..=74 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

impl fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// A ranked donor candidate for one recipient.
///
/// Derived on demand; persisted only for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Unique match identifier.
    pub id: MatchId,
    /// Candidate donor.
    pub donor_id: DonorId,
    /// Recipient in need.
    pub recipient_id: RecipientId,
    /// Deterministic score, 0–100.
    pub match_score: u8,
    /// Great-circle distance between donor and recipient.
    pub distance_km: f64,
    /// Compatibility edge, e.g. `"O- → AB+"`.
    pub compatibility_label: String,
    /// Score bucket.
    pub quality: MatchQuality,
    /// When the match was computed.
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Render the compatibility edge label for a donor/recipient pair.
    pub fn label(donor: BloodGroup, recipient: BloodGroup) -> String {
        format!("{donor} → {recipient}")
    }
}
