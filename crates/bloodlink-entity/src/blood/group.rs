//! The eight ABO/Rh blood groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use bloodlink_core::error::AppError;

/// ABO/Rh blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    /// O negative.
    #[serde(rename = "O-")]
    ONeg,
    /// O positive.
    #[serde(rename = "O+")]
    OPos,
    /// A negative.
    #[serde(rename = "A-")]
    ANeg,
    /// A positive.
    #[serde(rename = "A+")]
    APos,
    /// B negative.
    #[serde(rename = "B-")]
    BNeg,
    /// B positive.
    #[serde(rename = "B+")]
    BPos,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNeg,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPos,
}

impl BloodGroup {
    /// All eight groups.
    pub const ALL: [BloodGroup; 8] = [
        Self::ONeg,
        Self::OPos,
        Self::ANeg,
        Self::APos,
        Self::BNeg,
        Self::BPos,
        Self::AbNeg,
        Self::AbPos,
    ];

    /// Return the conventional notation, e.g. `"AB+"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ONeg => "O-",
            Self::OPos => "O+",
            Self::ANeg => "A-",
            Self::APos => "A+",
            Self::BNeg => "B-",
            Self::BPos => "B+",
            Self::AbNeg => "AB-",
            Self::AbPos => "AB+",
        }
    }

    /// Whether the group is Rh positive.
    pub fn is_rh_positive(&self) -> bool {
        matches!(self, Self::OPos | Self::APos | Self::BPos | Self::AbPos)
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| AppError::validation(format!("Unknown blood group: '{s}'")))
    }
}
