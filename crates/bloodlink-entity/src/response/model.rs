//! Donor response models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::error::AppError;
use bloodlink_core::types::{AlertId, DonorId};

/// A donor's answer to an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// The donor is coming.
    Yes,
    /// The donor declines.
    No,
    /// The donor cannot donate at the moment.
    Unavailable,
}

impl ResponseKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResponseKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            "unavailable" => Ok(Self::Unavailable),
            _ => Err(AppError::validation(format!(
                "Unknown response '{s}', expected yes, no or unavailable"
            ))),
        }
    }
}

/// The latest answer of one donor to one alert.
///
/// One record per (alert, donor); answering again replaces the earlier
/// answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorResponse {
    /// Alert answered.
    pub alert_id: AlertId,
    /// Donor answering.
    pub donor_id: DonorId,
    /// The answer.
    pub response: ResponseKind,
    /// When the donor first answered.
    pub first_responded_at: DateTime<Utc>,
    /// When the current answer was given.
    pub responded_at: DateTime<Utc>,
}

/// Response counts for one alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSummary {
    /// Donors who answered.
    pub total: usize,
    /// Answered yes.
    pub yes: usize,
    /// Answered no.
    pub no: usize,
    /// Answered unavailable.
    pub unavailable: usize,
    /// Donors the alert reached.
    pub reached: usize,
    /// `total / reached`, or 0 when nobody was reached.
    pub response_rate: f64,
}

impl ResponseSummary {
    /// Tally responses against the number of donors reached.
    pub fn from_responses<'a>(
        responses: impl IntoIterator<Item = &'a DonorResponse>,
        reached: usize,
    ) -> Self {
        let mut summary = Self {
            reached,
            ..Self::default()
        };
        for r in responses {
            summary.total += 1;
            match r.response {
                ResponseKind::Yes => summary.yes += 1,
                ResponseKind::No => summary.no += 1,
                ResponseKind::Unavailable => summary.unavailable += 1,
            }
        }
        if reached > 0 {
            summary.response_rate = summary.total as f64 / reached as f64;
        }
        summary
    }
}
