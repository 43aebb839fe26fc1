//! Alert lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an alert.
///
/// ```text
/// Draft ──► Active ──► Expired
///   │         │
///   └────────►└──────► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    /// Created but not yet dispatchable.
    Draft,
    /// Dispatchable until `expires_at`.
    Active,
    /// Passed its expiry time.
    Expired,
    /// Withdrawn by the issuing hospital.
    Cancelled,
}

impl AlertState {
    /// Check if the alert can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: AlertState) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Active)
                | (Self::Draft, Self::Cancelled)
                | (Self::Active, Self::Expired)
                | (Self::Active, Self::Cancelled)
        )
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(AlertState::Draft.can_transition_to(AlertState::Active));
        assert!(AlertState::Active.can_transition_to(AlertState::Cancelled));
        assert!(!AlertState::Expired.can_transition_to(AlertState::Active));
        assert!(!AlertState::Cancelled.can_transition_to(AlertState::Active));
        assert!(!AlertState::Draft.can_transition_to(AlertState::Expired));
        assert!(!AlertState::Active.can_transition_to(AlertState::Active));
    }
}
