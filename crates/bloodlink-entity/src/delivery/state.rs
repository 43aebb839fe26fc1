//! Delivery state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of one (alert, donor, channel) delivery.
///
/// ```text
/// Pending ──► Sent ──► Delivered
///   │  ▲       │
///   │  │       ▼
///   │  └──── Failed ──► Dead
///   └──────────────────► Dead
/// ```
///
/// A transient failure parks the record in `Failed` with a retry time;
/// claiming it for the retry moves it back to `Pending`. A permanent
/// failure, or one that exhausts the attempt budget, is written as `Dead`
/// in the same update, passing through `Failed` without storing it.
/// `Delivered` and `Dead` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryState {
    /// Waiting for a send attempt.
    Pending,
    /// Accepted by the gateway, awaiting confirmation.
    Sent,
    /// Confirmed received.
    Delivered,
    /// Last attempt failed; waiting out the backoff before a retry.
    Failed,
    /// Given up. Surfaced to the hospital operator.
    Dead,
}

impl DeliveryState {
    /// All states, in canonical order.
    pub const ALL: [DeliveryState; 5] = [
        Self::Pending,
        Self::Sent,
        Self::Delivered,
        Self::Failed,
        Self::Dead,
    ];

    /// Check if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Dead)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: DeliveryState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sent)
                | (Self::Pending, Self::Failed)
                | (Self::Pending, Self::Dead)
                | (Self::Sent, Self::Delivered)
                | (Self::Sent, Self::Failed)
                | (Self::Failed, Self::Pending)
                | (Self::Failed, Self::Dead)
        )
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_are_sticky() {
        for next in DeliveryState::ALL {
            assert!(!DeliveryState::Dead.can_transition_to(next));
            assert!(!DeliveryState::Delivered.can_transition_to(next));
        }
    }

    #[test]
    fn test_legal_edges() {
        use DeliveryState::*;
        let legal = [
            (Pending, Sent),
            (Pending, Failed),
            (Pending, Dead),
            (Sent, Delivered),
            (Sent, Failed),
            (Failed, Pending),
            (Failed, Dead),
        ];
        for from in DeliveryState::ALL {
            for to in DeliveryState::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }
}
