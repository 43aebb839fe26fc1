//! Notification delivery channels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Transport used to reach a donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryChannel {
    /// Mobile push notification.
    Push,
    /// SMS text message.
    Sms,
    /// E-mail.
    Email,
}

impl DeliveryChannel {
    /// All channels, in canonical order.
    pub const ALL: [DeliveryChannel; 3] = [Self::Push, Self::Sms, Self::Email];

    /// Return the channel as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryChannel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            other => Err(AppError::validation(format!(
                "Unknown delivery channel: '{other}'"
            ))),
        }
    }
}
