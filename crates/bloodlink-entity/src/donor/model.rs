//! Donor entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bloodlink_core::types::{DeliveryChannel, DonorId, GeoPoint, HospitalId};

use crate::blood::BloodGroup;

/// Verification state of a donor profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Awaiting review by hospital staff.
    Pending,
    /// Reviewed and confirmed.
    Verified,
    /// Reviewed and refused.
    Rejected,
}

/// How a donor can be reached on each channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorContact {
    /// Phone number for SMS.
    pub phone: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Device token for push notifications.
    pub push_token: Option<String>,
}

/// A registered blood donor.
///
/// Donors are never hard-deleted; `is_active = false` removes them from
/// matching and alert audiences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    /// Unique donor identifier.
    pub id: DonorId,
    /// Hospital that registered the donor.
    pub hospital_id: HospitalId,
    /// Display name.
    pub name: String,
    /// ABO/Rh group.
    pub blood_group: BloodGroup,
    /// Geocoded home location.
    pub location: GeoPoint,
    /// Whether the donor is currently available.
    pub is_active: bool,
    /// Most recent donation, if any.
    pub last_donation_date: Option<DateTime<Utc>>,
    /// Profile verification state.
    pub verification_status: VerificationStatus,
    /// Contact details per channel.
    #[serde(default)]
    pub contact: DonorContact,
    /// When the donor was registered.
    pub created_at: DateTime<Utc>,
    /// When the donor was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Donor {
    /// Address to use for `channel`, if the donor has one.
    pub fn contact_for(&self, channel: DeliveryChannel) -> Option<&str> {
        let value = match channel {
            DeliveryChannel::Push => self.contact.push_token.as_deref(),
            DeliveryChannel::Sms => self.contact.phone.as_deref(),
            DeliveryChannel::Email => self.contact.email.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Whole days since the last donation, or `None` if never donated.
    ///
    /// A donation date in the future counts as today.
    pub fn days_since_last_donation(&self, now: DateTime<Utc>) -> Option<i64> {
        self.last_donation_date
            .map(|last| (now - last).num_days().max(0))
    }

    /// Whether the profile has been verified.
    pub fn is_verified(&self) -> bool {
        self.verification_status == VerificationStatus::Verified
    }
}
