//! Alert audience selection.

use bloodlink_core::types::GeoPoint;
use bloodlink_entity::alert::AudienceCriteria;
use bloodlink_entity::blood::BloodGroup;
use bloodlink_entity::donor::Donor;
use bloodlink_entity::hospital::Hospital;
use bloodlink_entity::recipient::Recipient;

use crate::compatibility::can_donate;
use crate::distance::distance_km;

/// Where an alert is centred and whom it serves.
#[derive(Debug, Clone, Copy)]
pub struct AudienceAnchor {
    /// Point distances are measured from.
    pub location: GeoPoint,
    /// Recipient group donors must be compatible with, if the alert names one.
    pub recipient_group: Option<BloodGroup>,
}

impl AudienceAnchor {
    /// Anchor an alert on its recipient.
    pub fn recipient(recipient: &Recipient) -> Self {
        Self {
            location: recipient.location,
            recipient_group: Some(recipient.blood_group),
        }
    }

    /// Anchor an alert that names no recipient on its hospital.
    pub fn hospital(hospital: &Hospital) -> Self {
        Self {
            location: hospital.location,
            recipient_group: None,
        }
    }
}

/// Donors an alert with `criteria` reaches, ordered by donor id.
///
/// A donor is included when active, within the radius, in the target
/// groups (empty targets mean every group), and compatible with the
/// anchored recipient if there is one.
pub fn select_audience(
    criteria: &AudienceCriteria,
    anchor: &AudienceAnchor,
    donors: &[Donor],
    require_verified: bool,
) -> Vec<Donor> {
    let mut audience: Vec<Donor> = donors
        .iter()
        .filter(|donor| donor.is_active)
        .filter(|donor| !require_verified || donor.is_verified())
        .filter(|donor| criteria.targets(donor.blood_group))
        .filter(|donor| {
            anchor
                .recipient_group
                .is_none_or(|group| can_donate(donor.blood_group, group))
        })
        .filter(|donor| distance_km(donor.location, anchor.location) <= criteria.max_distance_km)
        .cloned()
        .collect();

    audience.sort_by_key(|donor| donor.id);
    audience
}
