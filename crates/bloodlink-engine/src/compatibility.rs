//! ABO/Rh red-cell compatibility.
//!
//! A donor may give to a recipient only if the recipient's plasma carries no
//! antibodies against the donor's antigens: O- is the universal donor and
//! AB+ the universal recipient.

use bloodlink_entity::blood::BloodGroup;

/// Whether a donor of `donor` group may give to a recipient of `recipient` group.
pub fn can_donate(donor: BloodGroup, recipient: BloodGroup) -> bool {
    use BloodGroup::*;

    match donor {
        ONeg => true,
        OPos => matches!(recipient, OPos | APos | BPos | AbPos),
        ANeg => matches!(recipient, ANeg | APos | AbNeg | AbPos),
        APos => matches!(recipient, APos | AbPos),
        BNeg => matches!(recipient, BNeg | BPos | AbNeg | AbPos),
        BPos => matches!(recipient, BPos | AbPos),
        AbNeg => matches!(recipient, AbNeg | AbPos),
        AbPos => recipient == AbPos,
    }
}

/// Donor groups that may give to `recipient`, in canonical group order.
pub fn compatible_donors(recipient: BloodGroup) -> Vec<BloodGroup> {
    BloodGroup::ALL
        .into_iter()
        .filter(|donor| can_donate(*donor, recipient))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: [(&str, &[&str]); 8] = [
        ("O-", &["O-", "O+", "A-", "A+", "B-", "B+", "AB-", "AB+"]),
        ("O+", &["O+", "A+", "B+", "AB+"]),
        ("A-", &["A-", "A+", "AB-", "AB+"]),
        ("A+", &["A+", "AB+"]),
        ("B-", &["B-", "B+", "AB-", "AB+"]),
        ("B+", &["B+", "AB+"]),
        ("AB-", &["AB-", "AB+"]),
        ("AB+", &["AB+"]),
    ];

    #[test]
    fn test_all_pairs_match_table() {
        let mut checked = 0;
        for (donor, recipients) in TABLE {
            let donor: BloodGroup = donor.parse().unwrap();
            for recipient in BloodGroup::ALL {
                let expected = recipients.contains(&recipient.as_str());
                assert_eq!(
                    can_donate(donor, recipient),
                    expected,
                    "{donor} -> {recipient}"
                );
                checked += 1;
            }
        }
        assert_eq!(checked, 64);
    }

    #[test]
    fn test_universal_groups() {
        assert_eq!(compatible_donors(BloodGroup::AbPos).len(), 8);
        assert_eq!(compatible_donors(BloodGroup::ONeg), vec![BloodGroup::ONeg]);
    }

    #[test]
    fn test_compatible_donors_for_a_pos() {
        assert_eq!(
            compatible_donors(BloodGroup::APos),
            vec![
                BloodGroup::ONeg,
                BloodGroup::OPos,
                BloodGroup::ANeg,
                BloodGroup::APos
            ]
        );
    }
}
