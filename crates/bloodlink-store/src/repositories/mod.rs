//! Typed JSON repositories over a [`RecordStore`].
//!
//! Repositories are the serialization boundary: entities go in and out as
//! typed records, and only here are they converted to and from JSON text.

pub mod alert;
pub mod delivery;
pub mod donor;
pub mod hospital;
pub mod matching;
pub mod recipient;
pub mod response;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::GeoPoint;
use bloodlink_entity::donor::Donor;
use bloodlink_entity::hospital::Hospital;
use bloodlink_entity::recipient::Recipient;

pub use alert::AlertRepository;
pub use delivery::DeliveryRepository;
pub use donor::DonorRepository;
pub use hospital::HospitalRepository;
pub use matching::MatchRepository;
pub use recipient::RecipientRepository;
pub use response::ResponseRepository;

/// A record together with the exact stored text it was read from.
///
/// The stored text is the compare-and-set token: a replace only succeeds
/// if nobody has written the key since this value was read.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    /// The decoded record.
    pub value: T,
    /// Stored JSON the record was decoded from.
    token: String,
}

impl<T> Versioned<T> {
    /// Discard the version token.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> std::ops::Deref for Versioned<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// Read a key and keep its stored text as the version token.
pub(crate) async fn load_versioned<T: DeserializeOwned>(
    store: &dyn RecordStore,
    key: &str,
) -> AppResult<Option<Versioned<T>>> {
    match store.get(key).await? {
        Some(token) => {
            let value = serde_json::from_str(&token)?;
            Ok(Some(Versioned { value, token }))
        }
        None => Ok(None),
    }
}

/// Replace `current` with `next` if the key still holds `current`.
pub(crate) async fn swap<T: Serialize>(
    store: &dyn RecordStore,
    key: &str,
    current: &Versioned<T>,
    next: &T,
) -> AppResult<bool> {
    let json = serde_json::to_string(next)?;
    store.compare_and_set(key, &current.token, &json).await
}

/// Directory records that carry coordinates.
///
/// Their locations are checked on the way in and on the way out, so
/// distance computations never see an out-of-range point.
pub(crate) trait Located {
    const KIND: &'static str;

    fn location(&self) -> GeoPoint;

    fn record_id(&self) -> String;
}

impl Located for Donor {
    const KIND: &'static str = "donor";

    fn location(&self) -> GeoPoint {
        self.location
    }

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Located for Recipient {
    const KIND: &'static str = "recipient";

    fn location(&self) -> GeoPoint {
        self.location
    }

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

impl Located for Hospital {
    const KIND: &'static str = "hospital";

    fn location(&self) -> GeoPoint {
        self.location
    }

    fn record_id(&self) -> String {
        self.id.to_string()
    }
}

/// Fail if the record's coordinates are out of range.
pub(crate) fn check_location<T: Located>(record: &T) -> AppResult<()> {
    record.location().validate().map_err(|e| {
        AppError::validation(format!(
            "{} {} has an invalid location: {}",
            T::KIND,
            record.record_id(),
            e.message
        ))
    })
}

/// Drop records with out-of-range coordinates from a scan, logging each.
pub(crate) fn keep_located<T: Located>(records: Vec<T>) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| match check_location(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = T::KIND, error = %e, "Skipping stored record");
                false
            }
        })
        .collect()
}
