//! Validated geographic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A latitude/longitude pair in decimal degrees.
///
/// Constructed through [`GeoPoint::new`], which rejects non-finite or
/// out-of-range values. Deserialization does not check ranges; the
/// directory repositories run [`GeoPoint::validate`] on every stored
/// point they write or read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `-90..=90`.
    pub lat: f64,
    /// Longitude in degrees, `-180..=180`.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a validated point.
    pub fn new(lat: f64, lon: f64) -> Result<Self, AppError> {
        let point = Self { lat, lon };
        point.validate()?;
        Ok(point)
    }

    /// Check that both components are finite and in range.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::validation(format!(
                "Latitude out of range: {}",
                self.lat
            )));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(AppError::validation(format!(
                "Longitude out of range: {}",
                self.lon
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(6.9271, 79.8612).unwrap();
        assert_eq!(p.lat, 6.9271);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }
}
