//! Great-circle distance between two coordinates.

use bloodlink_core::types::GeoPoint;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between `a` and `b` in kilometres.
///
/// Always non-negative and exactly symmetric; identical points yield `0.0`.
/// Inputs are assumed to be validated coordinates.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    // Fixed operand order keeps the result bit-identical for (a, b) and (b, a).
    let (a, b) = if (a.lat, a.lon) <= (b.lat, b.lon) {
        (a, b)
    } else {
        (b, a)
    };

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_identical_points_are_zero() {
        let colombo = point(6.9271, 79.8612);
        assert_eq!(distance_km(colombo, colombo), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            (point(6.9271, 79.8612), point(7.2906, 80.6337)),
            (point(-33.8688, 151.2093), point(51.5074, -0.1278)),
            (point(0.0, 179.9), point(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_eq!(distance_km(a, b), distance_km(b, a));
            assert!(distance_km(a, b) >= 0.0);
        }
    }

    #[test]
    fn test_known_distance() {
        // Colombo to Kandy is roughly 94 km as the crow flies.
        let d = distance_km(point(6.9271, 79.8612), point(7.2906, 80.6337));
        assert!((90.0..100.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = distance_km(point(0.0, 0.0), point(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1e-6);
    }
}
