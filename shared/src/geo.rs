//! Great-circle distance and radius checks for business discovery

use crate::types::GeoPoint;

/// Mean earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default search radius when configuration does not override it
pub const DEFAULT_MAX_RADIUS_KM: f64 = 1000.0;

/// Haversine distance between two points in kilometres
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Distance from `origin` to `candidate`, or `None` when it lies outside `radius_km`
pub fn distance_within(origin: GeoPoint, candidate: GeoPoint, radius_km: f64) -> Option<f64> {
    let distance = haversine_km(origin, candidate);
    (distance <= radius_km).then_some(distance)
}

pub fn is_valid_latitude(latitude: f64) -> bool {
    latitude.is_finite() && (-90.0..=90.0).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    longitude.is_finite() && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sydney() -> GeoPoint {
        GeoPoint::new(-33.8688, 151.2093)
    }

    fn melbourne() -> GeoPoint {
        GeoPoint::new(-37.8136, 144.9631)
    }

    #[test]
    fn test_same_point_is_zero() {
        assert_eq!(haversine_km(sydney(), sydney()), 0.0);
    }

    #[test]
    fn test_sydney_to_melbourne() {
        let d = haversine_km(sydney(), melbourne());
        assert!((d - 713.4).abs() < 2.0, "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(haversine_km(sydney(), melbourne()), haversine_km(melbourne(), sydney()));
    }

    #[test]
    fn test_antipodal_does_not_nan() {
        let d = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_distance_within_radius() {
        assert!(distance_within(sydney(), melbourne(), 1000.0).is_some());
        assert!(distance_within(sydney(), melbourne(), 500.0).is_none());
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(is_valid_latitude(-90.0));
        assert!(is_valid_latitude(90.0));
        assert!(!is_valid_latitude(90.5));
        assert!(!is_valid_latitude(f64::NAN));
        assert!(is_valid_longitude(-180.0));
        assert!(!is_valid_longitude(181.0));
        assert!(!is_valid_longitude(f64::INFINITY));
    }
}
