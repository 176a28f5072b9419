//! Coordinates and great-circle distance.

use crate::error::ServiceError;
use serde::Serialize;

/// Sphere radius in meters (equatorial WGS84). Keeps distances comparable
/// with existing clients that compute them on the same sphere.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A validated WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Rejects non-finite values and anything outside [-90,90] x [-180,180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ServiceError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ServiceError::InvalidCoordinate(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ServiceError::InvalidCoordinate(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Builds from optional axes, as they arrive from a query string.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Result<Self, ServiceError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon),
            (None, _) => Err(ServiceError::InvalidCoordinate(
                "latitude is required".to_string(),
            )),
            (_, None) => Err(ServiceError::InvalidCoordinate(
                "longitude is required".to_string(),
            )),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Haversine distance in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

        // Rounding can push h a hair past 1 for antipodal points.
        2.0 * EARTH_RADIUS_M * h.min(1.0).sqrt().asin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_rejects_out_of_range_and_nan() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.5).is_err());
        assert!(Coordinate::new(0.0, -181.0).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinate::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn test_missing_axis_is_rejected() {
        assert!(matches!(
            Coordinate::from_parts(None, Some(1.0)),
            Err(ServiceError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            Coordinate::from_parts(Some(1.0), None),
            Err(ServiceError::InvalidCoordinate(_))
        ));
        assert!(Coordinate::from_parts(Some(1.0), Some(2.0)).is_ok());
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let a = coord(34.05, -118.25);
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let la = coord(34.05, -118.25);
        let sf = coord(37.77, -122.42);
        assert!((la.distance_to(&sf) - sf.distance_to(&la)).abs() < 1e-6);
    }

    #[test]
    fn test_distance_los_angeles_to_san_francisco() {
        // Roughly 560 km on this sphere.
        let d = coord(34.05, -118.25).distance_to(&coord(37.77, -122.42));
        assert!(d > 550_000.0 && d < 570_000.0, "got {d}");
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = coord(0.0, 0.0).distance_to(&coord(1.0, 0.0));
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_points_do_not_produce_nan() {
        let d = coord(0.0, 0.0).distance_to(&coord(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_M).abs() < 1.0);
    }
}
