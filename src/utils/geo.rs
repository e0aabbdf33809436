//! Great-circle distance and geofence checks

use crate::utils::errors::{CollectivError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two coordinates given in degrees
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    pub fn is_within(&self, other: &Coordinate, radius_km: f64) -> bool {
        self.distance_km(other) <= radius_km
    }

    /// Parse a coordinate from optional raw values.
    ///
    /// Accepts JSON numbers or numeric strings, the way clients send them in
    /// both query strings and bodies.
    pub fn parse(latitude: Option<&serde_json::Value>, longitude: Option<&serde_json::Value>) -> Result<Self> {
        match (latitude.and_then(value_as_f64), longitude.and_then(value_as_f64)) {
            (Some(latitude), Some(longitude)) => Ok(Self::new(latitude, longitude)),
            _ => Err(CollectivError::invalid(
                "Latitude and Longitude must be a valid floating point number",
            )),
        }
    }

    /// Like [`Coordinate::parse`] but yields `None` instead of an error
    pub fn parse_optional(latitude: Option<&serde_json::Value>, longitude: Option<&serde_json::Value>) -> Option<Self> {
        Self::parse(latitude, longitude).ok()
    }
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(number) => number.as_f64(),
        serde_json::Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Keep the items within `radius_km` of `origin`, nearest first
pub fn nearby_sorted<T, F>(items: Vec<T>, origin: &Coordinate, radius_km: f64, coordinate_of: F) -> Vec<T>
where
    F: Fn(&T) -> Coordinate,
{
    let mut with_distance: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| (origin.distance_km(&coordinate_of(&item)), item))
        .filter(|(distance, _)| *distance <= radius_km)
        .collect();

    with_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
    with_distance.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_haversine_known_distance() {
        // Jakarta to Depok, roughly 22 km
        let distance = haversine(-6.2088, 106.8456, -6.4025, 106.7942);
        assert!((distance - 22.2).abs() < 1.0, "distance was {}", distance);
    }

    #[test]
    fn test_parse_accepts_strings_and_numbers() {
        let coordinate = Coordinate::parse(Some(&json!("-6.36")), Some(&json!(106.82))).unwrap();
        assert_eq!(coordinate, Coordinate::new(-6.36, 106.82));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Coordinate::parse(Some(&json!("north")), Some(&json!(1.0))).is_err());
        assert!(Coordinate::parse(None, Some(&json!(1.0))).is_err());
        assert!(Coordinate::parse_optional(Some(&json!(true)), Some(&json!(1.0))).is_none());
    }

    #[test]
    fn test_nearby_sorted_filters_and_orders() {
        let origin = Coordinate::new(0.0, 0.0);
        let points = vec![
            ("far", Coordinate::new(1.0, 1.0)),
            ("near", Coordinate::new(0.001, 0.0)),
            ("mid", Coordinate::new(0.01, 0.0)),
        ];

        let result = nearby_sorted(points, &origin, 5.0, |(_, c)| *c);
        let names: Vec<&str> = result.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["near", "mid"]);
    }

    proptest! {
        #[test]
        fn prop_haversine_is_symmetric(
            lat1 in -90.0f64..90.0, lon1 in -180.0f64..180.0,
            lat2 in -90.0f64..90.0, lon2 in -180.0f64..180.0,
        ) {
            let forward = haversine(lat1, lon1, lat2, lon2);
            let backward = haversine(lat2, lon2, lat1, lon1);
            prop_assert!((forward - backward).abs() < 1e-6);
            prop_assert!(forward >= 0.0);
        }

        #[test]
        fn prop_haversine_zero_on_same_point(lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            prop_assert!(haversine(lat, lon, lat, lon).abs() < 1e-9);
        }
    }
}
