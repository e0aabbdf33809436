//! Location (space) model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{CollectivError, Result};
use crate::utils::geo::Coordinate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
}

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Whether `point` lies within `radius_km` of this location
    pub fn contains(&self, point: &Coordinate, radius_km: f64) -> bool {
        self.coordinate().is_within(point, radius_km)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
}

impl CreateLocationRequest {
    pub fn validate(&self) -> Result<()> {
        let length = self.name.trim().chars().count();
        if length <= 3 || length > 50 {
            return Err(CollectivError::invalid(
                "Location name must be longer than 3 and at most 50 characters",
            ));
        }

        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CollectivError::invalid("Latitude must be between -90 and 90"));
        }

        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CollectivError::invalid("Longitude must be between -180 and 180"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPreferenceRequest {
    pub location_id: Uuid,
    pub subscribe: bool,
}

/// `latitude`/`longitude` query parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinateQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl CoordinateQuery {
    pub fn coordinate(&self) -> Result<Coordinate> {
        let latitude = self.latitude.clone().map(serde_json::Value::String);
        let longitude = self.longitude.clone().map(serde_json::Value::String);
        Coordinate::parse(latitude.as_ref(), longitude.as_ref())
    }
}
