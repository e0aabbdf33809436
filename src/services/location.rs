//! Spaces: locations events are held at, and users' subscriptions to them

use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::location::{CreateLocationRequest, Location, LocationPreferenceRequest};
use crate::models::user::User;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::geo::{nearby_sorted, Coordinate};
use crate::utils::logging::log_user_action;

#[derive(Clone)]
#[derive(Debug)]
pub struct LocationService {
    db: DatabaseService,
}

impl LocationService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn get_or_create(&self, request: &CreateLocationRequest) -> Result<Location> {
        request.validate()?;
        self.db.locations.get_or_create(request).await
    }

    pub async fn list_all(&self) -> Result<Vec<Location>> {
        self.db.locations.list_all().await
    }

    pub async fn get(&self, location_id: Uuid) -> Result<Location> {
        self.db
            .locations
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Location"))
    }

    pub async fn get_by_coordinate(&self, coordinate: Coordinate) -> Result<Location> {
        self.db
            .locations
            .find_by_coordinate(coordinate.latitude, coordinate.longitude)
            .await?
            .ok_or_else(|| CollectivError::not_found("Location"))
    }

    /// Locations within the user's preferred radius the user was never asked about, nearest first
    pub async fn nearby_not_notified(&self, user: &User, origin: Coordinate) -> Result<Vec<Location>> {
        let candidates = self.db.locations.list_not_notified(&user.user_id).await?;
        Ok(nearby_sorted(candidates, &origin, user.preferred_radius_km(), Location::coordinate))
    }

    pub async fn update_preference(&self, user_id: &str, request: &LocationPreferenceRequest) -> Result<Location> {
        let location = self.get(request.location_id).await?;
        self.db
            .locations
            .set_preference(user_id, location.id, request.subscribe)
            .await?;

        let action = if request.subscribe { "subscribe_location" } else { "neglect_location" };
        log_user_action(user_id, action, Some(&location.id.to_string()));
        Ok(location)
    }

    pub async fn list_subscribed(&self, user_id: &str) -> Result<Vec<Location>> {
        self.db.locations.list_subscribed(user_id).await
    }
}
