//! Location repository implementation

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::location::{CreateLocationRequest, Location};
use crate::utils::errors::Result;

#[derive(Clone)]
#[derive(Debug)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the location unless one already sits at the same coordinate
    pub async fn get_or_create(&self, request: &CreateLocationRequest) -> Result<Location> {
        let created = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (id, name, latitude, longitude, description)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (latitude, longitude) DO NOTHING
            RETURNING id, name, latitude, longitude, description
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.name.trim())
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.description.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        match created {
            Some(location) => Ok(location),
            None => {
                let existing = sqlx::query_as::<_, Location>(
                    "SELECT id, name, latitude, longitude, description FROM locations WHERE latitude = $1 AND longitude = $2",
                )
                .bind(request.latitude)
                .bind(request.longitude)
                .fetch_one(&self.pool)
                .await?;
                Ok(existing)
            }
        }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, name, latitude, longitude, description FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn find_by_coordinate(&self, latitude: f64, longitude: f64) -> Result<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, name, latitude, longitude, description FROM locations WHERE latitude = $1 AND longitude = $2",
        )
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn list_all(&self) -> Result<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, name, latitude, longitude, description FROM locations ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    pub async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, name, latitude, longitude, description FROM locations WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    /// Locations the user has not been notified about yet
    pub async fn list_not_notified(&self, user_id: &str) -> Result<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT l.id, l.name, l.latitude, l.longitude, l.description
            FROM locations l
            WHERE NOT EXISTS (
                SELECT 1 FROM user_location_preferences p
                WHERE p.location_id = l.id AND p.user_id = $1
            )
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    pub async fn list_subscribed(&self, user_id: &str) -> Result<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            r#"
            SELECT l.id, l.name, l.latitude, l.longitude, l.description
            FROM locations l
            JOIN user_location_preferences p ON p.location_id = l.id
            WHERE p.user_id = $1 AND p.subscribed
            ORDER BY l.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }

    /// Mark the location as notified, subscribing or neglecting it
    pub async fn set_preference(&self, user_id: &str, location_id: Uuid, subscribed: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_location_preferences (user_id, location_id, subscribed)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, location_id) DO UPDATE SET subscribed = EXCLUDED.subscribed
            "#,
        )
        .bind(user_id)
        .bind(location_id)
        .bind(subscribed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
