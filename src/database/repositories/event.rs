//! Event repository implementation

use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::event::{
    Event, EventFilters, EventStatus, LocationParticipationTotals, NewEvent, ProjectTransaction, RegistrationDay,
};
use crate::utils::errors::{CollectivError, Result};

const EVENT_COLUMNS: &str = "e.id, e.event_type, e.name, e.description, e.start_date_time, e.end_date_time, \
     e.min_num_of_volunteers, e.volunteer_registration_enabled, e.participation_registration_enabled, \
     e.current_num_of_participants, e.current_num_of_volunteers, e.location_id, e.creator_id, e.category_id, \
     e.status, e.event_image_directory, e.goal, e.progress, e.measurement_unit, e.goal_kind, e.created_at";

/// Which events a search starts from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventScope {
    /// Every event held at the location, whatever its status
    Location(Uuid),
    /// Scheduled and on-going events everywhere
    Active,
}

fn active_statuses() -> Vec<String> {
    vec![EventStatus::Scheduled.as_str().to_string(), EventStatus::OnGoing.as_str().to_string()]
}

#[derive(Clone)]
#[derive(Debug)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new event in the caller's transaction
    pub async fn create(&self, conn: &mut PgConnection, event: &NewEvent, creator_id: &str) -> Result<Event> {
        let created = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events AS e (
                id, event_type, name, description, start_date_time, end_date_time,
                min_num_of_volunteers, location_id, creator_id, category_id,
                goal, progress, measurement_unit, goal_kind, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(event.event_type.as_str())
        .bind(&event.name)
        .bind(event.description.as_deref())
        .bind(event.start_date_time)
        .bind(event.end_date_time)
        .bind(event.min_num_of_volunteers)
        .bind(event.location_id)
        .bind(creator_id)
        .bind(event.category_id)
        .bind(event.goal)
        .bind(event.goal.map(|_| 0.0_f64))
        .bind(event.measurement_unit.as_deref())
        .bind(event.goal_kind.as_deref())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(created)
    }

    /// Find event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Load and row-lock the event
    pub async fn lock(&self, conn: &mut PgConnection, id: Uuid) -> Result<Event> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = $1 FOR UPDATE"))
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))
    }

    pub async fn set_image_directory(&self, id: Uuid, directory: &str) -> Result<()> {
        sqlx::query("UPDATE events SET event_image_directory = $2 WHERE id = $1")
            .bind(id)
            .bind(directory)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn set_status(&self, conn: &mut PgConnection, id: Uuid, status: EventStatus) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events e SET status = $2 WHERE e.id = $1 RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_one(conn)
        .await?;

        Ok(event)
    }

    /// Increase project progress and record the change as a transaction
    pub async fn add_progress(&self, conn: &mut PgConnection, id: Uuid, amount: f64) -> Result<f64> {
        let progress: f64 = sqlx::query_scalar(
            "UPDATE events SET progress = COALESCE(progress, 0) + $2 WHERE id = $1 RETURNING progress",
        )
        .bind(id)
        .bind(amount)
        .fetch_one(&mut *conn)
        .await?;

        sqlx::query(
            "INSERT INTO project_transactions (event_id, transaction_time, transaction_value) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(Utc::now())
        .bind(amount)
        .execute(conn)
        .await?;

        Ok(progress)
    }

    pub async fn transactions(&self, id: Uuid) -> Result<Vec<ProjectTransaction>> {
        let transactions = sqlx::query_as::<_, ProjectTransaction>(
            r#"
            SELECT id, event_id, transaction_time, transaction_value
            FROM project_transactions
            WHERE event_id = $1
            ORDER BY transaction_time
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    /// Shift the participant counter by `delta`, never below zero
    pub async fn adjust_participant_count(&self, conn: &mut PgConnection, id: Uuid, delta: i32) -> Result<()> {
        sqlx::query(
            "UPDATE events SET current_num_of_participants = GREATEST(current_num_of_participants + $2, 0) WHERE id = $1",
        )
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Shift the volunteer counter by `delta`, never below zero
    pub async fn adjust_volunteer_count(&self, conn: &mut PgConnection, id: Uuid, delta: i32) -> Result<()> {
        sqlx::query(
            "UPDATE events SET current_num_of_volunteers = GREATEST(current_num_of_volunteers + $2, 0) WHERE id = $1",
        )
        .bind(id)
        .bind(delta)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Events matching `filters` within `scope`, earliest start first
    pub async fn search(&self, scope: EventScope, filters: &EventFilters) -> Result<Vec<Event>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events e WHERE TRUE"));

        match scope {
            EventScope::Location(location_id) => {
                builder.push(" AND e.location_id = ").push_bind(location_id);
            }
            EventScope::Active => {
                builder.push(" AND e.status = ANY(").push_bind(active_statuses()).push(")");
            }
        }

        if let Some(status) = filters.status {
            builder.push(" AND e.status = ").push_bind(status.as_str());
        }

        if let Some(category_id) = filters.category_id {
            builder.push(" AND e.category_id = ").push_bind(category_id);
        }

        if let Some(event_type) = filters.event_type {
            builder.push(" AND e.event_type = ").push_bind(event_type.as_str());
        }

        if let Some(name) = &filters.name {
            builder
                .push(" AND e.name ILIKE ")
                .push_bind(format!("%{}%", name.replace('%', "\\%").replace('_', "\\_")));
        }

        if !filters.tags.is_empty() {
            builder
                .push(
                    " AND EXISTS (SELECT 1 FROM event_tags et JOIN tags t ON t.id = et.tag_id \
                     WHERE et.event_id = e.id AND t.name = ANY(",
                )
                .push_bind(filters.tags.clone())
                .push("))");
        }

        builder.push(" ORDER BY e.start_date_time, e.created_at");

        let events = builder.build_query_as::<Event>().fetch_all(&self.pool).await?;
        Ok(events)
    }

    /// Active events at `location_ids` carrying at least one of the user's interests
    pub async fn list_matching_interests(&self, user_id: &str, location_ids: &[Uuid]) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events e
            WHERE e.location_id = ANY($2)
              AND e.status = ANY($3)
              AND EXISTS (
                  SELECT 1
                  FROM event_tags et
                  JOIN user_interests ui ON ui.tag_id = et.tag_id
                  WHERE et.event_id = e.id AND ui.user_id = $1
              )
            ORDER BY e.start_date_time
            "#
        ))
        .bind(user_id)
        .bind(location_ids)
        .bind(active_statuses())
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    pub async fn list_created_by(&self, creator_id: &str, statuses: &[EventStatus]) -> Result<Vec<Event>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let events = sqlx::query_as::<_, Event>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM events e
            WHERE e.creator_id = $1 AND e.status = ANY($2)
            ORDER BY e.start_date_time DESC
            "#
        ))
        .bind(creator_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Registrations per calendar day (UTC)
    pub async fn registration_history(&self, id: Uuid) -> Result<Vec<RegistrationDay>> {
        let history = sqlx::query_as::<_, RegistrationDay>(
            r#"
            SELECT date_trunc('day', registration_time AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS registration_date,
                   COUNT(*)::BIGINT AS registration_count
            FROM event_participations
            WHERE event_id = $1
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }

    pub async fn average_rating(&self, id: Uuid) -> Result<Option<f64>> {
        let average: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(r.event_rating)::DOUBLE PRECISION
            FROM participation_reviews r
            JOIN event_participations p ON p.id = r.participation_id
            WHERE p.event_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }

    /// Mean attendance duration of attended participations of one type
    pub async fn average_duration(&self, id: Uuid, participation_type: &str) -> Result<Option<f64>> {
        let average: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT AVG(overall_duration_in_seconds)::DOUBLE PRECISION
            FROM event_participations
            WHERE event_id = $1 AND participation_type = $2 AND has_attended
            "#,
        )
        .bind(id)
        .bind(participation_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }

    pub async fn location_totals(&self, location_id: Uuid) -> Result<LocationParticipationTotals> {
        let totals = sqlx::query_as::<_, LocationParticipationTotals>(
            r#"
            SELECT
                COALESCE(SUM(current_num_of_volunteers), 0)::BIGINT AS volunteers_count_in_location,
                COALESCE(SUM(current_num_of_participants) FILTER (WHERE event_type = 'initiative'), 0)::BIGINT
                    AS participants_in_location,
                COALESCE(SUM(current_num_of_participants) FILTER (WHERE event_type = 'project'), 0)::BIGINT
                    AS contributors_in_location
            FROM events
            WHERE location_id = $1
            "#,
        )
        .bind(location_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }
}
