//! Participation repository implementation
//!
//! Participations, attendance activities and contribution activities.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::event::EventStatus;
use crate::models::participation::{
    AttendanceActivityType, ContributionActivity, Participation, ParticipationType,
};
use crate::utils::errors::Result;

const PARTICIPATION_COLUMNS: &str = "p.id, p.event_id, p.participant_id, p.participation_type, p.registration_time, \
     p.has_left_forum, p.rewarded, p.submitted_review, p.is_currently_attending, p.overall_duration_in_seconds, \
     p.has_attended, p.has_violated_geofencing_rule, p.granted_manager_access, p.total_contribution";

#[derive(Clone)]
#[derive(Debug)]
pub struct ParticipationRepository {
    pool: PgPool,
}

impl ParticipationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        event_id: Uuid,
        user_id: &str,
        kind: ParticipationType,
    ) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            INSERT INTO event_participations AS p (id, event_id, participant_id, participation_type, registration_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(participation)
    }

    /// The user's participation in the event, if any
    pub async fn find(&self, event_id: Uuid, user_id: &str) -> Result<Option<Participation>> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM event_participations p WHERE p.event_id = $1 AND p.participant_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(participation)
    }

    /// Row-locked variant of [`ParticipationRepository::find`]
    pub async fn lock(&self, conn: &mut PgConnection, event_id: Uuid, user_id: &str) -> Result<Option<Participation>> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            SELECT {PARTICIPATION_COLUMNS}
            FROM event_participations p
            WHERE p.event_id = $1 AND p.participant_id = $2
            FOR UPDATE
            "#
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(participation)
    }

    /// Lock every participation currently checked in to the event
    pub async fn lock_attending(&self, conn: &mut PgConnection, event_id: Uuid) -> Result<Vec<Participation>> {
        let participations = sqlx::query_as::<_, Participation>(&format!(
            r#"
            SELECT {PARTICIPATION_COLUMNS}
            FROM event_participations p
            WHERE p.event_id = $1 AND p.is_currently_attending
            FOR UPDATE
            "#
        ))
        .bind(event_id)
        .fetch_all(conn)
        .await?;

        Ok(participations)
    }

    pub async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM event_participations WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// User ids of everyone registered to the event
    pub async fn registered_user_ids(&self, event_id: Uuid) -> Result<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT participant_id FROM event_participations WHERE event_id = $1 ORDER BY registration_time",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// The user's participations of `kinds` in events with one of `statuses`, newest registration first
    pub async fn list_for_user(
        &self,
        user_id: &str,
        kinds: &[ParticipationType],
        statuses: &[EventStatus],
    ) -> Result<Vec<Participation>> {
        let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let participations = sqlx::query_as::<_, Participation>(&format!(
            r#"
            SELECT {PARTICIPATION_COLUMNS}
            FROM event_participations p
            JOIN events e ON e.id = p.event_id
            WHERE p.participant_id = $1
              AND p.participation_type = ANY($2)
              AND e.status = ANY($3)
            ORDER BY p.registration_time DESC
            "#
        ))
        .bind(user_id)
        .bind(kinds)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(participations)
    }

    pub async fn record_attendance(
        &self,
        conn: &mut PgConnection,
        participation_id: Uuid,
        activity: AttendanceActivityType,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO attendance_activities (participation_id, activity_type, activity_time) VALUES ($1, $2, $3)",
        )
        .bind(participation_id)
        .bind(activity.as_str())
        .bind(at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn latest_check_in(&self, conn: &mut PgConnection, participation_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let time: Option<DateTime<Utc>> = sqlx::query_scalar(
            r#"
            SELECT activity_time
            FROM attendance_activities
            WHERE participation_id = $1 AND activity_type = 'check-in'
            ORDER BY activity_time DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(participation_id)
        .fetch_optional(conn)
        .await?;

        Ok(time)
    }

    pub async fn mark_checked_in(&self, conn: &mut PgConnection, id: Uuid) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            UPDATE event_participations p
            SET is_currently_attending = TRUE, has_attended = TRUE
            WHERE p.id = $1
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(conn)
        .await?;

        Ok(participation)
    }

    /// Close the attendance, adding `seconds` to the overall duration.
    /// A violation, once flagged, stays flagged.
    pub async fn mark_checked_out(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        seconds: f64,
        violated_geofencing_rule: bool,
    ) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            UPDATE event_participations p
            SET is_currently_attending = FALSE,
                overall_duration_in_seconds = overall_duration_in_seconds + $2,
                has_violated_geofencing_rule = has_violated_geofencing_rule OR $3
            WHERE p.id = $1
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(seconds)
        .bind(violated_geofencing_rule)
        .fetch_one(conn)
        .await?;

        Ok(participation)
    }

    pub async fn mark_rewarded(&self, conn: &mut PgConnection, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE event_participations SET rewarded = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn grant_manager_access(&self, conn: &mut PgConnection, id: Uuid) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            "UPDATE event_participations p SET granted_manager_access = TRUE WHERE p.id = $1 RETURNING {PARTICIPATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(conn)
        .await?;

        Ok(participation)
    }

    pub async fn mark_left_forum(&self, id: Uuid) -> Result<Participation> {
        let participation = sqlx::query_as::<_, Participation>(&format!(
            "UPDATE event_participations p SET has_left_forum = TRUE WHERE p.id = $1 RETURNING {PARTICIPATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(participation)
    }

    pub async fn mark_reviewed(&self, conn: &mut PgConnection, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE event_participations SET submitted_review = TRUE WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Record a contribution activity and add it to the running total
    pub async fn add_contribution(&self, conn: &mut PgConnection, id: Uuid, amount: f64) -> Result<Participation> {
        sqlx::query(
            "INSERT INTO contribution_activities (participation_id, activity_time, contribution) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(Utc::now())
        .bind(amount)
        .execute(&mut *conn)
        .await?;

        let participation = sqlx::query_as::<_, Participation>(&format!(
            r#"
            UPDATE event_participations p
            SET total_contribution = total_contribution + $2
            WHERE p.id = $1
            RETURNING {PARTICIPATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(amount)
        .fetch_one(conn)
        .await?;

        Ok(participation)
    }

    pub async fn contribution_activities(&self, participation_id: Uuid) -> Result<Vec<ContributionActivity>> {
        let activities = sqlx::query_as::<_, ContributionActivity>(
            r#"
            SELECT id, participation_id, activity_time, contribution
            FROM contribution_activities
            WHERE participation_id = $1
            ORDER BY activity_time DESC
            "#,
        )
        .bind(participation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(activities)
    }
}
