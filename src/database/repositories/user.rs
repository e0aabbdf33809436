//! User repository implementation

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::tag::Tag;
use crate::models::user::{ContributionSummary, User, UserSummary, UserUpdate};
use crate::utils::errors::{CollectivError, Result};

const USER_COLUMNS: &str = "user_id, full_name, reward_points, preferred_radius, location_track, \
     has_been_prompted_for_location_tracking, currently_attended_event_id, currently_attending_role, created_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the user, creating the row on first sight
    pub async fn get_or_create(&self, user_id: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (user_id, created_at)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Same as [`UserRepository::get_or_create`], inside a transaction
    pub async fn get_or_create_in(&self, conn: &mut PgConnection, user_id: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (user_id, created_at)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(user)
    }

    /// Find user by id
    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Load and row-lock the user
    pub async fn lock(&self, conn: &mut PgConnection, user_id: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| CollectivError::not_found("User"))
    }

    pub async fn summary(&self, user_id: &str) -> Result<Option<UserSummary>> {
        let summary = sqlx::query_as::<_, UserSummary>("SELECT user_id, full_name FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(summary)
    }

    /// Apply the present fields of `update`
    pub async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                preferred_radius = COALESCE($3, preferred_radius),
                location_track = COALESCE($4, location_track)
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(update.full_name.as_deref())
        .bind(update.preferred_radius)
        .bind(update.location_track)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn set_location_prompted(&self, user_id: &str, prompted: bool) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET has_been_prompted_for_location_tracking = $2 WHERE user_id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(prompted)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Record the event (and role) the user is currently attending
    pub async fn set_current_event(
        &self,
        conn: &mut PgConnection,
        user_id: &str,
        event_id: Option<Uuid>,
        role: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE users SET currently_attended_event_id = $2, currently_attending_role = $3 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(event_id)
        .bind(role)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Clear the current event of every user attending `event_id`
    pub async fn clear_current_event_for(&self, conn: &mut PgConnection, event_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET currently_attended_event_id = NULL, currently_attending_role = NULL
            WHERE currently_attended_event_id = $1
            "#,
        )
        .bind(event_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Add reward points and return the new balance
    pub async fn add_reward_points(&self, conn: &mut PgConnection, user_id: &str, points: i64) -> Result<i64> {
        let balance: i64 = sqlx::query_scalar(
            "UPDATE users SET reward_points = reward_points + $2 WHERE user_id = $1 RETURNING reward_points",
        )
        .bind(user_id)
        .bind(points)
        .fetch_one(conn)
        .await?;

        Ok(balance)
    }

    pub async fn set_reward_points(&self, conn: &mut PgConnection, user_id: &str, points: i64) -> Result<()> {
        sqlx::query("UPDATE users SET reward_points = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(points)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Zero every user's points, returning how many rows changed
    pub async fn reset_all_reward_points(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE users SET reward_points = 0 WHERE reward_points <> 0")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// One plus the number of users holding more points
    pub async fn rank(&self, user_id: &str) -> Result<i64> {
        let rank: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)::BIGINT + 1
            FROM users
            WHERE reward_points > (SELECT reward_points FROM users WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(rank)
    }

    pub async fn interests(&self, user_id: &str) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN user_interests ui ON ui.tag_id = t.id
            WHERE ui.user_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Replace the user's interests with `tag_ids`
    pub async fn replace_interests(&self, conn: &mut PgConnection, user_id: &str, tag_ids: &[Uuid]) -> Result<()> {
        sqlx::query("DELETE FROM user_interests WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO user_interests (user_id, tag_id)
            SELECT $1, UNNEST($2::UUID[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(tag_ids)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Count and summed duration of the user's participations of one type registered in `[start, end)`
    pub async fn attendance_totals(
        &self,
        user_id: &str,
        participation_type: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(i64, f64)> {
        let totals: (i64, f64) = sqlx::query_as(
            r#"
            SELECT COUNT(*)::BIGINT,
                   COALESCE(SUM(overall_duration_in_seconds), 0)::DOUBLE PRECISION
            FROM event_participations
            WHERE participant_id = $1
              AND participation_type = $2
              AND registration_time >= $3
              AND registration_time < $4
            "#,
        )
        .bind(user_id)
        .bind(participation_type)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Contributions registered in `[start, end)` grouped by unit and goal kind
    pub async fn contribution_totals(
        &self,
        user_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ContributionSummary>> {
        let totals = sqlx::query_as::<_, ContributionSummary>(
            r#"
            SELECT e.measurement_unit,
                   e.goal_kind,
                   COALESCE(SUM(p.total_contribution), 0)::DOUBLE PRECISION AS total_contribution
            FROM event_participations p
            JOIN events e ON e.id = p.event_id
            WHERE p.participant_id = $1
              AND p.participation_type = 'contributor'
              AND p.registration_time >= $2
              AND p.registration_time < $3
            GROUP BY e.measurement_unit, e.goal_kind
            ORDER BY e.measurement_unit, e.goal_kind
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}
