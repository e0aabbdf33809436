//! Reviews and reports

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::report::EventReport;
use crate::models::review::ParticipationReview;
use crate::utils::errors::Result;

#[derive(Clone)]
#[derive(Debug)]
pub struct FeedbackRepository {
    pool: PgPool,
}

impl FeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_review(
        &self,
        conn: &mut PgConnection,
        participation_id: Uuid,
        event_rating: i32,
        event_comment: Option<&str>,
        sentiment_score: Option<f64>,
    ) -> Result<ParticipationReview> {
        let review = sqlx::query_as::<_, ParticipationReview>(
            r#"
            INSERT INTO participation_reviews (participation_id, event_rating, event_comment, sentiment_score, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, participation_id, event_rating, event_comment, sentiment_score, created_at
            "#,
        )
        .bind(participation_id)
        .bind(event_rating)
        .bind(event_comment)
        .bind(sentiment_score)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(review)
    }

    pub async fn has_reported(&self, event_id: Uuid, reporter_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM event_reports WHERE event_id = $1 AND reporter_id = $2)",
        )
        .bind(event_id)
        .bind(reporter_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert the report, returning `None` when the user already reported the event
    pub async fn create_report(&self, event_id: Uuid, reporter_id: &str, remarks: &str) -> Result<Option<EventReport>> {
        let report = sqlx::query_as::<_, EventReport>(
            r#"
            INSERT INTO event_reports (event_id, reporter_id, remarks, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (event_id, reporter_id) DO NOTHING
            RETURNING id, event_id, reporter_id, remarks, created_at
            "#,
        )
        .bind(event_id)
        .bind(reporter_id)
        .bind(remarks)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        Ok(report)
    }
}
