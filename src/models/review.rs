//! Participation review model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{CollectivError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ParticipationReview {
    pub id: i64,
    pub participation_id: Uuid,
    pub event_rating: i32,
    pub event_comment: Option<String>,
    pub sentiment_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub event_id: Uuid,
    pub event_rating: serde_json::Value,
    pub event_comment: Option<String>,
}

/// Validated review fields
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub event_rating: i32,
    pub event_comment: Option<String>,
}

impl SubmitReviewRequest {
    pub fn validate(&self) -> Result<NewReview> {
        let rating = self
            .event_rating
            .as_i64()
            .filter(|rating| (1..=5).contains(rating))
            .ok_or_else(|| CollectivError::invalid("Event rating must be an integer between 1 and 5"))?;

        Ok(NewReview {
            event_rating: rating as i32,
            event_comment: self
                .event_comment
                .as_deref()
                .map(str::trim)
                .filter(|comment| !comment.is_empty())
                .map(str::to_string),
        })
    }
}
