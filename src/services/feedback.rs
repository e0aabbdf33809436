//! Participation reviews and event reports

use crate::database::DatabaseService;
use crate::models::report::{EventReport, SubmitReportRequest};
use crate::models::review::{ParticipationReview, SubmitReviewRequest};
use crate::services::inference::InferenceService;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::logging::log_event_action;

#[derive(Clone)]
#[derive(Debug)]
pub struct FeedbackService {
    db: DatabaseService,
    inference: InferenceService,
}

impl FeedbackService {
    pub fn new(db: DatabaseService, inference: InferenceService) -> Self {
        Self { db, inference }
    }

    /// Review the event the user took part in. One review per participation.
    pub async fn submit_review(&self, user_id: &str, request: &SubmitReviewRequest) -> Result<ParticipationReview> {
        let review = request.validate()?;

        let sentiment_score = match review.event_comment.as_deref() {
            Some(comment) => self.inference.try_sentiment_score(comment).await,
            None => None,
        };

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        let participation = self
            .db
            .participations
            .lock(&mut tx, event.id, user_id)
            .await?
            .ok_or_else(|| CollectivError::invalid("User has not participated in the event"))?;

        if participation.submitted_review {
            return Err(CollectivError::invalid("User has already reviewed the event"));
        }
        if !participation.can_submit_review() {
            return Err(CollectivError::invalid("User has not attended the event"));
        }

        let created = self
            .db
            .feedback
            .create_review(
                &mut tx,
                participation.id,
                review.event_rating,
                review.event_comment.as_deref(),
                sentiment_score,
            )
            .await?;
        self.db.participations.mark_reviewed(&mut tx, participation.id).await?;
        tx.commit().await?;

        log_event_action(event.id, "submit_review", user_id, Some(&review.event_rating.to_string()));
        Ok(created)
    }

    pub async fn submit_report(&self, user_id: &str, request: &SubmitReportRequest) -> Result<EventReport> {
        let remarks = request.validate()?;

        let event = self
            .db
            .events
            .find_by_id(request.event_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))?;

        if self.db.feedback.has_reported(event.id, user_id).await? {
            return Err(CollectivError::invalid("User has already reported the event"));
        }

        let report = self
            .db
            .feedback
            .create_report(event.id, user_id, &remarks)
            .await?
            .ok_or_else(|| CollectivError::invalid("User has already reported the event"))?;

        log_event_action(event.id, "submit_report", user_id, None);
        Ok(report)
    }
}
