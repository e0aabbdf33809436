//! Event and location analytics

use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::event::{EventAnalytics, LocationAnalytics};
use crate::models::participation::ParticipationType;
use crate::utils::errors::{CollectivError, Result};

#[derive(Clone)]
#[derive(Debug)]
pub struct AnalyticsService {
    db: DatabaseService,
}

impl AnalyticsService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    pub async fn event(&self, event_id: Uuid) -> Result<EventAnalytics> {
        let event = self
            .db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))?;

        let registration_history = self.db.events.registration_history(event.id).await?;
        let average_rating = self.db.events.average_rating(event.id).await?;
        let average_participant_duration = self
            .db
            .events
            .average_duration(event.id, ParticipationType::Participant.as_str())
            .await?;
        let average_volunteer_duration = self
            .db
            .events
            .average_duration(event.id, ParticipationType::Volunteer.as_str())
            .await?;

        Ok(EventAnalytics {
            event: self.db.event_detail(event).await?,
            registration_history,
            average_rating,
            average_participant_duration,
            average_volunteer_duration,
        })
    }

    pub async fn location(&self, location_id: Uuid) -> Result<LocationAnalytics> {
        let location = self
            .db
            .locations
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Location"))?;

        Ok(LocationAnalytics {
            location_id: location.id,
            participation_data: self.db.events.location_totals(location.id).await?,
        })
    }
}
