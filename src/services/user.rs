//! User profile, interests and the monthly wrap

use chrono::Utc;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::participation::ParticipationType;
use crate::models::tag::Tag;
use crate::models::user::{CurrentEvent, MonthlyWrap, UpdateUserRequest, User};
use crate::utils::errors::{CollectivError, Result};
use crate::utils::helpers::previous_month_range;
use crate::utils::logging::log_user_action;

#[derive(Clone)]
#[derive(Debug)]
pub struct UserService {
    db: DatabaseService,
}

impl UserService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Fetch the user, creating the row the first time a token is seen
    pub async fn get_or_create(&self, user_id: &str) -> Result<User> {
        self.db.users.get_or_create(user_id).await
    }

    pub async fn update(&self, user_id: &str, request: UpdateUserRequest) -> Result<User> {
        let update = request.validate()?;
        let user = self.db.users.update(user_id, &update).await?;
        log_user_action(user_id, "update_profile", None);
        Ok(user)
    }

    pub async fn set_location_tracking(&self, user_id: &str, location_track: bool) -> Result<User> {
        let update = UpdateUserRequest {
            location_track: Some(location_track),
            ..Default::default()
        }
        .validate()?;
        self.db.users.update(user_id, &update).await
    }

    pub async fn set_location_prompted(&self, user_id: &str, prompted: bool) -> Result<User> {
        self.db.users.set_location_prompted(user_id, prompted).await
    }

    pub async fn interests(&self, user_id: &str) -> Result<Vec<Tag>> {
        self.db.users.interests(user_id).await
    }

    /// Replace the user's interests. Every tag must exist.
    pub async fn replace_interests(&self, user_id: &str, tag_ids: &[Uuid]) -> Result<Vec<Tag>> {
        let mut ids = tag_ids.to_vec();
        ids.sort();
        ids.dedup();

        let tags = self.db.taxonomy.find_tags(&ids).await?;
        if tags.len() != ids.len() {
            return Err(CollectivError::invalid("Some of the given tags do not exist"));
        }

        let mut tx = self.db.begin().await?;
        self.db.users.replace_interests(&mut tx, user_id, &ids).await?;
        tx.commit().await?;

        log_user_action(user_id, "update_interests", Some(&ids.len().to_string()));
        self.interests(user_id).await
    }

    pub async fn current_event(&self, user_id: &str) -> Result<CurrentEvent> {
        let user = self.get_or_create(user_id).await?;

        let event = match user.currently_attended_event_id {
            Some(event_id) => self.db.events.find_by_id(event_id).await?,
            None => None,
        };

        let data = match event {
            Some(event) => Some(self.db.event_data(event).await?),
            None => None,
        };

        Ok(CurrentEvent {
            is_currently_attending_event: data.is_some(),
            currently_attending_role: data.as_ref().and(user.currently_attending_role),
            data,
        })
    }

    /// Activity summary over the previous calendar month
    pub async fn monthly_wrap(&self, user_id: &str) -> Result<MonthlyWrap> {
        let (start, end) = previous_month_range(Utc::now())?;

        let (volunteer_count, volunteer_duration) = self
            .db
            .users
            .attendance_totals(user_id, ParticipationType::Volunteer.as_str(), start, end)
            .await?;
        let (initiative_count, initiative_duration) = self
            .db
            .users
            .attendance_totals(user_id, ParticipationType::Participant.as_str(), start, end)
            .await?;
        let contributions = self.db.users.contribution_totals(user_id, start, end).await?;
        let rank = self.db.users.rank(user_id).await?;

        Ok(MonthlyWrap {
            last_month_volunteer_count: volunteer_count,
            last_month_volunteering_duration: volunteer_duration,
            last_month_initiative_count: initiative_count,
            last_month_initiative_duration: initiative_duration,
            last_month_contributions: contributions,
            last_month_overall_rank: rank,
        })
    }
}
