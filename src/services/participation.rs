//! Participation service
//!
//! Registration of participants and volunteers, leaving an event, project
//! contributions and the participation views of a user.

use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use crate::database::DatabaseService;
use crate::models::event::{Event, EventData, EventStatus};
use crate::models::participation::{
    ContributionRequest, ContributionResult, ContributionWithEvent, Participation, ParticipationType,
    ParticipationViewQuery, ParticipationWithEvent, RegistrationCheck,
};
use crate::services::identity::IdentityService;
use crate::services::reward::RewardService;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::helpers::ContactIdentifier;
use crate::utils::logging::log_event_action;

/// Fail unless `user_id` may manage the event: its creator, or a checked-in
/// volunteer holding manager access.
pub(crate) async fn ensure_manager(
    db: &DatabaseService,
    conn: &mut PgConnection,
    event: &Event,
    user_id: &str,
) -> Result<()> {
    if event.is_creator(user_id) {
        return Ok(());
    }

    match db.participations.lock(conn, event.id, user_id).await? {
        Some(participation) if participation.can_act_as_manager() => Ok(()),
        _ => Err(CollectivError::restricted("User is not a manager of the event")),
    }
}

fn already_registered(participation: &Participation) -> CollectivError {
    CollectivError::invalid(format!(
        "User has been registered as {} in the event",
        participation.participation_type
    ))
}

#[derive(Clone)]
#[derive(Debug)]
pub struct ParticipationService {
    db: DatabaseService,
    rewards: RewardService,
    identity: IdentityService,
}

impl ParticipationService {
    pub fn new(db: DatabaseService, rewards: RewardService, identity: IdentityService) -> Self {
        Self { db, rewards, identity }
    }

    pub async fn check_registration(&self, user_id: &str, event_id: Uuid) -> Result<RegistrationCheck> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))?;

        let participation = self.db.participations.find(event_id, user_id).await?;
        Ok(RegistrationCheck {
            is_registered: participation.is_some(),
            data: participation,
        })
    }

    pub async fn register_participant(&self, user_id: &str, event_id: Uuid) -> Result<Participation> {
        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, event_id).await?;

        if !event.is_initiative() {
            return Err(CollectivError::invalid("Participants can only register to initiatives"));
        }
        if !event.is_active() {
            return Err(CollectivError::invalid("Event is no longer active"));
        }
        if !event.participation_registration_enabled {
            return Err(CollectivError::invalid("Participant registration is closed for this event"));
        }

        let participation = self.register(&mut tx, &event, user_id, ParticipationType::Participant).await?;
        self.db.events.adjust_participant_count(&mut tx, event.id, 1).await?;
        tx.commit().await?;

        log_event_action(event.id, "register_participant", user_id, None);
        Ok(participation)
    }

    pub async fn register_volunteer(&self, user_id: &str, event_id: Uuid) -> Result<Participation> {
        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, event_id).await?;

        if !event.is_active() {
            return Err(CollectivError::invalid("Event is no longer active"));
        }
        if !event.volunteer_registration_enabled {
            return Err(CollectivError::invalid("Volunteer registration is closed for this event"));
        }

        let participation = self.register(&mut tx, &event, user_id, ParticipationType::Volunteer).await?;
        self.db.events.adjust_volunteer_count(&mut tx, event.id, 1).await?;
        tx.commit().await?;

        log_event_action(event.id, "register_volunteer", user_id, None);
        Ok(participation)
    }

    async fn register(
        &self,
        conn: &mut PgConnection,
        event: &Event,
        user_id: &str,
        kind: ParticipationType,
    ) -> Result<Participation> {
        if event.is_creator(user_id) {
            return Err(CollectivError::invalid("Event creator cannot register to their own event"));
        }

        if let Some(existing) = self.db.participations.lock(&mut *conn, event.id, user_id).await? {
            return Err(already_registered(&existing));
        }

        self.db.participations.create(conn, event.id, user_id, kind).await
    }

    /// Withdraw a participant or volunteer registration
    pub async fn leave(&self, user_id: &str, event_id: Uuid) -> Result<Participation> {
        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, event_id).await?;
        let participation = self
            .db
            .participations
            .lock(&mut tx, event.id, user_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Participation"))?;

        match participation.kind()? {
            ParticipationType::Contributor => {
                return Err(CollectivError::invalid("Contributions cannot be withdrawn"));
            }
            _ if participation.is_currently_attending => {
                return Err(CollectivError::invalid("Cannot leave an event while attending it"));
            }
            ParticipationType::Participant => {
                self.db.events.adjust_participant_count(&mut tx, event.id, -1).await?;
            }
            ParticipationType::Volunteer => {
                self.db.events.adjust_volunteer_count(&mut tx, event.id, -1).await?;
            }
        }

        self.db.participations.delete(&mut tx, participation.id).await?;
        tx.commit().await?;

        log_event_action(event.id, "leave_event", user_id, Some(&participation.participation_type));
        Ok(participation)
    }

    /// Record a contribution to a project on behalf of the contributor
    pub async fn register_contribution(&self, manager_id: &str, request: &ContributionRequest) -> Result<ContributionResult> {
        let amount = request.amount_contributed;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CollectivError::invalid("Amount contributed must be a positive number"));
        }

        let contact = ContactIdentifier::parse(&request.contributor_email_phone)?;
        let contributor_id = self.identity.find_user_id(&contact).await?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.project_id).await?;

        if !event.is_project() {
            return Err(CollectivError::invalid("Contributions can only be made to projects"));
        }
        if !event.is_ongoing() {
            return Err(CollectivError::invalid("Project is not on going"));
        }

        ensure_manager(&self.db, &mut tx, &event, manager_id).await?;

        if event.is_creator(&contributor_id) {
            return Err(CollectivError::invalid("Event creator cannot contribute to their own project"));
        }

        self.db.users.get_or_create_in(&mut tx, &contributor_id).await?;

        let participation = match self.db.participations.lock(&mut tx, event.id, &contributor_id).await? {
            Some(existing) if existing.is_of(ParticipationType::Contributor) => existing,
            Some(existing) => return Err(already_registered(&existing)),
            None => {
                let created = self
                    .db
                    .participations
                    .create(&mut tx, event.id, &contributor_id, ParticipationType::Contributor)
                    .await?;
                self.db.events.adjust_participant_count(&mut tx, event.id, 1).await?;
                created
            }
        };

        let updated = self.db.participations.add_contribution(&mut tx, participation.id, amount).await?;
        let project_progress = self.db.events.add_progress(&mut tx, event.id, amount).await?;
        let is_rewarded = self.rewards.grant_if_eligible(&mut tx, &updated).await?;
        tx.commit().await?;

        info!(event_id = %event.id, contributor = %contributor_id, amount = amount, "Contribution recorded");

        Ok(ContributionResult {
            participation_id: updated.id,
            contributor_id,
            amount_contributed: amount,
            total_contribution: updated.total_contribution,
            project_progress,
            is_rewarded,
        })
    }

    async fn with_event(&self, participation: &Participation) -> Result<EventData> {
        let event = self
            .db
            .events
            .find_by_id(participation.event_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))?;
        self.db.event_data(event).await
    }

    /// Participant and volunteer registrations of the user, newest first
    pub async fn list_participations(
        &self,
        user_id: &str,
        query: &ParticipationViewQuery,
    ) -> Result<Vec<ParticipationWithEvent>> {
        let kinds = query.participation_types()?;
        let statuses = EventStatus::from_selector(query.status.as_deref());
        let participations = self.db.participations.list_for_user(user_id, &kinds, &statuses).await?;

        let mut results = Vec::with_capacity(participations.len());
        for participation in participations {
            let event = self.with_event(&participation).await?;
            results.push(ParticipationWithEvent { participation, event });
        }
        Ok(results)
    }

    pub async fn list_contributions(&self, user_id: &str) -> Result<Vec<ContributionWithEvent>> {
        let statuses = EventStatus::from_selector(None);
        let participations = self
            .db
            .participations
            .list_for_user(user_id, &[ParticipationType::Contributor], &statuses)
            .await?;

        let mut results = Vec::with_capacity(participations.len());
        for participation in participations {
            let event = self.with_event(&participation).await?;
            let activities = self.db.participations.contribution_activities(participation.id).await?;
            results.push(ContributionWithEvent { participation, event, activities });
        }
        Ok(results)
    }

    pub async fn list_created_events(&self, user_id: &str, status: Option<&str>) -> Result<Vec<EventData>> {
        let statuses = EventStatus::from_selector(status);
        let events = self.db.events.list_created_by(user_id, &statuses).await?;
        self.db.event_data_list(events).await
    }
}
