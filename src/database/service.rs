//! Database service layer
//!
//! This module bundles the repositories behind one cloneable handle and
//! resolves event rows into their API representation.

use sqlx::{Postgres, Transaction};

use crate::database::{
    DatabasePool, EventRepository, FeedbackRepository, ForumRepository, LocationRepository, ParticipationRepository,
    TaxonomyRepository, UserRepository,
};
use crate::models::event::{Event, EventData};
use crate::utils::errors::CollectivError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub locations: LocationRepository,
    pub taxonomy: TaxonomyRepository,
    pub events: EventRepository,
    pub participations: ParticipationRepository,
    pub forums: ForumRepository,
    pub feedback: FeedbackRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            taxonomy: TaxonomyRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            participations: ParticipationRepository::new(pool.clone()),
            forums: ForumRepository::new(pool.clone()),
            feedback: FeedbackRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Start a transaction on the shared pool
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, CollectivError> {
        Ok(self.pool.begin().await?)
    }

    /// Resolve location, category, creator and tags of an event
    pub async fn event_data(&self, event: Event) -> Result<EventData, CollectivError> {
        let location = self.locations.find_by_id(event.location_id).await?;
        let category = match event.category_id {
            Some(category_id) => self.taxonomy.find_category(category_id).await?,
            None => None,
        };
        let creator = match event.creator_id.as_deref() {
            Some(creator_id) => self.users.summary(creator_id).await?,
            None => None,
        };
        let tags = self.taxonomy.tags_for_event(event.id).await?;

        Ok(EventData::new(event, location, category, creator, tags))
    }

    /// [`DatabaseService::event_data`] over a list, keeping order
    pub async fn event_data_list(&self, events: Vec<Event>) -> Result<Vec<EventData>, CollectivError> {
        let mut data = Vec::with_capacity(events.len());
        for event in events {
            data.push(self.event_data(event).await?);
        }
        Ok(data)
    }

    /// Event detail, including the transaction history of projects
    pub async fn event_detail(&self, event: Event) -> Result<EventData, CollectivError> {
        let is_project = event.is_project();
        let event_id = event.id;
        let data = self.event_data(event).await?;

        if is_project {
            let transactions = self.events.transactions(event_id).await?;
            Ok(data.with_transactions(transactions))
        } else {
            Ok(data)
        }
    }
}
