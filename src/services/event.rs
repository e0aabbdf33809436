//! Event service
//!
//! Creation of initiatives and projects, event images, discovery and search,
//! status transitions and project progress.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::database::{DatabaseService, EventScope};
use crate::models::event::{
    CreateEventRequest, Event, EventData, EventSearchQuery, EventStatus, UpdateProgressRequest, UpdateStatusRequest,
};
use crate::models::location::Location;
use crate::models::user::User;
use crate::services::attendance::close_attendance;
use crate::services::identity::IdentityService;
use crate::services::notification::{MailMessage, NotificationService, CANCELLATION_TEMPLATE};
use crate::services::storage::{StorageService, StoredObject};
use crate::utils::errors::{CollectivError, Result};
use crate::utils::geo::{nearby_sorted, Coordinate};
use crate::utils::helpers::{file_extension, guess_image_content_type};
use crate::utils::logging::{log_attendance, log_event_action};
use crate::utils::pagination::{paginate, Page};

/// Uploaded image file
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct EventService {
    db: DatabaseService,
    storage: StorageService,
    identity: IdentityService,
    notifications: NotificationService,
    pagination: PaginationConfig,
}

impl EventService {
    pub fn new(
        db: DatabaseService,
        storage: StorageService,
        identity: IdentityService,
        notifications: NotificationService,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            db,
            storage,
            identity,
            notifications,
            pagination,
        }
    }

    async fn find(&self, event_id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))
    }

    /// Create an event together with its forum
    pub async fn create(&self, user_id: &str, request: CreateEventRequest) -> Result<EventData> {
        let new_event = request.validate(Utc::now())?;

        self.db
            .locations
            .find_by_id(new_event.location_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Location"))?;

        if let Some(category_id) = new_event.category_id {
            self.db
                .taxonomy
                .find_category(category_id)
                .await?
                .ok_or_else(|| CollectivError::not_found("Event category"))?;
        }

        let tags = self.db.taxonomy.find_tags(&new_event.tags).await?;
        if tags.len() != new_event.tags.len() {
            return Err(CollectivError::invalid("Some of the given tags do not exist"));
        }

        let mut tx = self.db.begin().await?;
        self.db.users.get_or_create_in(&mut tx, user_id).await?;
        if let Some(goal_kind) = &new_event.goal_kind {
            self.db.taxonomy.ensure_goal_kind(&mut tx, goal_kind).await?;
        }
        let event = self.db.events.create(&mut tx, &new_event, user_id).await?;
        self.db.taxonomy.attach_tags(&mut tx, event.id, &new_event.tags).await?;
        self.db.forums.create(&mut tx, event.id).await?;
        tx.commit().await?;

        log_event_action(event.id, "create_event", user_id, Some(&event.event_type));
        self.db.event_detail(event).await
    }

    /// Store an event image. Only the creator may upload.
    pub async fn upload_image(&self, user_id: &str, event_id: Uuid, upload: ImageUpload) -> Result<EventData> {
        let event = self.find(event_id).await?;
        if !event.is_creator(user_id) {
            return Err(CollectivError::restricted("Only the event creator can upload the event image"));
        }

        let extension = file_extension(&upload.file_name)
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| CollectivError::invalid("Event image must have a file extension"))?;
        let content_type = guess_image_content_type(&extension)
            .ok_or_else(|| CollectivError::invalid(format!("Unsupported image type: {}", extension)))?;

        if upload.bytes.is_empty() {
            return Err(CollectivError::invalid("Event image is empty"));
        }
        if upload.bytes.len() > self.storage.max_image_bytes() {
            return Err(CollectivError::invalid("Event image is too large"));
        }

        let path = self.storage.event_image_path(event.id, &extension);
        self.storage.upload(&path, upload.bytes, content_type).await?;
        self.db.events.set_image_directory(event.id, &path).await?;

        log_event_action(event.id, "upload_image", user_id, Some(&path));
        let event = self.find(event_id).await?;
        self.db.event_detail(event).await
    }

    /// Image bytes of an event, `None` when no image was uploaded
    pub async fn get_image(&self, event_id: Uuid) -> Result<Option<StoredObject>> {
        let event = self.find(event_id).await?;
        let Some(path) = event.event_image_directory else {
            return Ok(None);
        };

        let Some(mut object) = self.storage.download(&path).await? else {
            return Ok(None);
        };

        let guessed = file_extension(&path).and_then(guess_image_content_type);
        if let Some(content_type) = guessed {
            object.content_type = Some(content_type.to_string());
        }
        Ok(Some(object))
    }

    pub async fn detail(&self, event_id: Uuid) -> Result<EventData> {
        let event = self.find(event_id).await?;
        self.db.event_detail(event).await
    }

    /// Active events at the user's subscribed locations within the preferred
    /// radius that carry one of the user's interests, nearest location first
    pub async fn discover_nearby(&self, user: &User, origin: Coordinate) -> Result<Vec<EventData>> {
        let subscribed = self.db.locations.list_subscribed(&user.user_id).await?;
        let nearby = nearby_sorted(subscribed, &origin, user.preferred_radius_km(), Location::coordinate);
        if nearby.is_empty() {
            return Ok(Vec::new());
        }

        let rank: HashMap<Uuid, usize> = nearby.iter().enumerate().map(|(i, l)| (l.id, i)).collect();
        let location_ids: Vec<Uuid> = nearby.iter().map(|l| l.id).collect();

        let mut events = self.db.events.list_matching_interests(&user.user_id, &location_ids).await?;
        events.sort_by_key(|event| rank.get(&event.location_id).copied().unwrap_or(usize::MAX));

        self.db.event_data_list(events).await
    }

    /// Events of one location matching the query filters
    pub async fn by_location(&self, location_id: Uuid, query: &EventSearchQuery) -> Result<Vec<EventData>> {
        self.db
            .locations
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Location"))?;

        let events = self
            .db
            .events
            .search(EventScope::Location(location_id), &query.filters()?)
            .await?;
        self.db.event_data_list(events).await
    }

    pub async fn search(&self, query: &EventSearchQuery) -> Result<Page<EventData>> {
        let filters = query.filters()?;

        let events = if let Some(location_id) = query.location_id {
            self.db.events.search(EventScope::Location(location_id), &filters).await?
        } else {
            let mut events = self.db.events.search(EventScope::Active, &filters).await?;

            let latitude = query.latitude.clone().map(serde_json::Value::String);
            let longitude = query.longitude.clone().map(serde_json::Value::String);
            if latitude.is_some() || longitude.is_some() {
                let origin = Coordinate::parse(latitude.as_ref(), longitude.as_ref())?;
                self.sort_by_distance(&mut events, &origin).await?;
            }
            events
        };

        let limit = query.limit.unwrap_or(self.pagination.default_limit);
        let page = paginate(events, limit, query.page.unwrap_or(1));

        Ok(Page {
            current: page.current,
            next: page.next,
            previous: page.previous,
            results: self.db.event_data_list(page.results).await?,
        })
    }

    async fn sort_by_distance(&self, events: &mut [Event], origin: &Coordinate) -> Result<()> {
        let ids: Vec<Uuid> = events.iter().map(|e| e.location_id).collect();
        let distances: HashMap<Uuid, f64> = self
            .db
            .locations
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|location| (location.id, location.coordinate().distance_km(origin)))
            .collect();

        let distance_of = |event: &Event| distances.get(&event.location_id).copied().unwrap_or(f64::MAX);
        events.sort_by(|a, b| distance_of(a).partial_cmp(&distance_of(b)).unwrap_or(Ordering::Equal));
        Ok(())
    }

    /// Move the event to a new status. Ending an event checks out everyone
    /// still attending it; cancelling it also mails every registered user.
    pub async fn update_status(&self, user_id: &str, request: &UpdateStatusRequest) -> Result<EventData> {
        let next: EventStatus = request.status.parse()?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;

        if !event.is_creator(user_id) {
            return Err(CollectivError::restricted("Only the event creator can update the event status"));
        }

        let current = event.status()?;
        if !current.can_transition_to(next) {
            return Err(CollectivError::invalid(format!(
                "Event status cannot change from {} to {}",
                current, next
            )));
        }

        let updated = self.db.events.set_status(&mut tx, event.id, next).await?;

        if matches!(next, EventStatus::Completed | EventStatus::Cancelled) {
            let attending = self.db.participations.lock_attending(&mut tx, event.id).await?;
            for participation in &attending {
                close_attendance(&self.db, &mut tx, participation, true).await?;
                log_attendance(event.id, &participation.participant_id, "forced_check_out", true, false);
            }
            self.db.users.clear_current_event_for(&mut tx, event.id).await?;
        }

        tx.commit().await?;
        log_event_action(event.id, "update_status", user_id, Some(next.as_str()));

        if next == EventStatus::Cancelled {
            let service = self.clone();
            let cancelled = updated.clone();
            tokio::spawn(async move {
                service.send_cancellation_notices(&cancelled).await;
            });
        }

        self.db.event_detail(updated).await
    }

    async fn send_cancellation_notices(&self, event: &Event) {
        if !self.notifications.is_enabled() {
            info!(event_id = %event.id, "Mail disabled, no cancellation notices sent");
            return;
        }

        match self.cancellation_messages(event).await {
            Ok(messages) => {
                self.notifications.send_bulk(&messages).await;
            }
            Err(e) => warn!(event_id = %event.id, error = %e, "Failed to prepare cancellation notices"),
        }
    }

    async fn cancellation_messages(&self, event: &Event) -> Result<Vec<MailMessage>> {
        let location_name = self
            .db
            .locations
            .find_by_id(event.location_id)
            .await?
            .map(|location| location.name)
            .unwrap_or_default();

        let creator = match event.creator_id.as_deref() {
            Some(creator_id) => self.identity.find_account(creator_id).await?,
            None => None,
        };
        let creator_name = creator
            .as_ref()
            .and_then(|account| account.display_name.clone())
            .unwrap_or_else(|| "The event organizer".to_string());
        let creator_contact = creator
            .as_ref()
            .and_then(|account| account.contact())
            .unwrap_or_default()
            .to_string();

        let mut messages = Vec::new();
        for user_id in self.db.participations.registered_user_ids(event.id).await? {
            let account = match self.identity.find_account(&user_id).await {
                Ok(Some(account)) => account,
                Ok(None) => continue,
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "Cannot resolve cancellation recipient");
                    continue;
                }
            };
            let Some(email) = account.email.clone() else {
                continue;
            };

            let parameters = HashMap::from([
                (
                    "participant_name".to_string(),
                    account.display_name.clone().unwrap_or_else(|| "Participant".to_string()),
                ),
                ("event_name".to_string(), event.name.clone()),
                ("location_name".to_string(), location_name.clone()),
                ("start_date_time".to_string(), event.start_date_time.to_rfc3339()),
                ("creator_name".to_string(), creator_name.clone()),
                ("creator_contact".to_string(), creator_contact.clone()),
            ]);
            messages.push(self.notifications.render(CANCELLATION_TEMPLATE, &email, &parameters)?);
        }

        Ok(messages)
    }

    /// Add to the progress of a project. Returns the new progress.
    pub async fn update_progress(&self, user_id: &str, request: &UpdateProgressRequest) -> Result<f64> {
        let amount = request.amount_to_update;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CollectivError::invalid("Amount to update must be a positive number"));
        }

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;

        if !event.is_project() {
            return Err(CollectivError::invalid("Progress can only be updated for projects"));
        }
        if !event.is_creator(user_id) {
            return Err(CollectivError::restricted("Only the event creator can update the project progress"));
        }

        let progress = self.db.events.add_progress(&mut tx, event.id, amount).await?;
        tx.commit().await?;

        log_event_action(event.id, "update_progress", user_id, Some(&progress.to_string()));
        Ok(progress)
    }
}
