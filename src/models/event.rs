//! Event model
//!
//! Initiatives and projects live in one `events` table. The `event_type`
//! column selects which of the kind-specific columns are meaningful:
//! initiatives use `participation_registration_enabled`, projects use
//! `goal`, `progress`, `measurement_unit` and `goal_kind`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::location::Location;
use crate::models::tag::{EventCategory, Tag};
use crate::models::user::UserSummary;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::helpers::{parse_iso_datetime, validate_trimmed_length};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Initiative,
    Project,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Initiative => "initiative",
            EventType::Project => "project",
        }
    }
}

impl FromStr for EventType {
    type Err = CollectivError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "initiative" => Ok(EventType::Initiative),
            "project" => Ok(EventType::Project),
            other => Err(CollectivError::invalid(format!("Unknown event type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    #[serde(rename = "Scheduled")]
    Scheduled,
    #[serde(rename = "On Going")]
    OnGoing,
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Cancelled")]
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "Scheduled",
            EventStatus::OnGoing => "On Going",
            EventStatus::Completed => "Completed",
            EventStatus::Cancelled => "Cancelled",
        }
    }

    /// Scheduled and on-going events accept registrations
    pub fn is_active(&self) -> bool {
        matches!(self, EventStatus::Scheduled | EventStatus::OnGoing)
    }

    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Scheduled, EventStatus::OnGoing)
                | (EventStatus::Scheduled, EventStatus::Cancelled)
                | (EventStatus::OnGoing, EventStatus::Completed)
        )
    }

    /// Statuses matched by a participation view selector
    pub fn from_selector(selector: Option<&str>) -> Vec<EventStatus> {
        match selector.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "past" => vec![EventStatus::Completed, EventStatus::Cancelled],
            Some(s) if s == "on going" || s == "ongoing" => vec![EventStatus::OnGoing],
            Some(s) if s == "future" => vec![EventStatus::Scheduled],
            _ => vec![
                EventStatus::Scheduled,
                EventStatus::OnGoing,
                EventStatus::Completed,
                EventStatus::Cancelled,
            ],
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = CollectivError;

    /// Case-insensitive; accepts `ongoing` for `On Going`
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "scheduled" => Ok(EventStatus::Scheduled),
            "on going" | "ongoing" | "on_going" => Ok(EventStatus::OnGoing),
            "completed" => Ok(EventStatus::Completed),
            "cancelled" | "canceled" => Ok(EventStatus::Cancelled),
            other => Err(CollectivError::invalid(format!("Unknown event status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub event_type: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub min_num_of_volunteers: i32,
    pub volunteer_registration_enabled: bool,
    pub participation_registration_enabled: bool,
    pub current_num_of_participants: i32,
    pub current_num_of_volunteers: i32,
    pub location_id: Uuid,
    pub creator_id: Option<String>,
    pub category_id: Option<Uuid>,
    pub status: String,
    pub event_image_directory: Option<String>,
    pub goal: Option<f64>,
    pub progress: Option<f64>,
    pub measurement_unit: Option<String>,
    pub goal_kind: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn kind(&self) -> Result<EventType> {
        self.event_type.parse()
    }

    pub fn status(&self) -> Result<EventStatus> {
        self.status.parse()
    }

    pub fn is_project(&self) -> bool {
        self.event_type == EventType::Project.as_str()
    }

    pub fn is_initiative(&self) -> bool {
        self.event_type == EventType::Initiative.as_str()
    }

    pub fn is_active(&self) -> bool {
        self.status().map(|s| s.is_active()).unwrap_or(false)
    }

    pub fn is_ongoing(&self) -> bool {
        self.status == EventStatus::OnGoing.as_str()
    }

    pub fn is_creator(&self, user_id: &str) -> bool {
        self.creator_id.as_deref() == Some(user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectTransaction {
    pub id: i64,
    pub event_id: Uuid,
    pub transaction_time: DateTime<Utc>,
    pub transaction_value: f64,
}

/// Kind-specific fields of an event response
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum EventKindData {
    Initiative {
        participation_registration_enabled: bool,
    },
    Project {
        goal: f64,
        progress: f64,
        measurement_unit: Option<String>,
        goal_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        transactions: Option<Vec<ProjectTransaction>>,
    },
}

/// Event as returned by the API, with its related rows resolved
#[derive(Debug, Clone, Serialize)]
pub struct EventData {
    pub id: Uuid,
    pub event_type: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub min_num_of_volunteers: i32,
    pub volunteer_registration_enabled: bool,
    pub current_num_of_participants: i32,
    pub current_num_of_volunteers: i32,
    pub status: String,
    pub event_image_directory: Option<String>,
    pub location: Option<Location>,
    pub category: Option<EventCategory>,
    pub creator: Option<UserSummary>,
    pub tags: Vec<Tag>,
    #[serde(flatten)]
    pub kind: EventKindData,
}

impl EventData {
    pub fn new(
        event: Event,
        location: Option<Location>,
        category: Option<EventCategory>,
        creator: Option<UserSummary>,
        tags: Vec<Tag>,
    ) -> Self {
        let kind = if event.is_project() {
            EventKindData::Project {
                goal: event.goal.unwrap_or_default(),
                progress: event.progress.unwrap_or_default(),
                measurement_unit: event.measurement_unit.clone(),
                goal_kind: event.goal_kind.clone(),
                transactions: None,
            }
        } else {
            EventKindData::Initiative {
                participation_registration_enabled: event.participation_registration_enabled,
            }
        };

        Self {
            id: event.id,
            event_type: event.event_type,
            name: event.name,
            description: event.description,
            start_date_time: event.start_date_time,
            end_date_time: event.end_date_time,
            min_num_of_volunteers: event.min_num_of_volunteers,
            volunteer_registration_enabled: event.volunteer_registration_enabled,
            current_num_of_participants: event.current_num_of_participants,
            current_num_of_volunteers: event.current_num_of_volunteers,
            status: event.status,
            event_image_directory: event.event_image_directory,
            location,
            category,
            creator,
            tags,
            kind,
        }
    }

    pub fn with_transactions(mut self, history: Vec<ProjectTransaction>) -> Self {
        if let EventKindData::Project { ref mut transactions, .. } = self.kind {
            *transactions = Some(history);
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_project: bool,
    pub project_goal: Option<f64>,
    pub goal_measurement_unit: Option<String>,
    pub goal_kind: Option<String>,
    #[serde(default)]
    pub min_num_of_volunteers: i32,
    pub start_date_time: String,
    pub end_date_time: String,
    pub location_id: Uuid,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// Validated event ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: EventType,
    pub name: String,
    pub description: Option<String>,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub min_num_of_volunteers: i32,
    pub goal: Option<f64>,
    pub measurement_unit: Option<String>,
    pub goal_kind: Option<String>,
    pub location_id: Uuid,
    pub category_id: Option<Uuid>,
    pub tags: Vec<Uuid>,
}

impl CreateEventRequest {
    /// Check field shapes and ordering. Existence of the referenced
    /// location, category and tags is checked against the database.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewEvent> {
        let name = validate_trimmed_length(&self.name, 3, 50, "Event name")?;

        if self.min_num_of_volunteers < 0 {
            return Err(CollectivError::invalid("Minimum number of volunteers cannot be negative"));
        }

        let start_date_time = parse_iso_datetime(&self.start_date_time, "Start date time")?;
        let end_date_time = parse_iso_datetime(&self.end_date_time, "End date time")?;

        if start_date_time < now {
            return Err(CollectivError::invalid("Start date time cannot be in the past"));
        }

        if start_date_time >= end_date_time {
            return Err(CollectivError::invalid("Start date time must be before end date time"));
        }

        let (event_type, goal, measurement_unit, goal_kind) = if self.is_project {
            let goal = self
                .project_goal
                .ok_or_else(|| CollectivError::invalid("Project goal must be a number"))?;
            if !goal.is_finite() || goal <= 0.0 {
                return Err(CollectivError::invalid("Project goal must be a positive number"));
            }

            let unit = self
                .goal_measurement_unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .ok_or_else(|| CollectivError::invalid("Goal measurement unit is required for projects"))?;
            if unit.chars().count() > 30 {
                return Err(CollectivError::invalid("Goal measurement unit must be at most 30 characters"));
            }

            let goal_kind = self
                .goal_kind
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty());

            (EventType::Project, Some(goal), Some(unit), goal_kind)
        } else {
            (EventType::Initiative, None, None, None)
        };

        let mut tags = self.tags;
        tags.sort();
        tags.dedup();

        Ok(NewEvent {
            event_type,
            name,
            description: self.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            start_date_time,
            end_date_time,
            min_num_of_volunteers: self.min_num_of_volunteers,
            goal,
            measurement_unit,
            goal_kind,
            location_id: self.location_id,
            category_id: self.category_id,
            tags,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub event_id: Uuid,
    #[serde(alias = "new_status")]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProgressRequest {
    pub event_id: Uuid,
    pub amount_to_update: f64,
}

/// Query parameters for event search and per-location listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventSearchQuery {
    pub location_id: Option<Uuid>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub status: Option<String>,
    pub category_id: Option<Uuid>,
    /// Comma separated tag names
    pub tags: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub name: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
}

/// Parsed search filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilters {
    pub status: Option<EventStatus>,
    pub category_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub event_type: Option<EventType>,
    pub name: Option<String>,
}

impl EventSearchQuery {
    pub fn filters(&self) -> Result<EventFilters> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<EventStatus>)
            .transpose()?;

        let event_type = self
            .event_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<EventType>)
            .transpose()?;

        let tags = self
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(|tag| tag.trim().to_lowercase())
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(EventFilters {
            status,
            category_id: self.category_id,
            tags,
            event_type,
            name: self.name.clone().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        })
    }
}

/// Registrations of one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationDay {
    pub registration_date: DateTime<Utc>,
    pub registration_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventAnalytics {
    #[serde(flatten)]
    pub event: EventData,
    pub registration_history: Vec<RegistrationDay>,
    pub average_rating: Option<f64>,
    pub average_participant_duration: Option<f64>,
    pub average_volunteer_duration: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct LocationParticipationTotals {
    pub volunteers_count_in_location: i64,
    pub participants_in_location: i64,
    pub contributors_in_location: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationAnalytics {
    pub location_id: Uuid,
    pub participation_data: LocationParticipationTotals,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(now: DateTime<Utc>) -> CreateEventRequest {
        CreateEventRequest {
            name: "  Beach Cleanup ".to_string(),
            description: Some("Bring gloves".to_string()),
            is_project: false,
            project_goal: None,
            goal_measurement_unit: None,
            goal_kind: None,
            min_num_of_volunteers: 2,
            start_date_time: (now + Duration::days(1)).to_rfc3339(),
            end_date_time: (now + Duration::days(1) + Duration::hours(3)).to_rfc3339(),
            location_id: Uuid::new_v4(),
            category_id: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_status_transitions() {
        use EventStatus::*;
        assert!(Scheduled.can_transition_to(OnGoing));
        assert!(Scheduled.can_transition_to(Cancelled));
        assert!(OnGoing.can_transition_to(Completed));
        assert!(!OnGoing.can_transition_to(Cancelled));
        assert!(!Scheduled.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(OnGoing));
        assert!(!Cancelled.can_transition_to(Scheduled));
        assert!(!Scheduled.can_transition_to(Scheduled));
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("on going".parse::<EventStatus>().unwrap(), EventStatus::OnGoing);
        assert_eq!("COMPLETED".parse::<EventStatus>().unwrap(), EventStatus::Completed);
        assert!("finished".parse::<EventStatus>().is_err());
        assert_eq!(EventStatus::OnGoing.to_string(), "On Going");
    }

    #[test]
    fn test_status_selector() {
        assert_eq!(
            EventStatus::from_selector(Some("past")),
            vec![EventStatus::Completed, EventStatus::Cancelled]
        );
        assert_eq!(EventStatus::from_selector(Some("future")), vec![EventStatus::Scheduled]);
        assert_eq!(EventStatus::from_selector(None).len(), 4);
    }

    #[test]
    fn test_initiative_request_is_valid() {
        let now = Utc::now();
        let event = request(now).validate(now).unwrap();
        assert_eq!(event.name, "Beach Cleanup");
        assert_eq!(event.event_type, EventType::Initiative);
        assert_eq!(event.goal, None);
    }

    #[test]
    fn test_project_requires_goal_and_unit() {
        let now = Utc::now();
        let mut project = request(now);
        project.is_project = true;
        assert!(project.clone().validate(now).is_err());

        project.project_goal = Some(100.0);
        assert!(project.clone().validate(now).is_err());

        project.goal_measurement_unit = Some("kg".to_string());
        let event = project.validate(now).unwrap();
        assert_eq!(event.event_type, EventType::Project);
        assert_eq!(event.goal, Some(100.0));
    }

    #[test]
    fn test_dates_are_checked() {
        let now = Utc::now();

        let mut past = request(now);
        past.start_date_time = (now - Duration::hours(1)).to_rfc3339();
        assert!(past.validate(now).is_err());

        let mut inverted = request(now);
        inverted.end_date_time = (now + Duration::hours(1)).to_rfc3339();
        assert!(inverted.validate(now).is_err());

        let mut garbage = request(now);
        garbage.start_date_time = "tomorrow".to_string();
        assert!(garbage.validate(now).is_err());
    }

    #[test]
    fn test_search_filters() {
        let query = EventSearchQuery {
            status: Some("scheduled".to_string()),
            tags: Some("Beach, cleanup,,".to_string()),
            event_type: Some("project".to_string()),
            ..Default::default()
        };

        let filters = query.filters().unwrap();
        assert_eq!(filters.status, Some(EventStatus::Scheduled));
        assert_eq!(filters.tags, vec!["beach", "cleanup"]);
        assert_eq!(filters.event_type, Some(EventType::Project));
    }

    #[test]
    fn test_event_data_serializes_kind_fields_flat() {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            event_type: "project".to_string(),
            name: "Tree Planting".to_string(),
            description: None,
            start_date_time: now,
            end_date_time: now,
            min_num_of_volunteers: 0,
            volunteer_registration_enabled: true,
            participation_registration_enabled: true,
            current_num_of_participants: 0,
            current_num_of_volunteers: 0,
            location_id: Uuid::new_v4(),
            creator_id: None,
            category_id: None,
            status: "Scheduled".to_string(),
            event_image_directory: None,
            goal: Some(50.0),
            progress: Some(10.0),
            measurement_unit: Some("trees".to_string()),
            goal_kind: None,
            created_at: now,
        };

        let json = serde_json::to_value(EventData::new(event, None, None, None, vec![])).unwrap();
        assert_eq!(json["goal"], 50.0);
        assert_eq!(json["progress"], 10.0);
        assert!(json.get("participation_registration_enabled").is_none());
    }
}
