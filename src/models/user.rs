//! User model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::event::EventData;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::helpers::validate_trimmed_length;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub full_name: Option<String>,
    pub reward_points: i64,
    /// Meters
    pub preferred_radius: i32,
    pub location_track: bool,
    pub has_been_prompted_for_location_tracking: bool,
    pub currently_attended_event_id: Option<Uuid>,
    pub currently_attending_role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_currently_attending_event(&self) -> bool {
        self.currently_attended_event_id.is_some()
    }

    pub fn preferred_radius_km(&self) -> f64 {
        self.preferred_radius as f64 / 1000.0
    }
}

/// Public view of an event creator or post author
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub user_id: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub preferred_radius: Option<i64>,
    pub location_track: Option<bool>,
}

/// Validated form of [`UpdateUserRequest`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub preferred_radius: Option<i32>,
    pub location_track: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserUpdate> {
        let full_name = self
            .full_name
            .map(|name| validate_trimmed_length(&name, 3, 50, "Full name"))
            .transpose()?;

        let preferred_radius = match self.preferred_radius {
            Some(radius) if radius <= 0 || radius > i32::MAX as i64 => {
                return Err(CollectivError::invalid("Preferred radius must be a positive integer"));
            }
            Some(radius) => Some(radius as i32),
            None => None,
        };

        Ok(UserUpdate {
            full_name,
            preferred_radius,
            location_track: self.location_track,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationTrackingRequest {
    pub location_track: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationPromptRequest {
    #[serde(alias = "has_been_prompted_for_location_tracking")]
    pub has_been_prompted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInterestsRequest {
    pub interests: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentEvent {
    pub is_currently_attending_event: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currently_attending_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<EventData>,
}

/// Contributions of one user grouped by unit and goal kind
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContributionSummary {
    pub measurement_unit: Option<String>,
    pub goal_kind: Option<String>,
    pub total_contribution: f64,
}

/// Activity summary of a user over the previous calendar month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyWrap {
    pub last_month_volunteer_count: i64,
    pub last_month_volunteering_duration: f64,
    pub last_month_initiative_count: i64,
    pub last_month_initiative_duration: f64,
    pub last_month_contributions: Vec<ContributionSummary>,
    pub last_month_overall_rank: i64,
}
