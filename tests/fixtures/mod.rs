//! Request fixtures shared by the integration tests

#![allow(dead_code)]

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use Collectiv::models::event::CreateEventRequest;
use Collectiv::models::location::CreateLocationRequest;
use Collectiv::models::participation::GeofencedAttendanceRequest;

/// Jakarta, Monas
pub const VENUE_LATITUDE: f64 = -6.175392;
pub const VENUE_LONGITUDE: f64 = 106.827153;

/// About 55 m north of the venue
pub const NEARBY_LATITUDE: f64 = -6.174900;
/// About 1.1 km north of the venue
pub const FAR_LATITUDE: f64 = -6.165392;

pub fn venue_request(name: &str) -> CreateLocationRequest {
    CreateLocationRequest {
        name: name.to_string(),
        latitude: VENUE_LATITUDE,
        longitude: VENUE_LONGITUDE,
        description: Some("City park".to_string()),
    }
}

pub fn initiative_request(name: &str, location_id: Uuid) -> CreateEventRequest {
    let start = Utc::now() + Duration::hours(1);
    CreateEventRequest {
        name: name.to_string(),
        description: Some("Weekend clean-up".to_string()),
        is_project: false,
        project_goal: None,
        goal_measurement_unit: None,
        goal_kind: None,
        min_num_of_volunteers: 2,
        start_date_time: start.to_rfc3339(),
        end_date_time: (start + Duration::hours(3)).to_rfc3339(),
        location_id,
        category_id: None,
        tags: Vec::new(),
    }
}

pub fn project_request(name: &str, location_id: Uuid, goal: f64) -> CreateEventRequest {
    CreateEventRequest {
        is_project: true,
        project_goal: Some(goal),
        goal_measurement_unit: Some("kg".to_string()),
        goal_kind: Some("Waste".to_string()),
        ..initiative_request(name, location_id)
    }
}

pub fn position(event_id: Uuid, latitude: f64, longitude: f64) -> GeofencedAttendanceRequest {
    GeofencedAttendanceRequest {
        event_id,
        latitude: Some(json!(latitude)),
        longitude: Some(json!(longitude.to_string())),
    }
}

pub fn at_venue(event_id: Uuid) -> GeofencedAttendanceRequest {
    position(event_id, NEARBY_LATITUDE, VENUE_LONGITUDE)
}

pub fn far_away(event_id: Uuid) -> GeofencedAttendanceRequest {
    position(event_id, FAR_LATITUDE, VENUE_LONGITUDE)
}
