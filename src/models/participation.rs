//! Participation model
//!
//! One row per (event, user). Participants and volunteers are "attendable":
//! they check in and out of the event location. Contributors only record
//! contributions to a project.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::event::EventData;
use crate::utils::errors::{CollectivError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationType {
    Participant,
    Volunteer,
    Contributor,
}

impl ParticipationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationType::Participant => "participant",
            ParticipationType::Volunteer => "volunteer",
            ParticipationType::Contributor => "contributor",
        }
    }

    pub fn is_attendable(&self) -> bool {
        !matches!(self, ParticipationType::Contributor)
    }
}

impl fmt::Display for ParticipationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationType {
    type Err = CollectivError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "participant" => Ok(ParticipationType::Participant),
            "volunteer" => Ok(ParticipationType::Volunteer),
            "contributor" => Ok(ParticipationType::Contributor),
            other => Err(CollectivError::invalid(format!("Unknown participation type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Participation {
    pub id: Uuid,
    pub event_id: Uuid,
    pub participant_id: String,
    pub participation_type: String,
    pub registration_time: DateTime<Utc>,
    pub has_left_forum: bool,
    pub rewarded: bool,
    pub submitted_review: bool,
    pub is_currently_attending: bool,
    pub overall_duration_in_seconds: f64,
    pub has_attended: bool,
    pub has_violated_geofencing_rule: bool,
    pub granted_manager_access: bool,
    pub total_contribution: f64,
}

impl Participation {
    pub fn kind(&self) -> Result<ParticipationType> {
        self.participation_type.parse()
    }

    pub fn is_of(&self, kind: ParticipationType) -> bool {
        self.participation_type == kind.as_str()
    }

    pub fn is_attendable(&self) -> bool {
        !self.is_of(ParticipationType::Contributor)
    }

    /// A volunteer acts as manager only while granted access and checked in
    pub fn can_act_as_manager(&self) -> bool {
        self.is_of(ParticipationType::Volunteer) && self.granted_manager_access && self.is_currently_attending
    }

    pub fn is_eligible_for_reward(&self, minimum_seconds: f64) -> bool {
        if self.rewarded {
            return false;
        }

        if self.is_attendable() {
            self.overall_duration_in_seconds >= minimum_seconds && !self.has_violated_geofencing_rule
        } else {
            true
        }
    }

    pub fn can_submit_review(&self) -> bool {
        if self.submitted_review {
            return false;
        }
        !self.is_attendable() || self.has_attended
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceActivityType {
    #[serde(rename = "check-in")]
    CheckIn,
    #[serde(rename = "check-out")]
    CheckOut,
}

impl AttendanceActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceActivityType::CheckIn => "check-in",
            AttendanceActivityType::CheckOut => "check-out",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceActivity {
    pub id: i64,
    pub participation_id: Uuid,
    pub activity_type: String,
    pub activity_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContributionActivity {
    pub id: i64,
    pub participation_id: Uuid,
    pub activity_time: DateTime<Utc>,
    pub contribution: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckInData {
    pub check_in_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckOutData {
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: DateTime<Utc>,
    pub duration_in_seconds: f64,
    pub total_duration_in_seconds: f64,
    pub is_rewarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violated_geofencing_rule: Option<bool>,
}

/// Result of the automated check-out probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomatedCheckOut {
    pub checked_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CheckOutData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionResult {
    pub participation_id: Uuid,
    pub contributor_id: String,
    pub amount_contributed: f64,
    pub total_contribution: f64,
    pub project_progress: f64,
    pub is_rewarded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipationWithEvent {
    #[serde(flatten)]
    pub participation: Participation,
    pub event: EventData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContributionWithEvent {
    #[serde(flatten)]
    pub participation: Participation,
    pub event: EventData,
    pub activities: Vec<ContributionActivity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistrationCheck {
    pub is_registered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Participation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventIdRequest {
    pub event_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventIdQuery {
    pub event_id: Uuid,
}

/// Self check-in/out payload. Coordinates arrive as numbers or numeric strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofencedAttendanceRequest {
    pub event_id: Uuid,
    pub latitude: Option<serde_json::Value>,
    pub longitude: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistedAttendanceRequest {
    pub event_id: Uuid,
    #[serde(alias = "participant_email_phone", alias = "volunteer_email_phone")]
    pub user_email_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRequest {
    pub project_id: Uuid,
    pub contributor_email_phone: String,
    pub amount_contributed: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipationViewQuery {
    #[serde(rename = "type")]
    pub participation_type: Option<String>,
    pub status: Option<String>,
}

impl ParticipationViewQuery {
    /// Attendable types selected by the `type` parameter
    pub fn participation_types(&self) -> Result<Vec<ParticipationType>> {
        match self.participation_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            None => Ok(vec![ParticipationType::Participant, ParticipationType::Volunteer]),
            Some(raw) => match raw.parse::<ParticipationType>()? {
                ParticipationType::Contributor => Err(CollectivError::invalid(
                    "Contributions are listed through the contribution view",
                )),
                kind => Ok(vec![kind]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participation(kind: ParticipationType) -> Participation {
        Participation {
            id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            participant_id: "user-1".to_string(),
            participation_type: kind.as_str().to_string(),
            registration_time: Utc::now(),
            has_left_forum: false,
            rewarded: false,
            submitted_review: false,
            is_currently_attending: false,
            overall_duration_in_seconds: 0.0,
            has_attended: false,
            has_violated_geofencing_rule: false,
            granted_manager_access: false,
            total_contribution: 0.0,
        }
    }

    #[test]
    fn test_attendable_reward_eligibility() {
        let mut p = participation(ParticipationType::Participant);
        p.overall_duration_in_seconds = 120.0;
        assert!(p.is_eligible_for_reward(60.0));
        assert!(!p.is_eligible_for_reward(600.0));

        p.has_violated_geofencing_rule = true;
        assert!(!p.is_eligible_for_reward(0.0));

        p.has_violated_geofencing_rule = false;
        p.rewarded = true;
        assert!(!p.is_eligible_for_reward(0.0));
    }

    #[test]
    fn test_contributor_reward_eligibility() {
        let mut p = participation(ParticipationType::Contributor);
        p.has_violated_geofencing_rule = true;
        assert!(p.is_eligible_for_reward(1_000_000.0));

        p.rewarded = true;
        assert!(!p.is_eligible_for_reward(0.0));
    }

    #[test]
    fn test_review_eligibility() {
        let mut volunteer = participation(ParticipationType::Volunteer);
        assert!(!volunteer.can_submit_review());
        volunteer.has_attended = true;
        assert!(volunteer.can_submit_review());
        volunteer.submitted_review = true;
        assert!(!volunteer.can_submit_review());

        let contributor = participation(ParticipationType::Contributor);
        assert!(contributor.can_submit_review());
    }

    #[test]
    fn test_manager_requires_grant_and_attendance() {
        let mut volunteer = participation(ParticipationType::Volunteer);
        volunteer.granted_manager_access = true;
        assert!(!volunteer.can_act_as_manager());
        volunteer.is_currently_attending = true;
        assert!(volunteer.can_act_as_manager());

        let mut participant = participation(ParticipationType::Participant);
        participant.granted_manager_access = true;
        participant.is_currently_attending = true;
        assert!(!participant.can_act_as_manager());
    }

    #[test]
    fn test_view_query_types() {
        let all = ParticipationViewQuery::default().participation_types().unwrap();
        assert_eq!(all, vec![ParticipationType::Participant, ParticipationType::Volunteer]);

        let volunteer = ParticipationViewQuery {
            participation_type: Some("Volunteer".to_string()),
            status: None,
        };
        assert_eq!(volunteer.participation_types().unwrap(), vec![ParticipationType::Volunteer]);

        let contributor = ParticipationViewQuery {
            participation_type: Some("contributor".to_string()),
            status: None,
        };
        assert!(contributor.participation_types().is_err());
    }
}
