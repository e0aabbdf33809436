//! Attendance service
//!
//! Geofenced self check-in and check-out of participants, assisted check-in
//! and check-out by event managers, volunteer attendance and the automated
//! check-out of participants who walked out of the event area.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::config::GeofenceConfig;
use crate::database::DatabaseService;
use crate::models::event::Event;
use crate::models::location::Location;
use crate::models::participation::{
    AssistedAttendanceRequest, AttendanceActivityType, AutomatedCheckOut, CheckInData, CheckOutData,
    GeofencedAttendanceRequest, Participation, ParticipationType,
};
use crate::services::identity::IdentityService;
use crate::services::participation::ensure_manager;
use crate::services::reward::RewardService;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::geo::Coordinate;
use crate::utils::helpers::ContactIdentifier;
use crate::utils::logging::{log_attendance, log_event_action};

/// A closed attendance period
#[derive(Debug, Clone)]
pub(crate) struct ClosedAttendance {
    pub participation: Participation,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: DateTime<Utc>,
    pub duration_in_seconds: f64,
}

/// Check the participation out: record the activity, add the elapsed time
/// since the latest check-in and clear the user's current event.
pub(crate) async fn close_attendance(
    db: &DatabaseService,
    conn: &mut PgConnection,
    participation: &Participation,
    violated_geofencing_rule: bool,
) -> Result<ClosedAttendance> {
    let now = Utc::now();
    let check_in_time = db
        .participations
        .latest_check_in(&mut *conn, participation.id)
        .await?
        .unwrap_or(now);
    let duration_in_seconds = ((now - check_in_time).num_milliseconds() as f64 / 1000.0).max(0.0);

    db.participations
        .record_attendance(&mut *conn, participation.id, AttendanceActivityType::CheckOut, now)
        .await?;
    let updated = db
        .participations
        .mark_checked_out(&mut *conn, participation.id, duration_in_seconds, violated_geofencing_rule)
        .await?;
    db.users
        .set_current_event(conn, &participation.participant_id, None, None)
        .await?;

    Ok(ClosedAttendance {
        participation: updated,
        check_in_time,
        check_out_time: now,
        duration_in_seconds,
    })
}

#[derive(Clone)]
#[derive(Debug)]
pub struct AttendanceService {
    db: DatabaseService,
    rewards: RewardService,
    identity: IdentityService,
    geofence: GeofenceConfig,
}

impl AttendanceService {
    pub fn new(db: DatabaseService, rewards: RewardService, identity: IdentityService, geofence: GeofenceConfig) -> Self {
        Self {
            db,
            rewards,
            identity,
            geofence,
        }
    }

    async fn event_location(&self, event: &Event) -> Result<Location> {
        self.db
            .locations
            .find_by_id(event.location_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Location"))
    }

    async fn registration(
        &self,
        conn: &mut PgConnection,
        event_id: Uuid,
        user_id: &str,
        kind: ParticipationType,
    ) -> Result<Participation> {
        match self.db.participations.lock(conn, event_id, user_id).await? {
            Some(participation) if participation.is_of(kind) => Ok(participation),
            _ => Err(CollectivError::invalid(format!("User is not registered as {} in the event", kind))),
        }
    }

    async fn open_attendance(
        &self,
        conn: &mut PgConnection,
        event: &Event,
        participation: &Participation,
    ) -> Result<CheckInData> {
        if !event.is_ongoing() {
            return Err(CollectivError::invalid("Event is not on going"));
        }

        let user = self.db.users.lock(&mut *conn, &participation.participant_id).await?;
        if user.is_currently_attending_event() {
            return Err(CollectivError::invalid("User is currently attending an event"));
        }

        let now = Utc::now();
        self.db
            .participations
            .record_attendance(&mut *conn, participation.id, AttendanceActivityType::CheckIn, now)
            .await?;
        self.db.participations.mark_checked_in(&mut *conn, participation.id).await?;
        self.db
            .users
            .set_current_event(conn, &user.user_id, Some(event.id), Some(&participation.participation_type))
            .await?;

        log_attendance(event.id, &user.user_id, "check_in", false, false);
        Ok(CheckInData { check_in_time: now })
    }

    async fn finish_attendance(
        &self,
        conn: &mut PgConnection,
        participation: &Participation,
        violated: bool,
    ) -> Result<CheckOutData> {
        if !participation.is_currently_attending {
            return Err(CollectivError::invalid("User is not currently attending the event"));
        }

        let closed = close_attendance(&self.db, &mut *conn, participation, violated).await?;
        let is_rewarded = self.rewards.grant_if_eligible(conn, &closed.participation).await?;

        log_attendance(
            participation.event_id,
            &participation.participant_id,
            "check_out",
            violated,
            is_rewarded,
        );

        Ok(CheckOutData {
            check_in_time: closed.check_in_time,
            check_out_time: closed.check_out_time,
            duration_in_seconds: closed.duration_in_seconds,
            total_duration_in_seconds: closed.participation.overall_duration_in_seconds,
            is_rewarded,
            violated_geofencing_rule: Some(violated),
        })
    }

    async fn find_target(&self, contact: &str) -> Result<String> {
        let contact = ContactIdentifier::parse(contact)?;
        self.identity.find_user_id(&contact).await
    }

    /// Participant checks in from inside the event area
    pub async fn participant_check_in(&self, user_id: &str, request: &GeofencedAttendanceRequest) -> Result<CheckInData> {
        let position = Coordinate::parse(request.latitude.as_ref(), request.longitude.as_ref())?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        let location = self.event_location(&event).await?;

        if !location.contains(&position, self.geofence.area_radius_km) {
            return Err(CollectivError::invalid("User is outside the event area"));
        }

        let participation = self
            .registration(&mut tx, event.id, user_id, ParticipationType::Participant)
            .await?;
        let data = self.open_attendance(&mut tx, &event, &participation).await?;
        tx.commit().await?;

        Ok(data)
    }

    /// Participant checks out. Leaving without a position, from outside the
    /// buffer area, or once the event stopped running flags a violation.
    pub async fn participant_check_out(&self, user_id: &str, request: &GeofencedAttendanceRequest) -> Result<CheckOutData> {
        let position = Coordinate::parse_optional(request.latitude.as_ref(), request.longitude.as_ref());

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        let location = self.event_location(&event).await?;
        let participation = self
            .registration(&mut tx, event.id, user_id, ParticipationType::Participant)
            .await?;

        let outside = position.map_or(true, |p| !location.contains(&p, self.geofence.area_buffer_radius_km));
        let violated = outside || !event.is_ongoing();

        let data = self.finish_attendance(&mut tx, &participation, violated).await?;
        tx.commit().await?;

        Ok(data)
    }

    /// Check the participant out when the reported position left the event area
    pub async fn automated_check_out(&self, user_id: &str, request: &GeofencedAttendanceRequest) -> Result<AutomatedCheckOut> {
        let position = Coordinate::parse(request.latitude.as_ref(), request.longitude.as_ref())?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        let location = self.event_location(&event).await?;
        let participation = self
            .registration(&mut tx, event.id, user_id, ParticipationType::Participant)
            .await?;

        if !participation.is_currently_attending || location.contains(&position, self.geofence.area_radius_km) {
            return Ok(AutomatedCheckOut {
                checked_out: false,
                data: None,
            });
        }

        let data = self.finish_attendance(&mut tx, &participation, false).await?;
        tx.commit().await?;

        Ok(AutomatedCheckOut {
            checked_out: true,
            data: Some(data),
        })
    }

    async fn assisted_check_in(
        &self,
        manager_id: &str,
        request: &AssistedAttendanceRequest,
        kind: ParticipationType,
    ) -> Result<CheckInData> {
        let target_id = self.find_target(&request.user_email_phone).await?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        ensure_manager(&self.db, &mut tx, &event, manager_id).await?;

        let participation = self.registration(&mut tx, event.id, &target_id, kind).await?;
        let data = self.open_attendance(&mut tx, &event, &participation).await?;
        tx.commit().await?;

        Ok(data)
    }

    /// A manager checks a participant in by email or phone number
    pub async fn assisted_participant_check_in(
        &self,
        manager_id: &str,
        request: &AssistedAttendanceRequest,
    ) -> Result<CheckInData> {
        self.assisted_check_in(manager_id, request, ParticipationType::Participant).await
    }

    /// A manager checks a volunteer in by email or phone number
    pub async fn assisted_volunteer_check_in(
        &self,
        manager_id: &str,
        request: &AssistedAttendanceRequest,
    ) -> Result<CheckInData> {
        self.assisted_check_in(manager_id, request, ParticipationType::Volunteer).await
    }

    pub async fn assisted_participant_check_out(
        &self,
        manager_id: &str,
        request: &AssistedAttendanceRequest,
    ) -> Result<CheckOutData> {
        let target_id = self.find_target(&request.user_email_phone).await?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        ensure_manager(&self.db, &mut tx, &event, manager_id).await?;

        let participation = self
            .registration(&mut tx, event.id, &target_id, ParticipationType::Participant)
            .await?;
        let data = self.finish_attendance(&mut tx, &participation, false).await?;
        tx.commit().await?;

        Ok(data)
    }

    pub async fn volunteer_check_out(&self, user_id: &str, event_id: Uuid) -> Result<CheckOutData> {
        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, event_id).await?;
        let participation = self
            .registration(&mut tx, event.id, user_id, ParticipationType::Volunteer)
            .await?;
        let data = self.finish_attendance(&mut tx, &participation, false).await?;
        tx.commit().await?;

        Ok(data)
    }

    /// Grant a registered volunteer manager access to the event
    pub async fn grant_manager_access(
        &self,
        manager_id: &str,
        request: &AssistedAttendanceRequest,
    ) -> Result<Participation> {
        let target_id = self.find_target(&request.user_email_phone).await?;

        let mut tx = self.db.begin().await?;
        let event = self.db.events.lock(&mut tx, request.event_id).await?;
        ensure_manager(&self.db, &mut tx, &event, manager_id).await?;

        let participation = self
            .registration(&mut tx, event.id, &target_id, ParticipationType::Volunteer)
            .await?;
        let updated = self.db.participations.grant_manager_access(&mut tx, participation.id).await?;
        tx.commit().await?;

        log_event_action(event.id, "grant_manager_access", manager_id, Some(&target_id));
        Ok(updated)
    }
}
