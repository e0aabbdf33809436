//! `/api/participation` handlers

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::handlers::extract::{ApiJson, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::event::EventData;
use crate::models::participation::{
    AssistedAttendanceRequest, AutomatedCheckOut, CheckInData, CheckOutData, ContributionRequest, ContributionResult,
    ContributionWithEvent, EventIdQuery, EventIdRequest, GeofencedAttendanceRequest, Participation,
    ParticipationViewQuery, ParticipationWithEvent, RegistrationCheck,
};
use crate::state::AppState;
use crate::utils::errors::Result;

#[derive(Debug, Deserialize)]
pub struct CreatedEventsQuery {
    pub status: Option<String>,
}

pub async fn check_participation(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<EventIdQuery>,
) -> Result<Json<RegistrationCheck>> {
    let check = state
        .services
        .participation_service
        .check_registration(auth.id(), query.event_id)
        .await?;
    Ok(Json(check))
}

pub async fn register_participant(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<EventIdRequest>,
) -> Result<Json<Participation>> {
    let participation = state
        .services
        .participation_service
        .register_participant(auth.id(), request.event_id)
        .await?;
    Ok(Json(participation))
}

pub async fn register_volunteer(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<EventIdRequest>,
) -> Result<Json<Participation>> {
    let participation = state
        .services
        .participation_service
        .register_volunteer(auth.id(), request.event_id)
        .await?;
    Ok(Json(participation))
}

pub async fn leave_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<EventIdRequest>,
) -> Result<Json<Participation>> {
    let participation = state
        .services
        .participation_service
        .leave(auth.id(), request.event_id)
        .await?;
    Ok(Json(participation))
}

pub async fn participant_self_check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<GeofencedAttendanceRequest>,
) -> Result<Json<CheckInData>> {
    let data = state
        .services
        .attendance_service
        .participant_check_in(auth.id(), &request)
        .await?;
    Ok(Json(data))
}

pub async fn participant_self_check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<GeofencedAttendanceRequest>,
) -> Result<Json<CheckOutData>> {
    let data = state
        .services
        .attendance_service
        .participant_check_out(auth.id(), &request)
        .await?;
    Ok(Json(data))
}

pub async fn participant_automated_check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<GeofencedAttendanceRequest>,
) -> Result<Json<AutomatedCheckOut>> {
    let result = state
        .services
        .attendance_service
        .automated_check_out(auth.id(), &request)
        .await?;
    Ok(Json(result))
}

pub async fn participant_assisted_check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<AssistedAttendanceRequest>,
) -> Result<Json<CheckInData>> {
    let data = state
        .services
        .attendance_service
        .assisted_participant_check_in(auth.id(), &request)
        .await?;
    Ok(Json(data))
}

pub async fn participant_assisted_check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<AssistedAttendanceRequest>,
) -> Result<Json<CheckOutData>> {
    let data = state
        .services
        .attendance_service
        .assisted_participant_check_out(auth.id(), &request)
        .await?;
    Ok(Json(data))
}

pub async fn volunteer_assisted_check_in(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<AssistedAttendanceRequest>,
) -> Result<Json<CheckInData>> {
    let data = state
        .services
        .attendance_service
        .assisted_volunteer_check_in(auth.id(), &request)
        .await?;
    Ok(Json(data))
}

pub async fn volunteer_self_check_out(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<EventIdRequest>,
) -> Result<Json<CheckOutData>> {
    let data = state
        .services
        .attendance_service
        .volunteer_check_out(auth.id(), request.event_id)
        .await?;
    Ok(Json(data))
}

pub async fn grant_managerial_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<AssistedAttendanceRequest>,
) -> Result<Json<Participation>> {
    let participation = state
        .services
        .attendance_service
        .grant_manager_access(auth.id(), &request)
        .await?;
    Ok(Json(participation))
}

pub async fn register_contribution(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<ContributionRequest>,
) -> Result<Json<ContributionResult>> {
    let result = state
        .services
        .participation_service
        .register_contribution(auth.id(), &request)
        .await?;
    Ok(Json(result))
}

pub async fn view_participations(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ParticipationViewQuery>,
) -> Result<Json<Vec<ParticipationWithEvent>>> {
    let participations = state
        .services
        .participation_service
        .list_participations(auth.id(), &query)
        .await?;
    Ok(Json(participations))
}

pub async fn view_contributions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ContributionWithEvent>>> {
    Ok(Json(state.services.participation_service.list_contributions(auth.id()).await?))
}

pub async fn view_created_events(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<CreatedEventsQuery>,
) -> Result<Json<Vec<EventData>>> {
    let events = state
        .services
        .participation_service
        .list_created_events(auth.id(), query.status.as_deref())
        .await?;
    Ok(Json(events))
}
