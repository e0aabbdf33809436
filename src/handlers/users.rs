//! `/api/users` handlers

use axum::extract::State;
use axum::Json;

use crate::handlers::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::tag::Tag;
use crate::models::user::{
    CurrentEvent, LocationPromptRequest, LocationTrackingRequest, MonthlyWrap, UpdateInterestsRequest,
    UpdateUserRequest, User,
};
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn get_user_data(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

pub async fn update_user_data(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    let user = state.services.user_service.update(auth.id(), request).await?;
    Ok(Json(user))
}

pub async fn update_location_tracking(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<LocationTrackingRequest>,
) -> Result<Json<User>> {
    let user = state
        .services
        .user_service
        .set_location_tracking(auth.id(), request.location_track)
        .await?;
    Ok(Json(user))
}

pub async fn get_interests(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<Tag>>> {
    Ok(Json(state.services.user_service.interests(auth.id()).await?))
}

pub async fn update_interests(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<UpdateInterestsRequest>,
) -> Result<Json<Vec<Tag>>> {
    let tags = state
        .services
        .user_service
        .replace_interests(auth.id(), &request.interests)
        .await?;
    Ok(Json(tags))
}

pub async fn get_current_event(State(state): State<AppState>, auth: AuthUser) -> Result<Json<CurrentEvent>> {
    Ok(Json(state.services.user_service.current_event(auth.id()).await?))
}

pub async fn update_location_prompt(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<LocationPromptRequest>,
) -> Result<Json<User>> {
    let user = state
        .services
        .user_service
        .set_location_prompted(auth.id(), request.has_been_prompted)
        .await?;
    Ok(Json(user))
}

pub async fn get_monthly_wrap(State(state): State<AppState>, auth: AuthUser) -> Result<Json<MonthlyWrap>> {
    Ok(Json(state.services.user_service.monthly_wrap(auth.id()).await?))
}
