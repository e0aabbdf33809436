//! `/api/space` handlers

use axum::extract::State;
use axum::Json;
use uuid::Uuid;

use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::location::{CoordinateQuery, CreateLocationRequest, Location, LocationPreferenceRequest};
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn list_locations(State(state): State<AppState>) -> Result<Json<Vec<Location>>> {
    Ok(Json(state.services.location_service.list_all().await?))
}

pub async fn get_location(
    State(state): State<AppState>,
    ApiPath(location_id): ApiPath<Uuid>,
) -> Result<Json<Location>> {
    Ok(Json(state.services.location_service.get(location_id).await?))
}

pub async fn get_or_create_location(
    State(state): State<AppState>,
    _auth: AuthUser,
    ApiJson(request): ApiJson<CreateLocationRequest>,
) -> Result<Json<Location>> {
    Ok(Json(state.services.location_service.get_or_create(&request).await?))
}

pub async fn get_location_by_coordinate(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CoordinateQuery>,
) -> Result<Json<Location>> {
    let coordinate = query.coordinate()?;
    Ok(Json(state.services.location_service.get_by_coordinate(coordinate).await?))
}

pub async fn nearby_non_subscribed(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<CoordinateQuery>,
) -> Result<Json<Vec<Location>>> {
    let origin = query.coordinate()?;
    let locations = state
        .services
        .location_service
        .nearby_not_notified(&auth.user, origin)
        .await?;
    Ok(Json(locations))
}

pub async fn update_preference(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<LocationPreferenceRequest>,
) -> Result<Json<Location>> {
    let location = state
        .services
        .location_service
        .update_preference(auth.id(), &request)
        .await?;
    Ok(Json(location))
}

pub async fn list_subscribed(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<Location>>> {
    Ok(Json(state.services.location_service.list_subscribed(auth.id()).await?))
}
