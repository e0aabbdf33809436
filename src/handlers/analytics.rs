//! `/api/analytics` handlers and the health probe

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::handlers::extract::ApiPath;
use crate::models::event::{EventAnalytics, LocationAnalytics};
use crate::services::ServiceHealthStatus;
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn event_analytics(
    State(state): State<AppState>,
    ApiPath(event_id): ApiPath<Uuid>,
) -> Result<Json<EventAnalytics>> {
    Ok(Json(state.services.analytics_service.event(event_id).await?))
}

pub async fn location_analytics(
    State(state): State<AppState>,
    ApiPath(location_id): ApiPath<Uuid>,
) -> Result<Json<LocationAnalytics>> {
    Ok(Json(state.services.analytics_service.location(location_id).await?))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ServiceHealthStatus>) {
    let status = state.services.health_check().await;
    let code = if status.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}
