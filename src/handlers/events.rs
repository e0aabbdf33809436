//! `/api/event` handlers

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::AuthUser;
use crate::models::event::{
    CreateEventRequest, EventData, EventSearchQuery, UpdateProgressRequest, UpdateStatusRequest,
};
use crate::models::location::CoordinateQuery;
use crate::models::tag::{CreateCategoryRequest, EventCategory, Tag, TagNamesRequest};
use crate::services::ImageUpload;
use crate::state::AppState;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::pagination::Page;

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> Result<Json<EventCategory>> {
    Ok(Json(state.services.taxonomy_service.create_category(&request.name).await?))
}

pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<EventCategory>>> {
    Ok(Json(state.services.taxonomy_service.list_categories().await?))
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(state.services.taxonomy_service.list_tags().await?))
}

pub async fn get_or_create_tags(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TagNamesRequest>,
) -> Result<Json<Vec<Tag>>> {
    Ok(Json(state.services.taxonomy_service.get_or_create_tags(&request.tags).await?))
}

pub async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<Json<EventData>> {
    Ok(Json(state.services.event_service.create(auth.id(), request).await?))
}

/// Multipart form with `event_id` and `event_image` fields
pub async fn upload_image(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<EventData>> {
    let mut event_id: Option<Uuid> = None;
    let mut upload: Option<ImageUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CollectivError::invalid(e.body_text()))?
    {
        match field.name() {
            Some("event_id") => {
                let raw = field.text().await.map_err(|e| CollectivError::invalid(e.body_text()))?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| CollectivError::invalid("Event id must be a valid UUID"))?;
                event_id = Some(id);
            }
            Some("event_image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| CollectivError::invalid(e.body_text()))?;
                upload = Some(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let event_id = event_id.ok_or_else(|| CollectivError::invalid("Event id is required"))?;
    let upload = upload.ok_or_else(|| CollectivError::invalid("Event image is required"))?;

    let event = state
        .services
        .event_service
        .upload_image(auth.id(), event_id, upload)
        .await?;
    Ok(Json(event))
}

pub async fn get_image(State(state): State<AppState>, ApiPath(event_id): ApiPath<Uuid>) -> Result<Response> {
    match state.services.event_service.get_image(event_id).await? {
        Some(image) => {
            let content_type = image
                .content_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            Ok(([(header::CONTENT_TYPE, content_type)], image.bytes).into_response())
        }
        None => Ok(Json(json!({ "message": "No image has been uploaded for the event" })).into_response()),
    }
}

pub async fn get_event(State(state): State<AppState>, ApiPath(event_id): ApiPath<Uuid>) -> Result<Json<EventData>> {
    Ok(Json(state.services.event_service.detail(event_id).await?))
}

pub async fn discover_nearby(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<CoordinateQuery>,
) -> Result<Json<Vec<EventData>>> {
    let origin = query.coordinate()?;
    Ok(Json(state.services.event_service.discover_nearby(&auth.user, origin).await?))
}

pub async fn search_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventSearchQuery>,
) -> Result<Json<Page<EventData>>> {
    Ok(Json(state.services.event_service.search(&query).await?))
}

pub async fn events_by_location(
    State(state): State<AppState>,
    ApiPath(location_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<EventSearchQuery>,
) -> Result<Json<Vec<EventData>>> {
    Ok(Json(state.services.event_service.by_location(location_id, &query).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<EventData>> {
    Ok(Json(state.services.event_service.update_status(auth.id(), &request).await?))
}

pub async fn update_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<UpdateProgressRequest>,
) -> Result<Json<serde_json::Value>> {
    let progress = state
        .services
        .event_service
        .update_progress(auth.id(), &request)
        .await?;
    Ok(Json(json!({ "event_id": request.event_id, "progress": progress })))
}
