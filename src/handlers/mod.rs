//! HTTP handlers module
//!
//! Handlers are grouped by resource and mounted under `/api`:
//! - users, spaces and events
//! - participation and attendance
//! - reviews, reports, rewards and forums
//! - analytics

pub mod analytics;
pub mod events;
pub mod extract;
pub mod feedback;
pub mod forums;
pub mod participation;
pub mod spaces;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::middleware::{check_origin, limit_requests, log_requests, trace_layer};
use crate::state::AppState;

/// Build the application router with every route and middleware layer attached
pub fn router(state: AppState) -> Router {
    let body_limit = state.settings.storage.max_image_bytes + 64 * 1024;
    let cors = cors_layer(&state.settings.server.allowed_origins);

    Router::new()
        .route("/health", get(analytics::health))
        .nest("/api/users", user_routes())
        .nest("/api/space", space_routes())
        .nest("/api/event", event_routes())
        .nest("/api/participation", participation_routes())
        .route("/api/review/submit", post(feedback::submit_review))
        .route("/api/report/submit", post(feedback::submit_report))
        .route("/api/reward/redeem", post(feedback::redeem_reward))
        .nest("/api/forums", forum_routes())
        .route("/api/analytics/event/:event_id", get(analytics::event_analytics))
        .route("/api/analytics/space/:location_id", get(analytics::location_analytics))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(from_fn_with_state(state.clone(), limit_requests))
        .layer(from_fn_with_state(state.clone(), check_origin))
        .layer(from_fn(log_requests))
        .layer(trace_layer())
        .layer(cors)
        .with_state(state)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/data", get(users::get_user_data))
        .route("/update", post(users::update_user_data))
        .route(
            "/update/location-tracking-preference",
            post(users::update_location_tracking),
        )
        .route("/interests", get(users::get_interests))
        .route("/interests/update", post(users::update_interests))
        .route("/current-event", get(users::get_current_event))
        .route("/location-prompt-status/update", post(users::update_location_prompt))
        .route("/monthly-wrap", get(users::get_monthly_wrap))
}

fn space_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(spaces::list_locations))
        .route("/detail/:location_id", get(spaces::get_location))
        .route("/get-or-create", post(spaces::get_or_create_location))
        .route("/get-by-coordinate", get(spaces::get_location_by_coordinate))
        .route("/nearby/nonsubscribed", get(spaces::nearby_non_subscribed))
        .route("/preference/update", post(spaces::update_preference))
        .route("/subscribed", get(spaces::list_subscribed))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/category/create", post(events::create_category))
        .route("/category", get(events::list_categories))
        .route("/create", post(events::create_event))
        .route("/image/upload", post(events::upload_image))
        .route("/image/:event_id", get(events::get_image))
        .route("/detail/:event_id", get(events::get_event))
        .route("/discover/nearby", get(events::discover_nearby))
        .route("/search", get(events::search_events))
        .route("/location/:location_id", get(events::events_by_location))
        .route("/tags", get(events::list_tags))
        .route("/tags/get-or-create/multiple", post(events::get_or_create_tags))
        .route("/status/update", post(events::update_status))
        .route("/progress/update", post(events::update_progress))
}

fn participation_routes() -> Router<AppState> {
    Router::new()
        .route("/check-participation", get(participation::check_participation))
        .route("/participant/register", post(participation::register_participant))
        .route("/participant/check-in/self", post(participation::participant_self_check_in))
        .route("/participant/check-out/self", post(participation::participant_self_check_out))
        .route(
            "/participant/check-out/automated",
            post(participation::participant_automated_check_out),
        )
        .route(
            "/participant/check-in/assisted",
            post(participation::participant_assisted_check_in),
        )
        .route(
            "/participant/check-out/assisted",
            post(participation::participant_assisted_check_out),
        )
        .route("/participant/delete", post(participation::leave_event))
        .route(
            "/project/contribution/register",
            post(participation::register_contribution),
        )
        .route("/volunteer/register", post(participation::register_volunteer))
        .route("/volunteer/check-in/assisted", post(participation::volunteer_assisted_check_in))
        .route("/volunteer/check-out/self", post(participation::volunteer_self_check_out))
        .route(
            "/volunteer/grant-managerial-role",
            post(participation::grant_managerial_role),
        )
        .route("/participant/view", get(participation::view_participations))
        .route("/contribution/view", get(participation::view_contributions))
        .route("/creator/view", get(participation::view_created_events))
}

fn forum_routes() -> Router<AppState> {
    Router::new()
        .route("/trending", get(forums::trending_forums))
        .route("/:event_id/posts", get(forums::list_posts).post(forums::create_post))
        .route("/:event_id/leave", post(forums::leave_forum))
        .route("/:event_id/analytics", get(forums::forum_analytics))
        .route("/posts/:post_id/upvote", post(forums::upvote_post))
        .route("/posts/:post_id/downvote", post(forums::downvote_post))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if allowed_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable allowed origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_accepts_wildcard_and_lists() {
        let _ = cors_layer(&["*".to_string()]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "not a header\n".to_string()]);
    }
}
