//! Allowed-origin check
//!
//! When `server.enforce_origin` is set, browser requests from an origin not
//! listed in `server.allowed_origins` are refused. Requests without an
//! `Origin` header (server to server, curl) pass.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::state::AppState;
use crate::utils::errors::CollectivError;

pub fn is_allowed_origin(origin: &str, allowed: &[String]) -> bool {
    let origin = origin.trim_end_matches('/');
    allowed
        .iter()
        .any(|candidate| candidate == "*" || candidate.trim_end_matches('/').eq_ignore_ascii_case(origin))
}

pub async fn check_origin(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, CollectivError> {
    if state.settings.server.enforce_origin {
        if let Some(origin) = request.headers().get(header::ORIGIN) {
            let origin = origin.to_str().unwrap_or_default();
            if !is_allowed_origin(origin, &state.settings.server.allowed_origins) {
                warn!(origin = %origin, path = %request.uri().path(), "Request from disallowed origin");
                return Err(CollectivError::ImproperNetworkAccess(
                    "Request origin is not allowed".to_string(),
                ));
            }
        }
    }

    Ok(next.run(request).await)
}
