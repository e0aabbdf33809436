//! Rate limiting middleware
//!
//! A keyed `governor` limiter applied to every route. Requests with a
//! verified bearer token are counted per user id, all others per client
//! address. An unverified `Authorization` header counts as anonymous.

use std::num::NonZeroU32;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::warn;

use crate::middleware::auth::bearer_token;
use crate::state::AppState;
use crate::utils::errors::{CollectivError, Result};

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub struct RequestLimiter {
    limiter: KeyedLimiter,
}

impl RequestLimiter {
    /// Allow `requests` per minute and key. Zero is treated as one.
    pub fn per_minute(requests: u32) -> Self {
        let quota = Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN));
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    pub fn check(&self, key: &str) -> Result<()> {
        self.limiter.check_key(&key.to_string()).map_err(|_| {
            warn!(key = %key, "Rate limit exceeded");
            CollectivError::RateLimitExceeded
        })
    }

    /// Drop the state of keys whose quota has fully replenished
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

/// Client address as reported by the reverse proxy
pub fn client_address(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|value| value.to_str().ok()))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Limiter key: the user id of a verified bearer token, else the client address
pub fn rate_limit_key(state: &AppState, headers: &HeaderMap) -> String {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .and_then(|token| state.services.auth_service.verify_user_id(token).ok())
        .map(|user_id| format!("user:{}", user_id))
        .unwrap_or_else(|| format!("ip:{}", client_address(headers)))
}

pub async fn limit_requests(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> std::result::Result<Response, CollectivError> {
    state.limiter.check(&rate_limit_key(&state, request.headers()))?;
    Ok(next.run(request).await)
}
