//! Shared application state
//!
//! Handed to every axum handler and middleware through `State`.

use std::sync::Arc;

use crate::config::Settings;
use crate::middleware::rate_limit::RequestLimiter;
use crate::services::ServiceFactory;

#[derive(Clone)]
pub struct AppState {
    pub services: ServiceFactory,
    pub settings: Arc<Settings>,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(settings: Settings, services: ServiceFactory) -> Self {
        let limiter = RequestLimiter::per_minute(settings.server.requests_per_minute);

        Self {
            services,
            settings: Arc::new(settings),
            limiter: Arc::new(limiter),
        }
    }
}
