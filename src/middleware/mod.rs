//! Middleware module
//!
//! Authentication, origin checks, rate limiting and request logging

pub mod auth;
pub mod logging;
pub mod origin;
pub mod rate_limit;

// Re-export commonly used middleware
pub use auth::AuthUser;
pub use logging::{log_requests, trace_layer};
pub use origin::check_origin;
pub use rate_limit::{limit_requests, RequestLimiter};
