//! Services module
//!
//! Business rules and the clients of external services

pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod event;
pub mod feedback;
pub mod forum;
pub mod identity;
pub mod inference;
pub mod location;
pub mod notification;
pub mod participation;
pub mod redis;
pub mod reward;
pub mod storage;
pub mod taxonomy;
pub mod user;

// Re-export commonly used services
pub use analytics::AnalyticsService;
pub use attendance::AttendanceService;
pub use auth::{AuthService, IdTokenClaims};
pub use event::{EventService, ImageUpload};
pub use feedback::FeedbackService;
pub use forum::ForumService;
pub use identity::{IdentityAccount, IdentityService};
pub use inference::InferenceService;
pub use location::LocationService;
pub use notification::{MailMessage, MessageTemplate, NotificationService, NotificationStats};
pub use participation::ParticipationService;
pub use redis::RedisService;
pub use reward::RewardService;
pub use storage::{StorageService, StoredObject};
pub use taxonomy::TaxonomyService;
pub use user::UserService;

use serde::Serialize;

use crate::config::Settings;
use crate::database::{self, DatabaseService};
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
#[derive(Debug)]
pub struct ServiceFactory {
    pub database: DatabaseService,
    pub auth_service: AuthService,
    pub redis_service: RedisService,
    pub user_service: UserService,
    pub location_service: LocationService,
    pub taxonomy_service: TaxonomyService,
    pub event_service: EventService,
    pub participation_service: ParticipationService,
    pub attendance_service: AttendanceService,
    pub reward_service: RewardService,
    pub forum_service: ForumService,
    pub feedback_service: FeedbackService,
    pub analytics_service: AnalyticsService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, database: DatabaseService) -> Result<Self> {
        let redis_service = RedisService::new(settings.redis.clone())?;
        let auth_service = AuthService::new(&settings.auth)?;
        let identity = IdentityService::new(settings.auth.clone(), redis_service.clone())?;
        let inference = InferenceService::new(settings.inference.clone())?;
        let storage = StorageService::new(settings.storage.clone())?;
        let notifications = NotificationService::new(settings.mail.clone())?;

        let reward_service = RewardService::new(database.clone(), settings.reward.clone());

        Ok(Self {
            user_service: UserService::new(database.clone()),
            location_service: LocationService::new(database.clone()),
            taxonomy_service: TaxonomyService::new(database.clone()),
            event_service: EventService::new(
                database.clone(),
                storage,
                identity.clone(),
                notifications,
                settings.pagination.clone(),
            ),
            participation_service: ParticipationService::new(
                database.clone(),
                reward_service.clone(),
                identity.clone(),
            ),
            attendance_service: AttendanceService::new(
                database.clone(),
                reward_service.clone(),
                identity,
                settings.geofence.clone(),
            ),
            forum_service: ForumService::new(database.clone(), inference.clone(), settings.forum.clone()),
            feedback_service: FeedbackService::new(database.clone(), inference),
            analytics_service: AnalyticsService::new(database.clone()),
            reward_service,
            auth_service,
            redis_service,
            database,
        })
    }

    /// Health check for the backing stores
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let database_healthy = database::health_check(self.database.pool()).await.is_ok();
        let redis_healthy = self.redis_service.health_check().await.unwrap_or(false);

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
        }
    }
}

/// Health status of the backing stores
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub redis_healthy: bool,
}

impl ServiceHealthStatus {
    /// Redis only caches lookups, so the database alone decides health
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
