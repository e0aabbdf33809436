//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{CollectivError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_inference_config(&settings.inference)?;
    validate_storage_config(&settings.storage)?;
    validate_mail_config(&settings.mail)?;
    validate_geofence_config(&settings.geofence)?;
    validate_reward_config(&settings.reward)?;
    validate_logging_config(&settings.logging)?;

    if settings.pagination.default_limit == 0 {
        return Err(CollectivError::Config(
            "Default page limit must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CollectivError::Config(format!("{} is required", name)));
    }

    url::Url::parse(value)
        .map_err(|e| CollectivError::Config(format!("{} is not a valid URL: {}", name, e)))?;

    Ok(())
}

/// Validate server configuration
fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(CollectivError::Config(
            "Server port must be greater than 0".to_string()
        ));
    }

    if config.enforce_origin && config.allowed_origins.is_empty() {
        return Err(CollectivError::Config(
            "At least one allowed origin must be configured when origin enforcement is on".to_string()
        ));
    }

    if config.requests_per_minute == 0 {
        return Err(CollectivError::Config(
            "Requests per minute must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CollectivError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(CollectivError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(CollectivError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(CollectivError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate identity provider configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    let has_secret = config.jwt_secret.as_deref().map_or(false, |s| !s.is_empty());
    if !has_secret && config.public_keys.is_empty() {
        return Err(CollectivError::Config(
            "Either a JWT secret or at least one public key is required".to_string()
        ));
    }

    validate_url("Identity lookup URL", &config.lookup_url)?;

    if config.timeout_seconds == 0 {
        return Err(CollectivError::Config(
            "Identity provider timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate inference configuration
fn validate_inference_config(config: &super::InferenceConfig) -> Result<()> {
    validate_url("Sentiment endpoint", &config.sentiment_url)?;
    validate_url("Token classification endpoint", &config.token_classification_url)?;

    if config.timeout_seconds == 0 {
        return Err(CollectivError::Config(
            "Inference timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate object store configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    validate_url("Storage base URL", &config.base_url)?;

    if config.bucket.is_empty() {
        return Err(CollectivError::Config(
            "Storage bucket is required".to_string()
        ));
    }

    if config.max_image_bytes == 0 {
        return Err(CollectivError::Config(
            "Maximum image size must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_mail_config(config: &super::MailConfig) -> Result<()> {
    if config.enabled {
        validate_url("Mail relay URL", &config.relay_url)?;

        if !config.sender.contains('@') {
            return Err(CollectivError::Config(
                "Mail sender must be an email address".to_string()
            ));
        }
    }

    Ok(())
}

/// Validate geofence radii
fn validate_geofence_config(config: &super::GeofenceConfig) -> Result<()> {
    if config.area_radius_km <= 0.0 || config.area_buffer_radius_km <= 0.0 {
        return Err(CollectivError::Config(
            "Geofence radii must be positive".to_string()
        ));
    }

    if config.area_buffer_radius_km < config.area_radius_km {
        return Err(CollectivError::Config(
            "Geofence buffer radius cannot be smaller than the area radius".to_string()
        ));
    }

    Ok(())
}

fn validate_reward_config(config: &super::RewardConfig) -> Result<()> {
    if config.points_per_attendance < 0 || config.minimum_seconds < 0.0 {
        return Err(CollectivError::Config(
            "Reward settings cannot be negative".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CollectivError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CollectivError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
