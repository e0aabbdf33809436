//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub inference: InferenceConfig,
    pub storage: StorageConfig,
    pub mail: MailConfig,
    pub geofence: GeofenceConfig,
    pub reward: RewardConfig,
    pub forum: ForumConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// Reject requests whose `Origin` header is not in `allowed_origins`
    pub enforce_origin: bool,
    pub requests_per_minute: u32,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Identity provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Shared HS256 secret. Used when no public keys are configured.
    pub jwt_secret: Option<String>,
    /// RS256 public keys in PEM format, keyed by `kid`
    #[serde(default)]
    pub public_keys: std::collections::HashMap<String, String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub lookup_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Inference API configuration (sentiment and named entity recognition)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    pub sentiment_url: String,
    pub token_classification_url: String,
    pub access_token: String,
    pub timeout_seconds: u64,
}

/// Object store configuration for event images
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub base_directory: String,
    pub access_token: String,
    pub max_image_bytes: usize,
}

/// Mail relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    pub enabled: bool,
    pub relay_url: String,
    pub api_key: String,
    pub sender: String,
}

/// Geofence radii in kilometers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeofenceConfig {
    pub area_radius_km: f64,
    pub area_buffer_radius_km: f64,
}

/// Reward configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RewardConfig {
    pub points_per_attendance: i64,
    pub minimum_seconds: f64,
    pub monthly_reset_enabled: bool,
}

/// Forum configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ForumConfig {
    pub trending_vote_threshold: i32,
    pub top_words_limit: usize,
}

/// Pagination configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaginationConfig {
    pub default_limit: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("COLLECTIV")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CollectivError> {
        super::validation::validate_settings(self)
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                allowed_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://127.0.0.1:3000".to_string(),
                ],
                enforce_origin: false,
                requests_per_minute: 120,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/collectiv".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "collectiv:".to_string(),
                ttl_seconds: 3600,
            },
            auth: AuthConfig {
                jwt_secret: None,
                public_keys: std::collections::HashMap::new(),
                issuer: None,
                audience: None,
                lookup_url: "https://identitytoolkit.googleapis.com/v1/accounts:lookup".to_string(),
                api_key: String::new(),
                timeout_seconds: 5,
            },
            inference: InferenceConfig {
                sentiment_url: "https://api-inference.huggingface.co/models/cardiffnlp/twitter-roberta-base-sentiment-latest".to_string(),
                token_classification_url: "https://api-inference.huggingface.co/models/xlm-roberta-large-finetuned-conll03-english".to_string(),
                access_token: String::new(),
                timeout_seconds: 30,
            },
            storage: StorageConfig {
                base_url: "https://storage.googleapis.com".to_string(),
                bucket: "collectiv".to_string(),
                base_directory: "event_images".to_string(),
                access_token: String::new(),
                max_image_bytes: 5 * 1024 * 1024,
            },
            mail: MailConfig {
                enabled: false,
                relay_url: String::new(),
                api_key: String::new(),
                sender: "no-reply@collectiv.app".to_string(),
            },
            geofence: GeofenceConfig {
                area_radius_km: 0.1,
                area_buffer_radius_km: 0.3,
            },
            reward: RewardConfig {
                points_per_attendance: 1,
                minimum_seconds: 0.0,
                monthly_reset_enabled: true,
            },
            forum: ForumConfig {
                trending_vote_threshold: 20,
                top_words_limit: 10,
            },
            pagination: PaginationConfig {
                default_limit: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                json: false,
            },
        }
    }
}
