//! Test context for unified test setup
//!
//! Owns the test database, the external mock server and a fully wired
//! `ServiceFactory`, and mints bearer tokens for API tests.

use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tempfile::TempDir;

use Collectiv::config::Settings;
use Collectiv::database::DatabaseService;
use Collectiv::services::ServiceFactory;
use Collectiv::state::AppState;

use super::database_helper::TestDatabase;
use super::external_mock::{ExternalMockServer, ENTITIES_PATH, LOOKUP_PATH, SENTIMENT_PATH, STORAGE_BUCKET};

pub const TEST_JWT_SECRET: &str = "collectiv-test-secret";

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Unified test context that manages all test components
pub struct TestContext {
    pub database: TestDatabase,
    pub external: ExternalMockServer,
    pub settings: Settings,
    pub services: ServiceFactory,
    pub temp_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> TestResult<Self> {
        Self::with_settings(|_| {}).await
    }

    /// Create a context after applying `customize` to the test settings
    pub async fn with_settings<F>(customize: F) -> TestResult<Self>
    where
        F: FnOnce(&mut Settings),
    {
        let temp_dir = tempfile::tempdir()?;
        let database = TestDatabase::new().await?;
        let external = ExternalMockServer::new().await;

        let mut settings = Self::create_test_settings(&database, &external, &temp_dir);
        customize(&mut settings);
        settings.validate()?;

        let services = ServiceFactory::new(&settings, DatabaseService::new(database.pool.clone()))?;

        Ok(Self {
            database,
            external,
            settings,
            services,
            temp_dir,
        })
    }

    /// Create test-specific settings
    fn create_test_settings(database: &TestDatabase, external: &ExternalMockServer, temp_dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        let mock_uri = external.uri();

        settings.database.url = database.database_url.clone();
        settings.database.max_connections = 5;

        // Nothing listens here; the identity cache degrades to direct lookups
        settings.redis.url = "redis://127.0.0.1:1".to_string();
        settings.redis.prefix = "test_collectiv:".to_string();

        settings.auth.jwt_secret = Some(TEST_JWT_SECRET.to_string());
        settings.auth.lookup_url = format!("{}{}", mock_uri, LOOKUP_PATH);
        settings.auth.timeout_seconds = 2;

        settings.inference.sentiment_url = format!("{}{}", mock_uri, SENTIMENT_PATH);
        settings.inference.token_classification_url = format!("{}{}", mock_uri, ENTITIES_PATH);
        settings.inference.timeout_seconds = 2;

        settings.storage.base_url = mock_uri;
        settings.storage.bucket = STORAGE_BUCKET.to_string();
        settings.storage.max_image_bytes = 1024;

        settings.reward.monthly_reset_enabled = false;
        settings.server.requests_per_minute = 10_000;

        settings.logging.level = "debug".to_string();
        settings.logging.file_path = temp_dir.path().to_string_lossy().to_string();

        settings
    }

    pub fn db_pool(&self) -> &sqlx::PgPool {
        &self.database.pool
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.settings.clone(), self.services.clone())
    }

    /// The full HTTP application
    pub fn app(&self) -> Router {
        Collectiv::router(self.app_state())
    }

    /// HS256 id token for `user_id`, valid for an hour
    pub fn token_for(&self, user_id: &str) -> String {
        let claims = json!({
            "user_id": user_id,
            "sub": user_id,
            "exp": chrono::Utc::now().timestamp() + 3600,
        });

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .expect("Failed to encode test token")
    }
}
