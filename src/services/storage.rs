//! Object store client for event images

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::info;

use crate::config::StorageConfig;
use crate::utils::errors::{CollectivError, Result};
use crate::utils::logging::log_api_error;

/// A downloaded object
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct StorageService {
    client: Client,
    config: StorageConfig,
}

impl StorageService {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("Collectiv/1.0")
            .build()?;

        Ok(Self { client, config })
    }

    pub fn max_image_bytes(&self) -> usize {
        self.config.max_image_bytes
    }

    /// Object path of an event image: `<base_directory>/<event_id>.<extension>`
    pub fn event_image_path(&self, event_id: uuid::Uuid, extension: &str) -> String {
        let directory = self.config.base_directory.trim_matches('/');
        if directory.is_empty() {
            format!("{}.{}", event_id, extension)
        } else {
            format!("{}/{}.{}", directory, event_id, extension)
        }
    }

    fn object_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.bucket,
            encoded.join("/")
        )
    }

    pub async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let size = bytes.len();
        let response = self
            .client
            .put(self.object_url(path))
            .bearer_auth(&self.config.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log_api_error("storage", &error_text, Some(path));
            return Err(CollectivError::Storage(format!("Upload failed with HTTP {}", status)));
        }

        info!(path = %path, size = size, "Object uploaded");
        Ok(())
    }

    /// Download an object, `None` when it does not exist
    pub async fn download(&self, path: &str) -> Result<Option<StoredObject>> {
        let response = self
            .client
            .get(self.object_url(path))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log_api_error("storage", &error_text, Some(path));
            return Err(CollectivError::Storage(format!("Download failed with HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();

        Ok(Some(StoredObject { bytes, content_type }))
    }
}
