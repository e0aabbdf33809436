//! Identity provider account lookups
//!
//! Managers name other users by email or phone number; the provider maps
//! those to user ids. Results are cached in Redis. A cache outage only
//! costs a round trip to the provider.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::services::redis::RedisService;
use crate::utils::errors::{CollectivError, IdentityError, Result};
use crate::utils::helpers::ContactIdentifier;
use crate::utils::logging::log_api_error;

/// Account as returned by the provider's lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityAccount {
    #[serde(rename = "localId")]
    pub local_id: String,
    pub email: Option<String>,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

impl IdentityAccount {
    /// Email when known, phone number otherwise
    pub fn contact(&self) -> Option<&str> {
        self.email.as_deref().or(self.phone_number.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<IdentityAccount>,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct IdentityService {
    client: Client,
    config: AuthConfig,
    cache: RedisService,
}

impl IdentityService {
    pub fn new(config: AuthConfig, cache: RedisService) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Collectiv/1.0")
            .build()?;

        Ok(Self { client, config, cache })
    }

    /// User id of the account registered with `contact`
    pub async fn find_user_id(&self, contact: &ContactIdentifier) -> Result<String> {
        let cache_key = format!("identity:{}:{}", contact.kind().replace(' ', "_"), contact.as_str());

        match self.cache.get::<String>(&cache_key).await {
            Ok(Some(user_id)) => {
                debug!(contact = %contact.as_str(), "Identity lookup served from cache");
                return Ok(user_id);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Identity cache unavailable"),
        }

        let body = match contact {
            ContactIdentifier::Email(email) => json!({ "email": [email] }),
            ContactIdentifier::PhoneNumber(phone) => json!({ "phoneNumber": [phone] }),
        };

        let account = self.lookup(body).await?.ok_or_else(|| {
            CollectivError::invalid(format!("No user is registered with {} {}", contact.kind(), contact.as_str()))
        })?;

        if let Err(e) = self.cache.set(&cache_key, &account.local_id, None).await {
            warn!(error = %e, "Failed to cache identity lookup");
        }

        Ok(account.local_id)
    }

    /// Account details of a user id, if the provider knows it
    pub async fn find_account(&self, user_id: &str) -> Result<Option<IdentityAccount>> {
        let cache_key = format!("identity:account:{}", user_id);

        match self.cache.get::<IdentityAccount>(&cache_key).await {
            Ok(Some(account)) => return Ok(Some(account)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Identity cache unavailable"),
        }

        let account = self.lookup(json!({ "localId": [user_id] })).await?;

        if let Some(account) = &account {
            if let Err(e) = self.cache.set(&cache_key, account, None).await {
                warn!(error = %e, "Failed to cache identity account");
            }
        }

        Ok(account)
    }

    async fn lookup(&self, body: serde_json::Value) -> Result<Option<IdentityAccount>> {
        let response = self
            .client
            .post(&self.config.lookup_url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                log_api_error("identity", &e.to_string(), Some("accounts:lookup"));
                if e.is_timeout() {
                    IdentityError::Timeout
                } else if e.is_connect() {
                    IdentityError::ServiceUnavailable
                } else {
                    IdentityError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log_api_error("identity", &error_text, Some("accounts:lookup"));
            return Err(IdentityError::RequestFailed(format!("HTTP {}: {}", status, error_text)).into());
        }

        let parsed: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))?;

        Ok(parsed.users.into_iter().next())
    }
}
