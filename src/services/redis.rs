//! Redis cache service
//!
//! Thin JSON cache with key prefixing and TTLs. Used for identity provider
//! lookups, which are stable and comparatively slow.

use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::RedisConfig;
use crate::utils::errors::{CollectivError, Result};

#[derive(Clone)]
#[derive(Debug)]
pub struct RedisService {
    client: Client,
    config: RedisConfig,
}

impl RedisService {
    /// Create a new RedisService instance. No connection is made until first use.
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(CollectivError::Redis)?;
        Ok(Self { client, config })
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection> {
        self.client.get_async_connection().await.map_err(CollectivError::Redis)
    }

    /// Full key under the configured prefix
    pub fn key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }

    /// Set a value with the given TTL, or the configured default
    pub async fn set<T>(&self, key: &str, value: &T, ttl_seconds: Option<u64>) -> Result<()>
    where
        T: Serialize,
    {
        let mut conn = self.get_connection().await?;
        let serialized = serde_json::to_string(value)?;
        let full_key = self.key(key);
        let ttl = ttl_seconds.unwrap_or(self.config.ttl_seconds);

        let _: () = conn.set_ex(&full_key, serialized, ttl).await?;

        debug!(key = %full_key, ttl = ttl, "Value set in Redis");
        Ok(())
    }

    pub async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut conn = self.get_connection().await?;
        let full_key = self.key(key);

        let cached: Option<String> = conn.get(&full_key).await?;
        match cached {
            Some(data) => Ok(Some(serde_json::from_str::<T>(&data)?)),
            None => {
                debug!(key = %full_key, "Key not found in Redis");
                Ok(None)
            }
        }
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let deleted: i32 = conn.del(self.key(key)).await?;
        Ok(deleted > 0)
    }

    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
