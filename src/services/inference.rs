//! Inference API client: sentiment analysis and named entity recognition

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::utils::errors::{CollectivError, InferenceError, InferenceResult, Result};
use crate::utils::logging::log_api_error;

/// One label of a sentiment classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentLabel {
    pub label: String,
    pub score: f64,
}

/// One recognised entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedEntity {
    #[serde(alias = "entity")]
    pub entity_group: String,
    pub word: String,
    pub score: f64,
}

fn label_weight(label: &str) -> f64 {
    match label.to_lowercase().as_str() {
        "positive" => 1.0,
        "negative" => -1.0,
        "neutral" => 0.25,
        _ => 0.0,
    }
}

/// Weighted label scores, mapped from `[-1, 1]` to `[0, 1]`
pub fn weighted_sentiment(labels: &[SentimentLabel]) -> f64 {
    let raw: f64 = labels.iter().map(|l| label_weight(&l.label) * l.score).sum();
    (raw.clamp(-1.0, 1.0) + 1.0) / 2.0
}

/// Add the lower-cased words of `entities` to `counts`
pub fn count_entity_words(counts: &mut HashMap<String, i64>, entities: &[NamedEntity]) {
    for entity in entities {
        let word = entity.word.trim().to_lowercase();
        if word.is_empty() {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }
}

#[derive(Clone)]
#[derive(Debug)]
pub struct InferenceService {
    client: Client,
    config: InferenceConfig,
}

impl InferenceService {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("Collectiv/1.0")
            .build()
            .map_err(CollectivError::Http)?;

        Ok(Self { client, config })
    }

    /// Sentiment of `text` in `[0, 1]`, 1 being most positive
    pub async fn sentiment_score(&self, text: &str) -> InferenceResult<f64> {
        let body = json!({ "inputs": [text], "options": { "wait_for_model": true } });
        let response: Vec<Vec<SentimentLabel>> = self.post(&self.config.sentiment_url, &body).await?;

        let labels = response
            .into_iter()
            .next()
            .ok_or_else(|| InferenceError::InvalidResponse("empty sentiment response".to_string()))?;

        let score = weighted_sentiment(&labels);
        debug!(score = score, "Sentiment computed");
        Ok(score)
    }

    pub async fn named_entities(&self, text: &str) -> InferenceResult<Vec<NamedEntity>> {
        let body = json!({ "inputs": text, "options": { "wait_for_model": true } });
        self.post(&self.config.token_classification_url, &body).await
    }

    /// Like [`InferenceService::sentiment_score`], logging failures instead of returning them
    pub async fn try_sentiment_score(&self, text: &str) -> Option<f64> {
        match self.sentiment_score(text).await {
            Ok(score) => Some(score),
            Err(e) => {
                warn!(error = %e, "Sentiment analysis unavailable, storing without score");
                None
            }
        }
    }

    async fn post<T>(&self, url: &str, body: &serde_json::Value) -> InferenceResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                log_api_error("inference", &e.to_string(), Some(url));
                if e.is_timeout() {
                    InferenceError::Timeout
                } else if e.is_connect() {
                    InferenceError::ServiceUnavailable
                } else {
                    InferenceError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(InferenceError::ServiceUnavailable);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log_api_error("inference", &error_text, Some(url));
            return Err(InferenceError::RequestFailed(format!("HTTP {}: {}", status, error_text)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))
    }
}
