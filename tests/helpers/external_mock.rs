//! Mock server for the identity provider, inference API and object store
//!
//! One wiremock server stands in for every external HTTP dependency. The
//! test settings point each service at a distinct path on it.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOOKUP_PATH: &str = "/identity/accounts:lookup";
pub const SENTIMENT_PATH: &str = "/inference/sentiment";
pub const ENTITIES_PATH: &str = "/inference/entities";
pub const STORAGE_BUCKET: &str = "test-bucket";

pub struct ExternalMockServer {
    pub server: MockServer,
}

impl ExternalMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Resolve `email` to `user_id`
    pub async fn mock_email_lookup(&self, email: &str, user_id: &str) {
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .and(body_partial_json(json!({ "email": [email] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "identitytoolkit#GetAccountInfoResponse",
                "users": [{ "localId": user_id, "email": email }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Resolve `phone` to `user_id`
    pub async fn mock_phone_lookup(&self, phone: &str, user_id: &str) {
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .and(body_partial_json(json!({ "phoneNumber": [phone] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{ "localId": user_id, "phoneNumber": phone }]
            })))
            .mount(&self.server)
            .await;
    }

    /// Every other lookup finds no account
    pub async fn mock_unknown_lookups(&self) {
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "x" })))
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    /// Sentiment classification returning a single positive label
    pub async fn mock_positive_sentiment(&self, score: f64) {
        Mock::given(method("POST"))
            .and(path(SENTIMENT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
                { "label": "positive", "score": score },
                { "label": "negative", "score": 0.0 }
            ]])))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_sentiment_unavailable(&self) {
        Mock::given(method("POST"))
            .and(path(SENTIMENT_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&self.server)
            .await;
    }

    /// Token classification returning one entity per word
    pub async fn mock_entities(&self, words: &[&str]) {
        let entities: Vec<serde_json::Value> = words
            .iter()
            .map(|word| json!({ "entity_group": "LOC", "word": word, "score": 0.99 }))
            .collect();

        Mock::given(method("POST"))
            .and(path(ENTITIES_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(entities))
            .mount(&self.server)
            .await;
    }

    /// Accept uploads and serve `bytes` back for any object in the bucket
    pub async fn mock_storage(&self, bytes: &[u8]) {
        let object_path = format!(r"^/{}/.+$", STORAGE_BUCKET);

        Mock::given(method("PUT"))
            .and(path_regex(object_path.as_str()))
            .respond_with(ResponseTemplate::new(200))
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(object_path.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/octet-stream")
                    .set_body_bytes(bytes.to_vec()),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
