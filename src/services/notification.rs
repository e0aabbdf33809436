//! Mail notifications
//!
//! Messages are rendered from templates with `{placeholder}` parameters and
//! posted to the mail relay, several at a time. Delivery is best effort:
//! failures are counted and logged, never returned to the caller.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::MailConfig;
use crate::utils::errors::{CollectivError, Result};

pub const CANCELLATION_TEMPLATE: &str = "event_cancellation";

/// Relay requests in flight at once during a bulk send
const MAX_CONCURRENT_SENDS: usize = 8;

/// Mail template: subject and HTML body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub key: String,
    pub subject: String,
    pub html: String,
}

/// Rendered message for one recipient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationStats {
    pub total_sent: u64,
    pub total_failed: u64,
}

#[derive(Clone)]
#[derive(Debug)]
pub struct NotificationService {
    client: Client,
    config: MailConfig,
    templates: HashMap<String, MessageTemplate>,
}

impl NotificationService {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Collectiv/1.0")
            .build()?;

        Ok(Self {
            client,
            config,
            templates: Self::load_default_templates(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Render a template for one recipient
    pub fn render(&self, template_key: &str, to: &str, parameters: &HashMap<String, String>) -> Result<MailMessage> {
        let template = self
            .templates
            .get(template_key)
            .ok_or_else(|| CollectivError::Mail(format!("Template not found: {}", template_key)))?;

        let mut subject = template.subject.clone();
        let mut html = template.html.clone();
        for (key, value) in parameters {
            let placeholder = format!("{{{}}}", key);
            subject = subject.replace(&placeholder, value);
            html = html.replace(&placeholder, value);
        }

        Ok(MailMessage {
            to: to.to_string(),
            subject,
            html,
        })
    }

    async fn send(&self, message: &MailMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.config.relay_url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "from": self.config.sender,
                "to": [message.to],
                "subject": message.subject,
                "html": message.html,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CollectivError::Mail(format!("Relay answered HTTP {}", response.status())));
        }

        Ok(())
    }

    /// Send every message, returning delivery counts
    pub async fn send_bulk(&self, messages: &[MailMessage]) -> NotificationStats {
        let mut stats = NotificationStats::default();

        if !self.config.enabled {
            info!(count = messages.len(), "Mail disabled, skipping notifications");
            return stats;
        }

        let mut deliveries = stream::iter(messages)
            .map(|message| async move { (message, self.send(message).await) })
            .buffer_unordered(MAX_CONCURRENT_SENDS)
            .boxed();

        while let Some((message, outcome)) = deliveries.next().await {
            match outcome {
                Ok(()) => stats.total_sent += 1,
                Err(e) => {
                    warn!(to = %message.to, error = %e, "Failed to send notification");
                    stats.total_failed += 1;
                }
            }
        }

        info!(sent = stats.total_sent, failed = stats.total_failed, "Notifications delivered");
        stats
    }

    fn load_default_templates() -> HashMap<String, MessageTemplate> {
        let mut templates = HashMap::new();

        templates.insert(
            CANCELLATION_TEMPLATE.to_string(),
            MessageTemplate {
                key: CANCELLATION_TEMPLATE.to_string(),
                subject: "Collectiv Event Cancellation Notice".to_string(),
                html: r#"<body style="font-family: Arial, sans-serif;">
<h1>Cancellation of Event</h1>
<p>Dear {participant_name},</p>
<p>We regret to inform you that the following event has been cancelled.</p>
<p><strong>Event Name:</strong> {event_name}<br>
<strong>Initial Location:</strong> {location_name}<br>
<strong>Initial Start Date:</strong> {start_date_time}</p>
<p>If you have any questions, please contact the organizer at <strong>{creator_contact}</strong>.</p>
<p>Warm regards,</p>
<p>{creator_name}<br>{creator_contact}</p>
</body>"#
                    .to_string(),
            },
        );

        templates
    }
}
