//! Generic webhook channel

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::info;

use super::{NotificationChannel, PublishReceipt};
use crate::error::{Error, Result};
use crate::formatter::FormattedMessage;

/// POSTs each message as JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    client: Client,
    url: String,
}

impl WebhookChannel {
    /// Create a webhook channel with a request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

// Generic webhook payload
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    body: &'a str,
}

#[derive(Debug, serde::Deserialize)]
struct WebhookResponse {
    #[serde(default, alias = "messageId", alias = "MessageId")]
    message_id: Option<String>,
}

#[async_trait::async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn publish(&self, message: &FormattedMessage) -> Result<PublishReceipt> {
        let payload = WebhookPayload {
            subject: &message.subject,
            body: &message.body,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::publish(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::publish(format!(
                "Webhook returned {}: {}",
                status, body
            )));
        }

        // Receivers are not required to answer with JSON
        let message_id = response
            .json::<WebhookResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id);

        info!(url = %self.url, message_id = ?message_id, "Webhook notification sent");
        Ok(PublishReceipt::new(self.name(), message_id))
    }
}
