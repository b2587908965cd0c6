//! Notification dispatch
//!
//! A [`NotificationChannel`] receives a rendered [`FormattedMessage`] and
//! hands it to an external delivery mechanism. Delivery guarantees belong to
//! that mechanism; channels report one attempt.

mod log;
mod sns;
mod webhook;

pub use self::log::LogChannel;
pub use sns::SnsChannel;
pub use webhook::WebhookChannel;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::{ChannelKind, DispatchConfig};
use crate::error::{Error, Result};
use crate::formatter::FormattedMessage;

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReceipt {
    /// Channel type that delivered the message
    pub channel: String,
    /// Identifier assigned by the channel, when it returns one
    pub message_id: Option<String>,
    /// When the channel accepted the message
    pub sent_at: DateTime<Utc>,
}

impl PublishReceipt {
    /// Receipt stamped with the current time
    pub fn new(channel: impl Into<String>, message_id: Option<String>) -> Self {
        Self {
            channel: channel.into(),
            message_id,
            sent_at: Utc::now(),
        }
    }
}

/// Destination for formatted alarm messages
#[async_trait::async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short channel type name used in logs and receipts
    fn name(&self) -> &'static str;

    /// Deliver one message
    async fn publish(&self, message: &FormattedMessage) -> Result<PublishReceipt>;
}

/// Build the channel selected in configuration
pub async fn build_channel(config: &DispatchConfig) -> Result<Arc<dyn NotificationChannel>> {
    let channel: Arc<dyn NotificationChannel> = match config.channel {
        ChannelKind::Log => Arc::new(LogChannel::new()),
        ChannelKind::Sns => {
            let topic_arn = config
                .topic_arn
                .clone()
                .ok_or_else(|| Error::config("dispatch.topic_arn is not set"))?;
            Arc::new(SnsChannel::from_env(topic_arn, config.region.clone()).await)
        }
        ChannelKind::Webhook => {
            let url = config
                .webhook_url
                .clone()
                .ok_or_else(|| Error::config("dispatch.webhook_url is not set"))?;
            Arc::new(WebhookChannel::new(url, config.timeout)?)
        }
    };

    info!(channel = channel.name(), "Notification channel ready");
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_default_channel() {
        let channel = build_channel(&DispatchConfig::default()).await.unwrap();
        assert_eq!(channel.name(), "log");
    }

    #[tokio::test]
    async fn test_build_webhook_without_url() {
        let config = DispatchConfig {
            channel: ChannelKind::Webhook,
            ..DispatchConfig::default()
        };
        assert!(matches!(build_channel(&config).await, Err(Error::Config(_))));
    }
}
