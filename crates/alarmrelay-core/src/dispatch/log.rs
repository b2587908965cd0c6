//! Log-only channel

use tracing::info;
use uuid::Uuid;

use super::{NotificationChannel, PublishReceipt};
use crate::error::Result;
use crate::formatter::FormattedMessage;

/// Writes messages to the log instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogChannel;

impl LogChannel {
    /// Create a log channel
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, message: &FormattedMessage) -> Result<PublishReceipt> {
        let message_id = Uuid::new_v4().to_string();
        info!(
            message_id = %message_id,
            subject = %message.subject,
            body = %message.body,
            "Formatted alarm message (log channel, not delivered)"
        );
        Ok(PublishReceipt::new(self.name(), Some(message_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_channel_assigns_id() {
        let message = FormattedMessage {
            subject: "CRITICAL - HighCPU".to_string(),
            body: "Alarm: HighCPU".to_string(),
        };

        let first = LogChannel::new().publish(&message).await.unwrap();
        let second = LogChannel::new().publish(&message).await.unwrap();

        assert_eq!(first.channel, "log");
        assert!(first.message_id.is_some());
        assert_ne!(first.message_id, second.message_id);
    }
}
