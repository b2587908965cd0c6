//! SNS topic channel

use aws_sdk_sns::config::Region;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;
use tracing::{debug, info};

use super::{NotificationChannel, PublishReceipt};
use crate::error::{Error, Result};
use crate::formatter::FormattedMessage;

/// Publishes to an SNS topic; email subscribers receive the body as-is
#[derive(Debug, Clone)]
pub struct SnsChannel {
    client: Client,
    topic_arn: String,
}

impl SnsChannel {
    /// Wrap an existing client
    pub fn new(client: Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    /// Build a client from the ambient AWS credential chain
    pub async fn from_env(topic_arn: impl Into<String>, region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        Self::new(Client::new(&sdk_config), topic_arn)
    }

    /// Topic this channel publishes to
    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}

#[async_trait::async_trait]
impl NotificationChannel for SnsChannel {
    fn name(&self) -> &'static str {
        "sns"
    }

    async fn publish(&self, message: &FormattedMessage) -> Result<PublishReceipt> {
        debug!(topic_arn = %self.topic_arn, subject = %message.subject, "Publishing to SNS");

        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(&message.subject)
            .message(&message.body)
            .send()
            .await
            .map_err(|e| {
                Error::publish(format!("SNS publish failed: {}", DisplayErrorContext(&e)))
            })?;

        let message_id = output.message_id().map(String::from);
        info!(topic_arn = %self.topic_arn, message_id = ?message_id, "SNS message published");

        Ok(PublishReceipt::new(self.name(), message_id))
    }
}
