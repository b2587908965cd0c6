//! CloudWatch Logs lookup for Lambda alarms

use std::time::Duration;

use aws_sdk_cloudwatchlogs::config::Region;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::Client;
use chrono::Utc;
use tracing::debug;

use super::{lambda_log_group, LogLookup};
use crate::config::LogLookupConfig;
use crate::error::{Error, Result};

/// Searches the function's log group for the latest error-like line
#[derive(Debug, Clone)]
pub struct CloudWatchLogLookup {
    client: Client,
    lookback: Duration,
    filter_pattern: String,
}

impl CloudWatchLogLookup {
    /// Wrap an existing client
    pub fn new(client: Client, lookback: Duration, filter_pattern: impl Into<String>) -> Self {
        Self {
            client,
            lookback,
            filter_pattern: filter_pattern.into(),
        }
    }

    /// Build a client from the ambient AWS credential chain
    pub async fn from_env(config: &LogLookupConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        Self::new(
            Client::new(&sdk_config),
            config.lookback,
            config.filter_pattern.clone(),
        )
    }
}

#[async_trait::async_trait]
impl LogLookup for CloudWatchLogLookup {
    async fn causing_entry(&self, resource: &str) -> Result<Option<String>> {
        let log_group = lambda_log_group(resource);
        let end = Utc::now().timestamp_millis();
        let lookback = i64::try_from(self.lookback.as_millis()).unwrap_or(i64::MAX);
        let start = end.saturating_sub(lookback);

        debug!(log_group = %log_group, start, end, "Searching for causing log entry");

        let output = self
            .client
            .filter_log_events()
            .log_group_name(&log_group)
            .filter_pattern(&self.filter_pattern)
            .start_time(start)
            .end_time(end)
            .limit(1)
            .send()
            .await
            .map_err(|e| Error::internal(format!("{}", DisplayErrorContext(&e))))?;

        Ok(output
            .events()
            .iter()
            .find_map(|event| event.message().map(String::from)))
    }
}
