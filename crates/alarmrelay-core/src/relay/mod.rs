//! Alarm relay
//!
//! Drives ingest, format and dispatch for each incoming event. This is the
//! entry point the invoking environment (HTTP API, CLI) calls.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::dispatch::{NotificationChannel, PublishReceipt};
use crate::enrich::{self, LogLookup};
use crate::error::{Error, Result};
use crate::formatter::{AlarmFormatter, FormattedMessage};
use crate::ingest::{self, IngestedAlarm};
use crate::models::envelope::SnsEvent;

/// Why a record was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The record did not contain a well-formed notification
    Malformed,
    /// The channel refused or failed to deliver
    Publish,
}

/// One record that could not be relayed
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    /// 1-based position in the batch
    pub record: usize,
    /// Failure category
    pub kind: FailureKind,
    /// Error message
    pub error: String,
}

/// Outcome of relaying an SNS batch
#[derive(Debug, Clone, Serialize)]
pub struct RelayOutcome {
    /// HTTP-style status summarizing the batch
    pub status_code: u16,
    /// Ids of the published messages, in record order
    pub message_ids: Vec<String>,
    /// Records without a message body
    pub skipped: usize,
    /// Records that could not be relayed
    pub failures: Vec<RecordFailure>,
    /// Explanation when the batch was rejected as a whole
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl RelayOutcome {
    fn empty_batch() -> Self {
        Self {
            status_code: 400,
            message_ids: Vec::new(),
            skipped: 0,
            failures: Vec::new(),
            body: Some("No SNS records provided".to_string()),
        }
    }
}

/// Relays alarm events to a notification channel
pub struct AlarmRelay {
    formatter: AlarmFormatter,
    channel: Arc<dyn NotificationChannel>,
    log_lookup: Option<Arc<dyn LogLookup>>,
}

impl AlarmRelay {
    /// Create a relay from explicit configuration and a channel
    pub fn new(formatter: AlarmFormatter, channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            formatter,
            channel,
            log_lookup: None,
        }
    }

    /// Look up the causing log entry of each alarm before rendering it
    #[must_use]
    pub fn with_log_lookup(mut self, lookup: Arc<dyn LogLookup>) -> Self {
        self.log_lookup = Some(lookup);
        self
    }

    /// Name of the configured channel
    pub fn channel_name(&self) -> &'static str {
        self.channel.name()
    }

    /// Ingest and render an event without publishing it.
    ///
    /// Previews skip the log lookup and never call out to the provider.
    pub fn preview(&self, value: &Value) -> Result<FormattedMessage> {
        let alarm = ingest::ingest(value)?;
        self.formatter.render(&alarm)
    }

    /// Relay a single EventBridge, CloudWatch or flat event
    pub async fn handle_event(&self, value: &Value) -> Result<PublishReceipt> {
        let mut alarm = ingest::ingest(value)?;
        self.publish(&mut alarm).await
    }

    /// Relay an EventBridge alarm state change event
    pub async fn handle_eventbridge_event(&self, value: &Value) -> Result<PublishReceipt> {
        let mut alarm = ingest::from_eventbridge_event(value)?;
        self.publish(&mut alarm).await
    }

    /// Relay every record of an SNS delivery.
    ///
    /// Records are processed in order; a failing record does not stop the
    /// rest of the batch.
    pub async fn handle_sns_event(&self, event: &SnsEvent) -> RelayOutcome {
        debug!(records = event.records.len(), "Received SNS event");

        if event.records.is_empty() {
            warn!("No SNS records found in the event");
            return RelayOutcome::empty_batch();
        }

        let mut message_ids = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = 0;

        for (index, record) in event.records.iter().enumerate() {
            let position = index + 1;

            let raw_message = match record.sns.message.as_deref() {
                Some(m) if !m.trim().is_empty() => m,
                _ => {
                    warn!(record = position, "Record missing SNS message body; skipping");
                    skipped += 1;
                    continue;
                }
            };

            let result = match ingest::from_sns_message(raw_message) {
                Ok(mut alarm) => self.publish(&mut alarm).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(receipt) => {
                    if let Some(id) = receipt.message_id {
                        message_ids.push(id);
                    }
                }
                Err(e) => {
                    let kind = if e.is_malformed() {
                        FailureKind::Malformed
                    } else {
                        FailureKind::Publish
                    };
                    error!(record = position, error = %e, "Failed to relay SNS record");
                    failures.push(RecordFailure {
                        record: position,
                        kind,
                        error: e.to_string(),
                    });
                }
            }
        }

        let attempted = event.records.len() - skipped;
        let status_code = batch_status(attempted, &failures);

        RelayOutcome {
            status_code,
            message_ids,
            skipped,
            failures,
            body: None,
        }
    }

    /// Relay a JSON value that is either an SNS delivery or a single event
    pub async fn handle_value(&self, value: &Value) -> Result<RelayOutcome> {
        if value.get("Records").is_some() {
            let event: SnsEvent = serde_json::from_value(value.clone())
                .map_err(|e| Error::malformed("Records", e.to_string()))?;
            return Ok(self.handle_sns_event(&event).await);
        }

        let receipt = self.handle_event(value).await?;
        Ok(RelayOutcome {
            status_code: 200,
            message_ids: receipt.message_id.into_iter().collect(),
            skipped: 0,
            failures: Vec::new(),
            body: None,
        })
    }

    async fn publish(&self, alarm: &mut IngestedAlarm) -> Result<PublishReceipt> {
        if !alarm.notification.is_transition() {
            warn!(
                alarm = alarm.notification.alarm_name(),
                state = %alarm.notification.new_state(),
                "Alarm event without a state change"
            );
        }

        if let Some(lookup) = &self.log_lookup {
            enrich::enrich_context(lookup.as_ref(), &mut alarm.context).await;
        }

        let message = self.formatter.render(alarm)?;
        let notification = &alarm.notification;
        let receipt = self.channel.publish(&message).await?;

        info!(
            alarm = notification.alarm_name(),
            channel = %receipt.channel,
            message_id = ?receipt.message_id,
            "Published formatted alarm message"
        );
        Ok(receipt)
    }
}

/// 200 unless every attempted record failed
fn batch_status(attempted: usize, failures: &[RecordFailure]) -> u16 {
    if attempted == 0 || failures.len() < attempted {
        return 200;
    }
    if failures.iter().all(|f| f.kind == FailureKind::Malformed) {
        422
    } else {
        502
    }
}
