//! Alarm context enrichment
//!
//! Before an alarm is rendered, the relay may look up the log entry that most
//! likely caused it. Lookups never fail the relay: an empty result or a
//! lookup error is turned into a short placeholder line instead.

mod cloudwatch;

pub use cloudwatch::CloudWatchLogLookup;

use tracing::{debug, warn};

use crate::error::Result;
use crate::models::AlarmContext;

/// Placeholder when the lookup found nothing
pub const NO_LOG_ENTRY: &str = "No specific log entry found.";

/// Source of recent error log entries for a monitored resource
#[async_trait::async_trait]
pub trait LogLookup: Send + Sync {
    /// Most recent error-like entry logged by `resource`, if any
    async fn causing_entry(&self, resource: &str) -> Result<Option<String>>;
}

/// Log group a Lambda function writes to
pub fn lambda_log_group(function_name: &str) -> String {
    format!("/aws/lambda/{function_name}")
}

/// Fill `context.causing_log` for alarms that name a source resource
pub async fn enrich_context(lookup: &dyn LogLookup, context: &mut AlarmContext) {
    let Some(resource) = context.source_resource.as_deref() else {
        debug!("Alarm has no source resource; skipping log lookup");
        return;
    };

    let entry = match lookup.causing_entry(resource).await {
        Ok(Some(message)) if !message.trim().is_empty() => message.trim().to_string(),
        Ok(_) => NO_LOG_ENTRY.to_string(),
        Err(e) => {
            warn!(resource, error = %e, "Log lookup failed");
            format!("Failed to retrieve log: {e}")
        }
    };

    context.causing_log = Some(entry);
}
