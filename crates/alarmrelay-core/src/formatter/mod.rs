//! Alarm event formatter
//!
//! Renders an [`AlarmNotification`] into a plain-text email body. The body
//! always has exactly one labeled line per field, in this order:
//!
//! ```text
//! Alarm: <alarm name>
//! Previous State: <old state>
//! New State: <new state>
//! Reason: <reason>
//! Timestamp: <timestamp, UTC RFC 3339>
//! ```
//!
//! Lines are separated by `\n` with no trailing newline. An empty reason is
//! still rendered as `Reason: `. Line breaks inside values are folded into
//! single spaces so that a value can never add lines.

use serde::{Deserialize, Serialize};

use crate::config::FormatterConfig;
use crate::error::Result;
use crate::ingest::IngestedAlarm;
use crate::models::{render_timestamp, AlarmContext, AlarmNotification, AlarmNotificationDraft};

/// Field labels, in rendering order
pub const FIELD_LABELS: [&str; 5] = [
    "Alarm",
    "Previous State",
    "New State",
    "Reason",
    "Timestamp",
];

/// Line separator used in every rendered body
pub const LINE_SEPARATOR: &str = "\n";

/// Subject and body ready for a notification channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedMessage {
    /// One-line subject, already cut to the configured length
    pub subject: String,
    /// Field lines plus any enabled sections
    pub body: String,
}

/// Render the five field lines of a notification
pub fn format_body(notification: &AlarmNotification) -> String {
    let values = [
        single_line(notification.alarm_name()),
        notification.old_state().to_string(),
        notification.new_state().to_string(),
        single_line(notification.reason()),
        render_timestamp(&notification.timestamp()),
    ];

    FIELD_LABELS
        .iter()
        .zip(values.iter())
        .map(|(label, value)| format!("{label}: {value}"))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

/// Validate a flat draft and render it; fails without partial output
pub fn format_draft(draft: &AlarmNotificationDraft) -> Result<String> {
    let notification = draft.validate()?;
    Ok(format_body(&notification))
}

/// `<SEVERITY> - <alarm name>`, cut to at most `max_chars` characters
pub fn format_subject(notification: &AlarmNotification, max_chars: usize) -> String {
    let subject = format!(
        "{} - {}",
        notification.severity(),
        single_line(notification.alarm_name())
    );
    truncate_chars(&subject, max_chars)
}

fn single_line(value: &str) -> String {
    if !value.contains(['\n', '\r']) {
        return value.to_string();
    }
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

/// Formatter configured at startup
#[derive(Debug, Clone, Default)]
pub struct AlarmFormatter {
    config: FormatterConfig,
}

impl AlarmFormatter {
    /// Create a formatter from explicit configuration
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }

    /// Formatter configuration
    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    /// Render subject and body for an ingested alarm.
    ///
    /// Optional sections are appended after a blank line and only when
    /// enabled in [`FormatterConfig`]; the field lines always come first.
    pub fn render(&self, alarm: &IngestedAlarm) -> Result<FormattedMessage> {
        let mut body = format_body(&alarm.notification);

        if self.config.include_details {
            body.push_str(LINE_SEPARATOR);
            body.push_str(LINE_SEPARATOR);
            body.push_str(&details_section(&alarm.notification, &alarm.context));
        }

        if self.config.include_raw_payload {
            body.push_str(LINE_SEPARATOR);
            body.push_str(LINE_SEPARATOR);
            body.push_str("Raw Payload:");
            body.push_str(LINE_SEPARATOR);
            body.push_str(&serde_json::to_string_pretty(&alarm.raw)?);
        }

        Ok(FormattedMessage {
            subject: format_subject(&alarm.notification, self.config.subject_max_len),
            body,
        })
    }
}

fn details_section(notification: &AlarmNotification, context: &AlarmContext) -> String {
    const UNKNOWN: &str = "Unknown";

    let trigger = context.trigger.clone().unwrap_or_default();
    let or_unknown = |v: Option<String>| v.unwrap_or_else(|| UNKNOWN.to_string());

    let mut lines = vec![
        format!("Severity: {}", notification.severity()),
        format!("Metric: {}", or_unknown(trigger.metric_name.clone())),
        format!("Namespace: {}", or_unknown(trigger.namespace.clone())),
        format!("Statistic: {}", or_unknown(trigger.statistic.clone())),
        format!(
            "Period: {}",
            or_unknown(trigger.period_seconds.map(|p| format!("{p} seconds")))
        ),
        format!(
            "Evaluation Periods: {}",
            or_unknown(trigger.evaluation_periods.map(|p| p.to_string()))
        ),
        format!("Threshold: {}", or_unknown(trigger.threshold.map(|t| t.to_string()))),
        format!("Dimensions: {}", trigger.dimensions_text()),
        format!("Source Resource: {}", or_unknown(context.source_resource.clone())),
        format!("Alarm ARN: {}", or_unknown(context.alarm_arn.clone())),
        format!("Region: {}", or_unknown(context.region.clone())),
        format!("Account: {}", or_unknown(context.account_id.clone())),
    ];
    if let Some(entry) = &context.causing_log {
        lines.push(format!("Log Entry: {entry}"));
    }

    lines
        .iter()
        .map(|line| single_line(line))
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{self, EventSource};
    use crate::models::AlarmState;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn high_cpu(reason: &str) -> AlarmNotification {
        AlarmNotification::new(
            "HighCPU",
            AlarmState::Ok,
            AlarmState::Alarm,
            reason,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_format_body_example() {
        let body = format_body(&high_cpu("Threshold crossed: 85% > 80%"));

        assert_eq!(
            body,
            "Alarm: HighCPU\n\
             Previous State: OK\n\
             New State: ALARM\n\
             Reason: Threshold crossed: 85% > 80%\n\
             Timestamp: 2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_empty_reason_keeps_line() {
        let body = format_body(&high_cpu(""));
        let lines: Vec<&str> = body.split(LINE_SEPARATOR).collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "Reason: ");
    }

    #[test]
    fn test_multiline_reason_folded() {
        let body = format_body(&high_cpu("first\r\nsecond\nthird"));
        assert!(body.contains("Reason: first second third"));
        assert_eq!(body.lines().count(), 5);
    }

    #[test]
    fn test_format_draft_missing_timestamp() {
        let draft = AlarmNotificationDraft {
            alarm: Some("HighCPU".to_string()),
            old: Some("OK".to_string()),
            new: Some("ALARM".to_string()),
            reason: Some("Threshold crossed: 85% > 80%".to_string()),
            timestamp: None,
        };

        assert!(format_draft(&draft).unwrap_err().is_malformed());
    }

    #[test]
    fn test_subject() {
        assert_eq!(format_subject(&high_cpu(""), 100), "CRITICAL - HighCPU");
        assert_eq!(format_subject(&high_cpu(""), 8), "CRITICAL");
    }

    #[test]
    fn test_subject_truncates_on_char_boundary() {
        let n = AlarmNotification::new(
            "Überlast-Warnung",
            AlarmState::Alarm,
            AlarmState::Ok,
            "",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();

        assert_eq!(format_subject(&n, 12), "RESOLVED - Ü");
    }

    fn ingested(reason: &str) -> IngestedAlarm {
        ingest::from_flat(&json!({
            "alarm": "HighCPU",
            "old": "OK",
            "new": "ALARM",
            "reason": reason,
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_render_default_is_field_lines_only() {
        let alarm = ingested("cpu");
        let message = AlarmFormatter::default().render(&alarm).unwrap();

        assert_eq!(message.subject, "CRITICAL - HighCPU");
        assert_eq!(message.body, format_body(&alarm.notification));
    }

    #[test]
    fn test_render_with_details() {
        let formatter = AlarmFormatter::new(FormatterConfig {
            include_details: true,
            ..FormatterConfig::default()
        });
        let body = formatter.render(&ingested("cpu")).unwrap().body;
        let lines: Vec<&str> = body.split(LINE_SEPARATOR).collect();

        assert_eq!(lines[4], "Timestamp: 2024-01-01T00:00:00Z");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "Severity: CRITICAL");
        assert!(body.contains("Dimensions: None"));
        assert!(body.contains("Region: Unknown"));
        assert!(!body.contains("Log Entry:"));
    }

    #[test]
    fn test_render_details_with_causing_log() {
        let formatter = AlarmFormatter::new(FormatterConfig {
            include_details: true,
            ..FormatterConfig::default()
        });
        let mut alarm = ingested("cpu");
        alarm.context.causing_log = Some("ERROR Task timed out\n  at handler".to_string());

        let body = formatter.render(&alarm).unwrap().body;
        let last = body.split(LINE_SEPARATOR).last().unwrap();

        assert_eq!(last, "Log Entry: ERROR Task timed out   at handler");
        assert!(body.starts_with(&format_body(&alarm.notification)));
    }

    #[test]
    fn test_render_with_raw_payload() {
        let formatter = AlarmFormatter::new(FormatterConfig {
            include_raw_payload: true,
            ..FormatterConfig::default()
        });
        let body = formatter.render(&ingested("cpu")).unwrap().body;

        assert!(body.contains("\n\nRaw Payload:\n{"));
        assert!(body.contains("\"alarm\": \"HighCPU\""));
    }

    #[test]
    fn test_same_body_across_envelopes() {
        let cloudwatch = ingest::from_cloudwatch_value(&json!({
            "AlarmName": "HighCPU",
            "OldStateValue": "OK",
            "NewStateValue": "ALARM",
            "NewStateReason": "cpu",
            "StateChangeTime": "2024-01-01T00:00:00.000+0000"
        }))
        .unwrap();
        let eventbridge = ingest::from_eventbridge_event(&json!({
            "detail-type": "CloudWatch Alarm State Change",
            "detail": {
                "alarmName": "HighCPU",
                "previousState": { "value": "OK" },
                "state": { "value": "ALARM", "reason": "cpu", "timestamp": "2024-01-01T00:00:00Z" }
            }
        }))
        .unwrap();
        let flat = ingested("cpu");

        assert_eq!(cloudwatch.source, EventSource::CloudWatch);
        assert_eq!(format_body(&cloudwatch.notification), format_body(&flat.notification));
        assert_eq!(format_body(&eventbridge.notification), format_body(&flat.notification));
    }

    fn any_state() -> impl Strategy<Value = AlarmState> {
        prop_oneof![
            Just(AlarmState::Ok),
            Just(AlarmState::Alarm),
            Just(AlarmState::InsufficientData),
        ]
    }

    proptest! {
        #[test]
        fn body_has_one_line_per_field_in_order(
            name in "[A-Za-z0-9_\\-]{1,40}( [A-Za-z0-9]{1,10})?",
            reason in any::<String>(),
            old in any_state(),
            new in any_state(),
            secs in 0i64..4_102_444_800,
        ) {
            let ts = Utc.timestamp_opt(secs, 0).unwrap();
            let n = AlarmNotification::new(name, old, new, reason, ts).unwrap();
            let body = format_body(&n);
            let lines: Vec<&str> = body.split(LINE_SEPARATOR).collect();

            prop_assert_eq!(lines.len(), FIELD_LABELS.len());
            for (line, label) in lines.iter().zip(FIELD_LABELS.iter()) {
                let prefix = format!("{label}: ");
                prop_assert!(line.starts_with(&prefix));
            }
        }

        #[test]
        fn formatting_is_idempotent(reason in ".*", secs in 0i64..4_102_444_800) {
            let ts = Utc.timestamp_opt(secs, 0).unwrap();
            let n = AlarmNotification::new("HighCPU", AlarmState::Ok, AlarmState::Alarm, reason, ts)
                .unwrap();

            prop_assert_eq!(format_body(&n), format_body(&n.clone()));
        }

        #[test]
        fn subject_never_exceeds_limit(name in "\\PC{1,200}", max in 1usize..120) {
            let ts = Utc.timestamp_opt(0, 0).unwrap();
            prop_assume!(!name.trim().is_empty());
            let n = AlarmNotification::new(name, AlarmState::Ok, AlarmState::Alarm, "", ts)
                .unwrap();

            prop_assert!(format_subject(&n, max).chars().count() <= max);
        }
    }
}
