//! Ingestion adapters
//!
//! Provider envelopes (CloudWatch-over-SNS, EventBridge, flat JSON) are
//! normalized here into an [`AlarmNotification`] plus an [`AlarmContext`].
//! Nothing downstream of this module sees provider-specific structure.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::envelope::{CloudWatchAlarmMessage, EventBridgeEvent};
use crate::models::{
    AlarmContext, AlarmNotification, AlarmNotificationDraft, Dimension, MetricTrigger,
};

/// Kind of provider envelope an event arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// CloudWatch alarm message (usually the body of an SNS notification)
    CloudWatch,
    /// EventBridge alarm state change event
    EventBridge,
    /// Already-flat notification
    Flat,
}

/// A normalized alarm together with its provider metadata
#[derive(Debug, Clone, Serialize)]
pub struct IngestedAlarm {
    /// Envelope the alarm arrived in
    pub source: EventSource,
    /// Validated notification
    pub notification: AlarmNotification,
    /// Provider metadata, enriched by the relay before rendering
    pub context: AlarmContext,
    /// The provider payload as received
    pub raw: Value,
}

/// Top-level keys that only appear in CloudWatch alarm messages
const CLOUDWATCH_KEYS: [&str; 5] = [
    "AlarmName",
    "Alarm",
    "NewStateValue",
    "StateValue",
    "OldStateValue",
];

/// Guess the envelope kind from the shape of a JSON value
pub fn detect(value: &Value) -> EventSource {
    if value.get("detail-type").is_some() || value.get("detail").is_some() {
        EventSource::EventBridge
    } else if CLOUDWATCH_KEYS.iter().any(|key| value.get(*key).is_some()) {
        EventSource::CloudWatch
    } else {
        EventSource::Flat
    }
}

/// Normalize any supported envelope
pub fn ingest(value: &Value) -> Result<IngestedAlarm> {
    let source = detect(value);
    debug!(?source, "Ingesting alarm event");

    match source {
        EventSource::CloudWatch => from_cloudwatch_value(value),
        EventSource::EventBridge => from_eventbridge_event(value),
        EventSource::Flat => from_flat(value),
    }
}

/// Normalize the text body of an SNS notification.
///
/// The topic may be fed by a CloudWatch alarm action or by an EventBridge
/// rule, so the body is routed through [`ingest`].
pub fn from_sns_message(message: &str) -> Result<IngestedAlarm> {
    ingest(&parse_message(message)?)
}

/// Normalize the text body of an SNS notification carrying a CloudWatch alarm
pub fn from_cloudwatch_message(message: &str) -> Result<IngestedAlarm> {
    from_cloudwatch_value(&parse_message(message)?)
}

fn parse_message(message: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(message)
        .map_err(|e| Error::malformed("message", format!("not a JSON document: {e}")))?;

    if !value.is_object() {
        return Err(Error::malformed("message", "expected a JSON object"));
    }
    Ok(value)
}

/// Normalize a parsed CloudWatch alarm message
pub fn from_cloudwatch_value(value: &Value) -> Result<IngestedAlarm> {
    let msg: CloudWatchAlarmMessage = decode(value)?;

    let draft = AlarmNotificationDraft {
        alarm: msg.alarm_name,
        old: msg.old_state_value,
        new: msg.new_state_value,
        reason: msg.new_state_reason,
        timestamp: msg.state_change_time,
    };

    let trigger = msg.trigger.map(|t| MetricTrigger {
        metric_name: t.metric_name,
        namespace: t.namespace,
        statistic: t.statistic,
        period_seconds: t.period,
        evaluation_periods: t.evaluation_periods,
        threshold: t.threshold,
        comparison_operator: t.comparison_operator,
        dimensions: t
            .dimensions
            .into_iter()
            .filter_map(|d| {
                Some(Dimension {
                    name: d.name?,
                    value: d.value.unwrap_or_default(),
                })
            })
            .collect(),
    });

    let context = AlarmContext {
        trigger,
        alarm_arn: msg.alarm_arn,
        region: msg.region,
        account_id: msg.account_id,
        source_resource: None,
        causing_log: None,
    }
    .with_derived_resource();

    Ok(IngestedAlarm {
        source: EventSource::CloudWatch,
        notification: draft.validate()?,
        context,
        raw: value.clone(),
    })
}

/// Normalize an EventBridge alarm state change event
pub fn from_eventbridge_event(value: &Value) -> Result<IngestedAlarm> {
    let event: EventBridgeEvent = decode(value)?;
    let detail = event.detail.ok_or_else(|| Error::missing("detail"))?;

    let state = detail.state.unwrap_or_default();
    let previous = detail.previous_state.unwrap_or_default();

    let draft = AlarmNotificationDraft {
        alarm: detail.alarm_name,
        old: previous.value,
        new: state.value,
        reason: state.reason,
        timestamp: state.timestamp.or(event.time),
    };

    let trigger = detail
        .configuration
        .and_then(|c| c.metrics.into_iter().find_map(|m| m.metric_stat))
        .map(|stat| {
            let metric = stat.metric.unwrap_or_default();
            MetricTrigger {
                metric_name: metric.name,
                namespace: metric.namespace,
                statistic: stat.stat,
                period_seconds: stat.period,
                evaluation_periods: None,
                threshold: None,
                comparison_operator: None,
                dimensions: metric
                    .dimensions
                    .into_iter()
                    .map(|(name, value)| Dimension { name, value })
                    .collect(),
            }
        });

    let context = AlarmContext {
        trigger,
        alarm_arn: event.resources.into_iter().next(),
        region: event.region,
        account_id: event.account,
        source_resource: None,
        causing_log: None,
    }
    .with_derived_resource();

    Ok(IngestedAlarm {
        source: EventSource::EventBridge,
        notification: draft.validate()?,
        context,
        raw: value.clone(),
    })
}

/// Normalize an already-flat notification
pub fn from_flat(value: &Value) -> Result<IngestedAlarm> {
    let draft: AlarmNotificationDraft = decode(value)?;

    Ok(IngestedAlarm {
        source: EventSource::Flat,
        notification: draft.validate()?,
        context: AlarmContext::default(),
        raw: value.clone(),
    })
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| Error::malformed("payload", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlarmState;
    use serde_json::json;

    fn cloudwatch_message() -> Value {
        json!({
            "AlarmName": "ExampleLambdaErrorAlarm",
            "AlarmDescription": "Error alarm for ExampleLambdaFunction",
            "AWSAccountId": "123456789012",
            "NewStateValue": "ALARM",
            "NewStateReason": "Threshold Crossed: 1 datapoint [2.0 (01/01/24 00:00:00)] was greater than or equal to the threshold (1.0).",
            "StateChangeTime": "2024-01-01T00:00:00.000+0000",
            "Region": "EU (Frankfurt)",
            "AlarmArn": "arn:aws:cloudwatch:eu-central-1:123456789012:alarm:ExampleLambdaErrorAlarm",
            "OldStateValue": "OK",
            "Trigger": {
                "MetricName": "Errors",
                "Namespace": "AWS/Lambda",
                "StatisticType": "Statistic",
                "Statistic": "SUM",
                "Unit": null,
                "Dimensions": [{ "value": "ExampleLambdaFunction", "name": "FunctionName" }],
                "Period": 60,
                "EvaluationPeriods": 1,
                "ComparisonOperator": "GreaterThanOrEqualToThreshold",
                "Threshold": 1.0,
                "TreatMissingData": "notBreaching"
            }
        })
    }

    fn eventbridge_event() -> Value {
        json!({
            "version": "0",
            "id": "c4c1c1c9-6542-e61b-6ef0-8c4d36933a92",
            "detail-type": "CloudWatch Alarm State Change",
            "source": "aws.cloudwatch",
            "account": "123456789012",
            "time": "2024-01-01T00:00:05Z",
            "region": "eu-central-1",
            "resources": ["arn:aws:cloudwatch:eu-central-1:123456789012:alarm:ExampleLambdaErrorAlarm"],
            "detail": {
                "alarmName": "ExampleLambdaErrorAlarm",
                "state": {
                    "value": "ALARM",
                    "reason": "Threshold Crossed",
                    "timestamp": "2024-01-01T00:00:00.000+0000"
                },
                "previousState": {
                    "value": "OK",
                    "reason": "Threshold Crossed",
                    "timestamp": "2023-12-31T23:00:00.000+0000"
                },
                "configuration": {
                    "metrics": [{
                        "id": "m1",
                        "metricStat": {
                            "metric": {
                                "namespace": "AWS/Lambda",
                                "name": "Errors",
                                "dimensions": { "FunctionName": "ExampleLambdaFunction" }
                            },
                            "period": 60,
                            "stat": "Sum"
                        },
                        "returnData": true
                    }]
                }
            }
        })
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(&cloudwatch_message()), EventSource::CloudWatch);
        assert_eq!(detect(&eventbridge_event()), EventSource::EventBridge);
        assert_eq!(detect(&json!({ "alarm": "x" })), EventSource::Flat);
    }

    #[test]
    fn test_ingest_cloudwatch_alias_keys() {
        let value = json!({
            "Alarm": "HighCPU",
            "OldStateValue": "OK",
            "StateValue": "ALARM",
            "StateChangeTime": "2024-01-01T00:00:00.000+0000"
        });

        assert_eq!(detect(&value), EventSource::CloudWatch);

        let alarm = ingest(&value).unwrap();
        assert_eq!(alarm.source, EventSource::CloudWatch);
        assert_eq!(alarm.notification.alarm_name(), "HighCPU");
        assert_eq!(alarm.notification.new_state(), AlarmState::Alarm);
    }

    #[test]
    fn test_sns_message_carrying_eventbridge_event() {
        let alarm = from_sns_message(&eventbridge_event().to_string()).unwrap();
        assert_eq!(alarm.source, EventSource::EventBridge);
        assert_eq!(alarm.notification.alarm_name(), "ExampleLambdaErrorAlarm");

        let alarm = from_sns_message(&cloudwatch_message().to_string()).unwrap();
        assert_eq!(alarm.source, EventSource::CloudWatch);

        assert!(from_sns_message("ALARM: HighCPU").unwrap_err().is_malformed());
        assert!(from_sns_message("[1, 2]").unwrap_err().is_malformed());
    }

    #[test]
    fn test_cloudwatch_message() {
        let text = cloudwatch_message().to_string();
        let alarm = from_cloudwatch_message(&text).unwrap();

        assert_eq!(alarm.notification.alarm_name(), "ExampleLambdaErrorAlarm");
        assert_eq!(alarm.notification.old_state(), AlarmState::Ok);
        assert_eq!(alarm.notification.new_state(), AlarmState::Alarm);

        let trigger = alarm.context.trigger.as_ref().unwrap();
        assert_eq!(trigger.metric_name.as_deref(), Some("Errors"));
        assert_eq!(trigger.period_seconds, Some(60));
        assert_eq!(trigger.threshold, Some(1.0));
        assert_eq!(alarm.context.region.as_deref(), Some("EU (Frankfurt)"));
        assert_eq!(
            alarm.context.source_resource.as_deref(),
            Some("ExampleLambdaFunction")
        );
    }

    #[test]
    fn test_cloudwatch_state_value_aliases() {
        let value = json!({
            "AlarmName": "HighCPU",
            "OldStateValue": "OK",
            "StateValue": "ALARM",
            "StateReason": "cpu",
            "StateTransitionTime": "2024-01-01T00:00:00Z"
        });

        let alarm = from_cloudwatch_value(&value).unwrap();
        assert_eq!(alarm.notification.new_state(), AlarmState::Alarm);
        assert_eq!(alarm.notification.reason(), "cpu");
    }

    #[test]
    fn test_non_json_message_is_malformed() {
        let err = from_cloudwatch_message("ALARM: HighCPU in EU (Frankfurt)").unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_cloudwatch_missing_timestamp() {
        let mut value = cloudwatch_message();
        value.as_object_mut().unwrap().remove("StateChangeTime");

        match from_cloudwatch_value(&value).unwrap_err() {
            Error::MalformedNotification { field, .. } => assert_eq!(field, "timestamp"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_eventbridge_event() {
        let alarm = from_eventbridge_event(&eventbridge_event()).unwrap();

        assert_eq!(alarm.source, EventSource::EventBridge);
        assert_eq!(alarm.notification.alarm_name(), "ExampleLambdaErrorAlarm");
        assert_eq!(alarm.notification.reason(), "Threshold Crossed");
        assert_eq!(
            alarm.context.alarm_arn.as_deref(),
            Some("arn:aws:cloudwatch:eu-central-1:123456789012:alarm:ExampleLambdaErrorAlarm")
        );
        assert_eq!(
            alarm.context.source_resource.as_deref(),
            Some("ExampleLambdaFunction")
        );
        assert_eq!(
            alarm.context.trigger.as_ref().unwrap().statistic.as_deref(),
            Some("Sum")
        );
    }

    #[test]
    fn test_eventbridge_falls_back_to_event_time() {
        let mut value = eventbridge_event();
        value["detail"]["state"]
            .as_object_mut()
            .unwrap()
            .remove("timestamp");

        let alarm = from_eventbridge_event(&value).unwrap();
        assert_eq!(
            crate::models::render_timestamp(&alarm.notification.timestamp()),
            "2024-01-01T00:00:05Z"
        );
    }

    #[test]
    fn test_eventbridge_without_detail() {
        let err = from_eventbridge_event(&json!({ "detail-type": "x" })).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let err = from_cloudwatch_value(&json!({ "AlarmName": 5 })).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_ingest_dispatches_on_shape() {
        let flat = json!({
            "alarm": "HighCPU",
            "old": "OK",
            "new": "ALARM",
            "timestamp": "2024-01-01T00:00:00Z"
        });
        assert_eq!(ingest(&flat).unwrap().source, EventSource::Flat);
        assert_eq!(ingest(&eventbridge_event()).unwrap().source, EventSource::EventBridge);
    }
}
