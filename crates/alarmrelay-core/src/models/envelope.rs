//! Wire shapes of the provider events that carry alarm state changes
//!
//! These mirror what AWS actually sends and stay loosely typed: every field is
//! optional so that a missing value surfaces as a `MalformedNotification`
//! during ingestion instead of an opaque deserialization error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lambda-style SNS delivery: a batch of records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<SnsRecord>,
}

/// One SNS record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnsRecord {
    #[serde(rename = "EventSource", default)]
    pub event_source: Option<String>,
    #[serde(rename = "Sns", default)]
    pub sns: SnsMessage,
}

/// The SNS notification inside a record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SnsMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub topic_arn: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// JSON-encoded CloudWatch alarm message
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Alarm message CloudWatch publishes to an SNS topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudWatchAlarmMessage {
    #[serde(rename = "AlarmName", alias = "Alarm", default)]
    pub alarm_name: Option<String>,
    #[serde(rename = "AlarmDescription", default)]
    pub alarm_description: Option<String>,
    #[serde(rename = "AWSAccountId", default)]
    pub account_id: Option<String>,
    #[serde(rename = "OldStateValue", default)]
    pub old_state_value: Option<String>,
    #[serde(rename = "NewStateValue", alias = "StateValue", default)]
    pub new_state_value: Option<String>,
    #[serde(rename = "NewStateReason", alias = "StateReason", default)]
    pub new_state_reason: Option<String>,
    #[serde(rename = "StateChangeTime", alias = "StateTransitionTime", default)]
    pub state_change_time: Option<String>,
    #[serde(rename = "Region", default)]
    pub region: Option<String>,
    #[serde(rename = "AlarmArn", default)]
    pub alarm_arn: Option<String>,
    #[serde(rename = "Trigger", default)]
    pub trigger: Option<CloudWatchTrigger>,
}

/// `Trigger` block of a CloudWatch alarm message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudWatchTrigger {
    #[serde(rename = "MetricName", alias = "Metric", default)]
    pub metric_name: Option<String>,
    #[serde(rename = "Namespace", default)]
    pub namespace: Option<String>,
    #[serde(rename = "Statistic", alias = "Stat", default)]
    pub statistic: Option<String>,
    #[serde(rename = "Period", alias = "PeriodInSeconds", default)]
    pub period: Option<u64>,
    #[serde(rename = "EvaluationPeriods", default)]
    pub evaluation_periods: Option<u32>,
    #[serde(rename = "Threshold", default)]
    pub threshold: Option<f64>,
    #[serde(rename = "ComparisonOperator", default)]
    pub comparison_operator: Option<String>,
    #[serde(rename = "Dimensions", alias = "dimension", default)]
    pub dimensions: Vec<CloudWatchDimension>,
}

/// CloudWatch spells dimension keys in lower case
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudWatchDimension {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// EventBridge "CloudWatch Alarm State Change" event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBridgeEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "detail-type", default)]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub detail: Option<AlarmStateChangeDetail>,
}

/// `detail` of an alarm state change event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmStateChangeDetail {
    #[serde(default)]
    pub alarm_name: Option<String>,
    #[serde(default)]
    pub state: Option<AlarmStateValue>,
    #[serde(default)]
    pub previous_state: Option<AlarmStateValue>,
    #[serde(default)]
    pub configuration: Option<AlarmConfiguration>,
}

/// A state snapshot inside an EventBridge alarm event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmStateValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Alarm configuration carried by EventBridge events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmConfiguration {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metrics: Vec<AlarmMetric>,
}

/// One entry of `configuration.metrics`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmMetric {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metric_stat: Option<MetricStat>,
}

/// `metricStat` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricStat {
    #[serde(default)]
    pub metric: Option<MetricIdentity>,
    #[serde(default)]
    pub period: Option<u64>,
    #[serde(default)]
    pub stat: Option<String>,
}

/// `metricStat.metric` block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricIdentity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub dimensions: BTreeMap<String, String>,
}
