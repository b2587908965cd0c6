//! Provider metadata that accompanies an alarm notification

use serde::{Deserialize, Serialize};

/// A metric dimension such as `FunctionName=checkout`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    /// Dimension key
    pub name: String,
    /// Dimension value
    pub value: String,
}

/// The metric condition that drove the alarm
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTrigger {
    /// Metric name, e.g. `Errors`
    pub metric_name: Option<String>,
    /// Metric namespace, e.g. `AWS/Lambda`
    pub namespace: Option<String>,
    /// Statistic applied to the datapoints
    pub statistic: Option<String>,
    /// Evaluation period in seconds
    pub period_seconds: Option<u64>,
    /// Number of periods evaluated
    pub evaluation_periods: Option<u32>,
    /// Threshold the statistic is compared against
    pub threshold: Option<f64>,
    /// Comparison operator name
    pub comparison_operator: Option<String>,
    /// Metric dimensions in provider order
    pub dimensions: Vec<Dimension>,
}

impl MetricTrigger {
    /// Value of the named dimension, if present
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }

    /// `name=value` pairs joined with `, `, or `None` when there are no dimensions
    pub fn dimensions_text(&self) -> String {
        if self.dimensions.is_empty() {
            return "None".to_string();
        }
        self.dimensions
            .iter()
            .map(|d| format!("{}={}", d.name, d.value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Everything the provider told us besides the notification itself
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmContext {
    /// Metric condition, when the provider sent one
    pub trigger: Option<MetricTrigger>,
    /// ARN of the alarm
    pub alarm_arn: Option<String>,
    /// Region as reported by the provider
    pub region: Option<String>,
    /// Account that owns the alarm
    pub account_id: Option<String>,
    /// Resource the alarm watches (the `FunctionName` dimension for Lambda alarms)
    pub source_resource: Option<String>,
    /// Log entry that most likely caused the alarm, filled by a [`LogLookup`]
    ///
    /// [`LogLookup`]: crate::enrich::LogLookup
    pub causing_log: Option<String>,
}

impl AlarmContext {
    /// Fill `source_resource` from the trigger when the provider did not name one
    pub fn with_derived_resource(mut self) -> Self {
        if self.source_resource.is_none() {
            self.source_resource = self
                .trigger
                .as_ref()
                .and_then(|t| t.dimension("FunctionName"))
                .map(String::from);
        }
        self
    }
}
