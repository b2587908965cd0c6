//! Alarm notification data models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// CloudWatch emits `2024-01-01T00:00:00.000+0000`, which is not RFC 3339
const CLOUDWATCH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// State of a monitored alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    /// Metric is within its threshold
    Ok,
    /// Metric crossed its threshold
    Alarm,
    /// Not enough data to evaluate the alarm
    InsufficientData,
}

impl AlarmState {
    /// Wire name used by CloudWatch
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmState::Ok => "OK",
            AlarmState::Alarm => "ALARM",
            AlarmState::InsufficientData => "INSUFFICIENT_DATA",
        }
    }

    /// Severity label used in subjects and detail sections
    pub fn severity(&self) -> Severity {
        match self {
            AlarmState::Alarm => Severity::Critical,
            AlarmState::InsufficientData => Severity::Warning,
            AlarmState::Ok => Severity::Resolved,
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OK" => Ok(AlarmState::Ok),
            "ALARM" => Ok(AlarmState::Alarm),
            "INSUFFICIENT_DATA" => Ok(AlarmState::InsufficientData),
            other => Err(Error::malformed(
                "state",
                format!("unknown alarm state {other:?}"),
            )),
        }
    }
}

/// Severity derived from the new alarm state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Alarm fired
    Critical,
    /// Alarm could not be evaluated
    Warning,
    /// Alarm returned to OK
    Resolved,
}

impl Severity {
    /// Upper-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated alarm state-change notification.
///
/// Values of this type can only be built through [`AlarmNotification::new`]
/// or [`AlarmNotificationDraft::validate`], so every instance has a non-empty
/// alarm name, two known states and an absolute timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmNotification {
    alarm_name: String,
    old_state: AlarmState,
    new_state: AlarmState,
    reason: String,
    timestamp: DateTime<Utc>,
}

impl AlarmNotification {
    /// Build a notification from already-typed parts
    pub fn new(
        alarm_name: impl Into<String>,
        old_state: AlarmState,
        new_state: AlarmState,
        reason: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        let alarm_name = alarm_name.into();
        if alarm_name.trim().is_empty() {
            return Err(Error::malformed("alarm_name", "must not be empty"));
        }

        Ok(Self {
            alarm_name,
            old_state,
            new_state,
            reason: reason.into(),
            timestamp,
        })
    }

    /// Name of the alarm
    pub fn alarm_name(&self) -> &str {
        &self.alarm_name
    }

    /// State before the transition
    pub fn old_state(&self) -> AlarmState {
        self.old_state
    }

    /// State after the transition
    pub fn new_state(&self) -> AlarmState {
        self.new_state
    }

    /// Cause reported by the monitoring engine, possibly empty
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// When the transition happened
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Severity of the new state
    pub fn severity(&self) -> Severity {
        self.new_state.severity()
    }

    /// Whether the alarm actually changed state
    pub fn is_transition(&self) -> bool {
        self.old_state != self.new_state
    }
}

/// An unvalidated, flat alarm notification as received at the boundary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmNotificationDraft {
    /// Alarm name
    #[serde(default, alias = "alarm_name", alias = "alarmName")]
    pub alarm: Option<String>,

    /// Previous state
    #[serde(default, alias = "old_state", alias = "oldState")]
    pub old: Option<String>,

    /// Current state
    #[serde(default, alias = "new_state", alias = "newState")]
    pub new: Option<String>,

    /// Human-readable cause
    #[serde(default)]
    pub reason: Option<String>,

    /// Time of the transition
    #[serde(default, alias = "time")]
    pub timestamp: Option<String>,
}

impl AlarmNotificationDraft {
    /// Validate every required field and build an [`AlarmNotification`]
    pub fn validate(&self) -> Result<AlarmNotification> {
        let alarm_name = required("alarm_name", self.alarm.as_deref())?;
        let old_state = parse_state("old_state", self.old.as_deref())?;
        let new_state = parse_state("new_state", self.new.as_deref())?;
        let timestamp = parse_timestamp(required("timestamp", self.timestamp.as_deref())?)?;

        AlarmNotification::new(
            alarm_name,
            old_state,
            new_state,
            self.reason.clone().unwrap_or_default(),
            timestamp,
        )
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(Error::malformed(field, "must not be empty")),
        None => Err(Error::missing(field)),
    }
}

fn parse_state(field: &str, value: Option<&str>) -> Result<AlarmState> {
    required(field, value)?
        .parse()
        .map_err(|e: Error| match e {
            Error::MalformedNotification { reason, .. } => Error::malformed(field, reason),
            other => other,
        })
}

/// Parse an absolute timestamp in RFC 3339 or CloudWatch form
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::<FixedOffset>::parse_from_str(value, CLOUDWATCH_TIME_FORMAT))
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            Error::malformed(
                "timestamp",
                format!("{value:?} is not an absolute time: {e}"),
            )
        })
}

/// Render a timestamp as UTC RFC 3339 with the shortest exact precision
pub fn render_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
