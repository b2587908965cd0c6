//! Configuration management for AlarmRelay
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, and `ALARMRELAY__SECTION__KEY` environment variables.

use std::path::Path;
use std::time::Duration;

use config::{Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "ALARMRELAY";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Application identity used in logs
    pub application: ApplicationConfig,

    /// Formatter configuration
    pub formatter: FormatterConfig,

    /// Dispatch configuration
    pub dispatch: DispatchConfig,

    /// Causing-log lookup configuration
    pub log_lookup: LogLookupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional TOML file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot work at runtime
    pub fn validate(&self) -> Result<()> {
        if self.formatter.subject_max_len == 0 {
            return Err(Error::config("formatter.subject_max_len must be at least 1"));
        }

        match self.dispatch.channel {
            ChannelKind::Sns => {
                let arn = self.dispatch.topic_arn.as_deref().unwrap_or_default();
                if !arn.starts_with("arn:") {
                    return Err(Error::config(
                        "dispatch.topic_arn must be an SNS topic ARN when channel = \"sns\"",
                    ));
                }
            }
            ChannelKind::Webhook => {
                let raw = self.dispatch.webhook_url.as_deref().ok_or_else(|| {
                    Error::config("dispatch.webhook_url is required when channel = \"webhook\"")
                })?;
                url::Url::parse(raw)
                    .map_err(|e| Error::config(format!("dispatch.webhook_url: {e}")))?;
            }
            ChannelKind::Log => {}
        }

        if self.log_lookup.enabled && self.log_lookup.lookback.is_zero() {
            return Err(Error::config("log_lookup.lookback must be greater than zero"));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// HTTP API port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Application identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Deployment environment tag
    pub environment: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "EventbridgeAlarmError".to_string(),
            environment: "DEV".to_string(),
        }
    }
}

/// Formatter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    /// Append the metric/resource details section
    pub include_details: bool,
    /// Append the provider payload as pretty JSON
    pub include_raw_payload: bool,
    /// Maximum subject length in characters (SNS allows 100)
    pub subject_max_len: usize,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_details: false,
            include_raw_payload: false,
            subject_max_len: 100,
        }
    }
}

/// Which notification channel formatted messages go to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Log only (dry run)
    #[default]
    Log,
    /// AWS SNS topic
    Sns,
    /// Generic HTTP webhook
    Webhook,
}

/// Dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Channel kind
    pub channel: ChannelKind,
    /// Target topic for the `sns` channel
    pub topic_arn: Option<String>,
    /// Region override for the `sns` channel
    pub region: Option<String>,
    /// Target URL for the `webhook` channel
    pub webhook_url: Option<String>,
    /// Request timeout for network channels
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            channel: ChannelKind::Log,
            topic_arn: None,
            region: None,
            webhook_url: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Causing-log lookup for alarms on Lambda functions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogLookupConfig {
    /// Search CloudWatch Logs before rendering
    pub enabled: bool,
    /// How far back from now to search
    #[serde(with = "humantime_serde")]
    pub lookback: Duration,
    /// CloudWatch Logs filter pattern
    pub filter_pattern: String,
    /// Region override for the logs client
    pub region: Option<String>,
}

impl Default for LogLookupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            lookback: Duration::from_secs(300),
            filter_pattern: "?ERROR ?Exception ?Fail".to_string(),
            region: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format (json or pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
