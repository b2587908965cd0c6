//! # AlarmRelay
//!
//! Reformats CloudWatch alarm state changes into plain-text notifications.
//!
//! An alarm event arrives from SNS or EventBridge, is normalized into an
//! [`AlarmNotification`](models::AlarmNotification), rendered into a
//! multiline email body and published to a notification channel.
//!
//! ## Architecture
//!
//! - **Ingest**: provider envelopes to a flat notification
//! - **Enrich**: optional causing-log lookup for Lambda alarms
//! - **Formatter**: pure notification-to-text rendering
//! - **Dispatch**: SNS topic, webhook or log channel
//! - **Relay**: ingest, format and dispatch per event
//! - **API**: HTTP surface for the relay
//!
//! ## Quick Start
//!
//! ```bash
//! # Render an event without publishing it
//! alarmrelay format --input event.json
//!
//! # Serve the relay over HTTP
//! alarmrelay serve
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod config;
pub mod dispatch;
pub mod enrich;
pub mod error;
pub mod formatter;
pub mod ingest;
pub mod models;
pub mod relay;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::dispatch::{NotificationChannel, PublishReceipt};
    pub use crate::error::{Error, Result};
    pub use crate::formatter::{format_body, AlarmFormatter, FormattedMessage};
    pub use crate::models::*;
    pub use crate::relay::AlarmRelay;
}
