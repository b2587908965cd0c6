//! Data models for AlarmRelay

mod context;
// Wire structs; field names follow the AWS payloads
#[allow(missing_docs)]
pub mod envelope;
mod notification;

pub use context::*;
pub use notification::*;
