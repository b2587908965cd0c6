//! API handlers for the HTTP REST API

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::Error;
use crate::formatter::FormattedMessage;
use crate::models::envelope::SnsEvent;
use crate::relay::{AlarmRelay, RelayOutcome};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Relay invoked by every event endpoint
    pub relay: Arc<AlarmRelay>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Configured notification channel
    pub channel: String,
}

/// Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        channel: state.relay.channel_name().to_string(),
    })
}

/// Relay an SNS delivery of CloudWatch alarm messages
pub async fn relay_sns(
    State(state): State<AppState>,
    Json(event): Json<SnsEvent>,
) -> (StatusCode, Json<RelayOutcome>) {
    let outcome = state.relay.handle_sns_event(&event).await;
    let status = StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::OK);
    (status, Json(outcome))
}

/// Single-event relay response
#[derive(Serialize)]
pub struct RelayEventResponse {
    /// Channel that delivered the message
    pub channel: String,
    /// Identifier assigned by the channel
    pub message_id: Option<String>,
}

/// Relay one EventBridge alarm state change event
pub async fn relay_eventbridge(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> Result<Json<RelayEventResponse>, (StatusCode, String)> {
    let receipt = state
        .relay
        .handle_eventbridge_event(&event)
        .await
        .map_err(error_response)?;

    Ok(Json(RelayEventResponse {
        channel: receipt.channel,
        message_id: receipt.message_id,
    }))
}

/// Render an event without publishing it
pub async fn format_event(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> Result<Json<FormattedMessage>, (StatusCode, String)> {
    let message = state.relay.preview(&event).map_err(error_response)?;
    Ok(Json(message))
}

fn error_response(e: Error) -> (StatusCode, String) {
    let status = match &e {
        Error::MalformedNotification { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Publish(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
