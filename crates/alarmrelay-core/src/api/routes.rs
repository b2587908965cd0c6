//! API routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))

        // Event relay
        .route("/api/v1/events/sns", post(handlers::relay_sns))
        .route("/api/v1/events/eventbridge", post(handlers::relay_eventbridge))

        // Preview
        .route("/api/v1/format", post(handlers::format_event))

        .with_state(state)
}
