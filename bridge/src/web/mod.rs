//! Web server module for receiving GitHub webhooks.
//!
//! Routes:
//! - `POST /github/events`: transform the webhook and hand it to the publisher
//! - `GET /health`: liveness plus broker setup state
//! - `GET /`: service name

pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{github_events, health, index, AppState, HealthResponse};

/// Largest accepted webhook body.
pub const MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Build the router with all routes and layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/github/events", post(github_events))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
