//! Webhook endpoint handlers.
//!
//! The GitHub handler only runs the synchronous transform before answering.
//! Publishing is spawned onto its own task and never delays or changes the
//! response; publish failures end up in the logs only.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::event::{self, InboundRequest};
use crate::queue::{EventSink, PublisherState};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sink: Arc<dyn EventSink>,
}

impl AppState {
    pub fn new<S: EventSink + 'static>(config: Config, sink: S) -> Self {
        Self {
            config: Arc::new(config),
            sink: Arc::new(sink),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub broker: PublisherState,
}

/// Health check endpoint. Always `200`; the broker state is informational.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        broker: state.sink.state(),
    })
}

pub async fn index(State(state): State<AppState>) -> String {
    state.config.service_name.clone()
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// GitHub webhook endpoint.
///
/// Responds `200 OK!` once the event is transformed, or `400` with the
/// error text when the transform fails.
///
/// A body sent without a JSON content type is read as `{}`, so the event
/// carries only its headers. Malformed or oversized JSON is still rejected.
pub async fn github_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, String) {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Object(Default::default()),
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "github_event_body_rejected");
            return (rejection.status(), rejection.body_text());
        }
    };

    let request = InboundRequest::from_http(&headers, body);
    let github = request.github_headers();
    info!(
        event_type = ?github.event_type,
        delivery_id = ?github.delivery_id,
        header_count = request.headers.len(),
        "github_event_received"
    );

    let event = match event::transform(request) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "github_event_rejected");
            return (StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let sink = Arc::clone(&state.sink);
    tokio::spawn(async move {
        match sink.send(&event).await {
            Ok(()) => info!(
                routing_key = ?event.routing_key(),
                delivery_id = ?event.delivery_id(),
                "github_event_enqueued"
            ),
            Err(e) => error!(
                routing_key = ?event.routing_key(),
                delivery_id = ?event.delivery_id(),
                error = %format!("{e:#}"),
                "github_event_publish_failed"
            ),
        }
    });

    (StatusCode::OK, "OK!".to_string())
}
