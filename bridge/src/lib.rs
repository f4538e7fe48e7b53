//! rabbitmq-github-events - GitHub webhook to RabbitMQ bridge.
//!
//! Receives GitHub webhooks over HTTP, normalizes push events and republishes
//! every event onto a RabbitMQ exchange routed by its event type.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → POST /github/events → transform → Publisher → exchange (routing key = x-github-event)
//! ```

pub mod config;
pub mod event;
pub mod queue;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use event::{transform, EventError, GithubEvent, InboundRequest};
pub use queue::{AmqpBroker, EventSink, ExchangeSpec, Publisher, PublisherState};
pub use web::AppState;
