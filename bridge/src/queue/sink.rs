//! The seam between the HTTP layer and the broker.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::event::GithubEvent;

/// Lifecycle of the one-time broker setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherState {
    /// Setup has not started.
    Disconnected,
    /// Connecting, opening the channel or declaring the exchange.
    Connecting,
    /// Exchange declared, events can be published.
    Ready,
    /// Setup failed. There is no reconnection, a restart is required.
    Failed,
}

/// Destination for transformed webhook events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send(&self, event: &GithubEvent) -> Result<()>;

    fn state(&self) -> PublisherState;
}
