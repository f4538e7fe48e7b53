//! Errors raised while turning a webhook request into a publishable event.

use serde_json::Value;
use thiserror::Error;

/// Failure in the synchronous transform chain.
///
/// The `Display` text is returned verbatim as the body of the `400` response.
#[derive(Debug, Error)]
pub enum EventError {
    /// A push event date could not be read as a point in time.
    #[error("invalid timestamp in repository.{field}: {value}")]
    InvalidTimestamp { field: &'static str, value: Value },
}
