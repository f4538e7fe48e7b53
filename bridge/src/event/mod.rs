//! Webhook-to-event transformation.
//!
//! ## Processing Flow
//!
//! ```text
//! InboundRequest → is_push_event? ─ yes → normalize_push ─┐
//!                                 └ no  → (unchanged) ────┴→ merge → GithubEvent
//! ```
//!
//! Everything here is synchronous and side-effect free. Any error is
//! reported back to the webhook caller as a `400`.

pub mod error;
pub mod merge;
pub mod push;
pub mod types;

use tracing::debug;

pub use error::EventError;
pub use merge::merge;
pub use push::{is_push_event, iso_date, normalize_push};
pub use types::{
    GithubEvent, GithubHeaders, InboundRequest, DELIVERY_ID_HEADER, EVENT_TYPE_HEADER, PUSH_EVENT,
};

/// Turn an inbound request into a publishable event.
///
/// Push events get their headers trimmed and repository dates rewritten.
/// All other events keep their full headers and untouched body.
pub fn transform(request: InboundRequest) -> Result<GithubEvent, EventError> {
    let request = if is_push_event(&request) {
        debug!("push_event_normalizing");
        normalize_push(request)?
    } else {
        request
    };

    Ok(merge(request))
}
