//! Request and event types for the webhook-to-exchange pipeline.

use std::collections::BTreeMap;

use axum::http::HeaderMap;
use serde_json::{Map, Value};

/// Header carrying the GitHub event type, used as the routing key.
pub const EVENT_TYPE_HEADER: &str = "x-github-event";

/// Header carrying the unique GitHub delivery id.
pub const DELIVERY_ID_HEADER: &str = "x-github-delivery";

/// Event type that gets date coercion and header trimming.
pub const PUSH_EVENT: &str = "push";

/// An inbound webhook call: lowercase header names and the parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundRequest {
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl InboundRequest {
    pub fn new(headers: BTreeMap<String, String>, body: Value) -> Self {
        Self { headers, body }
    }

    /// Build a request from HTTP headers.
    ///
    /// Repeated headers are joined with `", "`. Non-UTF-8 bytes are replaced
    /// rather than dropped so every header survives into the record.
    pub fn from_http(headers: &HeaderMap, body: Value) -> Self {
        let mut flat: BTreeMap<String, String> = BTreeMap::new();

        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes());
            flat.entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert_with(|| value.into_owned());
        }

        Self::new(flat, body)
    }

    pub fn github_headers(&self) -> GithubHeaders<'_> {
        GithubHeaders {
            event_type: self.headers.get(EVENT_TYPE_HEADER).map(String::as_str),
            delivery_id: self.headers.get(DELIVERY_ID_HEADER).map(String::as_str),
        }
    }
}

/// Read-only view of the GitHub-specific headers of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GithubHeaders<'a> {
    pub event_type: Option<&'a str>,
    pub delivery_id: Option<&'a str>,
}

impl GithubHeaders<'_> {
    /// The whitelisted header subset kept on push events.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(event_type) = self.event_type {
            headers.insert(EVENT_TYPE_HEADER.to_string(), event_type.to_string());
        }
        if let Some(delivery_id) = self.delivery_id {
            headers.insert(DELIVERY_ID_HEADER.to_string(), delivery_id.to_string());
        }
        headers
    }
}

/// A flattened event record ready for publishing.
#[derive(Debug, Clone, PartialEq)]
pub struct GithubEvent {
    routing_key: Option<String>,
    record: Map<String, Value>,
}

impl GithubEvent {
    pub(crate) fn new(routing_key: Option<String>, record: Map<String, Value>) -> Self {
        Self { routing_key, record }
    }

    /// Routing key for the exchange: the original `x-github-event` value.
    pub fn routing_key(&self) -> Option<&str> {
        self.routing_key.as_deref()
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn delivery_id(&self) -> Option<&str> {
        self.record.get(DELIVERY_ID_HEADER).and_then(Value::as_str)
    }

    /// JSON text of the record, as sent to the broker.
    pub fn payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.record)
    }
}
