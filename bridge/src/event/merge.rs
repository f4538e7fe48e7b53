//! Flattening of headers and body into a single event record.

use serde_json::{Map, Value};

use super::types::{GithubEvent, InboundRequest, EVENT_TYPE_HEADER};

/// Merge headers and body into one flat record.
///
/// Body fields are laid over the headers; array bodies contribute their
/// elements under their indexes and scalar bodies contribute nothing. The
/// `x-github-event` field is then reset to the header value, which also
/// becomes the routing key. Without that header the event has no routing key.
pub fn merge(request: InboundRequest) -> GithubEvent {
    let routing_key = request.headers.get(EVENT_TYPE_HEADER).cloned();

    let mut record: Map<String, Value> = request
        .headers
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();

    match request.body {
        Value::Object(body) => record.extend(body),
        Value::Array(items) => record.extend(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item)),
        ),
        _ => {}
    }

    if let Some(routing_key) = &routing_key {
        record.insert(EVENT_TYPE_HEADER.to_string(), Value::String(routing_key.clone()));
    }

    GithubEvent::new(routing_key, record)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_flattens_headers_and_body() {
        let request = InboundRequest::new(
            headers(&[("x-github-event", "issues"), ("user-agent", "GitHub-Hookshot/1")]),
            json!({"action": "opened", "issue": {"number": 7}}),
        );

        let event = merge(request);

        assert_eq!(event.routing_key(), Some("issues"));
        assert_eq!(
            Value::Object(event.record().clone()),
            json!({
                "x-github-event": "issues",
                "user-agent": "GitHub-Hookshot/1",
                "action": "opened",
                "issue": {"number": 7}
            })
        );
    }

    #[test]
    fn test_body_cannot_override_event_type() {
        let request = InboundRequest::new(
            headers(&[("x-github-event", "issues")]),
            json!({"x-github-event": "push", "user-agent": "from-body"}),
        );

        let event = merge(request);

        assert_eq!(event.routing_key(), Some("issues"));
        assert_eq!(event.record()["x-github-event"], "issues");
        assert_eq!(event.record()["user-agent"], "from-body");
    }

    #[test]
    fn test_missing_event_type_has_no_routing_key() {
        let request = InboundRequest::new(headers(&[("user-agent", "curl/8.0")]), json!({"a": 1}));

        let event = merge(request);

        assert_eq!(event.routing_key(), None);
        assert_eq!(
            Value::Object(event.record().clone()),
            json!({"user-agent": "curl/8.0", "a": 1})
        );
    }

    #[test]
    fn test_array_body_merges_by_index() {
        let request = InboundRequest::new(headers(&[("x-github-event", "ping")]), json!(["a", "b"]));

        let event = merge(request);

        assert_eq!(
            Value::Object(event.record().clone()),
            json!({"x-github-event": "ping", "0": "a", "1": "b"})
        );
    }

    #[test]
    fn test_scalar_body_contributes_nothing() {
        let request = InboundRequest::new(headers(&[("x-github-event", "ping")]), json!(42));
        let event = merge(request);
        assert_eq!(Value::Object(event.record().clone()), json!({"x-github-event": "ping"}));
    }
}
