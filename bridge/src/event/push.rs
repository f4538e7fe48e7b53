//! Push event classification and normalization.
//!
//! GitHub's push payload reports `repository.created_at` and
//! `repository.pushed_at` as epoch seconds while every other event type uses
//! ISO-8601 strings. Push events get both dates rewritten so consumers see a
//! single representation, and their headers trimmed to the GitHub pair.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use super::error::EventError;
use super::types::{InboundRequest, PUSH_EVENT};

/// Repository fields rewritten to ISO-8601 on push events.
const DATE_FIELDS: [&str; 2] = ["created_at", "pushed_at"];

/// Offset-less layouts, read as UTC.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Layouts with a colon-less numeric offset, which RFC 3339 parsing rejects.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f %z"];

/// Whether the request carries `x-github-event: push`.
pub fn is_push_event(request: &InboundRequest) -> bool {
    request.github_headers().event_type == Some(PUSH_EVENT)
}

/// Trim headers to the GitHub pair and rewrite repository dates to ISO-8601.
///
/// Missing `repository` or date fields are left alone. Running this on an
/// already normalized request yields the same request.
pub fn normalize_push(request: InboundRequest) -> Result<InboundRequest, EventError> {
    let headers = request.github_headers().to_map();
    let mut body = request.body;

    if let Some(repository) = body.get_mut("repository").and_then(Value::as_object_mut) {
        for field in DATE_FIELDS {
            if let Some(value) = repository.get_mut(field) {
                let iso = iso_date(field, value)?;
                debug!(field = field, original = %value, normalized = %iso, "push_date_normalized");
                *value = Value::String(iso);
            }
        }
    }

    Ok(InboundRequest::new(headers, body))
}

/// Format a JSON date value as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
///
/// Numbers and digit-only strings are epoch seconds. Strings may be RFC 3339,
/// RFC 2822, a naive date-time (UTC) or a bare date (UTC midnight).
pub fn iso_date(field: &'static str, value: &Value) -> Result<String, EventError> {
    let parsed = match value {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => from_epoch_seconds(secs),
            None => n.as_f64().and_then(from_fractional_seconds),
        },
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    };

    parsed
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| EventError::InvalidTimestamp {
            field,
            value: value.clone(),
        })
}

fn from_epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    let millis = secs.checked_mul(1000)?;
    Utc.timestamp_millis_opt(millis).single()
}

fn from_fractional_seconds(secs: f64) -> Option<DateTime<Utc>> {
    let millis = (secs * 1000.0).round();
    if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_millis_opt(millis as i64).single()
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }

    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok().and_then(from_epoch_seconds);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;

    const NEW_YEAR: &str = "2021-01-01T00:00:00.000Z";

    fn request(event: &str, body: Value) -> InboundRequest {
        let mut headers = BTreeMap::new();
        headers.insert("x-github-event".to_string(), event.to_string());
        headers.insert("x-github-delivery".to_string(), "72d3162e".to_string());
        headers.insert("x-hub-signature".to_string(), "sha1=deadbeef".to_string());
        headers.insert("content-type".to_string(), "application/json".to_string());
        InboundRequest::new(headers, body)
    }

    #[test]
    fn test_is_push_event() {
        assert!(is_push_event(&request("push", json!({}))));
        assert!(!is_push_event(&request("pull_request", json!({}))));
        assert!(!is_push_event(&request("Push", json!({}))));
        assert!(!is_push_event(&InboundRequest::new(BTreeMap::new(), json!({}))));
    }

    #[test]
    fn test_iso_date_accepts_common_representations() {
        let inputs = [
            json!(1609459200),
            json!(1609459200.0),
            json!("1609459200"),
            json!("2021-01-01T00:00:00Z"),
            json!("2021-01-01T01:00:00+01:00"),
            json!("2021-01-01T01:00:00+0100"),
            json!("Fri, 01 Jan 2021 00:00:00 +0000"),
            json!("2021-01-01T00:00:00"),
            json!("2021-01-01 00:00:00"),
            json!("2021-01-01"),
            json!(NEW_YEAR),
        ];

        for input in inputs {
            assert_eq!(iso_date("created_at", &input).unwrap(), NEW_YEAR, "input {input}");
        }
    }

    #[test]
    fn test_iso_date_keeps_milliseconds() {
        assert_eq!(
            iso_date("pushed_at", &json!(1609459200.25)).unwrap(),
            "2021-01-01T00:00:00.250Z"
        );
        assert_eq!(
            iso_date("pushed_at", &json!("2021-01-01T00:00:00.5Z")).unwrap(),
            "2021-01-01T00:00:00.500Z"
        );
    }

    #[test]
    fn test_iso_date_rejects_garbage() {
        for input in [json!("yesterday"), json!(null), json!(true), json!([1]), json!("")] {
            let err = iso_date("created_at", &input).unwrap_err();
            assert!(matches!(err, EventError::InvalidTimestamp { field: "created_at", .. }));
        }

        let err = iso_date("pushed_at", &json!("soon")).unwrap_err();
        assert_eq!(err.to_string(), "invalid timestamp in repository.pushed_at: \"soon\"");
    }

    #[test]
    fn test_normalize_push_rewrites_dates_and_trims_headers() {
        let body = json!({
            "ref": "refs/heads/main",
            "repository": {
                "id": 1296269,
                "created_at": 1609459200,
                "pushed_at": "2021-01-01T00:00:00Z",
                "updated_at": "2021-02-01T00:00:00Z"
            }
        });

        let normalized = normalize_push(request("push", body)).unwrap();

        assert_eq!(normalized.headers.len(), 2);
        assert_eq!(normalized.headers["x-github-event"], "push");
        assert_eq!(normalized.headers["x-github-delivery"], "72d3162e");
        assert!(!normalized.headers.contains_key("x-hub-signature"));

        assert_eq!(
            normalized.body,
            json!({
                "ref": "refs/heads/main",
                "repository": {
                    "id": 1296269,
                    "created_at": NEW_YEAR,
                    "pushed_at": NEW_YEAR,
                    "updated_at": "2021-02-01T00:00:00Z"
                }
            })
        );
    }

    #[test]
    fn test_normalize_push_is_idempotent() {
        let body = json!({"repository": {"created_at": 1262304000, "pushed_at": 1609459200}});

        let once = normalize_push(request("push", body)).unwrap();
        let twice = normalize_push(once.clone()).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.body["repository"]["created_at"], "2010-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_normalize_push_without_repository() {
        let body = json!({"zen": "Keep it logically awesome."});
        let normalized = normalize_push(request("push", body.clone())).unwrap();
        assert_eq!(normalized.body, body);
    }

    #[test]
    fn test_normalize_push_surfaces_bad_date() {
        let body = json!({"repository": {"created_at": "not a date", "pushed_at": 1609459200}});
        assert!(normalize_push(request("push", body)).is_err());
    }
}
