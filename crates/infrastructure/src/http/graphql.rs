//! GraphQL request/response shaping.
//!
//! A GraphQL request travels as an HTTP POST whose body wraps the raw query
//! in a `{"query": ...}` envelope. On the way back, the standard response
//! envelope is unwrapped so callers see the payload they asked for.

use serde_json::Value;

/// Wraps a raw query string in the standard request envelope.
pub(crate) fn wrap_query(query: &str) -> String {
    serde_json::json!({ "query": query }).to_string()
}

/// Reformats a GraphQL response body for display.
///
/// When the body parses as an object with a `data` member, returns the
/// pretty-printed `data` payload; if `errors` is present and non-empty the
/// whole `{data, errors}` pair is kept so failures stay visible. Anything
/// that does not look like a GraphQL envelope is returned unchanged.
pub(crate) fn reformat_response(body: &str) -> String {
    let Ok(Value::Object(envelope)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    if !envelope.contains_key("data") {
        return body.to_string();
    }

    let has_errors = envelope
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty());

    let display = if has_errors {
        let mut kept = serde_json::Map::new();
        if let Some(data) = envelope.get("data") {
            kept.insert("data".to_string(), data.clone());
        }
        if let Some(errors) = envelope.get("errors") {
            kept.insert("errors".to_string(), errors.clone());
        }
        Value::Object(kept)
    } else {
        envelope.get("data").cloned().unwrap_or(Value::Null)
    };

    serde_json::to_string_pretty(&display).unwrap_or_else(|_| body.to_string())
}
