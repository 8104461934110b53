//! Request result types
//!
//! Every executor path produces a fully populated [`RequestResult`]; a
//! failed request is a result with the `error` field set, never a panic or
//! an early return without timing information.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP status code with semantic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Creates a new `StatusCode`.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric status code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is a 2xx success status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is any error status (4xx or 5xx).
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.0 >= 400 && self.0 < 600
    }

    /// Returns the canonical reason phrase for common status codes.
    #[must_use]
    pub const fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "Unknown",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

/// Outcome of a single HTTP or GraphQL request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RequestResult {
    /// HTTP status code. Zero when the request never reached a response.
    pub status: u16,
    /// Status text (e.g., "OK", "Not Found"). Empty when unknown.
    pub status_text: String,
    /// Response headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Response body. On size-cap or cancellation errors this holds the
    /// partial body accumulated so far.
    pub body: String,
    /// Wall-clock duration from call entry to completion or failure.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    /// Approximate request size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Error description. `None` only on full success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestResult {
    /// Creates a successful result from response data.
    #[must_use]
    pub fn success(
        status: impl Into<StatusCode>,
        headers: HashMap<String, String>,
        body: String,
        duration: Duration,
    ) -> Self {
        let status = status.into();
        let response_bytes = body.len();
        Self {
            status: status.as_u16(),
            status_text: status.reason_phrase().to_string(),
            headers,
            body,
            duration,
            request_bytes: 0,
            response_bytes,
            error: None,
        }
    }

    /// Creates a failed result that never received a response head.
    #[must_use]
    pub fn failure(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            duration,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Creates a result from an already-received response head, used by the
    /// streaming paths when the body read stops early (size cap or
    /// cancellation).
    #[must_use]
    pub fn from_head(status: impl Into<StatusCode>, headers: HashMap<String, String>) -> Self {
        let status = status.into();
        Self {
            status: status.as_u16(),
            status_text: status.reason_phrase().to_string(),
            headers,
            ..Self::default()
        }
    }

    /// Records the request size, builder-style.
    #[must_use]
    pub const fn with_request_bytes(mut self, bytes: usize) -> Self {
        self.request_bytes = bytes;
        self
    }

    /// Returns true if the result carries no error.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Attempts to parse the body as JSON.
    #[must_use]
    pub fn body_as_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Gets a response header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Returns a human-readable duration string (e.g., "124 ms").
    #[must_use]
    pub fn duration_display(&self) -> String {
        let millis = self.duration.as_millis();
        if millis < 1000 {
            format!("{millis} ms")
        } else {
            format!("{:.2} s", self.duration.as_secs_f64())
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_code_display() {
        assert_eq!(StatusCode::new(200).to_string(), "200 OK");
        assert_eq!(StatusCode::new(404).to_string(), "404 Not Found");
    }

    #[test]
    fn test_status_code_categories() {
        assert!(StatusCode::new(204).is_success());
        assert!(StatusCode::new(404).is_error());
        assert!(StatusCode::new(500).is_error());
        assert!(!StatusCode::new(200).is_error());
    }

    #[test]
    fn test_success_result() {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let result = RequestResult::success(
            200,
            headers,
            "hello".to_string(),
            Duration::from_millis(42),
        );

        assert!(result.is_ok());
        assert!(result.is_success());
        assert_eq!(result.status_text, "OK");
        assert_eq!(result.response_bytes, 5);
        assert_eq!(result.header("content-type"), Some(&"text/plain".to_string()));
    }

    #[test]
    fn test_failure_result_keeps_duration() {
        let result = RequestResult::failure("connection refused", Duration::from_millis(7));
        assert!(!result.is_ok());
        assert_eq!(result.status, 0);
        assert_eq!(result.duration, Duration::from_millis(7));
        assert_eq!(result.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_from_head() {
        let result = RequestResult::from_head(200, HashMap::new());
        assert_eq!(result.status, 200);
        assert_eq!(result.status_text, "OK");
        assert!(result.body.is_empty());
    }

    #[test]
    fn test_duration_display() {
        let result = RequestResult {
            duration: Duration::from_millis(150),
            ..Default::default()
        };
        assert_eq!(result.duration_display(), "150 ms");

        let result = RequestResult {
            duration: Duration::from_millis(1500),
            ..Default::default()
        };
        assert_eq!(result.duration_display(), "1.50 s");
    }
}
