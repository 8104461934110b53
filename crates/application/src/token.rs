//! Token extraction from response bodies.
//!
//! After a 2xx result, callers may probe the body for a bearer token and
//! feed it back into the resolver's session scope via
//! [`crate::resolver::VariableResolver::add_session_variable`]. The engine
//! never does this automatically.

/// Probes a JSON body for a top-level `access_token` or `token` string
/// field, in that order.
#[must_use]
pub fn extract_token(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    object
        .get("access_token")
        .or_else(|| object.get("token"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_access_token_wins_over_token() {
        let body = r#"{"access_token": "abc", "token": "def"}"#;
        assert_eq!(extract_token(body), Some("abc".to_string()));
    }

    #[test]
    fn test_token_fallback() {
        assert_eq!(
            extract_token(r#"{"token": "def"}"#),
            Some("def".to_string())
        );
    }

    #[test]
    fn test_no_token() {
        assert_eq!(extract_token(r#"{"user": "alice"}"#), None);
        assert_eq!(extract_token("not json"), None);
        assert_eq!(extract_token(r#"{"token": 42}"#), None);
    }
}
