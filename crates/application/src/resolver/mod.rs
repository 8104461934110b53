//! Layered variable resolution
//!
//! Resolves `{{name}}` placeholders against four scopes and executes
//! `$(command)` shell expressions. Resolution is a three-pass process:
//! shell expressions first, then placeholders, then shell expressions once
//! more over the substituted text so commands carried inside variable
//! values still run. A command that *emits* `{{name}}` text is never
//! substituted; there is no fourth pass.
//!
//! Expected failures degrade instead of aborting: an unresolved placeholder
//! or failed command is left byte-for-byte in the output and recorded in
//! the resolver's cumulative lists.

pub mod parser;
mod shell;

use std::collections::HashMap;

use comet_domain::{RequestSpec, VariableValue, WebSocketRequest};
use comet_domain::websocket::StepDirection;

use parser::placeholder_refs;

/// Prefix routing a placeholder to the process-environment scope.
const ENV_PREFIX: &str = "env.";

/// The layered variable resolver.
///
/// Precedence for bare names is strict and total: cli > session > profile.
/// `env.NAME` placeholders resolve only from the env scope and never fall
/// back to the other three.
///
/// The mutable bookkeeping (`unresolved`, `shell_errors`) is meant for
/// single-threaded, single-resolution use. Concurrent `resolve` calls on
/// one instance are unsupported; serialize access or use one resolver per
/// in-flight request.
#[derive(Debug, Default)]
pub struct VariableResolver {
    profile: HashMap<String, VariableValue>,
    session: HashMap<String, VariableValue>,
    cli: HashMap<String, VariableValue>,
    env: HashMap<String, String>,
    unresolved: Vec<String>,
    shell_errors: Vec<String>,
}

impl VariableResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver seeded with the current process environment.
    #[must_use]
    pub fn with_process_env() -> Self {
        Self {
            env: std::env::vars().collect(),
            ..Self::default()
        }
    }

    /// Replaces the profile scope, builder-style.
    #[must_use]
    pub fn with_profile_vars(mut self, vars: HashMap<String, VariableValue>) -> Self {
        self.profile = vars;
        self
    }

    /// Replaces the CLI scope, builder-style.
    #[must_use]
    pub fn with_cli_vars(mut self, vars: HashMap<String, VariableValue>) -> Self {
        self.cli = vars;
        self
    }

    /// Replaces the env scope, builder-style.
    #[must_use]
    pub fn with_env_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.env = vars;
        self
    }

    /// Sets a single profile variable, builder-style.
    #[must_use]
    pub fn with_profile_var(
        mut self,
        name: impl Into<String>,
        value: impl Into<VariableValue>,
    ) -> Self {
        self.profile.insert(name.into(), value.into());
        self
    }

    /// Sets a single CLI variable, builder-style.
    #[must_use]
    pub fn with_cli_var(
        mut self,
        name: impl Into<String>,
        value: impl Into<VariableValue>,
    ) -> Self {
        self.cli.insert(name.into(), value.into());
        self
    }

    /// Sets a single env variable, builder-style.
    #[must_use]
    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Adds a session variable for reuse by subsequent resolutions, e.g.
    /// a token auto-extracted from a prior response.
    pub fn add_session_variable(
        &mut self,
        name: impl Into<String>,
        value: impl Into<VariableValue>,
    ) {
        self.session.insert(name.into(), value.into());
    }

    /// Resolves all substitutions in `input`.
    ///
    /// Passes, in fixed order: shell expressions, placeholders, shell
    /// expressions again over the substituted text.
    pub async fn resolve(&mut self, input: &str) -> String {
        let pass_one = shell::expand(input, &mut self.shell_errors).await;
        let pass_two = self.substitute_placeholders(&pass_one);
        shell::expand(&pass_two, &mut self.shell_errors).await
    }

    /// Resolves the URL, every header value, and the body of a request.
    ///
    /// Never fails: unresolved placeholders and failed shell commands
    /// degrade into the cumulative lists and the original text passes
    /// through.
    pub async fn resolve_request(&mut self, request: &RequestSpec) -> RequestSpec {
        let mut resolved = request.clone();
        resolved.url = self.resolve(&request.url).await;
        for header in &mut resolved.headers {
            header.value = self.resolve(&header.value).await;
        }
        resolved.body = self.resolve(&request.body).await;
        resolved
    }

    /// Resolves the URL, handshake header values, and the content of every
    /// scripted send step of a WebSocket request.
    pub async fn resolve_ws_request(&mut self, request: &WebSocketRequest) -> WebSocketRequest {
        let mut resolved = request.clone();
        resolved.url = self.resolve(&request.url).await;
        for (_, value) in &mut resolved.headers {
            *value = self.resolve(value).await;
        }
        for step in &mut resolved.messages {
            if step.direction == StepDirection::Send {
                step.content = self.resolve(&step.content).await;
            }
        }
        resolved
    }

    /// Placeholder names that failed to resolve, deduplicated, in first-miss
    /// order. Cumulative across calls; never cleared automatically.
    #[must_use]
    pub fn unresolved_variables(&self) -> &[String] {
        &self.unresolved
    }

    /// Formatted shell failure messages. Cumulative across calls; never
    /// cleared automatically.
    #[must_use]
    pub fn shell_errors(&self) -> &[String] {
        &self.shell_errors
    }

    fn substitute_placeholders(&mut self, input: &str) -> String {
        let refs = placeholder_refs(input);
        if refs.is_empty() {
            return input.to_string();
        }

        let mut result = String::with_capacity(input.len());
        let mut last_end = 0;

        for placeholder in refs {
            result.push_str(&input[last_end..placeholder.span.start]);
            match self.lookup(&placeholder.name) {
                Some(value) => result.push_str(&value),
                None => {
                    self.record_unresolved(&placeholder.name);
                    result.push_str(&input[placeholder.span.clone()]);
                }
            }
            last_end = placeholder.span.end;
        }

        result.push_str(&input[last_end..]);
        result
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(env_name) = name.strip_prefix(ENV_PREFIX) {
            // env.* is a disjoint namespace; no fallback to the other scopes.
            return self.env.get(env_name).cloned();
        }

        self.cli
            .get(name)
            .or_else(|| self.session.get(name))
            .or_else(|| self.profile.get(name))
            .map(|value| value.value().to_string())
    }

    fn record_unresolved(&mut self, name: &str) {
        if !self.unresolved.iter().any(|n| n == name) {
            self.unresolved.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comet_domain::{MultiValue, ScriptStep};
    use pretty_assertions::assert_eq;

    fn resolver_with_all_scopes() -> VariableResolver {
        VariableResolver::new()
            .with_profile_var("host", "profile.example.com")
            .with_profile_var("stage", "from-profile")
            .with_cli_var("stage", "from-cli")
            .with_env_var("stage", "from-env")
            .with_env_var("HOME", "/home/tester")
    }

    #[tokio::test]
    async fn test_precedence_cli_wins() {
        let mut resolver = resolver_with_all_scopes();
        resolver.add_session_variable("stage", "from-session");

        assert_eq!(resolver.resolve("{{stage}}").await, "from-cli");
    }

    #[tokio::test]
    async fn test_session_beats_profile() {
        let mut resolver = VariableResolver::new().with_profile_var("stage", "from-profile");
        resolver.add_session_variable("stage", "from-session");

        assert_eq!(resolver.resolve("{{stage}}").await, "from-session");
    }

    #[tokio::test]
    async fn test_env_namespace_is_disjoint() {
        let mut resolver = resolver_with_all_scopes();

        // env.stage reads only the env scope.
        assert_eq!(resolver.resolve("{{env.stage}}").await, "from-env");
        // A bare name never reads the env scope.
        assert_eq!(resolver.resolve("{{HOME}}").await, "{{HOME}}");
        assert_eq!(resolver.unresolved_variables(), ["HOME"]);
    }

    #[tokio::test]
    async fn test_env_miss_records_full_name() {
        let mut resolver = VariableResolver::new();
        assert_eq!(resolver.resolve("{{env.MISSING}}").await, "{{env.MISSING}}");
        assert_eq!(resolver.unresolved_variables(), ["env.MISSING"]);
    }

    #[tokio::test]
    async fn test_idempotent_without_substitutions() {
        let mut resolver = VariableResolver::new();
        let input = "plain text with {single} braces";
        assert_eq!(resolver.resolve(input).await, input);
        assert!(resolver.unresolved_variables().is_empty());
        assert!(resolver.shell_errors().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_fallback_and_dedup() {
        let mut resolver = VariableResolver::new();
        let input = "{{missing}} and {{missing}}";
        assert_eq!(resolver.resolve(input).await, input);
        assert_eq!(resolver.unresolved_variables(), ["missing"]);
    }

    #[tokio::test]
    async fn test_unresolved_is_cumulative_across_calls() {
        let mut resolver = VariableResolver::new();
        let _ = resolver.resolve("{{first}}").await;
        let _ = resolver.resolve("{{second}}").await;
        assert_eq!(resolver.unresolved_variables(), ["first", "second"]);
    }

    #[tokio::test]
    async fn test_shell_round_trip_through_variable() {
        // A profile value carrying a shell command is executed on pass 3.
        let mut resolver =
            VariableResolver::new().with_profile_var("greeting", "$(echo hello)");
        assert_eq!(resolver.resolve("{{greeting}}").await, "hello");
    }

    #[tokio::test]
    async fn test_shell_emitting_placeholder_is_not_substituted() {
        // Documented limitation: a command carried inside a variable value
        // runs on pass 3, after the only placeholder pass, so placeholder
        // text it emits stays literal.
        let mut resolver = VariableResolver::new()
            .with_profile_var("name", "world")
            .with_profile_var("cmd", "$(echo '{{name}}')");
        assert_eq!(resolver.resolve("{{cmd}}").await, "{{name}}");
    }

    #[tokio::test]
    async fn test_first_pass_shell_output_is_substituted() {
        // The inverse of the limitation above: a command already present in
        // the input runs on pass 1 and its output goes through pass 2.
        let mut resolver = VariableResolver::new().with_profile_var("name", "world");
        assert_eq!(resolver.resolve("$(echo '{{name}}')").await, "world");
    }

    #[tokio::test]
    async fn test_failed_shell_command_degrades() {
        let mut resolver = VariableResolver::new();
        assert_eq!(resolver.resolve("$(false)").await, "$(false)");
        assert_eq!(resolver.shell_errors().len(), 1);
    }

    #[tokio::test]
    async fn test_multi_value_resolves_active_option() {
        let multi = MultiValue::new(vec!["alpha".to_string(), "beta".to_string()])
            .with_alias("b", 1);
        let mut resolver = VariableResolver::new()
            .with_profile_var("target", VariableValue::Multi(multi.clone()));
        assert_eq!(resolver.resolve("{{target}}").await, "alpha");

        let mut switched = multi;
        assert!(switched.activate_alias("b"));
        let mut resolver =
            VariableResolver::new().with_profile_var("target", VariableValue::Multi(switched));
        assert_eq!(resolver.resolve("{{target}}").await, "beta");
    }

    #[tokio::test]
    async fn test_resolve_request_touches_url_headers_body() {
        let mut resolver = VariableResolver::new()
            .with_profile_var("host", "api.example.com")
            .with_profile_var("token", "abc123");
        let request = RequestSpec::post("https://{{host}}/v1")
            .with_header("Authorization", "Bearer {{token}}")
            .with_body(r#"{"host": "{{host}}"}"#);

        let resolved = resolver.resolve_request(&request).await;
        assert_eq!(resolved.url, "https://api.example.com/v1");
        assert_eq!(resolved.header("Authorization"), Some("Bearer abc123"));
        assert_eq!(resolved.body, r#"{"host": "api.example.com"}"#);
    }

    #[tokio::test]
    async fn test_resolve_ws_request_skips_receive_steps() {
        let mut resolver = VariableResolver::new().with_profile_var("greeting", "hi");
        let request = WebSocketRequest::new("ws://{{host}}/ws")
            .with_step(ScriptStep::send("hello", "{{greeting}}"))
            .with_step(ScriptStep::receive("reply", 5));

        let resolved = resolver.resolve_ws_request(&request).await;
        assert_eq!(resolved.messages[0].content, "hi");
        // Receive content carries no expectation and is left alone.
        assert_eq!(resolved.messages[1].content, "");
        // host was missing; URL text is preserved and recorded.
        assert_eq!(resolved.url, "ws://{{host}}/ws");
        assert_eq!(resolver.unresolved_variables(), ["host"]);
    }
}
