//! WebSocket session types.
//!
//! A [`WebSocketRequest`] describes one session: the endpoint, handshake
//! headers, and (for scripted mode) an ordered list of send/receive steps.
//! A [`SessionResult`] is what either mode hands back when the session ends.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::tls::TlsConfig;

/// A WebSocket session request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WebSocketRequest {
    /// The WebSocket URL (ws:// or wss://).
    pub url: String,
    /// Additional headers to send with the handshake.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Subprotocols to request.
    #[serde(default)]
    pub subprotocols: Vec<String>,
    /// TLS configuration, used when the scheme is wss.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
    /// Scripted message sequence. Declared order is execution order.
    #[serde(default)]
    pub messages: Vec<ScriptStep>,
}

impl WebSocketRequest {
    /// Creates a request for the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Adds a handshake header, builder-style.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Appends a scripted step, builder-style.
    #[must_use]
    pub fn with_step(mut self, step: ScriptStep) -> Self {
        self.messages.push(step);
        self
    }

    /// Validates the URL scheme.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or not a ws/wss URL.
    pub fn validate(&self) -> DomainResult<()> {
        if self.url.is_empty() {
            return Err(DomainError::InvalidUrl("URL cannot be empty".to_string()));
        }
        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(DomainError::InvalidUrl(
                "URL must start with ws:// or wss://".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns true if the URL uses the secure scheme.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.starts_with("wss://")
    }
}

/// Payload framing for a scripted step or a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// Text frame.
    #[default]
    Text,
    /// Text frame whose content must parse as JSON before sending.
    Json,
    /// Binary frame.
    Binary,
}

/// Direction of a scripted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDirection {
    /// Send the step's content to the peer.
    Send,
    /// Wait for any inbound message, bounded by the step's timeout.
    Receive,
}

const DEFAULT_STEP_TIMEOUT_SECS: u64 = 30;

/// One step of a scripted WebSocket sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Step name, used in timeout error messages.
    pub name: String,
    /// Payload framing. Ignored for receive steps.
    #[serde(default)]
    pub kind: PayloadKind,
    /// Content to send. Receive steps carry no expectation; an arriving
    /// message of any content satisfies them.
    #[serde(default)]
    pub content: String,
    /// Step direction.
    pub direction: StepDirection,
    /// Per-step wait deadline for receive steps.
    #[serde(default = "default_step_timeout")]
    pub timeout_secs: u64,
}

const fn default_step_timeout() -> u64 {
    DEFAULT_STEP_TIMEOUT_SECS
}

impl ScriptStep {
    /// Creates a send step with text content.
    #[must_use]
    pub fn send(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: PayloadKind::Text,
            content: content.into(),
            direction: StepDirection::Send,
            timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
        }
    }

    /// Creates a send step with JSON content.
    #[must_use]
    pub fn send_json(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind: PayloadKind::Json,
            ..Self::send(name, content)
        }
    }

    /// Creates a receive step with the given timeout.
    #[must_use]
    pub fn receive(name: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            kind: PayloadKind::Text,
            content: String::new(),
            direction: StepDirection::Receive,
            timeout_secs,
        }
    }
}

/// Direction of a logged session message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionDirection {
    /// Synthetic connect/disconnect/error notification.
    System,
    /// Message sent by the client.
    Sent,
    /// Message received from the peer.
    Received,
}

/// One append-only entry in a session's message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    /// Unique message ID.
    pub id: uuid::Uuid,
    /// Payload framing of the message.
    pub kind: PayloadKind,
    /// Message content (lossy UTF-8 for binary frames).
    pub content: String,
    /// When the message occurred.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Message direction.
    pub direction: SessionDirection,
    /// Payload size in bytes.
    pub bytes: usize,
}

impl SessionMessage {
    /// Creates a system notification entry.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            id: uuid::Uuid::now_v7(),
            kind: PayloadKind::Text,
            content,
            timestamp: chrono::Utc::now(),
            direction: SessionDirection::System,
            bytes,
        }
    }

    /// Creates a sent-message entry.
    #[must_use]
    pub fn sent(kind: PayloadKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            id: uuid::Uuid::now_v7(),
            kind,
            content,
            timestamp: chrono::Utc::now(),
            direction: SessionDirection::Sent,
            bytes,
        }
    }

    /// Creates a received-message entry.
    #[must_use]
    pub fn received(kind: PayloadKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let bytes = content.len();
        Self {
            id: uuid::Uuid::now_v7(),
            kind,
            content,
            timestamp: chrono::Utc::now(),
            direction: SessionDirection::Received,
            bytes,
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// All scripted steps completed, or the peer closed cleanly.
    #[default]
    Completed,
    /// The caller's cancellation scope fired.
    Cancelled,
    /// The session ended with an error.
    Error(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed successfully"),
            Self::Cancelled => write!(f, "Cancelled by user"),
            Self::Error(message) => write!(f, "{message}"),
        }
    }
}

/// Outcome of one WebSocket session (scripted or interactive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Ordered message log; real-time occurrence order.
    pub messages: Vec<SessionMessage>,
    /// Number of messages sent.
    pub sent: usize,
    /// Number of messages received.
    pub received: usize,
    /// Error description. `None` when the session ended cleanly or was
    /// cancelled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock session duration.
    #[serde(with = "duration_millis")]
    pub duration: std::time::Duration,
    /// Why the session ended.
    pub disconnect_reason: DisconnectReason,
    /// When the session started.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Default for SessionResult {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            sent: 0,
            received: 0,
            error: None,
            duration: std::time::Duration::ZERO,
            disconnect_reason: DisconnectReason::Completed,
            timestamp: chrono::Utc::now(),
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
