//! Notification sinks for streaming execution.
//!
//! Sinks are small capability interfaces standing in for function-valued
//! callbacks: zero or more data notifications, then exactly one `on_done`.
//! Executors accept `Option<&dyn Sink>`; passing `None` means data is
//! accumulated (or logged) without notification.

use comet_domain::SessionMessage;

/// Receives HTTP streaming chunks as they arrive.
pub trait ChunkSink: Send + Sync {
    /// Called with each received chunk, in order.
    fn on_chunk(&self, chunk: &[u8]);

    /// Called exactly once when the stream terminates, on every exit path.
    fn on_done(&self);
}

/// Receives WebSocket session events as they occur.
pub trait SessionSink: Send + Sync {
    /// Called with each logged message (system, sent, or received).
    fn on_message(&self, message: &SessionMessage);

    /// Called exactly once when the session terminates.
    fn on_done(&self);
}

/// A `ChunkSink` that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopChunkSink;

impl ChunkSink for NoopChunkSink {
    fn on_chunk(&self, _chunk: &[u8]) {}
    fn on_done(&self) {}
}

/// A `SessionSink` that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionSink;

impl SessionSink for NoopSessionSink {
    fn on_message(&self, _message: &SessionMessage) {}
    fn on_done(&self) {}
}
