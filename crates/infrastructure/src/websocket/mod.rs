//! WebSocket session execution over `tokio-tungstenite`.
//!
//! Scripted mode drives an ordered list of send/receive steps to
//! completion; interactive mode relays caller-typed messages until the
//! caller hangs up, the peer closes, or the cancellation scope fires.
//! Either way the outcome is a [`SessionResult`] carrying the full ordered
//! message log.

mod connect;
mod interactive;
mod scripted;

use std::time::Duration;

use futures_util::SinkExt;
use futures_util::stream::SplitSink;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use comet_application::{CancellationReceiver, SessionSink, VariableResolver};
use comet_domain::{SessionDirection, SessionMessage, SessionResult, WebSocketRequest};

/// Executes WebSocket sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketExecutor;

impl WebSocketExecutor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Runs the scripted step sequence carried by `request`.
    ///
    /// Connection failures, invalid step payloads and receive timeouts all
    /// end the session with a populated error; cancellation ends it with
    /// [`comet_domain::DisconnectReason::Cancelled`] and no error. `sink`
    /// receives every logged message and exactly one `on_done`.
    pub async fn run_scripted(
        &self,
        cancel: CancellationReceiver,
        request: &WebSocketRequest,
        sink: Option<&dyn SessionSink>,
    ) -> SessionResult {
        scripted::run(cancel, request, sink).await
    }

    /// Runs an interactive session, relaying messages from `outbound` to
    /// the peer until the channel closes, the peer disconnects, or the
    /// cancellation scope fires.
    ///
    /// When a `resolver` is supplied each outbound message goes through
    /// variable and shell resolution first; a message whose shell commands
    /// fail is reported as a system entry and not sent.
    pub async fn run_interactive(
        &self,
        cancel: CancellationReceiver,
        request: &WebSocketRequest,
        outbound: mpsc::Receiver<String>,
        resolver: Option<&mut VariableResolver>,
        sink: Option<&dyn SessionSink>,
    ) -> SessionResult {
        interactive::run(cancel, request, outbound, resolver, sink).await
    }
}

/// Sends a close frame without letting a dead or backpressured peer stall
/// session teardown.
async fn close_best_effort(write: &mut SplitSink<connect::WsStream, Message>) {
    let _ = tokio::time::timeout(Duration::from_secs(1), write.send(Message::Close(None))).await;
}

/// Appends a message to the session log, updating counters and notifying
/// the sink in real-time order.
fn log_message(
    result: &mut SessionResult,
    sink: Option<&dyn SessionSink>,
    message: SessionMessage,
) {
    match message.direction {
        SessionDirection::Sent => result.sent += 1,
        SessionDirection::Received => result.received += 1,
        SessionDirection::System => {}
    }
    if let Some(sink) = sink {
        sink.on_message(&message);
    }
    result.messages.push(message);
}
