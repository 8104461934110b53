//! Scripted session driver.

use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use comet_application::{CancellationReceiver, SessionSink};
use comet_domain::{
    DisconnectReason, PayloadKind, SessionMessage, SessionResult, StepDirection, WebSocketRequest,
};

use super::connect::{Inbound, connect, spawn_receiver};
use super::{close_best_effort, log_message};

pub(super) async fn run(
    mut cancel: CancellationReceiver,
    request: &WebSocketRequest,
    sink: Option<&dyn SessionSink>,
) -> SessionResult {
    let start = Instant::now();
    let mut result = SessionResult::default();

    let stream = match connect(request).await {
        Ok(stream) => stream,
        Err(message) => {
            warn!(url = %request.url, error = %message, "connection failed");
            log_message(&mut result, sink, SessionMessage::system(&message));
            result.error = Some(message.clone());
            result.disconnect_reason = DisconnectReason::Error(message);
            result.duration = start.elapsed();
            if let Some(sink) = sink {
                sink.on_done();
            }
            return result;
        }
    };
    debug!(url = %request.url, steps = request.messages.len(), "session opened");
    log_message(
        &mut result,
        sink,
        SessionMessage::system(format!("Connected to {}", request.url)),
    );

    let (mut write, read) = stream.split();
    let (mut inbound, receiver) = spawn_receiver(read);

    let mut cancelled = false;
    let mut failure: Option<String> = None;

    'steps: for step in &request.messages {
        match step.direction {
            StepDirection::Send => {
                let frame = match step.kind {
                    PayloadKind::Json => {
                        if let Err(e) = serde_json::from_str::<serde_json::Value>(&step.content) {
                            failure =
                                Some(format!("invalid JSON in message '{}': {e}", step.name));
                            break 'steps;
                        }
                        Message::Text(step.content.clone())
                    }
                    PayloadKind::Text => Message::Text(step.content.clone()),
                    PayloadKind::Binary => Message::Binary(step.content.clone().into_bytes()),
                };
                // A write stalled on backpressure must still honor the scope.
                tokio::select! {
                    () = cancel.cancelled() => {
                        cancelled = true;
                        break 'steps;
                    }
                    sent = write.send(frame) => {
                        if let Err(e) = sent {
                            failure =
                                Some(format!("failed to send message '{}': {e}", step.name));
                            break 'steps;
                        }
                    }
                }
                log_message(
                    &mut result,
                    sink,
                    SessionMessage::sent(step.kind, step.content.clone()),
                );
            }
            StepDirection::Receive => {
                tokio::select! {
                    () = cancel.cancelled() => {
                        cancelled = true;
                        break 'steps;
                    }
                    () = tokio::time::sleep(Duration::from_secs(step.timeout_secs)) => {
                        failure = Some(format!(
                            "Timeout waiting for message '{}' ({}s)",
                            step.name, step.timeout_secs
                        ));
                        break 'steps;
                    }
                    event = inbound.recv() => match event {
                        Some(Inbound::Frame(message)) => log_message(&mut result, sink, message),
                        Some(Inbound::Failed(e)) => {
                            failure = Some(e);
                            break 'steps;
                        }
                        Some(Inbound::Closed) | None => {
                            failure = Some(format!(
                                "connection closed before message '{}'",
                                step.name
                            ));
                            break 'steps;
                        }
                    }
                }
            }
        }
    }

    if cancelled {
        close_best_effort(&mut write).await;
        log_message(&mut result, sink, SessionMessage::system("Session cancelled"));
        result.disconnect_reason = DisconnectReason::Cancelled;
    } else if let Some(message) = failure {
        warn!(url = %request.url, error = %message, "session failed");
        log_message(&mut result, sink, SessionMessage::system(&message));
        result.error = Some(message.clone());
        result.disconnect_reason = DisconnectReason::Error(message);
    } else {
        close_best_effort(&mut write).await;
        log_message(&mut result, sink, SessionMessage::system("Disconnected"));
        result.disconnect_reason = DisconnectReason::Completed;
    }

    receiver.abort();
    result.duration = start.elapsed();
    if let Some(sink) = sink {
        sink.on_done();
    }
    result
}
