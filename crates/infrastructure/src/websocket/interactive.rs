//! Interactive session driver.

use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use comet_application::{CancellationReceiver, SessionSink, VariableResolver};
use comet_domain::{DisconnectReason, SessionMessage, SessionResult, WebSocketRequest};

use super::connect::{Inbound, classify, connect, spawn_receiver};
use super::{close_best_effort, log_message};

pub(super) async fn run(
    mut cancel: CancellationReceiver,
    request: &WebSocketRequest,
    mut outbound: mpsc::Receiver<String>,
    mut resolver: Option<&mut VariableResolver>,
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
    debug!(url = %request.url, "interactive session opened");
    log_message(
        &mut result,
        sink,
        SessionMessage::system(format!("Connected to {}", request.url)),
    );

    let (mut write, read) = stream.split();
    let (mut inbound, receiver) = spawn_receiver(read);

    let mut cancelled = false;
    let mut failure: Option<String> = None;
    let mut peer_closed = false;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                cancelled = true;
                break;
            }
            outgoing = outbound.recv() => match outgoing {
                // Caller hung up; close gracefully.
                None => break,
                Some(text) => {
                    if text.is_empty() {
                        continue;
                    }
                    let text = match resolver.as_deref_mut() {
                        Some(resolver) => {
                            let seen = resolver.shell_errors().len();
                            let resolved = resolver.resolve(&text).await;
                            let new_errors = resolver.shell_errors()[seen..].to_vec();
                            if new_errors.is_empty() {
                                resolved
                            } else {
                                for error in new_errors {
                                    log_message(
                                        &mut result,
                                        sink,
                                        SessionMessage::system(format!(
                                            "shell expansion failed: {error}"
                                        )),
                                    );
                                }
                                // The message is dropped, not sent half-expanded.
                                continue;
                            }
                        }
                        None => text,
                    };
                    let kind = classify(&text);
                    // A write stalled on backpressure must still honor the scope.
                    tokio::select! {
                        () = cancel.cancelled() => {
                            cancelled = true;
                            break;
                        }
                        sent = write.send(Message::Text(text.clone())) => {
                            if let Err(e) = sent {
                                failure = Some(format!("failed to send message: {e}"));
                                break;
                            }
                        }
                    }
                    log_message(&mut result, sink, SessionMessage::sent(kind, text));
                }
            },
            event = inbound.recv() => match event {
                Some(Inbound::Frame(message)) => log_message(&mut result, sink, message),
                Some(Inbound::Failed(e)) => {
                    failure = Some(e);
                    break;
                }
                Some(Inbound::Closed) | None => {
                    peer_closed = true;
                    break;
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
    } else if peer_closed {
        log_message(
            &mut result,
            sink,
            SessionMessage::system("Connection closed by server"),
        );
        result.disconnect_reason = DisconnectReason::Completed;
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
