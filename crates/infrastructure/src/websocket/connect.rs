//! WebSocket dialing and inbound frame plumbing shared by both session
//! modes.

use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::SplitStream;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};

use comet_domain::{PayloadKind, SessionMessage, TlsConfig, WebSocketRequest};

use crate::http::tls::load_identity_pem;

pub(super) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(45);

/// An event surfaced by the inbound reader task.
pub(super) enum Inbound {
    /// A logged data frame from the peer.
    Frame(SessionMessage),
    /// The peer closed the connection (close frame or end of stream).
    Closed,
    /// The transport failed mid-session.
    Failed(String),
}

/// Dials the endpoint described by `request`, applying handshake headers,
/// subprotocols and TLS material. Failures come back as display-ready
/// strings; they end up in a session's error field, not in a panic.
pub(super) async fn connect(request: &WebSocketRequest) -> Result<WsStream, String> {
    request.validate().map_err(|e| e.to_string())?;

    let mut handshake = request
        .url
        .as_str()
        .into_client_request()
        .map_err(|e| format!("invalid WebSocket request: {e}"))?;
    let headers = handshake.headers_mut();
    for (name, value) in &request.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("invalid header name '{name}': {e}"))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| format!("invalid value for header '{name}': {e}"))?;
        headers.insert(header_name, header_value);
    }
    if !request.subprotocols.is_empty() {
        let value = HeaderValue::from_str(&request.subprotocols.join(", "))
            .map_err(|e| format!("invalid subprotocol list: {e}"))?;
        headers.insert("Sec-WebSocket-Protocol", value);
    }

    let connector = if request.is_secure() {
        match request.tls.as_ref() {
            Some(tls) => Some(build_connector(tls)?),
            None => None,
        }
    } else {
        None
    };

    let attempt = connect_async_tls_with_config(handshake, None, false, connector);
    match tokio::time::timeout(CONNECT_TIMEOUT, attempt).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(describe_handshake_error(&e)),
        Err(_) => Err(format!(
            "connection timed out after {}s",
            CONNECT_TIMEOUT.as_secs()
        )),
    }
}

fn build_connector(tls: &TlsConfig) -> Result<Connector, String> {
    let mut builder = native_tls::TlsConnector::builder();

    if let Some(ca_file) = &tls.ca_file {
        let pem = std::fs::read(ca_file)
            .map_err(|e| format!("failed to read CA file {}: {e}", ca_file.display()))?;
        let certificate = native_tls::Certificate::from_pem(&pem)
            .map_err(|e| format!("failed to parse CA file {}: {e}", ca_file.display()))?;
        // A dedicated CA replaces the system trust store.
        builder.add_root_certificate(certificate);
        builder.disable_built_in_roots(true);
    }

    if tls.has_client_identity() {
        let (cert, key) = load_identity_pem(tls).map_err(|e| e.to_string())?;
        let identity = native_tls::Identity::from_pkcs8(&cert, &key)
            .map_err(|e| format!("failed to build client identity: {e}"))?;
        builder.identity(identity);
    }

    if tls.insecure_skip_verify {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }

    builder
        .build()
        .map(Connector::NativeTls)
        .map_err(|e| format!("failed to initialize TLS: {e}"))
}

fn describe_handshake_error(error: &tungstenite::Error) -> String {
    match error {
        tungstenite::Error::Http(response) => {
            format!("WebSocket handshake rejected: HTTP {}", response.status())
        }
        other => format!("connection failed: {other}"),
    }
}

/// Spawns the reader task that turns raw frames into [`Inbound`] events.
/// Ping/pong frames are handled by the transport and never surfaced.
pub(super) fn spawn_receiver(
    mut read: SplitStream<WsStream>,
) -> (mpsc::Receiver<Inbound>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(32);
    let handle = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let kind = classify(&text);
                    let message = SessionMessage::received(kind, text);
                    if tx.send(Inbound::Frame(message)).await.is_err() {
                        return;
                    }
                }
                Ok(Message::Binary(data)) => {
                    let content = String::from_utf8_lossy(&data).to_string();
                    let message = SessionMessage::received(PayloadKind::Binary, content);
                    if tx.send(Inbound::Frame(message)).await.is_err() {
                        return;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    let _ = tx.send(Inbound::Failed(e.to_string())).await;
                    return;
                }
            }
        }
        let _ = tx.send(Inbound::Closed).await;
    });
    (rx, handle)
}

/// Classifies outbound/inbound text as JSON or plain text for the log.
pub(super) fn classify(text: &str) -> PayloadKind {
    if serde_json::from_str::<serde_json::Value>(text).is_ok() {
        PayloadKind::Json
    } else {
        PayloadKind::Text
    }
}
