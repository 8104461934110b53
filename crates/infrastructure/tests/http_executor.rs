//! HTTP executor integration tests against loopback servers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

use comet_application::{CancellationToken, ChunkSink, HttpClient};
use comet_domain::{ExecutionOptions, RequestSpec};
use comet_infrastructure::HttpExecutor;

/// Serves one connection: reads the request head, then writes `response`.
async fn spawn_http_server(response: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let _ = socket.write_all(&response).await;
            let _ = socket.flush().await;
        }
    });
    addr
}

/// Like `spawn_http_server` but hands the full request text back.
async fn spawn_capture_server(response: Vec<u8>) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let request = read_request(&mut socket).await;
            let _ = tx.send(request);
            let _ = socket.write_all(&response).await;
            let _ = socket.flush().await;
        }
    });
    (addr, rx)
}

/// Reads headers plus any Content-Length-delimited body.
async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = [0u8; 4096];
    let mut request: Vec<u8> = Vec::new();
    let mut header_end = None;
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        request.extend_from_slice(&buf[..n]);
        if header_end.is_none() {
            header_end = request
                .windows(4)
                .position(|w| w == b"\r\n\r\n")
                .map(|p| p + 4);
        }
        if let Some(end) = header_end {
            let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&request).to_string()
}

#[derive(Default)]
struct CollectSink {
    chunks: Mutex<Vec<Vec<u8>>>,
    done: AtomicUsize,
    notify: Option<mpsc::UnboundedSender<usize>>,
}

impl ChunkSink for CollectSink {
    fn on_chunk(&self, chunk: &[u8]) {
        self.chunks.lock().unwrap().push(chunk.to_vec());
        if let Some(notify) = &self.notify {
            let _ = notify.send(chunk.len());
        }
    }

    fn on_done(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }
}

impl CollectSink {
    fn combined(&self) -> Vec<u8> {
        self.chunks.lock().unwrap().concat()
    }
}

#[tokio::test]
async fn test_get_success() {
    let addr = spawn_http_server(
        b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello".to_vec(),
    )
    .await;

    let request = RequestSpec::get(format!("http://{addr}/"));
    let result = HttpExecutor::new()
        .execute(&request, None, &ExecutionOptions::default())
        .await
        .unwrap();

    assert!(result.is_ok(), "unexpected error: {:?}", result.error);
    assert_eq!(result.status, 200);
    assert_eq!(result.status_text, "OK");
    assert_eq!(result.body, "hello");
    assert_eq!(result.response_bytes, 5);
    assert!(result.request_bytes > 0);
    assert_eq!(
        result.header("content-type").map(String::as_str),
        Some("text/plain")
    );
}

#[tokio::test]
async fn test_graphql_wraps_query_and_unwraps_response() {
    let body = br#"{"data":{"viewer":{"login":"octocat"}}}"#;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        String::from_utf8_lossy(body)
    );
    let (addr, captured) = spawn_capture_server(response.into_bytes()).await;

    let request = RequestSpec::graphql(format!("http://{addr}/graphql"), "{ viewer { login } }");
    let result = HttpExecutor::new()
        .execute(&request, None, &ExecutionOptions::default())
        .await
        .unwrap();

    let captured = captured.await.unwrap();
    assert!(captured.starts_with("POST "), "GraphQL must POST: {captured}");
    assert!(captured.to_lowercase().contains("content-type: application/json"));
    assert!(captured.contains(r#"{"query":"{ viewer { login } }"}"#));

    assert!(result.is_ok());
    let json = result.body_as_json().unwrap();
    assert_eq!(json["viewer"]["login"], "octocat");
    assert!(json.get("data").is_none(), "envelope must be unwrapped");
}

#[tokio::test]
async fn test_connection_refused_is_a_soft_failure() {
    // Bind and immediately drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let request = RequestSpec::get(format!("http://{addr}/"));
    let result = HttpExecutor::new()
        .execute(&request, None, &ExecutionOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, 0);
    assert!(result.error.is_some());
    assert!(result.duration > Duration::ZERO);
}

#[tokio::test]
async fn test_timeout_is_reported() {
    // Accept the connection and never answer.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        }
    });

    let request = RequestSpec::get(format!("http://{addr}/"));
    let options = ExecutionOptions::default().with_timeout_secs(1);
    let result = HttpExecutor::new()
        .execute(&request, None, &options)
        .await
        .unwrap();

    assert!(
        result.error.as_deref().is_some_and(|e| e.contains("timed out after 1s")),
        "unexpected error: {:?}",
        result.error
    );
}

#[tokio::test]
async fn test_streaming_chunked_delivers_chunks() {
    let response = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\n\r\n6\r\ndata: \r\n5\r\nhello\r\n0\r\n\r\n".to_vec();
    let addr = spawn_http_server(response).await;

    let sink = CollectSink::default();
    let (_token, receiver) = CancellationToken::new();
    let request = RequestSpec::get(format!("http://{addr}/events"));
    let result = HttpExecutor::new()
        .execute_streaming(
            receiver,
            &request,
            None,
            &ExecutionOptions::default(),
            Some(&sink),
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "unexpected error: {:?}", result.error);
    assert_eq!(result.status, 200);
    assert_eq!(result.body, "data: hello");
    assert_eq!(sink.combined(), b"data: hello");
    assert_eq!(sink.done.load(Ordering::SeqCst), 1, "exactly one on_done");
}

#[tokio::test]
async fn test_streaming_cancellation_keeps_partial_body() {
    // First chunk, then silence; only cancellation ends the call.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let head = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\n\r\n7\r\npartial\r\n";
            let _ = socket.write_all(head).await;
            let _ = socket.flush().await;
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    });

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let sink = CollectSink {
        notify: Some(notify_tx),
        ..CollectSink::default()
    };
    let (token, receiver) = CancellationToken::new();
    let request = RequestSpec::get(format!("http://{addr}/events"));
    let executor = HttpExecutor::new();
    let options = ExecutionOptions::default();

    let (result, ()) = tokio::join!(
        executor.execute_streaming(receiver, &request, None, &options, Some(&sink)),
        async {
            // Cancel once the first chunk has arrived.
            let _ = notify_rx.recv().await;
            token.cancel();
        }
    );
    let result = result.unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.body, "partial");
    assert!(
        result.error.as_deref().is_some_and(|e| e.contains("cancelled")),
        "unexpected error: {:?}",
        result.error
    );
    assert_eq!(sink.done.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_streaming_size_cap_excludes_offending_chunk() {
    let response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nfirst\r\n20\r\n################################\r\n0\r\n\r\n".to_vec();
    let addr = spawn_http_server(response).await;

    let sink = CollectSink::default();
    let (_token, receiver) = CancellationToken::new();
    let request = RequestSpec::get(format!("http://{addr}/big"));
    let options = ExecutionOptions::default().with_max_response_bytes(10);
    let result = HttpExecutor::new()
        .execute_streaming(receiver, &request, None, &options, Some(&sink))
        .await
        .unwrap();

    assert!(
        result.error.as_deref().is_some_and(|e| e.contains("maximum size")),
        "unexpected error: {:?}",
        result.error
    );
    // The body stops before the chunk that crossed the cap.
    assert_eq!(result.body, "first");
    assert_eq!(sink.done.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_streaming_entry_point_reformats_graphql() {
    let body = br#"{"data":{"viewer":{"login":"octocat"}}}"#;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        String::from_utf8_lossy(body)
    );
    let addr = spawn_http_server(response.into_bytes()).await;

    let (_token, receiver) = CancellationToken::new();
    let request = RequestSpec::graphql(format!("http://{addr}/graphql"), "{ viewer { login } }");
    let result = HttpExecutor::new()
        .execute_streaming(
            receiver,
            &request,
            None,
            &ExecutionOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "unexpected error: {:?}", result.error);
    // Both entry points must unwrap the envelope the same way.
    let json = result.body_as_json().unwrap();
    assert_eq!(json["viewer"]["login"], "octocat");
    assert!(json.get("data").is_none(), "envelope must be unwrapped");
}

#[tokio::test]
async fn test_non_streaming_response_on_streaming_path() {
    let addr = spawn_http_server(
        b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\n\r\n{\"ok\":true}".to_vec(),
    )
    .await;

    let sink = CollectSink::default();
    let (_token, receiver) = CancellationToken::new();
    let request = RequestSpec::get(format!("http://{addr}/"));
    let result = HttpExecutor::new()
        .execute_streaming(
            receiver,
            &request,
            None,
            &ExecutionOptions::default(),
            Some(&sink),
        )
        .await
        .unwrap();

    assert!(result.is_ok(), "unexpected error: {:?}", result.error);
    assert_eq!(result.body, r#"{"ok":true}"#);
    assert_eq!(sink.combined(), br#"{"ok":true}"#);
    assert_eq!(sink.done.load(Ordering::SeqCst), 1);
}
