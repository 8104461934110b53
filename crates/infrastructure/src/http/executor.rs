//! The `reqwest`-backed HTTP/GraphQL executor.

use std::collections::HashMap;
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, TRANSFER_ENCODING};
use tracing::{debug, warn};

use comet_application::{ApplicationResult, CancellationReceiver, ChunkSink, HttpClient};
use comet_domain::{ExecutionOptions, Protocol, RequestResult, RequestSpec, TlsConfig};

use crate::http::{graphql, tls};

/// Content-Type markers that switch the streaming path into incremental
/// chunk delivery.
const STREAMING_CONTENT_TYPES: [&str; 4] = [
    "text/event-stream",
    "application/stream+json",
    "application/x-ndjson",
    "application/jsonlines",
];

/// Executes HTTP and GraphQL requests over `reqwest`.
///
/// Every expected failure (transport errors, timeouts, size caps,
/// cancellation) comes back as a populated [`RequestResult`] with its
/// `error` field set; only unusable TLS material aborts before the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpExecutor;

impl HttpExecutor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HttpClient for HttpExecutor {
    async fn execute(
        &self,
        request: &RequestSpec,
        profile_tls: Option<&TlsConfig>,
        options: &ExecutionOptions,
    ) -> ApplicationResult<RequestResult> {
        let start = Instant::now();
        let effective_tls = TlsConfig::effective(request.tls.as_ref(), profile_tls);
        let client = tls::build_client(effective_tls, Some(options.request_timeout()))?;

        let (method, body) = effective_payload(request);
        let request_bytes = request.size_bytes() - request.body.len() + body.len();
        debug!(method = %method, url = %request.url, "executing request");

        let headers = match build_headers(request) {
            Ok(headers) => headers,
            Err(message) => {
                return Ok(RequestResult::failure(message, start.elapsed())
                    .with_request_bytes(request_bytes));
            }
        };

        let mut builder = client.request(method, &request.url).headers(headers);
        if !body.is_empty() {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "request failed");
                return Ok(
                    RequestResult::failure(describe_error(&e, options), start.elapsed())
                        .with_request_bytes(request_bytes),
                );
            }
        };

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                let mut result = RequestResult::from_head(status, headers);
                result.error = Some(describe_error(&e, options));
                result.duration = start.elapsed();
                result.request_bytes = request_bytes;
                return Ok(result);
            }
        };

        if bytes.len() > options.max_response_bytes {
            let mut result = RequestResult::from_head(status, headers);
            result.body = String::from_utf8_lossy(&bytes[..options.max_response_bytes]).to_string();
            result.response_bytes = bytes.len();
            result.error = Some(size_cap_error(options));
            result.duration = start.elapsed();
            result.request_bytes = request_bytes;
            return Ok(result);
        }

        let mut body = String::from_utf8_lossy(&bytes).to_string();
        if request.protocol == Protocol::GraphQl {
            body = graphql::reformat_response(&body);
        }
        Ok(
            RequestResult::success(status, headers, body, start.elapsed())
                .with_request_bytes(request_bytes),
        )
    }

    async fn execute_streaming(
        &self,
        cancel: CancellationReceiver,
        request: &RequestSpec,
        profile_tls: Option<&TlsConfig>,
        options: &ExecutionOptions,
        sink: Option<&dyn ChunkSink>,
    ) -> ApplicationResult<RequestResult> {
        let outcome = stream_request(cancel, request, profile_tls, options, sink).await;
        if let Some(sink) = sink {
            sink.on_done();
        }
        outcome
    }
}

async fn stream_request(
    mut cancel: CancellationReceiver,
    request: &RequestSpec,
    profile_tls: Option<&TlsConfig>,
    options: &ExecutionOptions,
    sink: Option<&dyn ChunkSink>,
) -> ApplicationResult<RequestResult> {
    let start = Instant::now();
    let effective_tls = TlsConfig::effective(request.tls.as_ref(), profile_tls);
    // No client timeout: the caller's cancellation scope bounds the call.
    let client = tls::build_client(effective_tls, None)?;

    let (method, body) = effective_payload(request);
    let request_bytes = request.size_bytes() - request.body.len() + body.len();
    debug!(method = %method, url = %request.url, "executing streaming request");

    let headers = match build_headers(request) {
        Ok(headers) => headers,
        Err(message) => {
            return Ok(RequestResult::failure(message, start.elapsed())
                .with_request_bytes(request_bytes));
        }
    };

    let mut builder = client.request(method, &request.url).headers(headers);
    if !body.is_empty() {
        builder = builder.body(body);
    }

    let response = tokio::select! {
        () = cancel.cancelled() => {
            return Ok(RequestResult::failure("request cancelled", start.elapsed())
                .with_request_bytes(request_bytes));
        }
        response = builder.send() => match response {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %request.url, error = %e, "streaming request failed");
                return Ok(
                    RequestResult::failure(describe_error(&e, options), start.elapsed())
                        .with_request_bytes(request_bytes),
                );
            }
        }
    };

    let status = response.status().as_u16();
    let streaming = is_streaming_response(response.headers());
    let headers = collect_headers(response.headers());

    let mut result = RequestResult::from_head(status, headers);
    result.request_bytes = request_bytes;

    if !streaming {
        // Buffered read, still bounded by cancellation.
        let bytes = tokio::select! {
            () = cancel.cancelled() => {
                result.error = Some("request cancelled".to_string());
                result.duration = start.elapsed();
                return Ok(result);
            }
            bytes = response.bytes() => match bytes {
                Ok(bytes) => bytes,
                Err(e) => {
                    result.error = Some(describe_error(&e, options));
                    result.duration = start.elapsed();
                    return Ok(result);
                }
            }
        };
        if bytes.len() > options.max_response_bytes {
            result.body = String::from_utf8_lossy(&bytes[..options.max_response_bytes]).to_string();
            result.response_bytes = bytes.len();
            result.error = Some(size_cap_error(options));
            result.duration = start.elapsed();
            return Ok(result);
        }
        if let Some(sink) = sink {
            sink.on_chunk(&bytes);
        }
        result.body = String::from_utf8_lossy(&bytes).to_string();
        result.response_bytes = bytes.len();
        if request.protocol == Protocol::GraphQl {
            result.body = graphql::reformat_response(&result.body);
        }
        result.duration = start.elapsed();
        return Ok(result);
    }

    let mut stream = response.bytes_stream();
    let mut accumulated: Vec<u8> = Vec::new();
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(url = %request.url, "stream cancelled");
                result.error = Some("request cancelled".to_string());
                break;
            }
            chunk = stream.next() => match chunk {
                None => break,
                Some(Err(e)) => {
                    result.error = Some(describe_error(&e, options));
                    break;
                }
                Some(Ok(chunk)) => {
                    // The partial body never includes the offending chunk.
                    if accumulated.len() + chunk.len() > options.max_response_bytes {
                        result.error = Some(size_cap_error(options));
                        break;
                    }
                    if let Some(sink) = sink {
                        sink.on_chunk(&chunk);
                    }
                    accumulated.extend_from_slice(&chunk);
                }
            }
        }
    }

    result.response_bytes = accumulated.len();
    result.body = String::from_utf8_lossy(&accumulated).to_string();
    // Partial bodies (cap, cancellation, read error) stay raw.
    if request.protocol == Protocol::GraphQl && result.error.is_none() {
        result.body = graphql::reformat_response(&result.body);
    }
    result.duration = start.elapsed();
    Ok(result)
}

/// Resolves the wire method and body for a request. GraphQL always travels
/// as a POST carrying the `{"query": ...}` envelope.
fn effective_payload(request: &RequestSpec) -> (reqwest::Method, String) {
    match request.protocol {
        Protocol::Http => (to_reqwest_method(request), request.body.clone()),
        Protocol::GraphQl => (reqwest::Method::POST, graphql::wrap_query(&request.body)),
    }
}

fn to_reqwest_method(request: &RequestSpec) -> reqwest::Method {
    use comet_domain::HttpMethod;
    match request.method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

/// Builds the outgoing header map. GraphQL requests get a JSON Content-Type
/// first, so a caller-supplied Content-Type still wins.
fn build_headers(request: &RequestSpec) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::new();
    if request.protocol == Protocol::GraphQl {
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    for header in &request.headers {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|e| format!("invalid header name '{}': {e}", header.name))?;
        let value = HeaderValue::from_str(&header.value)
            .map_err(|e| format!("invalid value for header '{}': {e}", header.name))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn collect_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).to_string(),
            )
        })
        .collect()
}

fn is_streaming_response(headers: &HeaderMap) -> bool {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if STREAMING_CONTENT_TYPES
        .iter()
        .any(|marker| content_type.contains(marker))
    {
        return true;
    }
    headers
        .get(TRANSFER_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
}

fn describe_error(error: &reqwest::Error, options: &ExecutionOptions) -> String {
    if error.is_timeout() {
        format!(
            "request timed out after {}s",
            options.request_timeout_secs
        )
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

fn size_cap_error(options: &ExecutionOptions) -> String {
    format!(
        "response exceeded maximum size ({} bytes)",
        options.max_response_bytes
    )
}
