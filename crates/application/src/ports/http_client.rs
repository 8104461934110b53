//! HTTP client port.

use std::future::Future;

use comet_domain::{ExecutionOptions, RequestResult, RequestSpec, TlsConfig};

use crate::error::ApplicationResult;
use crate::ports::{CancellationReceiver, ChunkSink};

/// Port for executing HTTP and GraphQL requests.
///
/// Implementations return a fully populated [`RequestResult`] for every
/// expected failure mode (transport errors, timeouts, size caps,
/// cancellation); the outer `Result` is reserved for configuration errors
/// detected before any network I/O, such as unreadable TLS material.
pub trait HttpClient: Send + Sync {
    /// Executes a request with a whole-call timeout taken from `options`.
    fn execute(
        &self,
        request: &RequestSpec,
        profile_tls: Option<&TlsConfig>,
        options: &ExecutionOptions,
    ) -> impl Future<Output = ApplicationResult<RequestResult>> + Send;

    /// Executes a request reading the response incrementally. No client
    /// timeout is applied; lifetime is governed by `cancel`. Each chunk is
    /// forwarded to `sink` when one is supplied.
    fn execute_streaming(
        &self,
        cancel: CancellationReceiver,
        request: &RequestSpec,
        profile_tls: Option<&TlsConfig>,
        options: &ExecutionOptions,
        sink: Option<&dyn ChunkSink>,
    ) -> impl Future<Output = ApplicationResult<RequestResult>> + Send;
}
