//! Comet Application - Variable resolution and ports
//!
//! This crate defines the application layer with:
//! - The layered variable resolver (`{{name}}` placeholders and `$(shell)`
//!   expressions)
//! - Port traits for the executors (HTTP client, cancellation, sinks)
//! - Post-processing helpers callers invoke explicitly

pub mod error;
pub mod escape;
pub mod ports;
pub mod resolver;
pub mod token;

pub use error::{ApplicationError, ApplicationResult};
pub use escape::parse_escapes;
pub use ports::{
    CancellationReceiver, CancellationToken, ChunkSink, HttpClient, NoopChunkSink,
    NoopSessionSink, SessionSink,
};
pub use resolver::VariableResolver;
pub use token::extract_token;
