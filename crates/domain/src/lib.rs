//! Comet Domain - Core request engine types
//!
//! This crate defines the domain model for the Comet request engine.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod options;
pub mod request;
pub mod response;
pub mod tls;
pub mod variable;
pub mod websocket;

pub use error::{DomainError, DomainResult};
pub use options::ExecutionOptions;
pub use request::{Header, HttpMethod, Protocol, RequestSpec};
pub use response::{RequestResult, StatusCode};
pub use tls::TlsConfig;
pub use variable::{MultiValue, VariableValue};
pub use websocket::{
    DisconnectReason, PayloadKind, ScriptStep, SessionDirection, SessionMessage, SessionResult,
    StepDirection, WebSocketRequest,
};
