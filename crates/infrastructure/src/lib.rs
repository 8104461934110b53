//! Protocol executors: the outbound adapters behind the application ports.
//!
//! [`HttpExecutor`] implements the HTTP/GraphQL client port with `reqwest`;
//! [`WebSocketExecutor`] drives scripted and interactive WebSocket sessions
//! over `tokio-tungstenite`. Both share the native-tls backend so one set of
//! TLS material works for every protocol.

pub mod http;
pub mod websocket;

pub use http::HttpExecutor;
pub use websocket::WebSocketExecutor;
