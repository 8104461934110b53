//! Application error types

use thiserror::Error;

use comet_domain::DomainError;

/// Application-level errors.
///
/// Expected failure modes (transport errors, timeouts, size caps,
/// cancellation) are carried inside result objects; only configuration
/// problems and truly unexpected faults surface here.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// TLS material could not be loaded or parsed.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
