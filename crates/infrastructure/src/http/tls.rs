//! Client construction with TLS material.
//!
//! Loading and parsing TLS files is the one failure mode surfaced as a hard
//! error: it happens before any network I/O, so there is no partial result
//! to report.

use std::time::Duration;

use comet_application::{ApplicationError, ApplicationResult};
use comet_domain::TlsConfig;

/// Builds a `reqwest` client honouring the given TLS configuration.
///
/// `timeout` is the whole-call deadline; streaming callers pass `None` and
/// bound the call with cancellation instead.
pub(crate) fn build_client(
    tls: Option<&TlsConfig>,
    timeout: Option<Duration>,
) -> ApplicationResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(tls) = tls {
        if let Some(ca_file) = &tls.ca_file {
            let pem = std::fs::read(ca_file).map_err(|e| {
                ApplicationError::Tls(format!(
                    "failed to read CA file {}: {e}",
                    ca_file.display()
                ))
            })?;
            let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ApplicationError::Tls(format!(
                    "failed to parse CA file {}: {e}",
                    ca_file.display()
                ))
            })?;
            // A dedicated CA replaces the system trust store.
            builder = builder
                .add_root_certificate(certificate)
                .tls_built_in_root_certs(false);
        }

        if let (Some(cert_file), Some(key_file)) = (&tls.cert_file, &tls.key_file) {
            let identity = load_identity_pem(tls)?;
            let identity = reqwest::Identity::from_pkcs8_pem(&identity.0, &identity.1)
                .map_err(|e| {
                    ApplicationError::Tls(format!(
                        "failed to build client identity from {} / {}: {e}",
                        cert_file.display(),
                        key_file.display()
                    ))
                })?;
            builder = builder.identity(identity);
        }

        if tls.insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }

    builder
        .build()
        .map_err(|e| ApplicationError::Tls(format!("failed to build HTTP client: {e}")))
}

/// Reads the client certificate and key PEM files named by `tls`.
///
/// Callers have already checked [`TlsConfig::has_client_identity`]; the
/// files themselves may still be missing or unreadable.
pub(crate) fn load_identity_pem(tls: &TlsConfig) -> ApplicationResult<(Vec<u8>, Vec<u8>)> {
    let cert_file = tls
        .cert_file
        .as_ref()
        .ok_or_else(|| ApplicationError::Tls("client certificate path missing".to_string()))?;
    let key_file = tls
        .key_file
        .as_ref()
        .ok_or_else(|| ApplicationError::Tls("client key path missing".to_string()))?;

    let cert = std::fs::read(cert_file).map_err(|e| {
        ApplicationError::Tls(format!(
            "failed to read client certificate {}: {e}",
            cert_file.display()
        ))
    })?;
    let key = std::fs::read(key_file).map_err(|e| {
        ApplicationError::Tls(format!(
            "failed to read client key {}: {e}",
            key_file.display()
        ))
    })?;
    Ok((cert, key))
}
