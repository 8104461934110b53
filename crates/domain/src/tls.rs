//! TLS configuration for outbound requests.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// TLS material for a single request or a whole profile.
///
/// All fields are file paths; loading and validation happens in the
/// executor, before any network I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TlsConfig {
    /// Client certificate (PEM) for mutual TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,
    /// Client private key (PKCS#8 PEM) for mutual TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
    /// CA bundle (PEM) used as a dedicated trust root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,
    /// Disable server certificate verification entirely.
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Creates an insecure config that accepts any certificate.
    #[must_use]
    pub fn insecure() -> Self {
        Self {
            insecure_skip_verify: true,
            ..Self::default()
        }
    }

    /// Returns true if a client certificate and key are both configured.
    #[must_use]
    pub const fn has_client_identity(&self) -> bool {
        self.cert_file.is_some() && self.key_file.is_some()
    }

    /// Selects the effective config for a request. A request-level config
    /// fully replaces a profile-level one; fields are never merged.
    #[must_use]
    pub fn effective<'a>(
        request_level: Option<&'a Self>,
        profile_level: Option<&'a Self>,
    ) -> Option<&'a Self> {
        request_level.or(profile_level)
    }
}
