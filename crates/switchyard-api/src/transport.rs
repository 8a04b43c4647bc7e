// Shared transport configuration for building reqwest::Client instances.
//
// A cluster's transport parameters are taken from its first endpoint,
// so every endpoint of one cluster shares a single HTTP client.

use std::path::PathBuf;
use std::time::Duration;

use crate::endpoint::ControllerEndpoint;
use crate::error::Error;

/// TLS mode for controller connections.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Plain HTTP (lab controllers, test harnesses).
    Disabled,
    /// HTTPS using the system certificate store.
    System,
    /// HTTPS with a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// HTTPS, accepting any certificate (self-signed controllers).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// URL scheme for this mode.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Disabled => "http",
            Self::System | Self::CustomCa(_) | Self::DangerAcceptInvalid => "https",
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::DangerAcceptInvalid,
            request_timeout: crate::endpoint::DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: crate::endpoint::DEFAULT_CONNECT_TIMEOUT,
            redirects: crate::endpoint::DEFAULT_REDIRECTS,
        }
    }
}

impl TransportConfig {
    /// Transport parameters taken from one endpoint (the cluster primary).
    pub fn from_endpoint(endpoint: &ControllerEndpoint, tls: TlsMode) -> Self {
        Self {
            tls,
            request_timeout: endpoint.request_timeout,
            connect_timeout: endpoint.connect_timeout,
            redirects: endpoint.redirects,
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let redirect_policy = if self.redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(self.redirects)
        };

        let mut builder = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .redirect(redirect_policy)
            .user_agent("switchyard/0.1.0");

        match &self.tls {
            TlsMode::Disabled | TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
