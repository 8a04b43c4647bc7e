// Controller endpoint addressing and credential material.
//
// Clusters are configured as an ordered list of `host:port:user:password`
// specs; the first entry's transport parameters govern the whole cluster.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Default per-request timeout, matching the controller's own default.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default retry count across endpoints.
pub const DEFAULT_RETRIES: u32 = 2;
/// Default redirect-following limit per request.
pub const DEFAULT_REDIRECTS: usize = 2;

/// One controller API endpoint within a cluster.
///
/// Immutable once constructed. Endpoints are interchangeable targets for
/// the same cluster state; [`crate::ControlClient`] rotates between them
/// on connection failures.
#[derive(Debug, Clone)]
pub struct ControllerEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub retries: u32,
    pub redirects: usize,
}

impl ControllerEndpoint {
    /// Endpoint with default timeouts, retries, and redirect limits.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: SecretString,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            redirects: DEFAULT_REDIRECTS,
        }
    }

    /// Parse a positional `host:port:user:password` connection spec.
    ///
    /// The password segment may contain further colons; only the first
    /// three separators are structural.
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidEndpoint {
            spec: spec.to_owned(),
            reason: reason.to_owned(),
        };

        let mut parts = spec.splitn(4, ':');
        let host = parts.next().filter(|h| !h.is_empty()).ok_or_else(|| invalid("missing host"))?;
        let port_raw = parts.next().ok_or_else(|| invalid("missing port"))?;
        let username = parts
            .next()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| invalid("missing username"))?;
        let password = parts.next().ok_or_else(|| invalid("missing password"))?;

        let port: u16 = port_raw
            .parse()
            .map_err(|_| invalid(&format!("invalid port {port_raw:?}")))?;
        if port == 0 {
            return Err(invalid("port must be nonzero"));
        }

        Ok(Self::new(host, port, username, SecretString::from(password)))
    }

    /// Base URL for this endpoint under the given scheme.
    pub fn base_url(&self, scheme: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!(
            "{scheme}://{}:{}/",
            self.host, self.port
        ))?)
    }
}
