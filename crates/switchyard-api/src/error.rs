use thiserror::Error;

/// Top-level error type for the `switchyard-api` crate.
///
/// Covers transport failures, controller status responses, and payload
/// decoding. `switchyard-core` wraps these with cluster and resource
/// context before surfacing them to callers.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration ───────────────────────────────────────────────
    /// Malformed controller endpoint spec (`host:port:user:password`).
    #[error("Invalid controller endpoint {spec:?}: {reason}")]
    InvalidEndpoint { spec: String, reason: String },

    /// A client was constructed with an empty endpoint list.
    #[error("Controller endpoint list is empty")]
    NoEndpoints,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out against every configured endpoint.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The client is being torn down; its request limiter is closed.
    #[error("Client is shutting down")]
    Shutdown,

    // ── Controller responses ────────────────────────────────────────
    /// 401 -- credentials rejected by the controller.
    #[error("Controller rejected credentials")]
    Unauthorized,

    /// 403 -- the authenticated principal may not perform this request.
    #[error("Controller denied request: {message}")]
    Forbidden { message: String },

    /// 404 -- the addressed switch or port does not exist.
    #[error("Resource not found on controller: {message}")]
    ResourceNotFound { message: String },

    /// 409 -- the request conflicts with current controller state.
    #[error("Controller state conflict: {message}")]
    Conflict { message: String },

    /// 503 -- controller is up but cannot serve the request right now.
    #[error("Controller unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// Any other non-success status from the controller.
    #[error("Controller error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying
    /// against another endpoint.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } | Self::ServiceUnavailable { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::ResourceNotFound { .. } => true,
            _ => false,
        }
    }
}
