//! Error types for the reconciliation engine.

use uuid::Uuid;

/// Errors surfaced by engine operations.
///
/// Backend failures never carry a bare transport error: they are wrapped
/// into [`CoreError::BackendUnavailable`] together with the name of the
/// cluster that was being talked to, so that a caller (or an operator
/// reading logs) can tell which half of the system misbehaved.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    // ── Configuration ───────────────────────────────────────────────
    /// Cluster configuration was malformed. Fatal at startup: a registry
    /// is never built from a partially valid configuration.
    #[error("invalid cluster configuration: {message}")]
    InvalidClusterConfig { message: String },

    /// A resource named a failure-domain zone no configured cluster serves.
    #[error("no cluster serves zone {zone:?}")]
    UnknownZone { zone: String },

    // ── Validation ──────────────────────────────────────────────────
    /// Malformed or inconsistent request attributes.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// The requested (physical network, segmentation id) pair is already
    /// bound to another network.
    #[error("segmentation id {segmentation_id} already in use on {physical_network:?}")]
    SegmentationIdInUse {
        physical_network: String,
        segmentation_id: u16,
    },

    // ── Capacity ────────────────────────────────────────────────────
    /// Every backend switch carrying the network is at its port ceiling
    /// and fragmentation is not permitted for its type.
    #[error("no backend switch for network {network} can accept another port")]
    CapacityExhausted { network: Uuid },

    // ── Lookup ──────────────────────────────────────────────────────
    #[error("network {id} not found")]
    NetworkNotFound { id: Uuid },

    #[error("port {id} not found")]
    PortNotFound { id: Uuid },

    // ── Authorization ───────────────────────────────────────────────
    /// The caller is not permitted to perform `action`.
    #[error("not authorized to {action}")]
    Forbidden { action: String },

    // ── Backend ─────────────────────────────────────────────────────
    /// A backend call failed. Carries the cluster name for log context.
    #[error("backend request to cluster {cluster:?} failed: {source}")]
    BackendUnavailable {
        cluster: String,
        #[source]
        source: switchyard_api::Error,
    },

    // ── Consistency ─────────────────────────────────────────────────
    /// Local records and backend state diverge and strict consistency
    /// checks are enabled. Without strict checks the same condition is
    /// logged and tolerated.
    #[error("local records diverge from backend state: {message}")]
    OutOfSync { message: String },
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Wrap an API-level failure with the cluster it occurred on.
    pub fn backend(cluster: &str, source: switchyard_api::Error) -> Self {
        Self::BackendUnavailable {
            cluster: cluster.to_owned(),
            source,
        }
    }

    /// True for lookup misses (`NetworkNotFound` / `PortNotFound`).
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NetworkNotFound { .. } | Self::PortNotFound { .. })
    }
}
