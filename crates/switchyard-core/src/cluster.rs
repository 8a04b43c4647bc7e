//! A named controller cluster with its bound API client.

use std::fmt;

use switchyard_api::{ControlClient, ControllerEndpoint, TlsMode};
use uuid::Uuid;

use crate::error::CoreError;

/// Parsed configuration for one cluster, before a client is bound.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Unique cluster name.
    pub name: String,
    /// Priority-ordered controller endpoints. Must be non-empty.
    pub endpoints: Vec<ControllerEndpoint>,
    /// Transport zone new backend switches are created in.
    pub default_transport_zone: Uuid,
    pub cluster_uuid: Option<Uuid>,
    /// Failure-domain zone this cluster serves.
    pub zone: Option<String>,
    pub tls: TlsMode,
    /// Cap on in-flight backend requests for this cluster.
    pub concurrent_requests: usize,
}

/// A controller cluster: ordered endpoints plus the client bound to them.
///
/// Transport parameters (timeouts, retries, redirects) are those of the
/// first endpoint and apply cluster-wide.
pub struct Cluster {
    name: String,
    primary: ControllerEndpoint,
    secondaries: Vec<ControllerEndpoint>,
    default_transport_zone: Uuid,
    cluster_uuid: Option<Uuid>,
    zone: Option<String>,
    client: ControlClient,
}

impl Cluster {
    /// Bind a client to the configured endpoints.
    ///
    /// Fails with [`CoreError::InvalidClusterConfig`] when the endpoint
    /// list is empty or the transport cannot be built, so a cluster is
    /// never usable without at least one endpoint.
    pub fn new(config: ClusterConfig) -> Result<Self, CoreError> {
        let mut endpoints = config.endpoints;
        if endpoints.is_empty() {
            return Err(CoreError::InvalidClusterConfig {
                message: format!("cluster {:?} has no controller endpoints", config.name),
            });
        }
        let client = ControlClient::new(endpoints.clone(), config.tls, config.concurrent_requests)
            .map_err(|err| CoreError::InvalidClusterConfig {
                message: format!("cluster {:?}: {err}", config.name),
            })?;
        let primary = endpoints.remove(0);
        Ok(Self {
            name: config.name,
            primary,
            secondaries: endpoints,
            default_transport_zone: config.default_transport_zone,
            cluster_uuid: config.cluster_uuid,
            zone: config.zone,
            client,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &ControlClient {
        &self.client
    }

    /// First endpoint in priority order. Scalar connection parameters
    /// (host, credentials, timeouts) are read from here.
    #[must_use]
    pub fn primary(&self) -> &ControllerEndpoint {
        &self.primary
    }

    #[must_use]
    pub fn secondaries(&self) -> &[ControllerEndpoint] {
        &self.secondaries
    }

    #[must_use]
    pub fn default_transport_zone(&self) -> Uuid {
        self.default_transport_zone
    }

    #[must_use]
    pub fn cluster_uuid(&self) -> Option<Uuid> {
        self.cluster_uuid
    }

    #[must_use]
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("name", &self.name)
            .field("primary", &self.primary)
            .field("secondaries", &self.secondaries.len())
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}
