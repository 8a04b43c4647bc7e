//! The reconciliation engine: network and port CRUD that keeps local
//! records and backend state aligned, and reports drift between them.

mod networks;
mod ports;

use std::sync::Arc;

use futures_util::future::try_join_all;
use switchyard_api::wire::{tag_scope, BackendPort, BackendSwitch, ResourceFilter};
use switchyard_api::SwitchSelector;
use tracing::warn;
use uuid::Uuid;

use crate::allocator::SwitchAllocator;
use crate::cluster::Cluster;
use crate::error::CoreError;
use crate::model::{NetworkRecord, NetworkType, PortRecord};
use crate::policy::{Policy, RequestContext};
use crate::registry::ClusterRegistry;
use crate::store::RecordStore;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Per-switch port ceiling for overlay networks.
    pub max_ports_overlay: u32,
    /// Per-switch port ceiling for bridged (flat/vlan) networks.
    pub max_ports_bridged: u32,
    /// Transport type for networks created without a provider binding.
    pub default_transport_type: NetworkType,
    /// Fail listings with [`CoreError::OutOfSync`] when the backend holds
    /// resources with no local counterpart, instead of warning.
    pub strict_sync: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_ports_overlay: 256,
            max_ports_bridged: 64,
            default_transport_type: NetworkType::Stt,
            strict_sync: false,
        }
    }
}

/// Orchestrates network and port CRUD across the local record store and
/// the configured backend clusters.
///
/// Every operation pairs one local-store transaction with the backend
/// calls that mirror it. Backend calls are not covered by the
/// transaction: partial failure leaves the two stores diverged, and the
/// engine's contract is to log such divergence with full context and
/// surface it through listings, never to auto-heal it.
pub struct ReconciliationEngine {
    registry: ClusterRegistry,
    store: Arc<RecordStore>,
    policy: Arc<dyn Policy>,
    allocator: SwitchAllocator,
    options: EngineOptions,
}

impl ReconciliationEngine {
    pub fn new(
        registry: ClusterRegistry,
        store: Arc<RecordStore>,
        policy: Arc<dyn Policy>,
        options: EngineOptions,
    ) -> Self {
        let allocator = SwitchAllocator::new(
            options.max_ports_overlay,
            options.max_ports_bridged,
            options.default_transport_type,
        );
        Self {
            registry,
            store,
            policy,
            allocator,
            options,
        }
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    // ── Shared lookups ──────────────────────────────────────────────

    /// Switches tagged with `network_id` on each cluster that has any.
    /// Clusters are queried concurrently, with status relations.
    pub(crate) async fn tagged_switches(
        &self,
        network_id: Uuid,
    ) -> Result<Vec<(Arc<Cluster>, Vec<BackendSwitch>)>, CoreError> {
        let filter = ResourceFilter::by_tag(tag_scope::LOGICAL_NETWORK_ID, network_id.to_string())
            .with_relations();
        let queries = self.registry.iter().map(|cluster| {
            let cluster = Arc::clone(cluster);
            let filter = filter.clone();
            async move {
                let switches = cluster
                    .client()
                    .list_switches(&filter)
                    .await
                    .map_err(|err| CoreError::backend(cluster.name(), err))?;
                Ok::<_, CoreError>((cluster, switches))
            }
        });
        let pairs = try_join_all(queries).await?;
        Ok(pairs
            .into_iter()
            .filter(|(_, switches)| !switches.is_empty())
            .collect())
    }

    /// The cluster whose switches realize `network_id`, with those
    /// switches. First match in configuration order wins.
    pub(crate) async fn locate_network(
        &self,
        network_id: Uuid,
    ) -> Result<(Arc<Cluster>, Vec<BackendSwitch>), CoreError> {
        self.tagged_switches(network_id)
            .await?
            .into_iter()
            .next()
            .ok_or(CoreError::NetworkNotFound { id: network_id })
    }

    /// Find the backend port tagged with `port_id`.
    ///
    /// The recorded affinity cluster is probed first, then every other
    /// cluster in configuration order; the first match wins. At most one
    /// match is expected since a port belongs to exactly one network.
    pub(crate) async fn locate_port(
        &self,
        port_id: Uuid,
        affinity: Option<&str>,
    ) -> Result<Option<(Arc<Cluster>, BackendPort)>, CoreError> {
        let filter = ResourceFilter::by_tag(tag_scope::LOGICAL_PORT_ID, port_id.to_string())
            .with_relations();
        let mut clusters = Vec::with_capacity(self.registry.len());
        if let Some(name) = affinity {
            if let Some(cluster) = self.registry.get(name) {
                clusters.push(cluster);
            } else {
                warn!(cluster = %name, port = %port_id, "recorded cluster is no longer configured");
            }
        }
        for cluster in self.registry.iter() {
            if Some(cluster.name()) != affinity {
                clusters.push(Arc::clone(cluster));
            }
        }
        for cluster in clusters {
            let ports = cluster
                .client()
                .list_ports(SwitchSelector::Any, &filter)
                .await
                .map_err(|err| CoreError::backend(cluster.name(), err))?;
            if let Some(port) = ports.into_iter().next() {
                return Ok(Some((cluster, port)));
            }
        }
        Ok(None)
    }

    /// Count-only drift report for backend resources with no local
    /// counterpart. Strict mode turns the warning into an error.
    pub(crate) fn report_drift(&self, resource: &str, unclaimed: usize) -> Result<(), CoreError> {
        if unclaimed == 0 {
            return Ok(());
        }
        if self.options.strict_sync {
            return Err(CoreError::OutOfSync {
                message: format!("{unclaimed} backend {resource} have no local record"),
            });
        }
        warn!(
            count = unclaimed,
            resource,
            "found backend resources not bound to local records, stores are potentially out of sync"
        );
        Ok(())
    }
}

/// Non-admin callers only see resources of their own tenant. A mismatch
/// reads as absence, never as a permission error.
pub(crate) fn network_visible(ctx: &RequestContext, record: &NetworkRecord) -> bool {
    ctx.is_admin || record.tenant_id == ctx.tenant_id
}

pub(crate) fn port_visible(ctx: &RequestContext, record: &PortRecord) -> bool {
    ctx.is_admin || record.tenant_id == ctx.tenant_id
}
