//! Backend switch allocation for port placement.

use switchyard_api::wire::{
    tag_scope, truncate_display_name, BackendSwitch, SwitchSpec, SwitchUpdate, Tag,
};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::cluster::Cluster;
use crate::error::CoreError;
use crate::model::{NetworkRecord, NetworkType, ProviderBinding};

/// Places ports onto backend switches under a per-switch port ceiling.
///
/// A network normally maps onto exactly one switch. Bridged network
/// types sit on a physically constrained L2 domain and carry a stricter
/// ceiling; in exchange they may fragment: when every switch backing the
/// network is full, the primary switch is tagged multi-switch and an
/// extra switch is created under the same network tag, and ports land
/// on whichever switch has room. Overlay networks never fragment, so a
/// full overlay network is a hard capacity failure.
#[derive(Debug, Clone, Copy)]
pub struct SwitchAllocator {
    max_ports_overlay: u32,
    max_ports_bridged: u32,
    default_transport_type: NetworkType,
}

impl SwitchAllocator {
    #[must_use]
    pub fn new(
        max_ports_overlay: u32,
        max_ports_bridged: u32,
        default_transport_type: NetworkType,
    ) -> Self {
        Self {
            max_ports_overlay,
            max_ports_bridged,
            default_transport_type,
        }
    }

    /// Port ceiling and fragmentation permission for a network with this
    /// provider binding.
    #[must_use]
    pub fn capacity_for(&self, binding: Option<&ProviderBinding>) -> (u32, bool) {
        match binding.map(|b| b.network_type) {
            Some(network_type) if network_type.is_bridged() => (self.max_ports_bridged, true),
            _ => (self.max_ports_overlay, false),
        }
    }

    /// Pick the switch that will carry one more port.
    ///
    /// `switches` must be the current tagged set for the network on
    /// `cluster`, queried with status relations. The capacity check is a
    /// point-in-time read with no reservation; concurrent placements may
    /// race past the same free slot.
    pub async fn select(
        &self,
        cluster: &Cluster,
        network: &NetworkRecord,
        binding: Option<&ProviderBinding>,
        switches: &[BackendSwitch],
    ) -> Result<BackendSwitch, CoreError> {
        let (max_ports, allow_fragmentation) = self.capacity_for(binding);
        if let Some(free) = switches.iter().find(|sw| sw.port_count() < max_ports) {
            debug!(
                switch = %free.uuid,
                ports = free.port_count(),
                "selected switch with spare capacity"
            );
            return Ok(free.clone());
        }
        debug!(
            network = %network.id,
            checked = switches.len(),
            "no switch has available ports"
        );
        if !allow_fragmentation {
            error!(network = %network.id, "maximum number of ports reached");
            return Err(CoreError::CapacityExhausted {
                network: network.id,
            });
        }
        self.fragment(cluster, network, binding, switches).await
    }

    /// Fragment a full network: mark the primary switch multi-switch,
    /// then create an extra switch inheriting the provider binding.
    async fn fragment(
        &self,
        cluster: &Cluster,
        network: &NetworkRecord,
        binding: Option<&ProviderBinding>,
        switches: &[BackendSwitch],
    ) -> Result<BackendSwitch, CoreError> {
        let Some(primary) = switches.iter().find(|sw| sw.uuid == network.id) else {
            error!(network = %network.id, "primary switch missing, cannot fragment");
            return Err(CoreError::NetworkNotFound { id: network.id });
        };
        if !primary.has_tag(tag_scope::MULTI_SWITCH) {
            let mut tags = primary.tags.clone();
            tags.push(Tag::scoped(tag_scope::MULTI_SWITCH, "true"));
            cluster
                .client()
                .update_switch(
                    primary.uuid,
                    &SwitchUpdate {
                        display_name: None,
                        tags: Some(tags),
                    },
                )
                .await
                .map_err(|err| CoreError::backend(cluster.name(), err))?;
        }
        let name = format!("{}-ext-{}", network.name, switches.len());
        let spec = self.switch_spec(
            &name,
            &network.tenant_id,
            Some(network.id),
            binding,
            cluster.default_transport_zone(),
        );
        let created = cluster
            .client()
            .create_switch(&spec)
            .await
            .map_err(|err| CoreError::backend(cluster.name(), err))?;
        info!(
            network = %network.id,
            switch = %created.uuid,
            "created extra switch for full network"
        );
        Ok(created)
    }

    /// Wire spec for a switch realizing a network. `network_id` is
    /// `None` for the primary switch at network creation, before the
    /// backend has assigned the id.
    #[must_use]
    pub fn switch_spec(
        &self,
        name: &str,
        tenant_id: &str,
        network_id: Option<Uuid>,
        binding: Option<&ProviderBinding>,
        transport_zone: Uuid,
    ) -> SwitchSpec {
        let transport_type = binding.map_or(self.default_transport_type, |b| b.network_type);
        let mut tags = vec![Tag::scoped(tag_scope::TENANT_ID, tenant_id)];
        if let Some(id) = network_id {
            tags.push(Tag::scoped(tag_scope::LOGICAL_NETWORK_ID, id.to_string()));
        }
        SwitchSpec {
            display_name: truncate_display_name(name),
            transport_zone,
            transport_type: transport_type.to_string(),
            vlan_id: binding.and_then(|b| b.segmentation_id),
            tags,
        }
    }
}
