//! Network operations.

use std::collections::HashMap;

use futures_util::future::try_join_all;
use std::sync::Arc;
use switchyard_api::wire::{tag_scope, BackendSwitch, ResourceFilter, SwitchUpdate, Tag};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{network_visible, ReconciliationEngine};
use crate::error::CoreError;
use crate::model::{
    Network, NetworkCreate, NetworkFilter, NetworkRecord, NetworkUpdate, ProviderBinding,
    ResourceStatus,
};
use crate::policy::{action, RequestContext};

impl ReconciliationEngine {
    /// Create a network.
    ///
    /// Ordering is backend-first: the backend assigns the switch uuid,
    /// which becomes the network id, and the switch is then tagged with
    /// that id so every later lookup finds it by tag. Only then is the
    /// local record written. A local failure after backend creation
    /// leaves an orphaned switch, reported by later listings rather
    /// than rolled back.
    pub async fn create_network(
        &self,
        ctx: &RequestContext,
        req: NetworkCreate,
    ) -> Result<Network, CoreError> {
        if let Some(binding) = &req.provider {
            binding.validate()?;
            self.policy.enforce_set(ctx, action::PROVIDER_SET)?;
        }
        if !req.admin_state_up {
            // The backend cannot express an admin-down switch.
            warn!(
                network = %req.name,
                "admin-down networks are not supported, creating the network up"
            );
        }
        let cluster = self.registry.resolve(req.zone.as_deref())?;

        // Segment uniqueness is probed before the backend call so a
        // losing request creates nothing at all.
        if let Some((physical, vlan)) = req.provider.as_ref().and_then(ProviderBinding::segment) {
            let txn = self.store.begin().await;
            if txn.network_for_segment(physical, vlan).is_some() {
                return Err(CoreError::SegmentationIdInUse {
                    physical_network: physical.to_owned(),
                    segmentation_id: vlan,
                });
            }
        }

        let spec = self.allocator.switch_spec(
            &req.name,
            &req.tenant_id,
            None,
            req.provider.as_ref(),
            cluster.default_transport_zone(),
        );
        let client = cluster.client();
        let created = client
            .create_switch(&spec)
            .await
            .map_err(|err| CoreError::backend(cluster.name(), err))?;
        let network_id = created.uuid;
        let mut tags = created.tags;
        tags.push(Tag::scoped(
            tag_scope::LOGICAL_NETWORK_ID,
            network_id.to_string(),
        ));
        if let Err(err) = client
            .update_switch(
                network_id,
                &SwitchUpdate {
                    display_name: None,
                    tags: Some(tags),
                },
            )
            .await
        {
            warn!(
                switch = %network_id,
                cluster = %cluster.name(),
                "failed to tag new switch with its network id, switch is orphaned"
            );
            return Err(CoreError::backend(cluster.name(), err));
        }
        info!(network = %network_id, cluster = %cluster.name(), "created backend switch");

        let record = NetworkRecord {
            id: network_id,
            tenant_id: req.tenant_id,
            name: req.name,
            admin_state_up: true,
        };
        let port_security = req.port_security_enabled.unwrap_or(true);

        let mut txn = self.store.begin().await;
        // The probe runs again inside the writing transaction; a lost
        // race here orphans the switch just created.
        if let Some((physical, vlan)) = req.provider.as_ref().and_then(ProviderBinding::segment) {
            if txn.network_for_segment(physical, vlan).is_some() {
                warn!(
                    switch = %network_id,
                    cluster = %cluster.name(),
                    "segment was claimed concurrently, backend switch is orphaned"
                );
                return Err(CoreError::SegmentationIdInUse {
                    physical_network: physical.to_owned(),
                    segmentation_id: vlan,
                });
            }
        }
        txn.insert_network(record.clone());
        if let Some(binding) = req.provider.clone() {
            txn.set_binding(network_id, binding);
        }
        txn.set_network_port_security(network_id, port_security);
        txn.commit();

        let provider = if self.policy.check_view(ctx, action::PROVIDER_VIEW) {
            req.provider
        } else {
            None
        };
        Ok(record.into_view(Some(ResourceStatus::Active), provider, port_security))
    }

    /// Read one network, deriving its status from the fabric state of
    /// every backend switch carrying it.
    ///
    /// The network is active only if all of its switches report fabric
    /// up. A missing switch counts as down, never as a query failure;
    /// an actual query failure surfaces as [`CoreError::BackendUnavailable`].
    pub async fn get_network(&self, ctx: &RequestContext, id: Uuid) -> Result<Network, CoreError> {
        let (record, binding, port_security) = {
            let txn = self.store.begin().await;
            let record = txn.network(id)?.clone();
            if !network_visible(ctx, &record) {
                return Err(CoreError::NetworkNotFound { id });
            }
            (record, txn.binding(id).cloned(), txn.network_port_security(id))
        };

        let pairs = self.tagged_switches(id).await?;
        let mut observed = 0usize;
        let mut status = ResourceStatus::Active;
        for (_, switches) in &pairs {
            for switch in switches {
                observed += 1;
                if !switch.fabric_up() {
                    status = ResourceStatus::Down;
                }
            }
        }
        if observed == 0 {
            warn!(network = %id, "no backend switches carry this network");
            status = ResourceStatus::Down;
        }

        let provider = if self.policy.check_view(ctx, action::PROVIDER_VIEW) {
            binding
        } else {
            None
        };
        Ok(record.into_view(Some(status), provider, port_security))
    }

    /// Bulk listing, cross-referenced against the backend by uuid.
    ///
    /// Matched records take display name and status from the backend
    /// switch. Records with no backend match are returned without a
    /// status. Backend switches with no matching record are drift:
    /// summarized as a count-only warning, or an [`CoreError::OutOfSync`]
    /// error under strict checks.
    pub async fn get_networks(
        &self,
        ctx: &RequestContext,
        filter: &NetworkFilter,
    ) -> Result<Vec<Network>, CoreError> {
        let locals: Vec<(NetworkRecord, Option<ProviderBinding>, bool)> = {
            let txn = self.store.begin().await;
            txn.networks()
                .filter(|record| network_visible(ctx, record))
                .filter(|record| {
                    filter
                        .tenant_id
                        .as_ref()
                        .is_none_or(|tenant| &record.tenant_id == tenant)
                })
                .filter(|record| filter.ids.is_empty() || filter.ids.contains(&record.id))
                .cloned()
                .map(|record| {
                    let binding = txn.binding(record.id).cloned();
                    let port_security = txn.network_port_security(record.id);
                    (record, binding, port_security)
                })
                .collect()
        };

        let tenant_scope: Option<&str> = if ctx.is_admin {
            filter.tenant_id.as_deref()
        } else {
            Some(ctx.tenant_id.as_str())
        };
        let backend_filter = match tenant_scope {
            Some(tenant) => ResourceFilter::by_tag(tag_scope::TENANT_ID, tenant).with_relations(),
            None => ResourceFilter::default().with_relations(),
        };
        let queries = self.registry.iter().map(|cluster| {
            let cluster = Arc::clone(cluster);
            let filter = backend_filter.clone();
            async move {
                cluster
                    .client()
                    .list_switches(&filter)
                    .await
                    .map_err(|err| CoreError::backend(cluster.name(), err))
            }
        });
        let mut remote: HashMap<Uuid, BackendSwitch> = HashMap::new();
        for switches in try_join_all(queries).await? {
            for switch in switches {
                remote.insert(switch.uuid, switch);
            }
        }
        if !filter.ids.is_empty() {
            remote.retain(|uuid, _| filter.ids.contains(uuid));
        }

        let can_view_provider = self.policy.check_view(ctx, action::PROVIDER_VIEW);
        let mut views = Vec::with_capacity(locals.len());
        for (mut record, binding, port_security) in locals {
            let status = if let Some(switch) = remote.remove(&record.id) {
                let fabric_up = switch.fabric_up();
                record.name = switch.display_name;
                Some(if fabric_up {
                    ResourceStatus::Active
                } else {
                    ResourceStatus::Down
                })
            } else {
                debug!(network = %record.id, "network not found on backend");
                None
            };
            let provider = if can_view_provider { binding } else { None };
            views.push(record.into_view(status, provider, port_security));
        }
        self.report_drift("switches", remote.len())?;
        views.sort_by_key(|network| network.id);
        Ok(views)
    }

    /// Update a network. Local-only: the backend switch keeps its
    /// display name (listings copy the backend name over this record),
    /// and admin-down remains unsupported.
    pub async fn update_network(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: NetworkUpdate,
    ) -> Result<Network, CoreError> {
        let NetworkUpdate {
            name,
            admin_state_up,
            port_security_enabled,
        } = update;
        if admin_state_up == Some(false) {
            return Err(CoreError::invalid_input(
                "administratively down networks are not supported",
            ));
        }
        if port_security_enabled.is_some() {
            self.policy.enforce_set(ctx, action::PORT_SECURITY_UPDATE)?;
        }

        let mut txn = self.store.begin().await;
        if !network_visible(ctx, txn.network(id)?) {
            return Err(CoreError::NetworkNotFound { id });
        }
        let record = txn
            .update_network(id, |record| {
                if let Some(name) = name {
                    record.name = name;
                }
                if let Some(up) = admin_state_up {
                    record.admin_state_up = up;
                }
            })?
            .clone();
        if let Some(enabled) = port_security_enabled {
            txn.set_network_port_security(id, enabled);
        }
        let binding = txn.binding(id).cloned();
        let port_security = txn.network_port_security(id);
        txn.commit();

        let provider = if self.policy.check_view(ctx, action::PROVIDER_VIEW) {
            binding
        } else {
            None
        };
        Ok(record.into_view(None, provider, port_security))
    }

    /// Delete a network.
    ///
    /// The (cluster, switch) pairs are collected before anything is
    /// deleted; zero pairs means the network was never properly
    /// provisioned and fails the whole operation untouched. The local
    /// record (with its ports and side records) goes first, then each
    /// backend switch best-effort: a failed switch delete is logged and
    /// left for manual reconciliation.
    pub async fn delete_network(&self, ctx: &RequestContext, id: Uuid) -> Result<(), CoreError> {
        {
            let txn = self.store.begin().await;
            if !network_visible(ctx, txn.network(id)?) {
                return Err(CoreError::NetworkNotFound { id });
            }
        }

        let pairs = self.tagged_switches(id).await?;
        if pairs.is_empty() {
            return Err(CoreError::NetworkNotFound { id });
        }

        let mut txn = self.store.begin().await;
        txn.remove_network(id)?;
        txn.commit();

        for (cluster, switches) in pairs {
            for switch in switches {
                if let Err(err) = cluster.client().delete_switch(switch.uuid).await {
                    warn!(
                        switch = %switch.uuid,
                        cluster = %cluster.name(),
                        error = %err,
                        "failed to delete backend switch, stores diverge"
                    );
                }
            }
        }
        info!(network = %id, "network deleted");
        Ok(())
    }
}
