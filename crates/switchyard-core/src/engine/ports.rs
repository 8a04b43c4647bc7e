//! Port operations.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::try_join_all;
use switchyard_api::wire::{
    self, device_digest, tag_scope, truncate_display_name, Attachment, BackendPort, PortSpec,
    ResourceFilter, Tag,
};
use switchyard_api::SwitchSelector;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{network_visible, port_visible, ReconciliationEngine};
use crate::error::CoreError;
use crate::model::{
    MacAddress, Port, PortCreate, PortFilter, PortRecord, PortUpdate, ResourceStatus,
};
use crate::policy::{action, RequestContext};

/// Join-key and ownership tags carried by every backend port.
fn port_tags(record: &PortRecord) -> Vec<Tag> {
    vec![
        Tag::scoped(tag_scope::LOGICAL_PORT_ID, record.id.to_string()),
        Tag::scoped(tag_scope::LOGICAL_NETWORK_ID, record.network_id.to_string()),
        Tag::scoped(tag_scope::TENANT_ID, record.tenant_id.as_str()),
        Tag::scoped(tag_scope::DEVICE_ID, device_digest(&record.device_id)),
    ]
}

impl ReconciliationEngine {
    /// Create a port on an existing network.
    ///
    /// Ordering is local-first: the id and MAC are assigned locally,
    /// then tagged onto the backend port as the join key. The local
    /// transaction stays open across the backend calls, so a backend
    /// failure rolls the record back and nothing persists. Attachment
    /// failure after port creation leaves an orphaned backend port,
    /// logged for manual reconciliation.
    pub async fn create_port(
        &self,
        ctx: &RequestContext,
        req: PortCreate,
    ) -> Result<Port, CoreError> {
        if req.port_security_enabled.is_some() {
            self.policy.enforce_set(ctx, action::PORT_SECURITY_CREATE)?;
        }
        let PortCreate {
            network_id,
            tenant_id,
            name,
            device_id,
            admin_state_up,
            mac_address,
            fixed_ips,
            port_security_enabled,
        } = req;

        let mut txn = self.store.begin().await;
        let network = txn.network(network_id)?.clone();
        if !network_visible(ctx, &network) {
            return Err(CoreError::NetworkNotFound { id: network_id });
        }
        let port_security =
            port_security_enabled.unwrap_or_else(|| txn.network_port_security(network_id));
        let binding = txn.binding(network_id).cloned();

        let mut record = PortRecord {
            id: Uuid::new_v4(),
            network_id,
            tenant_id,
            name,
            device_id,
            admin_state_up,
            mac_address: mac_address.unwrap_or_else(MacAddress::generate),
            fixed_ips,
            cluster: None,
        };

        let (cluster, switches) = self.locate_network(network_id).await?;
        let switch = self
            .allocator
            .select(&cluster, &network, binding.as_ref(), &switches)
            .await?;
        let spec = PortSpec {
            display_name: truncate_display_name(&record.name),
            admin_status_enabled: record.admin_state_up,
            tags: port_tags(&record),
        };
        let client = cluster.client();
        let backend = client
            .create_port(switch.uuid, &spec)
            .await
            .map_err(|err| CoreError::backend(cluster.name(), err))?;
        let attachment = Attachment::Vif {
            vif_uuid: record.id,
        };
        if let Err(err) = client
            .plug_attachment(switch.uuid, backend.uuid, &attachment)
            .await
        {
            warn!(
                port = %backend.uuid,
                switch = %switch.uuid,
                cluster = %cluster.name(),
                "failed to plug attachment on new backend port, port is orphaned"
            );
            return Err(CoreError::backend(cluster.name(), err));
        }
        info!(
            port = %record.id,
            switch = %switch.uuid,
            cluster = %cluster.name(),
            "created backend port"
        );

        record.cluster = Some(cluster.name().to_owned());
        txn.insert_port(record.clone());
        txn.set_port_security(record.id, port_security);
        txn.commit();

        Ok(record.into_view(Some(ResourceStatus::Active), port_security))
    }

    /// Read one port, projecting admin state and fabric status from the
    /// backend port it joins to. A missing backend port leaves the
    /// status unset rather than failing the read.
    pub async fn get_port(&self, ctx: &RequestContext, id: Uuid) -> Result<Port, CoreError> {
        let (mut record, port_security) = {
            let txn = self.store.begin().await;
            let record = txn.port(id)?.clone();
            if !port_visible(ctx, &record) {
                return Err(CoreError::PortNotFound { id });
            }
            (record, txn.port_security(id))
        };

        let located = self.locate_port(id, record.cluster.as_deref()).await?;
        let status = if let Some((_, backend)) = located {
            record.admin_state_up = backend.admin_status_enabled;
            Some(if backend.fabric_up() {
                ResourceStatus::Active
            } else {
                ResourceStatus::Down
            })
        } else {
            warn!(port = %id, "port not found on any backend cluster");
            None
        };
        Ok(record.into_view(status, port_security))
    }

    /// Bulk listing, cross-referenced against the backend by the
    /// join-key tag.
    ///
    /// Matched records take admin state, display name, and status from
    /// the backend port; each match is consumed so that leftovers on
    /// either side surface. Local records with no match are returned
    /// without a status and logged per record; backend ports with no
    /// local record are drift, summarized as a count-only warning or an
    /// [`CoreError::OutOfSync`] error under strict checks.
    pub async fn get_ports(
        &self,
        ctx: &RequestContext,
        filter: &PortFilter,
    ) -> Result<Vec<Port>, CoreError> {
        let locals: Vec<(PortRecord, bool)> = {
            let txn = self.store.begin().await;
            txn.ports()
                .filter(|record| port_visible(ctx, record))
                .filter(|record| {
                    filter
                        .network_id
                        .is_none_or(|network| record.network_id == network)
                })
                .filter(|record| {
                    filter
                        .device_id
                        .as_ref()
                        .is_none_or(|device| &record.device_id == device)
                })
                .filter(|record| {
                    filter
                        .tenant_id
                        .as_ref()
                        .is_none_or(|tenant| &record.tenant_id == tenant)
                })
                .cloned()
                .map(|record| {
                    let port_security = txn.port_security(record.id);
                    (record, port_security)
                })
                .collect()
        };

        let tenant_scope: Option<&str> = if ctx.is_admin {
            filter.tenant_id.as_deref()
        } else {
            Some(ctx.tenant_id.as_str())
        };
        let mut backend_filter = ResourceFilter::default()
            .with_relations()
            .with_scope_presence(tag_scope::LOGICAL_PORT_ID);
        if let Some(network) = filter.network_id {
            backend_filter =
                backend_filter.and_tag(tag_scope::LOGICAL_NETWORK_ID, network.to_string());
        }
        if let Some(device) = &filter.device_id {
            backend_filter = backend_filter.and_tag(tag_scope::DEVICE_ID, device_digest(device));
        }
        if let Some(tenant) = tenant_scope {
            backend_filter = backend_filter.and_tag(tag_scope::TENANT_ID, tenant);
        }

        let queries = self.registry.iter().map(|cluster| {
            let cluster = Arc::clone(cluster);
            let filter = backend_filter.clone();
            async move {
                cluster
                    .client()
                    .list_ports(SwitchSelector::Any, &filter)
                    .await
                    .map_err(|err| CoreError::backend(cluster.name(), err))
            }
        });
        let mut remote: HashMap<Uuid, BackendPort> = HashMap::new();
        for ports in try_join_all(queries).await? {
            for port in ports {
                let parsed = port
                    .tag_value(tag_scope::LOGICAL_PORT_ID)
                    .and_then(|tag| tag.parse::<Uuid>().ok());
                let Some(join_key) = parsed else {
                    debug!(port = %port.uuid, "backend port carries an unparsable join tag");
                    continue;
                };
                remote.insert(join_key, port);
            }
        }

        let mut views = Vec::with_capacity(locals.len());
        for (mut record, port_security) in locals {
            let status = if let Some(backend) = remote.remove(&record.id) {
                let fabric_up = backend.fabric_up();
                record.admin_state_up = backend.admin_status_enabled;
                record.name = backend.display_name;
                Some(if fabric_up {
                    ResourceStatus::Active
                } else {
                    ResourceStatus::Down
                })
            } else {
                debug!(port = %record.id, "port not found on backend");
                None
            };
            views.push(record.into_view(status, port_security));
        }
        self.report_drift("ports", remote.len())?;
        views.sort_by_key(|port| port.id);
        Ok(views)
    }

    /// Update a port locally and push the result to its backend port.
    ///
    /// The local transaction stays open until the backend accepted the
    /// update, so a backend failure rolls every local change back. The
    /// post-update status refresh is best-effort: a failed fetch logs
    /// and leaves the status unset instead of failing the update.
    pub async fn update_port(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        update: PortUpdate,
    ) -> Result<Port, CoreError> {
        self.policy.enforce_set(ctx, action::PORT_SECURITY_UPDATE)?;
        let PortUpdate {
            name,
            admin_state_up,
            device_id,
            fixed_ips,
            port_security_enabled,
        } = update;

        let mut txn = self.store.begin().await;
        if !port_visible(ctx, txn.port(id)?) {
            return Err(CoreError::PortNotFound { id });
        }
        let record = txn
            .update_port(id, |record| {
                if let Some(name) = name {
                    record.name = name;
                }
                if let Some(up) = admin_state_up {
                    record.admin_state_up = up;
                }
                if let Some(device) = device_id {
                    record.device_id = device;
                }
                if let Some(ips) = fixed_ips {
                    record.fixed_ips = ips;
                }
            })?
            .clone();
        if let Some(enabled) = port_security_enabled {
            txn.set_port_security(id, enabled);
        }
        let port_security = txn.port_security(id);

        let Some((cluster, backend)) = self.locate_port(id, record.cluster.as_deref()).await?
        else {
            warn!(port = %id, "port to update not found on any backend cluster");
            return Err(CoreError::OutOfSync {
                message: format!("port {id} has no backend counterpart"),
            });
        };
        let Some(switch) = backend.switch_uuid else {
            warn!(port = %backend.uuid, "backend port listing did not include its switch");
            return Err(CoreError::OutOfSync {
                message: format!("backend port for {id} has no switch relation"),
            });
        };
        let backend_update = wire::PortUpdate {
            display_name: Some(truncate_display_name(&record.name)),
            admin_status_enabled: Some(record.admin_state_up),
            tags: Some(port_tags(&record)),
        };
        cluster
            .client()
            .update_port(switch, backend.uuid, &backend_update)
            .await
            .map_err(|err| CoreError::backend(cluster.name(), err))?;
        txn.commit();

        let status = match cluster.client().port_status(switch, backend.uuid).await {
            Ok(status) => Some(if status.fabric_status_up {
                ResourceStatus::Active
            } else {
                ResourceStatus::Down
            }),
            Err(err) => {
                warn!(
                    port = %backend.uuid,
                    error = %err,
                    "unable to retrieve port status after update"
                );
                None
            }
        };
        Ok(record.into_view(status, port_security))
    }

    /// Delete a port, backend side first.
    ///
    /// A port with no backend counterpart fails with
    /// [`CoreError::PortNotFound`] before the local record is touched.
    /// A backend port that disappears between locate and delete is
    /// treated as already gone.
    pub async fn delete_port(&self, ctx: &RequestContext, id: Uuid) -> Result<(), CoreError> {
        let affinity = {
            let txn = self.store.begin().await;
            let record = txn.port(id)?;
            if !port_visible(ctx, record) {
                return Err(CoreError::PortNotFound { id });
            }
            record.cluster.clone()
        };

        let Some((cluster, backend)) = self.locate_port(id, affinity.as_deref()).await? else {
            warn!(port = %id, "port to delete not found on any backend cluster");
            return Err(CoreError::PortNotFound { id });
        };
        let Some(switch) = backend.switch_uuid else {
            return Err(CoreError::OutOfSync {
                message: format!("backend port for {id} has no switch relation"),
            });
        };
        match cluster.client().delete_port(switch, backend.uuid).await {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                debug!(port = %backend.uuid, "backend port already gone");
            }
            Err(err) => return Err(CoreError::backend(cluster.name(), err)),
        }

        let mut txn = self.store.begin().await;
        txn.remove_port(id)?;
        txn.commit();
        info!(port = %id, "port deleted");
        Ok(())
    }
}
