//! Local record store with transactional mutation.

use std::collections::HashMap;

use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::{NetworkRecord, PortRecord, ProviderBinding};

#[derive(Debug, Clone, Default)]
struct Tables {
    networks: HashMap<Uuid, NetworkRecord>,
    ports: HashMap<Uuid, PortRecord>,
    bindings: HashMap<Uuid, ProviderBinding>,
    network_port_security: HashMap<Uuid, bool>,
    port_port_security: HashMap<Uuid, bool>,
}

/// In-process system of record for networks, ports, and their side
/// tables (provider bindings, port-security flags).
///
/// All reads and writes go through a [`Txn`]: [`RecordStore::begin`]
/// takes the single store lock and clones the tables into a working
/// copy, [`Txn::commit`] publishes the working copy, and dropping the
/// transaction without committing discards every change. Transactions
/// are serialized, which is the only strong consistency boundary the
/// engine has; in particular the segmentation-id uniqueness probe is
/// exactly as strong as this isolation.
#[derive(Debug, Default)]
pub struct RecordStore {
    tables: Mutex<Tables>,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a transaction. The store lock is held until the returned
    /// guard commits or drops.
    pub async fn begin(&self) -> Txn<'_> {
        let guard = self.tables.lock().await;
        let working = guard.clone();
        Txn { guard, working }
    }
}

/// An open transaction over the store tables.
pub struct Txn<'a> {
    guard: MutexGuard<'a, Tables>,
    working: Tables,
}

impl Txn<'_> {
    /// Publish the working copy. Dropping the transaction instead rolls
    /// every change back.
    pub fn commit(mut self) {
        *self.guard = self.working;
    }

    // ── Networks ────────────────────────────────────────────────────

    pub fn insert_network(&mut self, record: NetworkRecord) {
        self.working.networks.insert(record.id, record);
    }

    pub fn network(&self, id: Uuid) -> Result<&NetworkRecord, CoreError> {
        self.working
            .networks
            .get(&id)
            .ok_or(CoreError::NetworkNotFound { id })
    }

    pub fn update_network(
        &mut self,
        id: Uuid,
        apply: impl FnOnce(&mut NetworkRecord),
    ) -> Result<&NetworkRecord, CoreError> {
        let record = self
            .working
            .networks
            .get_mut(&id)
            .ok_or(CoreError::NetworkNotFound { id })?;
        apply(record);
        Ok(record)
    }

    /// Remove a network and everything hanging off it: its ports, its
    /// provider binding, and the port-security side records.
    pub fn remove_network(&mut self, id: Uuid) -> Result<NetworkRecord, CoreError> {
        let record = self
            .working
            .networks
            .remove(&id)
            .ok_or(CoreError::NetworkNotFound { id })?;
        let orphaned: Vec<Uuid> = self
            .working
            .ports
            .values()
            .filter(|port| port.network_id == id)
            .map(|port| port.id)
            .collect();
        for port_id in orphaned {
            self.working.ports.remove(&port_id);
            self.working.port_port_security.remove(&port_id);
        }
        self.working.bindings.remove(&id);
        self.working.network_port_security.remove(&id);
        Ok(record)
    }

    pub fn networks(&self) -> impl Iterator<Item = &NetworkRecord> {
        self.working.networks.values()
    }

    // ── Ports ───────────────────────────────────────────────────────

    pub fn insert_port(&mut self, record: PortRecord) {
        self.working.ports.insert(record.id, record);
    }

    pub fn port(&self, id: Uuid) -> Result<&PortRecord, CoreError> {
        self.working
            .ports
            .get(&id)
            .ok_or(CoreError::PortNotFound { id })
    }

    pub fn update_port(
        &mut self,
        id: Uuid,
        apply: impl FnOnce(&mut PortRecord),
    ) -> Result<&PortRecord, CoreError> {
        let record = self
            .working
            .ports
            .get_mut(&id)
            .ok_or(CoreError::PortNotFound { id })?;
        apply(record);
        Ok(record)
    }

    pub fn remove_port(&mut self, id: Uuid) -> Result<PortRecord, CoreError> {
        let record = self
            .working
            .ports
            .remove(&id)
            .ok_or(CoreError::PortNotFound { id })?;
        self.working.port_port_security.remove(&id);
        Ok(record)
    }

    pub fn ports(&self) -> impl Iterator<Item = &PortRecord> {
        self.working.ports.values()
    }

    // ── Provider bindings ───────────────────────────────────────────

    pub fn set_binding(&mut self, network_id: Uuid, binding: ProviderBinding) {
        self.working.bindings.insert(network_id, binding);
    }

    pub fn binding(&self, network_id: Uuid) -> Option<&ProviderBinding> {
        self.working.bindings.get(&network_id)
    }

    /// Network currently holding `(physical network, segmentation id)`,
    /// if any. This is the create-time uniqueness probe.
    pub fn network_for_segment(
        &self,
        physical_network: &str,
        segmentation_id: u16,
    ) -> Option<Uuid> {
        self.working
            .bindings
            .iter()
            .find(|(_, binding)| binding.segment() == Some((physical_network, segmentation_id)))
            .map(|(id, _)| *id)
    }

    // ── Port security ───────────────────────────────────────────────

    pub fn set_network_port_security(&mut self, network_id: Uuid, enabled: bool) {
        self.working.network_port_security.insert(network_id, enabled);
    }

    /// Network-level default for ports created without an explicit flag.
    /// Enabled when the network never recorded one.
    pub fn network_port_security(&self, network_id: Uuid) -> bool {
        self.working
            .network_port_security
            .get(&network_id)
            .copied()
            .unwrap_or(true)
    }

    pub fn set_port_security(&mut self, port_id: Uuid, enabled: bool) {
        self.working.port_port_security.insert(port_id, enabled);
    }

    pub fn port_security(&self, port_id: Uuid) -> bool {
        self.working
            .port_port_security
            .get(&port_id)
            .copied()
            .unwrap_or(true)
    }
}
