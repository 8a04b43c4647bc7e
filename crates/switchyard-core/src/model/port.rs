//! Port records and the port view type.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::mac::MacAddress;
use crate::model::network::ResourceStatus;

/// One fixed IP assignment on a port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedIp {
    pub subnet_id: Uuid,
    pub ip_address: IpAddr,
}

/// A port as persisted in the local record store.
///
/// The id is generated locally at create time and tagged onto the backend
/// port as the join key between the two stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRecord {
    pub id: Uuid,
    pub network_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    /// Identifier of the device (instance, router) the port serves.
    pub device_id: String,
    pub admin_state_up: bool,
    pub mac_address: MacAddress,
    pub fixed_ips: Vec<FixedIp>,
    /// Name of the cluster the backend port was created on. Lookups try
    /// this cluster first and fall back to scanning all of them.
    pub cluster: Option<String>,
}

/// A port as returned to callers. `status` is `None` when the backend
/// port was not observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub id: Uuid,
    pub network_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub device_id: String,
    pub admin_state_up: bool,
    pub mac_address: MacAddress,
    pub fixed_ips: Vec<FixedIp>,
    pub status: Option<ResourceStatus>,
    pub port_security_enabled: bool,
}

impl PortRecord {
    /// Extend the record into a caller-facing view.
    #[must_use]
    pub fn into_view(self, status: Option<ResourceStatus>, port_security_enabled: bool) -> Port {
        Port {
            id: self.id,
            network_id: self.network_id,
            tenant_id: self.tenant_id,
            name: self.name,
            device_id: self.device_id,
            admin_state_up: self.admin_state_up,
            mac_address: self.mac_address,
            fixed_ips: self.fixed_ips,
            status,
            port_security_enabled,
        }
    }
}

/// Request to create a port on an existing network.
#[derive(Debug, Clone)]
pub struct PortCreate {
    pub network_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub device_id: String,
    pub admin_state_up: bool,
    /// Generated under the local vendor prefix when unset.
    pub mac_address: Option<MacAddress>,
    pub fixed_ips: Vec<FixedIp>,
    /// Defaults to the owning network's flag when unset.
    pub port_security_enabled: Option<bool>,
}

impl PortCreate {
    pub fn new(network_id: Uuid, tenant_id: impl Into<String>) -> Self {
        Self {
            network_id,
            tenant_id: tenant_id.into(),
            name: String::new(),
            device_id: String::new(),
            admin_state_up: true,
            mac_address: None,
            fixed_ips: Vec::new(),
            port_security_enabled: None,
        }
    }
}

/// Partial update of a port. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PortUpdate {
    pub name: Option<String>,
    pub admin_state_up: Option<bool>,
    pub device_id: Option<String>,
    pub fixed_ips: Option<Vec<FixedIp>>,
    pub port_security_enabled: Option<bool>,
}

/// Constraints for bulk port listings.
#[derive(Debug, Clone, Default)]
pub struct PortFilter {
    pub network_id: Option<Uuid>,
    pub device_id: Option<String>,
    /// Restrict to one tenant. Non-admin callers are always restricted to
    /// their own tenant regardless of this field.
    pub tenant_id: Option<String>,
}
