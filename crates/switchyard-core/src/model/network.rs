//! Network records, provider bindings, and the network view type.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::CoreError;

/// Lowest VLAN tag usable for a provider segment.
pub const MIN_VLAN_TAG: u16 = 1;
/// Highest VLAN tag usable for a provider segment.
pub const MAX_VLAN_TAG: u16 = 4094;

/// Transport encapsulation of a provider network.
///
/// Bridged types (`flat`, `vlan`) map onto a physically constrained L2
/// domain and carry a stricter per-switch port ceiling than the overlay
/// types (`gre`, `stt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Flat,
    Vlan,
    Gre,
    Stt,
}

impl NetworkType {
    /// True for types realized on a bridged L2 domain.
    #[must_use]
    pub fn is_bridged(self) -> bool {
        matches!(self, Self::Flat | Self::Vlan)
    }
}

/// Provider attributes binding a network to physical infrastructure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderBinding {
    pub network_type: NetworkType,
    pub physical_network: String,
    /// VLAN tag. Set if and only if `network_type` is `vlan`.
    pub segmentation_id: Option<u16>,
}

impl ProviderBinding {
    /// Check the type / segmentation-id co-presence rules.
    pub fn validate(&self) -> Result<(), CoreError> {
        match (self.network_type, self.segmentation_id) {
            (NetworkType::Vlan, None) => Err(CoreError::invalid_input(
                "vlan provider networks require a segmentation id",
            )),
            (NetworkType::Vlan, Some(vlan)) if !(MIN_VLAN_TAG..=MAX_VLAN_TAG).contains(&vlan) => {
                Err(CoreError::invalid_input(format!(
                    "segmentation id {vlan} is outside [{MIN_VLAN_TAG}, {MAX_VLAN_TAG}]"
                )))
            }
            (NetworkType::Vlan, Some(_)) => Ok(()),
            (other, Some(_)) => Err(CoreError::invalid_input(format!(
                "segmentation id is not valid for {other} provider networks"
            ))),
            (_, None) => Ok(()),
        }
    }

    /// The `(physical network, segmentation id)` pair this binding claims,
    /// when it claims one.
    #[must_use]
    pub fn segment(&self) -> Option<(&str, u16)> {
        self.segmentation_id
            .map(|vlan| (self.physical_network.as_str(), vlan))
    }
}

/// A network as persisted in the local record store.
///
/// The id is adopted from the backend switch that realizes the network,
/// so a record only exists once the backend creation succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub admin_state_up: bool,
}

/// Fabric-derived activity status of a network or port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceStatus {
    Active,
    Down,
}

/// A network as returned to callers: the stored record extended with
/// derived fields. `status` is `None` when the backend was not observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Network {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub admin_state_up: bool,
    pub status: Option<ResourceStatus>,
    /// Present only when the caller is allowed to view provider attributes.
    pub provider: Option<ProviderBinding>,
    pub port_security_enabled: bool,
}

impl NetworkRecord {
    /// Extend the record into a caller-facing view.
    #[must_use]
    pub fn into_view(
        self,
        status: Option<ResourceStatus>,
        provider: Option<ProviderBinding>,
        port_security_enabled: bool,
    ) -> Network {
        Network {
            id: self.id,
            tenant_id: self.tenant_id,
            name: self.name,
            admin_state_up: self.admin_state_up,
            status,
            provider,
            port_security_enabled,
        }
    }
}

/// Request to create a network.
#[derive(Debug, Clone)]
pub struct NetworkCreate {
    pub tenant_id: String,
    pub name: String,
    pub admin_state_up: bool,
    pub provider: Option<ProviderBinding>,
    /// Defaults to enabled when unset.
    pub port_security_enabled: Option<bool>,
    /// Failure-domain zone steering the request to a specific cluster.
    pub zone: Option<String>,
}

impl NetworkCreate {
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
            admin_state_up: true,
            provider: None,
            port_security_enabled: None,
            zone: None,
        }
    }
}

/// Partial update of a network. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct NetworkUpdate {
    pub name: Option<String>,
    pub admin_state_up: Option<bool>,
    pub port_security_enabled: Option<bool>,
}

/// Constraints for bulk network listings.
#[derive(Debug, Clone, Default)]
pub struct NetworkFilter {
    /// Restrict to these ids. Empty means no id constraint.
    pub ids: Vec<Uuid>,
    /// Restrict to one tenant. Non-admin callers are always restricted to
    /// their own tenant regardless of this field.
    pub tenant_id: Option<String>,
}
