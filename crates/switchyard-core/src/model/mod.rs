//! Canonical domain types shared by the engine and its callers.
//!
//! Record types (`NetworkRecord`, `PortRecord`) are what the local store
//! persists. View types (`Network`, `Port`) are what engine operations
//! return: the record extended with derived fields (fabric status,
//! provider attributes, port-security flag) that are never stored.

pub mod mac;
pub mod network;
pub mod port;

pub use mac::MacAddress;
pub use network::{
    Network, NetworkCreate, NetworkFilter, NetworkRecord, NetworkType, NetworkUpdate,
    ProviderBinding, ResourceStatus, MAX_VLAN_TAG, MIN_VLAN_TAG,
};
pub use port::{FixedIp, Port, PortCreate, PortFilter, PortRecord, PortUpdate};
