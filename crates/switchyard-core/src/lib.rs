//! Reconciliation layer between the local record store and SDN controller
//! clusters.
//!
//! This crate owns the control-plane logic that keeps logical networks and
//! ports synchronized with the backend switches and ports that realize them:
//!
//! - **[`ReconciliationEngine`]**: top-level orchestrator. Every CRUD
//!   operation on a network or port combines a local record-store
//!   transaction with the backend calls that mirror it, and reports
//!   divergence between the two instead of papering over it.
//!
//! - **[`ClusterRegistry`]**: immutable set of named [`Cluster`]s built
//!   once at startup. Resolves the target cluster for a resource by its
//!   failure-domain zone, falling back to a configured default.
//!
//! - **[`SwitchAllocator`]**: places ports onto backend switches under a
//!   per-switch capacity ceiling, fragmenting a network across extra
//!   switches when its type permits.
//!
//! - **[`RecordStore`]**: in-process system of record for network and port
//!   records plus their provider-binding and port-security side tables.
//!   Single-writer transactions with commit/rollback semantics.
//!
//! - **Domain model** ([`model`]): canonical record and view types
//!   (`NetworkRecord`, `PortRecord`, `ProviderBinding`, `MacAddress`) shared
//!   by the engine and its callers.
//!
//! Divergence between the two stores is a tolerated steady state: the
//! engine logs it with enough context for manual reconciliation and keeps
//! serving, unless strict consistency checks are enabled.

pub mod allocator;
pub mod cluster;
pub mod engine;
pub mod error;
pub mod model;
pub mod policy;
pub mod registry;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use allocator::SwitchAllocator;
pub use cluster::{Cluster, ClusterConfig};
pub use engine::{EngineOptions, ReconciliationEngine};
pub use error::CoreError;
pub use model::{
    FixedIp, MacAddress, Network, NetworkCreate, NetworkFilter, NetworkRecord, NetworkType,
    NetworkUpdate, Port, PortCreate, PortFilter, PortRecord, PortUpdate, ProviderBinding,
    ResourceStatus,
};
pub use policy::{Policy, RequestContext, RoleBasedPolicy};
pub use registry::ClusterRegistry;
pub use store::{RecordStore, Txn};
