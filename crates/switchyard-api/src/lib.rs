// switchyard-api: Async REST client for SDN controller clusters.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;
pub mod wire;

pub use client::{ControlClient, SwitchSelector};
pub use endpoint::ControllerEndpoint;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
