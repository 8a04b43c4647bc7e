//! Configuration for the switchyard reconciliation engine.
//!
//! TOML schema, environment-variable layering, and translation into the
//! `switchyard_core` construction types ([`ClusterConfig`],
//! [`EngineOptions`]). A deployment points the engine at one file:
//!
//! ```toml
//! default_cluster = "main"
//!
//! [engine]
//! max_ports_overlay = 256
//! max_ports_bridged = 64
//! default_transport_type = "stt"
//! strict_sync = false
//!
//! [[clusters]]
//! name = "main"
//! controllers = ["10.0.0.5:443:admin:secret", "10.0.0.6:443:admin:secret"]
//! default_transport_zone = "6a8c5db7-fbbd-4b2c-9f02-6f85fd0d2c5e"
//! zone = "zone-a"
//! request_timeout_secs = 30
//! retries = 2
//! ```
//!
//! Every key can be overridden from the environment under the
//! `SWITCHYARD_` prefix with `__` as the section separator, e.g.
//! `SWITCHYARD_ENGINE__STRICT_SYNC=true`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use switchyard_api::client::DEFAULT_CONCURRENT_REQUESTS;
use switchyard_api::endpoint::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_REDIRECTS, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRIES,
};
use switchyard_api::{ControllerEndpoint, TlsMode};
use switchyard_core::{ClusterConfig, EngineOptions, NetworkType};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Cluster resources land on when they carry no zone attribute.
    /// Unset falls back to the first configured cluster.
    pub default_cluster: Option<String>,

    /// Engine tunables.
    #[serde(default)]
    pub engine: EngineSection,

    /// Named controller clusters.
    #[serde(default)]
    pub clusters: Vec<ClusterSection>,
}

/// `[engine]` section. Unset fields take the engine's built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EngineSection {
    /// Per-switch port ceiling for overlay (gre/stt) networks.
    pub max_ports_overlay: Option<u32>,

    /// Per-switch port ceiling for bridged (flat/vlan) networks.
    pub max_ports_bridged: Option<u32>,

    /// Transport type for networks created without a provider binding.
    pub default_transport_type: Option<NetworkType>,

    /// Fail listings on backend resources with no local record instead
    /// of warning.
    pub strict_sync: Option<bool>,
}

impl EngineSection {
    /// Merge this section over the engine's built-in defaults.
    #[must_use]
    pub fn options(&self) -> EngineOptions {
        let defaults = EngineOptions::default();
        EngineOptions {
            max_ports_overlay: self.max_ports_overlay.unwrap_or(defaults.max_ports_overlay),
            max_ports_bridged: self.max_ports_bridged.unwrap_or(defaults.max_ports_bridged),
            default_transport_type: self
                .default_transport_type
                .unwrap_or(defaults.default_transport_type),
            strict_sync: self.strict_sync.unwrap_or(defaults.strict_sync),
        }
    }
}

/// One `[[clusters]]` entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterSection {
    /// Unique cluster name.
    pub name: String,

    /// Priority-ordered `host:port:user:password` controller specs.
    pub controllers: Vec<String>,

    /// Transport zone new backend switches are created in.
    pub default_transport_zone: Uuid,

    /// Controller-side cluster identifier, if known.
    pub cluster_uuid: Option<Uuid>,

    /// Failure-domain zone this cluster serves.
    pub zone: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Retry count across endpoints per request.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Redirect-following limit per request.
    #[serde(default = "default_redirects")]
    pub redirects: usize,

    /// Cap on in-flight backend requests.
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    #[serde(default)]
    pub tls: TlsSetting,

    /// CA certificate (PEM) to trust instead of the system store.
    pub ca_cert: Option<PathBuf>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}
fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_retries() -> u32 {
    DEFAULT_RETRIES
}
fn default_redirects() -> usize {
    DEFAULT_REDIRECTS
}
fn default_concurrent_requests() -> usize {
    DEFAULT_CONCURRENT_REQUESTS
}

/// TLS behavior toward the controllers. `ca_cert` overrides this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TlsSetting {
    /// Plain HTTP (lab controllers, test harnesses).
    Disabled,
    /// HTTPS against the system trust store.
    #[default]
    System,
    /// HTTPS accepting any certificate (self-signed controllers).
    AcceptInvalid,
}

// ── Config loading ──────────────────────────────────────────────────

/// Load configuration from `path`, layered with `SWITCHYARD_`-prefixed
/// environment variables over the built-in defaults. A missing file is
/// an error; operators point the engine at exactly one config.
pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file_exact(path.as_ref()))
        .merge(Env::prefixed("SWITCHYARD_").split("__"));
    Ok(figment.extract()?)
}

impl Config {
    /// Resolve every `[[clusters]]` entry into a [`ClusterConfig`].
    ///
    /// Any malformed entry fails the whole resolution; a partial cluster
    /// set is never returned.
    pub fn cluster_configs(&self) -> Result<Vec<ClusterConfig>, ConfigError> {
        self.clusters.iter().map(resolve_cluster).collect()
    }

    /// Engine tunables, merged over the built-in defaults.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        self.engine.options()
    }

    /// Render as pretty TOML, for scaffolding a deployment config.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// A representative single-cluster configuration with placeholder
    /// credentials, suitable as a starting point for a deployment.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            default_cluster: Some("main".into()),
            engine: EngineSection::default(),
            clusters: vec![ClusterSection {
                name: "main".into(),
                controllers: vec!["10.0.0.5:443:admin:changeme".into()],
                default_transport_zone: Uuid::nil(),
                cluster_uuid: None,
                zone: None,
                request_timeout_secs: default_request_timeout_secs(),
                connect_timeout_secs: default_connect_timeout_secs(),
                retries: default_retries(),
                redirects: default_redirects(),
                concurrent_requests: default_concurrent_requests(),
                tls: TlsSetting::default(),
                ca_cert: None,
            }],
        }
    }
}

fn resolve_cluster(section: &ClusterSection) -> Result<ClusterConfig, ConfigError> {
    if section.controllers.is_empty() {
        return Err(ConfigError::Validation {
            field: format!("clusters.{}.controllers", section.name),
            reason: "at least one controller spec is required".into(),
        });
    }
    let mut endpoints = Vec::with_capacity(section.controllers.len());
    for spec in &section.controllers {
        let mut endpoint =
            ControllerEndpoint::parse(spec).map_err(|err| ConfigError::Validation {
                field: format!("clusters.{}.controllers", section.name),
                reason: err.to_string(),
            })?;
        endpoint.request_timeout = Duration::from_secs(section.request_timeout_secs);
        endpoint.connect_timeout = Duration::from_secs(section.connect_timeout_secs);
        endpoint.retries = section.retries;
        endpoint.redirects = section.redirects;
        endpoints.push(endpoint);
    }
    let tls = if let Some(path) = &section.ca_cert {
        TlsMode::CustomCa(path.clone())
    } else {
        match section.tls {
            TlsSetting::Disabled => TlsMode::Disabled,
            TlsSetting::System => TlsMode::System,
            TlsSetting::AcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    };
    Ok(ClusterConfig {
        name: section.name.clone(),
        endpoints,
        default_transport_zone: section.default_transport_zone,
        cluster_uuid: section.cluster_uuid,
        zone: section.zone.clone(),
        tls,
        concurrent_requests: section.concurrent_requests,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_file_and_applies_defaults() {
        let file = write_config(
            r#"
            default_cluster = "main"

            [[clusters]]
            name = "main"
            controllers = ["ctrl-1:443:admin:secret"]
            default_transport_zone = "6a8c5db7-fbbd-4b2c-9f02-6f85fd0d2c5e"
            "#,
        );
        let config = load(file.path()).unwrap();

        assert_eq!(config.default_cluster.as_deref(), Some("main"));
        assert_eq!(config.clusters.len(), 1);
        let cluster = &config.clusters[0];
        assert_eq!(cluster.request_timeout_secs, 30);
        assert_eq!(cluster.connect_timeout_secs, 10);
        assert_eq!(cluster.retries, 2);
        assert_eq!(cluster.tls, TlsSetting::System);

        let options = config.engine_options();
        assert_eq!(options.max_ports_overlay, 256);
        assert_eq!(options.max_ports_bridged, 64);
        assert!(!options.strict_sync);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load("/nonexistent/switchyard.toml").is_err());
    }

    #[test]
    fn engine_section_overrides_built_in_defaults() {
        let file = write_config(
            r#"
            [engine]
            max_ports_bridged = 8
            default_transport_type = "gre"
            strict_sync = true
            "#,
        );
        let options = load(file.path()).unwrap().engine_options();

        assert_eq!(options.max_ports_bridged, 8);
        assert_eq!(options.max_ports_overlay, 256);
        assert_eq!(options.default_transport_type, NetworkType::Gre);
        assert!(options.strict_sync);
    }

    #[test]
    fn resolves_endpoints_with_transport_overrides() {
        let file = write_config(
            r#"
            [[clusters]]
            name = "main"
            controllers = ["ctrl-1:443:admin:secret", "ctrl-2:8443:admin:secret"]
            default_transport_zone = "6a8c5db7-fbbd-4b2c-9f02-6f85fd0d2c5e"
            zone = "zone-a"
            request_timeout_secs = 5
            retries = 0
            tls = "accept-invalid"
            "#,
        );
        let clusters = load(file.path()).unwrap().cluster_configs().unwrap();

        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.name, "main");
        assert_eq!(cluster.zone.as_deref(), Some("zone-a"));
        assert_eq!(cluster.endpoints.len(), 2);
        assert_eq!(cluster.endpoints[0].host, "ctrl-1");
        assert_eq!(cluster.endpoints[1].port, 8443);
        assert_eq!(cluster.endpoints[0].request_timeout, Duration::from_secs(5));
        assert_eq!(cluster.endpoints[1].retries, 0);
        assert!(matches!(cluster.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn rejects_malformed_controller_spec() {
        let file = write_config(
            r#"
            [[clusters]]
            name = "main"
            controllers = ["ctrl-1:not-a-port:admin:secret"]
            default_transport_zone = "6a8c5db7-fbbd-4b2c-9f02-6f85fd0d2c5e"
            "#,
        );
        let err = load(file.path()).unwrap().cluster_configs().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. }
            if field == "clusters.main.controllers"));
    }

    #[test]
    fn rejects_empty_controller_list() {
        let file = write_config(
            r#"
            [[clusters]]
            name = "main"
            controllers = []
            default_transport_zone = "6a8c5db7-fbbd-4b2c-9f02-6f85fd0d2c5e"
            "#,
        );
        assert!(load(file.path()).unwrap().cluster_configs().is_err());
    }

    #[test]
    fn sample_round_trips_through_the_loader() {
        let rendered = Config::sample().to_toml().unwrap();
        let file = write_config(&rendered);
        let config = load(file.path()).unwrap();

        assert_eq!(config.default_cluster.as_deref(), Some("main"));
        let clusters = config.cluster_configs().unwrap();
        assert_eq!(clusters[0].endpoints[0].username, "admin");
    }
}
