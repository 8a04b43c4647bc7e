//! Registry of configured clusters and zone-based resolution.

use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::cluster::Cluster;
use crate::error::CoreError;

/// All configured clusters, keyed by unique name.
///
/// Built once at startup and read-only thereafter, except for the zone
/// resolution cache, which fills lazily and is never invalidated: zone
/// assignments are static for the process lifetime.
#[derive(Debug)]
pub struct ClusterRegistry {
    clusters: IndexMap<String, Arc<Cluster>>,
    default: Arc<Cluster>,
    zone_cache: DashMap<String, Arc<Cluster>>,
}

impl ClusterRegistry {
    /// Build the registry from fully constructed clusters.
    ///
    /// The designated default is resolved here: an unset or unknown
    /// `default_name` falls back to the first cluster in configuration
    /// order, logged at info or warning level respectively. An empty
    /// cluster list or a duplicate name aborts construction; a partial
    /// registry is never exposed.
    pub fn new(clusters: Vec<Cluster>, default_name: Option<&str>) -> Result<Self, CoreError> {
        let mut by_name = IndexMap::with_capacity(clusters.len());
        for cluster in clusters {
            let name = cluster.name().to_owned();
            if by_name.insert(name.clone(), Arc::new(cluster)).is_some() {
                return Err(CoreError::InvalidClusterConfig {
                    message: format!("duplicate cluster name {name:?}"),
                });
            }
        }
        let first = by_name
            .values()
            .next()
            .cloned()
            .ok_or_else(|| CoreError::InvalidClusterConfig {
                message: "no clusters configured".into(),
            })?;
        let default = if let Some(name) = default_name {
            if let Some(cluster) = by_name.get(name) {
                Arc::clone(cluster)
            } else {
                warn!(
                    default = %name,
                    fallback = %first.name(),
                    "default cluster not found, using first configured cluster"
                );
                first
            }
        } else {
            info!(
                fallback = %first.name(),
                "no default cluster configured, using first configured cluster"
            );
            first
        };
        Ok(Self {
            clusters: by_name,
            default,
            zone_cache: DashMap::new(),
        })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Cluster>> {
        self.clusters.get(name).cloned()
    }

    /// Clusters in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Cluster>> {
        self.clusters.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    #[must_use]
    pub fn default_cluster(&self) -> Arc<Cluster> {
        Arc::clone(&self.default)
    }

    /// Resolve the target cluster for a resource.
    ///
    /// A resource carrying an explicit failure-domain zone goes to the
    /// cluster serving that zone; anything else goes to the default.
    pub fn resolve(&self, zone: Option<&str>) -> Result<Arc<Cluster>, CoreError> {
        let Some(zone) = zone else {
            return Ok(self.default_cluster());
        };
        if let Some(hit) = self.zone_cache.get(zone) {
            return Ok(Arc::clone(&hit));
        }
        debug!(%zone, "resolving cluster for zone");
        for cluster in self.clusters.values() {
            if cluster.zone() == Some(zone) {
                self.zone_cache.insert(zone.to_owned(), Arc::clone(cluster));
                return Ok(Arc::clone(cluster));
            }
        }
        error!(%zone, "no cluster config entry for zone");
        Err(CoreError::UnknownZone {
            zone: zone.to_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cluster::ClusterConfig;
    use switchyard_api::{ControllerEndpoint, TlsMode};
    use uuid::Uuid;

    fn cluster(name: &str, zone: Option<&str>) -> Cluster {
        Cluster::new(ClusterConfig {
            name: name.into(),
            endpoints: vec![
                ControllerEndpoint::parse(&format!("{name}.example:443:admin:secret")).unwrap(),
            ],
            default_transport_zone: Uuid::new_v4(),
            cluster_uuid: None,
            zone: zone.map(Into::into),
            tls: TlsMode::DangerAcceptInvalid,
            concurrent_requests: 3,
        })
        .unwrap()
    }

    #[test]
    fn empty_registry_is_rejected() {
        let err = ClusterRegistry::new(Vec::new(), None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidClusterConfig { .. }));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = ClusterRegistry::new(
            vec![cluster("main", None), cluster("main", None)],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidClusterConfig { .. }));
    }

    #[test]
    fn unknown_default_falls_back_to_first() {
        let registry = ClusterRegistry::new(
            vec![cluster("alpha", None), cluster("beta", None)],
            Some("gone"),
        )
        .unwrap();
        assert_eq!(registry.default_cluster().name(), "alpha");
    }

    #[test]
    fn resolves_zone_and_caches_the_hit() {
        let registry = ClusterRegistry::new(
            vec![cluster("alpha", Some("zone-a")), cluster("beta", Some("zone-b"))],
            None,
        )
        .unwrap();

        let hit = registry.resolve(Some("zone-b")).unwrap();
        assert_eq!(hit.name(), "beta");
        let cached = registry.resolve(Some("zone-b")).unwrap();
        assert!(Arc::ptr_eq(&hit, &cached));
    }

    #[test]
    fn unknown_zone_is_an_error() {
        let registry = ClusterRegistry::new(vec![cluster("alpha", Some("zone-a"))], None).unwrap();
        let err = registry.resolve(Some("zone-x")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownZone { zone } if zone == "zone-x"));
    }

    #[test]
    fn no_zone_resolves_to_default() {
        let registry = ClusterRegistry::new(
            vec![cluster("alpha", None), cluster("beta", None)],
            Some("beta"),
        )
        .unwrap();
        assert_eq!(registry.resolve(None).unwrap().name(), "beta");
    }
}
