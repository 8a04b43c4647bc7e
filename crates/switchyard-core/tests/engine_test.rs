// End-to-end tests for `ReconciliationEngine` against a mocked
// controller cluster.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use switchyard_api::{ControllerEndpoint, TlsMode};
use switchyard_core::{
    Cluster, ClusterConfig, ClusterRegistry, CoreError, EngineOptions, NetworkCreate,
    NetworkFilter, NetworkType, PortCreate, PortFilter, PortUpdate, ProviderBinding,
    ReconciliationEngine, RecordStore, RequestContext, ResourceStatus, RoleBasedPolicy,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn endpoint_for(server: &MockServer) -> ControllerEndpoint {
    let uri = url::Url::parse(&server.uri()).unwrap();
    ControllerEndpoint::new(
        uri.host_str().unwrap(),
        uri.port().unwrap(),
        "admin",
        SecretString::from("secret"),
    )
}

fn engine_for(server: &MockServer, options: EngineOptions) -> ReconciliationEngine {
    let cluster = Cluster::new(ClusterConfig {
        name: "main".into(),
        endpoints: vec![endpoint_for(server)],
        default_transport_zone: Uuid::new_v4(),
        cluster_uuid: None,
        zone: None,
        tls: TlsMode::Disabled,
        concurrent_requests: 3,
    })
    .unwrap();
    let registry = ClusterRegistry::new(vec![cluster], None).unwrap();
    ReconciliationEngine::new(
        registry,
        Arc::new(RecordStore::new()),
        Arc::new(RoleBasedPolicy),
        options,
    )
}

/// Mount the switch create + tag-update pair behind `create_network`.
///
/// The PUT mock also serves later tag updates on the same switch, such
/// as the multi-switch marker written when a network fragments.
async fn mount_network_create(server: &MockServer, switch_id: Uuid, name: &str) {
    Mock::given(method("POST"))
        .and(path("/ws.v1/switch"))
        .and(body_partial_json(json!({ "display_name": name })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": switch_id,
            "display_name": name,
            "tags": [{ "scope": "tenant-id", "tag": "acme" }]
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/ws.v1/switch/{switch_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": switch_id,
            "display_name": name,
            "tags": [
                { "scope": "tenant-id", "tag": "acme" },
                { "scope": "logical-network-id", "tag": switch_id }
            ]
        })))
        .mount(server)
        .await;
}

fn tagged_switch_body(
    switch_id: Uuid,
    name: &str,
    fabric_up: bool,
    ports: u32,
) -> serde_json::Value {
    json!({
        "uuid": switch_id,
        "display_name": name,
        "tags": [{ "scope": "logical-network-id", "tag": switch_id }],
        "status": { "fabric_status": fabric_up, "port_count": ports }
    })
}

/// Mount the port create + attachment pair behind `create_port`.
async fn mount_port_create(server: &MockServer, switch_id: Uuid, backend_port: Uuid) {
    Mock::given(method("POST"))
        .and(path(format!("/ws.v1/switch/{switch_id}/port")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": backend_port,
            "display_name": ""
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!(
            "/ws.v1/switch/{switch_id}/port/{backend_port}/attachment"
        )))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

// ── Network lifecycle ───────────────────────────────────────────────

#[tokio::test]
async fn create_network_adopts_backend_switch_uuid() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "web-net").await;

    let network = engine
        .create_network(&ctx, NetworkCreate::new("acme", "web-net"))
        .await
        .unwrap();

    assert_eq!(network.id, switch_id);
    assert_eq!(network.status, Some(ResourceStatus::Active));
    assert!(network.port_security_enabled);
    assert_eq!(network.provider, None, "tenants never see provider attributes");

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .and(query_param("tag", switch_id.to_string()))
        .and(query_param("tag_scope", "logical-network-id"))
        .and(query_param("relations", "status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(switch_id, "web-net", true, 0)],
            "result_count": 1
        })))
        .mount(&server)
        .await;

    let read = engine.get_network(&ctx, switch_id).await.unwrap();
    assert_eq!(read.id, switch_id);
    assert_eq!(read.name, "web-net");
    assert_eq!(read.status, Some(ResourceStatus::Active));
}

#[tokio::test]
async fn network_without_backend_switches_reads_down() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "lost-net").await;
    engine
        .create_network(&ctx, NetworkCreate::new("acme", "lost-net"))
        .await
        .unwrap();

    // The backend lost the switch; the read degrades instead of failing.
    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "result_count": 0
        })))
        .mount(&server)
        .await;

    let read = engine.get_network(&ctx, switch_id).await.unwrap();
    assert_eq!(read.status, Some(ResourceStatus::Down));
}

#[tokio::test]
async fn foreign_tenant_reads_as_absent() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "private-net").await;
    engine
        .create_network(
            &RequestContext::tenant("acme"),
            NetworkCreate::new("acme", "private-net"),
        )
        .await
        .unwrap();

    let err = engine
        .get_network(&RequestContext::tenant("rival"), switch_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NetworkNotFound { id } if id == switch_id));
}

#[tokio::test]
async fn provider_binding_requires_admin() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());

    let mut req = NetworkCreate::new("acme", "phys-net");
    req.provider = Some(ProviderBinding {
        network_type: NetworkType::Flat,
        physical_network: "phys1".into(),
        segmentation_id: None,
    });

    let err = engine
        .create_network(&RequestContext::tenant("acme"), req)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Forbidden { .. }));
}

#[tokio::test]
async fn duplicate_vlan_segment_is_rejected() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let admin = RequestContext::admin("acme");

    let switch_id = Uuid::new_v4();
    // Exactly one switch create may reach the backend: the loser of the
    // segment probe creates nothing at all.
    Mock::given(method("POST"))
        .and(path("/ws.v1/switch"))
        .and(body_partial_json(json!({
            "transport_type": "vlan",
            "vlan_id": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": switch_id,
            "display_name": "prod-vlan",
            "tags": [{ "scope": "tenant-id", "tag": "acme" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/ws.v1/switch/{switch_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": switch_id,
            "display_name": "prod-vlan"
        })))
        .mount(&server)
        .await;

    let binding = ProviderBinding {
        network_type: NetworkType::Vlan,
        physical_network: "phys1".into(),
        segmentation_id: Some(100),
    };
    let mut req = NetworkCreate::new("acme", "prod-vlan");
    req.provider = Some(binding.clone());
    let first = engine.create_network(&admin, req).await.unwrap();
    assert_eq!(first.provider, Some(binding.clone()));

    let mut dup = NetworkCreate::new("acme", "prod-vlan-2");
    dup.provider = Some(binding);
    let err = engine.create_network(&admin, dup).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::SegmentationIdInUse { ref physical_network, segmentation_id: 100 }
            if physical_network == "phys1"
    ));

    // The winning network is untouched by the failed attempt.
    let txn = engine.store().begin().await;
    assert_eq!(txn.network(first.id).unwrap().name, "prod-vlan");
    assert_eq!(txn.networks().count(), 1);
}

#[tokio::test]
async fn delete_network_requires_a_backend_switch() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "doomed").await;
    engine
        .create_network(&ctx, NetworkCreate::new("acme", "doomed"))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "result_count": 0
        })))
        .mount(&server)
        .await;

    let err = engine.delete_network(&ctx, switch_id).await.unwrap_err();
    assert!(matches!(err, CoreError::NetworkNotFound { id } if id == switch_id));

    // Nothing was deleted locally.
    let txn = engine.store().begin().await;
    assert!(txn.network(switch_id).is_ok());
}

#[tokio::test]
async fn delete_network_removes_local_record_and_switches() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "old-net").await;
    engine
        .create_network(&ctx, NetworkCreate::new("acme", "old-net"))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .and(query_param("tag", switch_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(switch_id, "old-net", true, 0)],
            "result_count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/ws.v1/switch/{switch_id}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    engine.delete_network(&ctx, switch_id).await.unwrap();

    let txn = engine.store().begin().await;
    assert!(txn.network(switch_id).is_err());
}

// ── Port placement ──────────────────────────────────────────────────

#[tokio::test]
async fn full_bridged_network_fragments_onto_a_new_switch() {
    let server = MockServer::start().await;
    let options = EngineOptions {
        max_ports_bridged: 1,
        ..EngineOptions::default()
    };
    let engine = engine_for(&server, options);
    let admin = RequestContext::admin("acme");

    let primary = Uuid::new_v4();
    let extra = Uuid::new_v4();
    let backend_first = Uuid::new_v4();
    let backend_second = Uuid::new_v4();

    mount_network_create(&server, primary, "web").await;
    let mut req = NetworkCreate::new("acme", "web");
    req.provider = Some(ProviderBinding {
        network_type: NetworkType::Flat,
        physical_network: "phys1".into(),
        segmentation_id: None,
    });
    let network = engine.create_network(&admin, req).await.unwrap();

    // First placement sees a primary with room, the second sees it full.
    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .and(query_param("tag", primary.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(primary, "web", true, 0)],
            "result_count": 1
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .and(query_param("tag", primary.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(primary, "web", true, 1)],
            "result_count": 1
        })))
        .mount(&server)
        .await;
    // Fragmentation creates the extra switch under the network tag.
    Mock::given(method("POST"))
        .and(path("/ws.v1/switch"))
        .and(body_partial_json(json!({
            "display_name": "web-ext-1",
            "transport_type": "flat"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": extra,
            "display_name": "web-ext-1",
            "tags": [
                { "scope": "tenant-id", "tag": "acme" },
                { "scope": "logical-network-id", "tag": primary }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_port_create(&server, primary, backend_first).await;
    mount_port_create(&server, extra, backend_second).await;

    let first = engine
        .create_port(&admin, PortCreate::new(network.id, "acme"))
        .await
        .unwrap();
    let second = engine
        .create_port(&admin, PortCreate::new(network.id, "acme"))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.status, Some(ResourceStatus::Active));
    assert!(second.mac_address.as_str().starts_with("fa:16:3e:"));

    let txn = engine.store().begin().await;
    assert_eq!(txn.ports().count(), 2);
}

#[tokio::test]
async fn full_overlay_network_rejects_new_ports() {
    let server = MockServer::start().await;
    let options = EngineOptions {
        max_ports_overlay: 1,
        ..EngineOptions::default()
    };
    let engine = engine_for(&server, options);
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "overlay").await;
    let network = engine
        .create_network(&ctx, NetworkCreate::new("acme", "overlay"))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(switch_id, "overlay", true, 1)],
            "result_count": 1
        })))
        .mount(&server)
        .await;

    let err = engine
        .create_port(&ctx, PortCreate::new(network.id, "acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CapacityExhausted { network: id } if id == network.id));

    // The open transaction rolled back; no port record persists.
    let txn = engine.store().begin().await;
    assert_eq!(txn.ports().count(), 0);
}

// ── Port lifecycle ──────────────────────────────────────────────────

/// Create a network and one port on it, with all backend mocks mounted.
async fn create_network_and_port(
    server: &MockServer,
    engine: &ReconciliationEngine,
    ctx: &RequestContext,
    switch_id: Uuid,
    backend_port: Uuid,
) -> (Uuid, Uuid) {
    mount_network_create(server, switch_id, "app-net").await;
    let network = engine
        .create_network(ctx, NetworkCreate::new("acme", "app-net"))
        .await
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(switch_id, "app-net", true, 0)],
            "result_count": 1
        })))
        .mount(server)
        .await;
    mount_port_create(server, switch_id, backend_port).await;

    let mut req = PortCreate::new(network.id, "acme");
    req.device_id = "instance-0042".into();
    let port = engine.create_port(ctx, req).await.unwrap();
    (network.id, port.id)
}

fn backend_port_body(
    backend_port: Uuid,
    port_id: Uuid,
    switch_id: Uuid,
    admin_up: bool,
    fabric_up: bool,
) -> serde_json::Value {
    json!({
        "uuid": backend_port,
        "display_name": "",
        "admin_status_enabled": admin_up,
        "tags": [{ "scope": "logical-port-id", "tag": port_id }],
        "status": { "fabric_status_up": fabric_up },
        "switch_uuid": switch_id
    })
}

#[tokio::test]
async fn get_port_projects_backend_admin_state() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    let backend_port = Uuid::new_v4();
    let (_, port_id) =
        create_network_and_port(&server, &engine, &ctx, switch_id, backend_port).await;

    // The backend disagrees about admin state; the backend wins.
    Mock::given(method("GET"))
        .and(path("/ws.v1/switch/*/port"))
        .and(query_param("tag", port_id.to_string()))
        .and(query_param("tag_scope", "logical-port-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [backend_port_body(backend_port, port_id, switch_id, false, true)],
            "result_count": 1
        })))
        .mount(&server)
        .await;

    let port = engine.get_port(&ctx, port_id).await.unwrap();
    assert!(!port.admin_state_up);
    assert_eq!(port.status, Some(ResourceStatus::Active));
    assert_eq!(port.device_id, "instance-0042");
}

#[tokio::test]
async fn update_port_pushes_state_to_backend() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    let backend_port = Uuid::new_v4();
    let (_, port_id) =
        create_network_and_port(&server, &engine, &ctx, switch_id, backend_port).await;

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch/*/port"))
        .and(query_param("tag", port_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [backend_port_body(backend_port, port_id, switch_id, true, true)],
            "result_count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/ws.v1/switch/{switch_id}/port/{backend_port}")))
        .and(body_partial_json(json!({
            "display_name": "renamed",
            "admin_status_enabled": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": backend_port,
            "display_name": "renamed",
            "admin_status_enabled": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/ws.v1/switch/{switch_id}/port/{backend_port}/status"
        )))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "fabric_status_up": false })),
        )
        .mount(&server)
        .await;

    let update = PortUpdate {
        name: Some("renamed".into()),
        admin_state_up: Some(false),
        ..PortUpdate::default()
    };
    let port = engine.update_port(&ctx, port_id, update).await.unwrap();

    assert_eq!(port.name, "renamed");
    assert!(!port.admin_state_up);
    assert_eq!(port.status, Some(ResourceStatus::Down));

    let txn = engine.store().begin().await;
    assert_eq!(txn.port(port_id).unwrap().name, "renamed");
}

#[tokio::test]
async fn update_port_without_backend_counterpart_rolls_back() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    let backend_port = Uuid::new_v4();
    let (_, port_id) =
        create_network_and_port(&server, &engine, &ctx, switch_id, backend_port).await;

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch/*/port"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "result_count": 0
        })))
        .mount(&server)
        .await;

    let update = PortUpdate {
        name: Some("renamed".into()),
        ..PortUpdate::default()
    };
    let err = engine.update_port(&ctx, port_id, update).await.unwrap_err();
    assert!(matches!(err, CoreError::OutOfSync { .. }));

    // The rename never committed.
    let txn = engine.store().begin().await;
    assert_eq!(txn.port(port_id).unwrap().name, "");
}

#[tokio::test]
async fn delete_port_removes_backend_then_local() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    let backend_port = Uuid::new_v4();
    let (_, port_id) =
        create_network_and_port(&server, &engine, &ctx, switch_id, backend_port).await;

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch/*/port"))
        .and(query_param("tag", port_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [backend_port_body(backend_port, port_id, switch_id, true, true)],
            "result_count": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/ws.v1/switch/{switch_id}/port/{backend_port}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    engine.delete_port(&ctx, port_id).await.unwrap();

    let txn = engine.store().begin().await;
    assert_eq!(txn.ports().count(), 0);
    // Release the store lock before the engine takes it again.
    drop(txn);

    let err = engine.delete_port(&ctx, port_id).await.unwrap_err();
    assert!(matches!(err, CoreError::PortNotFound { id } if id == port_id));
}

// ── Listings and drift ──────────────────────────────────────────────

#[tokio::test]
async fn listings_copy_backend_names_and_tolerate_drift() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    mount_network_create(&server, switch_id, "known").await;
    engine
        .create_network(&ctx, NetworkCreate::new("acme", "known"))
        .await
        .unwrap();

    // Two backend switches have no local record: tolerated drift,
    // logged but absent from the result.
    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .and(query_param("tag", "acme"))
        .and(query_param("tag_scope", "tenant-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                tagged_switch_body(switch_id, "known-renamed", true, 0),
                tagged_switch_body(Uuid::new_v4(), "stray-1", true, 0),
                tagged_switch_body(Uuid::new_v4(), "stray-2", false, 0),
            ],
            "result_count": 3
        })))
        .mount(&server)
        .await;

    let networks = engine
        .get_networks(&ctx, &NetworkFilter::default())
        .await
        .unwrap();

    assert_eq!(networks.len(), 1);
    assert_eq!(networks[0].id, switch_id);
    assert_eq!(networks[0].name, "known-renamed", "backend name wins in listings");
    assert_eq!(networks[0].status, Some(ResourceStatus::Active));
}

#[tokio::test]
async fn strict_sync_fails_listings_on_backend_drift() {
    let server = MockServer::start().await;
    let options = EngineOptions {
        strict_sync: true,
        ..EngineOptions::default()
    };
    let engine = engine_for(&server, options);
    let ctx = RequestContext::tenant("acme");

    Mock::given(method("GET"))
        .and(path("/ws.v1/switch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [tagged_switch_body(Uuid::new_v4(), "stray", true, 0)],
            "result_count": 1
        })))
        .mount(&server)
        .await;

    let err = engine
        .get_networks(&ctx, &NetworkFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::OutOfSync { ref message } if message.contains("no local record")
    ));
}

#[tokio::test]
async fn port_listings_surface_local_records_missing_from_backend() {
    let server = MockServer::start().await;
    let engine = engine_for(&server, EngineOptions::default());
    let ctx = RequestContext::tenant("acme");

    let switch_id = Uuid::new_v4();
    let backend_port = Uuid::new_v4();
    let (network_id, port_id) =
        create_network_and_port(&server, &engine, &ctx, switch_id, backend_port).await;

    // The backend listing comes back empty: the local record is still
    // returned, with its status unset.
    Mock::given(method("GET"))
        .and(path("/ws.v1/switch/*/port"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "result_count": 0
        })))
        .mount(&server)
        .await;

    let filter = PortFilter {
        network_id: Some(network_id),
        ..PortFilter::default()
    };
    let ports = engine.get_ports(&ctx, &filter).await.unwrap();

    assert_eq!(ports.len(), 1);
    assert_eq!(ports[0].id, port_id);
    assert_eq!(ports[0].status, None);
}
