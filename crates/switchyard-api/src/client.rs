// Hand-crafted async HTTP client for the controller cluster API.
//
// Base path: /ws.v1/
// Auth: HTTP basic, per endpoint
//
// One client serves one cluster. Requests go to the active endpoint of
// the cluster's ordered list; connection-level failures and 503s rotate
// to the next endpoint and retry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::endpoint::ControllerEndpoint;
use crate::error::Error;
use crate::transport::{TlsMode, TransportConfig};
use crate::wire;

/// Default number of concurrent in-flight requests per cluster.
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 3;

// ── Error response shape from the controller ─────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Switch selector for port listings ────────────────────────────────

/// Which switch a port listing runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchSelector {
    /// One specific switch.
    Uuid(Uuid),
    /// Every switch on the cluster (the `*` wildcard).
    Any,
}

impl std::fmt::Display for SwitchSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uuid(uuid) => write!(f, "{uuid}"),
            Self::Any => f.write_str("*"),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for one controller cluster.
///
/// Endpoint rotation is shared across callers: the first request to
/// observe a dead endpoint advances the active index for everyone.
pub struct ControlClient {
    http: reqwest::Client,
    endpoints: Vec<ControllerEndpoint>,
    scheme: &'static str,
    active: AtomicUsize,
    permits: Semaphore,
    retries: u32,
    request_timeout: Duration,
}

impl ControlClient {
    /// Build a client over an ordered endpoint list.
    ///
    /// Transport parameters (timeouts, redirect limit, retry count) are
    /// taken from the first endpoint; they apply cluster-wide.
    pub fn new(
        endpoints: Vec<ControllerEndpoint>,
        tls: TlsMode,
        concurrent_requests: usize,
    ) -> Result<Self, Error> {
        let first = endpoints.first().ok_or(Error::NoEndpoints)?;
        let transport = TransportConfig::from_endpoint(first, tls);
        let retries = first.retries;
        let request_timeout = first.request_timeout;
        let http = transport.build_client()?;
        let scheme = transport.tls.scheme();

        Ok(Self {
            http,
            endpoints,
            scheme,
            active: AtomicUsize::new(0),
            permits: Semaphore::new(concurrent_requests.max(1)),
            retries,
            request_timeout,
        })
    }

    /// `host:port` of the endpoint requests currently go to.
    pub fn active_endpoint(&self) -> String {
        let idx = self.active.load(Ordering::Relaxed) % self.endpoints.len();
        let endpoint = &self.endpoints[idx];
        format!("{}:{}", endpoint.host, endpoint.port)
    }

    // ── Request plumbing ─────────────────────────────────────────────

    async fn permit(&self) -> Result<SemaphorePermit<'_>, Error> {
        self.permits.acquire().await.map_err(|_| Error::Shutdown)
    }

    fn url(&self, endpoint: &ControllerEndpoint, path: &str) -> Result<Url, Error> {
        Ok(endpoint.base_url(self.scheme)?.join(path)?)
    }

    /// Advance the active endpoint past one observed to be failing.
    ///
    /// Compare-and-swap so concurrent failures on the same endpoint
    /// rotate once, not once per caller.
    fn rotate(&self, observed: usize) {
        let next = (observed + 1) % self.endpoints.len();
        let _ = self
            .active
            .compare_exchange(observed, next, Ordering::Relaxed, Ordering::Relaxed);
    }

    /// Send one request, rotating endpoints on connection failures and
    /// 503s. `retries` counts additional attempts after the first.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<reqwest::Response, Error> {
        let mut attempt: u32 = 0;
        loop {
            let idx = self.active.load(Ordering::Relaxed) % self.endpoints.len();
            let endpoint = &self.endpoints[idx];
            let url = self.url(endpoint, path)?;
            debug!(%method, %url, attempt, "controller request");

            let mut req = self.http.request(method.clone(), url).basic_auth(
                &endpoint.username,
                Some(endpoint.password.expose_secret()),
            );
            if !query.is_empty() {
                req = req.query(query);
            }
            if let Some(body) = body {
                req = req.json(body);
            }

            match req.send().await {
                Ok(resp)
                    if resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE
                        && attempt < self.retries =>
                {
                    warn!(
                        endpoint = %endpoint.host,
                        status = 503,
                        "controller unavailable, rotating endpoint"
                    );
                    self.rotate(idx);
                    attempt += 1;
                }
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_connect() || e.is_timeout()) && attempt < self.retries => {
                    warn!(
                        endpoint = %endpoint.host,
                        error = %e,
                        "controller unreachable, rotating endpoint"
                    );
                    self.rotate(idx);
                    attempt += 1;
                }
                Err(e) if e.is_timeout() => {
                    return Err(Error::Timeout {
                        timeout_secs: self.request_timeout.as_secs(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, Error> {
        let _permit = self.permit().await?;
        let resp = self.send(Method::GET, path, query, None::<&()>).await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let _permit = self.permit().await?;
        let resp = self.send(Method::POST, path, &[], Some(body)).await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let _permit = self.permit().await?;
        let resp = self.send(Method::PUT, path, &[], Some(body)).await?;
        Self::handle_response(resp).await
    }

    async fn put_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let _permit = self.permit().await?;
        let resp = self.send(Method::PUT, path, &[], Some(body)).await?;
        Self::handle_empty(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let _permit = self.permit().await?;
        let resp = self.send(Method::DELETE, path, &[], None::<&()>).await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview = body.get(..body.len().min(200)).unwrap_or(&body);
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(ErrorResponse { message: Some(m) }) => m,
            _ if raw.is_empty() => status.to_string(),
            _ => raw,
        };

        match status {
            reqwest::StatusCode::UNAUTHORIZED => Error::Unauthorized,
            reqwest::StatusCode::FORBIDDEN => Error::Forbidden { message },
            reqwest::StatusCode::NOT_FOUND => Error::ResourceNotFound { message },
            reqwest::StatusCode::CONFLICT => Error::Conflict { message },
            reqwest::StatusCode::SERVICE_UNAVAILABLE => Error::ServiceUnavailable { message },
            _ => Error::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Follow `page_cursor` until the listing is exhausted.
    async fn query_all<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Vec<T>, Error> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = params.to_vec();
            if let Some(c) = cursor.take() {
                query.push((String::from("_page_cursor"), c));
            }
            let page: wire::Page<T> = self.get(path, &query).await?;
            all.extend(page.results);

            match page.page_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(all)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Switches ─────────────────────────────────────────────────────

    pub async fn create_switch(
        &self,
        spec: &wire::SwitchSpec,
    ) -> Result<wire::BackendSwitch, Error> {
        self.post("ws.v1/switch", spec).await
    }

    /// List switches matching the filter, following pagination.
    ///
    /// Pages are snapshots; concurrent mutation can repeat a resource
    /// across page boundaries, so the result is deduplicated by uuid.
    pub async fn list_switches(
        &self,
        filter: &wire::ResourceFilter,
    ) -> Result<Vec<wire::BackendSwitch>, Error> {
        let raw = self.query_all("ws.v1/switch", &filter.query()).await?;
        Ok(dedup_by_uuid(raw, |s: &wire::BackendSwitch| s.uuid))
    }

    pub async fn update_switch(
        &self,
        switch: Uuid,
        update: &wire::SwitchUpdate,
    ) -> Result<wire::BackendSwitch, Error> {
        self.put(&format!("ws.v1/switch/{switch}"), update).await
    }

    pub async fn delete_switch(&self, switch: Uuid) -> Result<(), Error> {
        self.delete(&format!("ws.v1/switch/{switch}")).await
    }

    // ── Ports ────────────────────────────────────────────────────────

    pub async fn create_port(
        &self,
        switch: Uuid,
        spec: &wire::PortSpec,
    ) -> Result<wire::BackendPort, Error> {
        self.post(&format!("ws.v1/switch/{switch}/port"), spec).await
    }

    pub async fn update_port(
        &self,
        switch: Uuid,
        port: Uuid,
        update: &wire::PortUpdate,
    ) -> Result<wire::BackendPort, Error> {
        self.put(&format!("ws.v1/switch/{switch}/port/{port}"), update)
            .await
    }

    pub async fn delete_port(&self, switch: Uuid, port: Uuid) -> Result<(), Error> {
        self.delete(&format!("ws.v1/switch/{switch}/port/{port}"))
            .await
    }

    /// List ports on one switch or, with [`SwitchSelector::Any`], on
    /// every switch of the cluster.
    pub async fn list_ports(
        &self,
        switch: SwitchSelector,
        filter: &wire::ResourceFilter,
    ) -> Result<Vec<wire::BackendPort>, Error> {
        let raw = self
            .query_all(&format!("ws.v1/switch/{switch}/port"), &filter.query())
            .await?;
        Ok(dedup_by_uuid(raw, |p: &wire::BackendPort| p.uuid))
    }

    pub async fn port_status(&self, switch: Uuid, port: Uuid) -> Result<wire::PortStatus, Error> {
        self.get(&format!("ws.v1/switch/{switch}/port/{port}/status"), &[])
            .await
    }

    /// Plug an attachment into a backend port.
    pub async fn plug_attachment(
        &self,
        switch: Uuid,
        port: Uuid,
        attachment: &wire::Attachment,
    ) -> Result<(), Error> {
        self.put_no_response(
            &format!("ws.v1/switch/{switch}/port/{port}/attachment"),
            attachment,
        )
        .await
    }
}

fn dedup_by_uuid<T>(items: Vec<T>, key: impl Fn(&T) -> Uuid) -> Vec<T> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
