//! GraphQL transport for the data API.
//!
//! `GraphqlTransport` abstracts over how a query reaches the backend;
//! `HttpTransport` posts it over HTTPS with an API key. A `ClientHandle`
//! is the explicitly constructed slot the gateway reads its transport
//! from: it starts pending or ready, and callers can await readiness
//! instead of sleeping until configuration has happened.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::types::{AccessError, AccessResult};

/// Default request timeout for the HTTP transport.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// One GraphQL request.
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlOperation {
    /// Root field the response data is keyed by, e.g. `searchArchives`.
    #[serde(skip)]
    pub root: &'static str,
    pub query: String,
    pub variables: Value,
}

impl GraphqlOperation {
    pub fn new(root: &'static str, query: String, variables: Value) -> Self {
        Self {
            root,
            query,
            variables,
        }
    }
}

/// Something that can execute a GraphQL operation and return its `data`.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Execute the operation and return the value under `data.<root>`.
    async fn execute(&self, operation: &GraphqlOperation) -> AccessResult<Value>;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorEntry {
    #[serde(default)]
    message: String,
}

/// Pull `data.<root>` out of a raw GraphQL response body.
///
/// A present `errors` array fails the call even when partial data came back.
pub fn extract_root(body: Value, root: &str) -> AccessResult<Value> {
    let response: GraphqlResponse = serde_json::from_value(body)?;
    if !response.errors.is_empty() {
        return Err(AccessError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    let mut data = response
        .data
        .ok_or_else(|| AccessError::MissingData("no data in response".to_string()))?;
    match data.get_mut(root) {
        Some(value) => Ok(value.take()),
        None => Err(AccessError::MissingData(format!("no '{root}' in response"))),
    }
}

/// HTTP transport posting `{query, variables}` to a GraphQL endpoint.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: url::Url,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Create a transport for the given endpoint.
    pub fn new(endpoint: url::Url, api_key: Option<String>, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(concat!("dlp-access/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint,
            api_key,
        }
    }

    /// Parse the endpoint and create a transport.
    pub fn from_endpoint(
        endpoint: &str,
        api_key: Option<String>,
        timeout_ms: u64,
    ) -> AccessResult<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| AccessError::InvalidInput(format!("bad endpoint '{endpoint}': {e}")))?;
        Ok(Self::new(endpoint, api_key, timeout_ms))
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, operation: &GraphqlOperation) -> AccessResult<Value> {
        let mut request = self.client.post(self.endpoint.clone()).json(operation);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        tracing::debug!("POST {} ({})", self.endpoint, operation.root);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AccessError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        extract_root(body, operation.root)
    }
}

type TransportSlot = Option<Arc<dyn GraphqlTransport>>;

/// Injected handle to the data API transport with an explicit ready state.
#[derive(Clone)]
pub struct ClientHandle {
    slot: Arc<watch::Sender<TransportSlot>>,
}

impl ClientHandle {
    /// A handle whose transport will be installed later.
    pub fn pending() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { slot: Arc::new(tx) }
    }

    /// A handle that is ready immediately.
    pub fn ready_with<T: GraphqlTransport + 'static>(transport: T) -> Self {
        let handle = Self::pending();
        handle.install(Arc::new(transport));
        handle
    }

    /// Install (or replace) the transport and wake every waiter.
    pub fn install(&self, transport: Arc<dyn GraphqlTransport>) {
        self.slot.send_replace(Some(transport));
        tracing::debug!("Data API client ready");
    }

    /// Whether a transport has been installed.
    pub fn is_ready(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Wait until a transport is installed.
    pub async fn ready(&self) -> AccessResult<Arc<dyn GraphqlTransport>> {
        let mut rx = self.slot.subscribe();
        let slot = rx.wait_for(Option::is_some).await.map_err(|_| AccessError::NotReady)?;
        slot.clone().ok_or(AccessError::NotReady)
    }

    /// Wait for readiness, giving up after `timeout`.
    pub async fn ready_within(
        &self,
        timeout: Duration,
    ) -> AccessResult<Arc<dyn GraphqlTransport>> {
        tokio::time::timeout(timeout, self.ready())
            .await
            .map_err(|_| AccessError::NotReady)?
    }
}

impl Default for ClientHandle {
    fn default() -> Self {
        Self::pending()
    }
}
