//! Mock gateway transport for testing
//!
//! Scripts per-URL outcomes (success bodies, failures) and records every
//! request, so fallback ordering and deduplication properties can be
//! asserted without a network. Optionally backed by an [`InMemoryPinner`]
//! so freshly pinned content is servable without pre-registration — the
//! pinner plus this mock form a self-contained fake IPFS network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use nodespeak_core::Cid;
use tokio::sync::Mutex;

use crate::error::IpfsError;
use crate::gateway::{GatewayResponse, GatewayTransport};
use crate::pin::InMemoryPinner;

/// Scripted in-memory gateway transport.
///
/// Resolution order per request: scripted failure, scripted response,
/// pinner lookup by trailing CID, then a default 404.
#[derive(Default)]
pub struct MockGateway {
    responses: DashMap<String, (u16, Bytes)>,
    failures: DashMap<String, ()>,
    store: Option<Arc<InMemoryPinner>>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    /// Create an empty mock; unscripted URLs answer 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that serves any content pinned to `store`.
    pub fn with_store(store: Arc<InMemoryPinner>) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    /// Script a response for an exact URL.
    pub fn respond(&self, url: impl Into<String>, status: u16, body: &[u8]) {
        self.responses
            .insert(url.into(), (status, Bytes::copy_from_slice(body)));
    }

    /// Script a transport-level failure (connection refused) for a URL.
    pub fn fail(&self, url: impl Into<String>) {
        self.failures.insert(url.into(), ());
    }

    /// Every URL requested so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Total number of requests made.
    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Number of requests whose URL starts with `prefix`.
    pub async fn calls_to(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl GatewayTransport for MockGateway {
    async fn get(&self, url: &str, _timeout: Duration) -> Result<GatewayResponse, IpfsError> {
        self.calls.lock().await.push(url.to_string());

        if self.failures.contains_key(url) {
            return Err(IpfsError::Transport("connection refused (mock)".to_string()));
        }

        if let Some(entry) = self.responses.get(url) {
            let (status, body) = entry.value().clone();
            return Ok(GatewayResponse { status, body });
        }

        if let Some(store) = &self.store
            && let Some((_, cid)) = url.rsplit_once('/')
            && let Some(body) = store.body(&Cid::new(cid))
        {
            return Ok(GatewayResponse { status: 200, body });
        }

        Ok(GatewayResponse {
            status: 404,
            body: Bytes::new(),
        })
    }
}
