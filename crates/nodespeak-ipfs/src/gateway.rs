//! Gateway fetcher
//!
//! Retrieves content-addressed bytes over plain HTTP from an ordered list of
//! public IPFS gateways. Gateways are tried strictly in configured order,
//! sequentially; the first 200 response wins and later gateways are never
//! attempted. Every attempt is bounded by an individual timeout, so a CID
//! that fails all N gateways resolves after roughly N x timeout.
//!
//! The HTTP layer sits behind [`GatewayTransport`] so the fallback policy is
//! testable without a network (see [`crate::mock::MockGateway`]).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use nodespeak_core::Cid;
use tracing::{debug, warn};

use crate::error::IpfsError;

/// Default public gateways, tried in this order.
pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://ipfs.io/ipfs/",
    "https://cloudflare-ipfs.com/ipfs/",
    "https://dweb.link/ipfs/",
];

/// Default per-attempt timeout.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the gateway fetcher.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Ordered gateway base URLs, each ending in `/ipfs/`.
    ///
    /// Order is static configuration; it is not reordered based on latency
    /// or success history.
    pub gateways: Vec<String>,
    /// Timeout applied to each individual gateway attempt.
    ///
    /// There is no cross-gateway deadline beyond the sum of these.
    pub attempt_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            gateways: DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Create a configuration with a custom gateway list.
    pub fn new(gateways: Vec<String>) -> Self {
        Self {
            gateways,
            ..Default::default()
        }
    }

    /// Override the per-attempt timeout.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

/// Raw response from a single gateway attempt.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, returned as-is; the caller decides how to interpret it.
    pub body: Bytes,
}

impl GatewayResponse {
    /// Only a 200 counts as success; redirects and partial responses do not.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// HTTP seam for gateway retrieval.
///
/// Production uses [`HttpTransport`]; tests use a scripted mock. An `Err`
/// here means the attempt failed at the network level (timeout, DNS,
/// connection refused) — the fetcher treats it the same as a non-200: log
/// and move to the next gateway.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// Issue a GET for `url`, bounded by `timeout`.
    async fn get(&self, url: &str, timeout: Duration) -> Result<GatewayResponse, IpfsError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh connection pool.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GatewayTransport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<GatewayResponse, IpfsError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| IpfsError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| IpfsError::Transport(e.to_string()))?;

        Ok(GatewayResponse { status, body })
    }
}

/// Result of a fetch across the whole gateway list.
///
/// Total failure is a value, not an error: downstream has exactly one
/// failure branch to handle regardless of whether the cause was a bad CID,
/// unpinned content, or a transient outage.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Body of the first successful response, as-is.
    Body(Bytes),
    /// Every gateway failed (or the CID was empty).
    Unavailable,
}

impl FetchOutcome {
    /// True when no gateway produced the content.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchOutcome::Unavailable)
    }
}

/// Multi-gateway fallback fetcher.
pub struct GatewayClient<T: GatewayTransport> {
    config: GatewayConfig,
    transport: T,
}

impl<T: GatewayTransport> GatewayClient<T> {
    /// Create a fetcher over the given transport.
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// The configured gateway list.
    pub fn gateways(&self) -> &[String] {
        &self.config.gateways
    }

    /// The underlying transport (tests use this to reach a mock's scripts).
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Rewrite a CID into a primary-gateway URL for direct use in an image
    /// `src` attribute.
    ///
    /// This path intentionally bypasses fetch and cache: the consumer's own
    /// HTTP layer handles retrieval.
    pub fn gateway_url(&self, cid: &Cid) -> String {
        let base = self
            .config
            .gateways
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_GATEWAYS[0]);
        format!("{base}{cid}")
    }

    /// Fetch `cid` from the first gateway that answers 200.
    ///
    /// An empty CID short-circuits to `Unavailable` without any network
    /// call — call sites frequently ask for content before the on-chain
    /// read that produces the CID has completed.
    pub async fn fetch(&self, cid: &Cid) -> FetchOutcome {
        if cid.is_empty() {
            return FetchOutcome::Unavailable;
        }

        for gateway in &self.config.gateways {
            let url = format!("{gateway}{cid}");

            match self.transport.get(&url, self.config.attempt_timeout).await {
                Ok(response) if response.is_success() => {
                    debug!(gateway = %gateway, cid = %cid.short(), "Gateway fetch succeeded");
                    return FetchOutcome::Body(response.body);
                }
                Ok(response) => {
                    warn!(
                        gateway = %gateway,
                        cid = %cid.short(),
                        status = response.status,
                        "Gateway returned non-success status"
                    );
                }
                Err(e) => {
                    warn!(gateway = %gateway, cid = %cid.short(), error = %e, "Gateway attempt failed");
                }
            }
        }

        debug!(cid = %cid.short(), "All gateways failed");
        FetchOutcome::Unavailable
    }
}
