//! Node configuration
//!
//! A JSON file with gateway and proxy settings; flags override file values,
//! file values override defaults.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use nodespeak_ipfs::GatewayConfig;
use nodespeak_mcp::ProxyConfig;
use serde::{Deserialize, Serialize};

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Ordered IPFS gateway base URLs.
    pub gateways: Vec<String>,
    /// Per-gateway attempt timeout, seconds.
    pub attempt_timeout_secs: u64,
    /// Address the proxy listens on.
    pub proxy_bind: String,
    /// Notes-proxy settings.
    pub proxy: ProxyConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            gateways: nodespeak_ipfs::DEFAULT_GATEWAYS
                .iter()
                .map(|g| g.to_string())
                .collect(),
            attempt_timeout_secs: 5,
            proxy_bind: "127.0.0.1:8787".to_string(),
            proxy: ProxyConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The gateway configuration this node fetches with.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(self.gateways.clone())
            .with_attempt_timeout(Duration::from_secs(self.attempt_timeout_secs))
    }
}
