//! Proxy configuration

use serde::{Deserialize, Serialize};

/// Configuration for the notes proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Base URL of the upstream REST API.
    pub api_base: String,
    /// Base URL of the upstream OAuth endpoints.
    pub auth_base: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Redirect URI registered with the upstream.
    pub redirect_uri: String,
    /// Shared secret for inbound webhook signatures.
    pub webhook_secret: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.hackmd.io".to_string(),
            auth_base: "https://hackmd.io".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "http://localhost:8787/auth/callback".to_string(),
            webhook_secret: String::new(),
        }
    }
}

impl ProxyConfig {
    /// Point both upstream bases at one URL (tests use this with a local
    /// mock server).
    pub fn with_upstream(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base = base.clone();
        self.auth_base = base;
        self
    }
}
