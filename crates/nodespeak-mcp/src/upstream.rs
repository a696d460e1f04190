//! Upstream HTTP client
//!
//! Talks to the notes service's OAuth and REST endpoints. Base URLs come
//! from configuration so tests can point the client at a local mock.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ProxyConfig;
use crate::error::ProxyError;

/// Token-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API calls.
    pub access_token: String,
    /// Rotation token, when issued.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access-token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Client for the upstream OAuth + REST API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: ProxyConfig,
}

impl UpstreamClient {
    /// Create a client from the proxy configuration.
    pub fn new(config: ProxyConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Authorization URL the login route redirects the browser to.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/oauth2/authorize?client_id={}&response_type=code&redirect_uri={}&state={}",
            self.config.auth_base, self.config.client_id, self.config.redirect_uri, state
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, ProxyError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        self.token_request(&params).await
    }

    /// Trade a refresh token for a fresh access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, ProxyError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        self.token_request(&params).await
    }

    /// Forward a GET to the REST API with the session's bearer token.
    pub async fn get_json(&self, path: &str, access_token: &str) -> Result<Value, ProxyError> {
        let url = format!("{}{}", self.config.api_base, path);
        debug!(url = %url, "Forwarding upstream GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProxyError::Upstream(format!(
                "upstream answered {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))
    }

    /// The logged-in user's profile (`/v1/me`).
    pub async fn me(&self, access_token: &str) -> Result<Value, ProxyError> {
        self.get_json("/v1/me", access_token).await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenResponse, ProxyError> {
        let url = format!("{}/oauth2/token", self.config.auth_base);

        let response = self
            .http
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProxyError::Upstream(format!(
                "token endpoint answered {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProxyError::Upstream(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_client_and_state() {
        let config = ProxyConfig {
            client_id: "abc123".to_string(),
            ..Default::default()
        };
        let client = UpstreamClient::new(config);

        let url = client.authorize_url("state-xyz");
        assert!(url.starts_with("https://hackmd.io/oauth2/authorize?"));
        assert!(url.contains("client_id=abc123"));
        assert!(url.contains("state=state-xyz"));
    }

    #[test]
    fn test_token_response_tolerates_minimal_payload() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"tok"}"#).unwrap();
        assert_eq!(parsed.access_token, "tok");
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.expires_in.is_none());
    }
}
