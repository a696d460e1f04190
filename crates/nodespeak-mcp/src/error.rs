//! Proxy errors and their HTTP mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the proxy
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Unknown session")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Unknown or reused OAuth state")]
    StateMismatch,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Proxy misconfigured: {0}")]
    Config(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProxyError::SessionNotFound
            | ProxyError::SessionExpired
            | ProxyError::StateMismatch
            | ProxyError::InvalidSignature => StatusCode::UNAUTHORIZED,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_401() {
        for err in [
            ProxyError::SessionNotFound,
            ProxyError::SessionExpired,
            ProxyError::InvalidSignature,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_upstream_errors_map_to_502() {
        let response = ProxyError::Upstream("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
