//! Proxy routes
//!
//! `/auth/*` manages the OAuth session lifecycle; `/webhooks/incoming`
//! accepts signed upstream events. The browser identifies itself with an
//! opaque session id header; tokens never leave the proxy.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::session::SessionStore;
use crate::upstream::UpstreamClient;
use crate::webhook;

/// Header carrying the opaque session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<SessionStore>,
    upstream: Arc<UpstreamClient>,
    /// Outstanding OAuth states issued by `/auth/login`, consumed once.
    pending_states: Arc<DashMap<String, ()>>,
    webhook_secret: Arc<str>,
}

impl AppState {
    /// Build state from configuration.
    pub fn new(config: ProxyConfig) -> Self {
        let webhook_secret = Arc::from(config.webhook_secret.as_str());
        Self {
            sessions: Arc::new(SessionStore::new()),
            upstream: Arc::new(UpstreamClient::new(config)),
            pending_states: Arc::new(DashMap::new()),
            webhook_secret,
        }
    }

    /// The session store (tests inspect it).
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    fn session_for(&self, headers: &HeaderMap) -> Result<(String, crate::session::Session), ProxyError> {
        let id = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ProxyError::SessionNotFound)?;
        let session = self.sessions.get(id).ok_or(ProxyError::SessionExpired)?;
        Ok((id.to_string(), session))
    }
}

/// Build the proxy router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
        .route("/webhooks/incoming", post(incoming_webhook))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn login(State(state): State<AppState>) -> Redirect {
    let oauth_state = Uuid::new_v4().to_string();
    state.pending_states.insert(oauth_state.clone(), ());

    let url = state.upstream.authorize_url(&oauth_state);
    info!("Redirecting to upstream authorization");
    Redirect::temporary(&url)
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: String,
    state: String,
}

async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<Value>, ProxyError> {
    if state.pending_states.remove(&params.state).is_none() {
        warn!("OAuth callback with unknown state");
        return Err(ProxyError::StateMismatch);
    }

    let tokens = state.upstream.exchange_code(&params.code).await?;
    let session_id = state.sessions.create(
        tokens.access_token,
        tokens.refresh_token,
        tokens.expires_in,
    );

    info!("OAuth login completed");
    Ok(Json(json!({ "session_id": session_id })))
}

async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ProxyError> {
    let (id, session) = state.session_for(&headers)?;
    let refresh_token = session
        .refresh_token
        .ok_or_else(|| ProxyError::Upstream("session has no refresh token".to_string()))?;

    let tokens = state.upstream.refresh(&refresh_token).await?;
    state.sessions.update(
        &id,
        tokens.access_token,
        tokens.refresh_token,
        tokens.expires_in,
    );

    Ok(Json(json!({ "refreshed": true })))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ProxyError> {
    let (id, _) = state.session_for(&headers)?;
    state.sessions.revoke(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ProxyError> {
    let (_, session) = state.session_for(&headers)?;
    let profile = state.upstream.me(&session.access_token).await?;
    Ok(Json(profile))
}

async fn incoming_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ProxyError> {
    let signature = headers
        .get(webhook::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ProxyError::InvalidSignature)?;

    if !webhook::verify(state.webhook_secret.as_bytes(), &body, signature) {
        warn!("Rejected webhook with bad signature");
        return Err(ProxyError::InvalidSignature);
    }

    let event: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    info!(event = %event.get("event").and_then(|v| v.as_str()).unwrap_or("unknown"), "Webhook accepted");
    Ok(Json(json!({ "received": true })))
}
