//! Server-side OAuth session store
//!
//! The browser only ever holds an opaque session id; the bearer tokens stay
//! here. Sessions live in process memory and die with it — the proxy is a
//! sidecar, not an account system.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Tokens held for one logged-in session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Upstream bearer token.
    pub access_token: String,
    /// Refresh token, when the upstream issued one.
    pub refresh_token: Option<String>,
    /// Access-token expiry; `None` means the upstream did not say.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// True when the access token is past its expiry.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Concurrent session-id -> tokens store.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store tokens under a fresh opaque session id.
    pub fn create(
        &self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: Option<u64>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session {
            access_token,
            refresh_token,
            expires_at: expires_in_secs.map(|s| Utc::now() + Duration::seconds(s as i64)),
            created_at: Utc::now(),
        };
        self.sessions.insert(id.clone(), session);
        debug!(session = %id, "Session created");
        id
    }

    /// Look up a live session. Expired sessions are dropped and reported as
    /// absent.
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self.sessions.get(id)?.value().clone();
        if session.is_expired() {
            self.sessions.remove(id);
            debug!(session = %id, "Session expired");
            return None;
        }
        Some(session)
    }

    /// Replace a session's tokens after a refresh. Returns false for an
    /// unknown id.
    pub fn update(
        &self,
        id: &str,
        access_token: String,
        refresh_token: Option<String>,
        expires_in_secs: Option<u64>,
    ) -> bool {
        let Some(mut session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.access_token = access_token;
        if refresh_token.is_some() {
            session.refresh_token = refresh_token;
        }
        session.expires_at = expires_in_secs.map(|s| Utc::now() + Duration::seconds(s as i64));
        true
    }

    /// Drop a session. Returns whether it existed.
    pub fn revoke(&self, id: &str) -> bool {
        let existed = self.sessions.remove(id).is_some();
        if existed {
            debug!(session = %id, "Session revoked");
        }
        existed
    }

    /// Number of live or not-yet-collected sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no sessions are stored.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let store = SessionStore::new();
        let id = store.create("token-a".to_string(), None, Some(3600));

        let session = store.get(&id).unwrap();
        assert_eq!(session.access_token, "token-a");
        assert!(!session.is_expired());
    }

    #[test]
    fn test_expired_session_is_dropped() {
        let store = SessionStore::new();
        let id = store.create("token-a".to_string(), None, Some(0));

        assert!(store.get(&id).is_none());
        assert!(store.is_empty(), "expired session is removed on access");
    }

    #[test]
    fn test_update_after_refresh() {
        let store = SessionStore::new();
        let id = store.create(
            "old".to_string(),
            Some("refresh-1".to_string()),
            Some(3600),
        );

        assert!(store.update(&id, "new".to_string(), None, Some(3600)));

        let session = store.get(&id).unwrap();
        assert_eq!(session.access_token, "new");
        // Refresh token survives an update that does not rotate it.
        assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));

        assert!(!store.update("unknown", "x".to_string(), None, None));
    }

    #[test]
    fn test_revoke() {
        let store = SessionStore::new();
        let id = store.create("token".to_string(), None, None);

        assert!(store.revoke(&id));
        assert!(!store.revoke(&id));
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_no_expiry_means_long_lived() {
        let store = SessionStore::new();
        let id = store.create("token".to_string(), None, None);
        assert!(store.get(&id).is_some());
    }
}
