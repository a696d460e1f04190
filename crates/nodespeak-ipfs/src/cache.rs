//! Content cache
//!
//! Process-lifetime key -> entry store. Unconditional by design: no TTL, no
//! size bound, no eviction. Content addressing means the same key can only
//! ever map to the same bytes, so entries are never invalidated and racing
//! writes for a key are idempotent — no locking beyond the map's own
//! sharding is required. `Unavailable` is cached like any other entry and is
//! not retried within the process lifetime except via an explicit refetch.

use bytes::Bytes;
use dashmap::DashMap;
use nodespeak_core::{Address, Cid};
use serde_json::Value;

/// Interpreted content body.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Body parsed as JSON.
    Json(Value),
    /// Body was valid UTF-8 but not JSON.
    Text(String),
    /// Opaque binary body.
    Bytes(Bytes),
}

impl Content {
    /// Interpret a raw gateway body: JSON first, then UTF-8 text, then raw
    /// bytes.
    pub fn from_body(body: Bytes) -> Self {
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            return Content::Json(value);
        }
        match String::from_utf8(body.to_vec()) {
            Ok(text) => Content::Text(text),
            Err(_) => Content::Bytes(body),
        }
    }

    /// The parsed JSON value, if this content is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Content::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The text body, if this content is plain text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A cached resolution outcome.
///
/// Failure is data: a CID whose retrieval failed on every gateway is stored
/// as `Unavailable`, giving downstream exactly one failure branch and zero
/// repeated-failure cost. A tagged variant rather than a sentinel string, so
/// real content can never be mistaken for the marker.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntry {
    /// Successfully retrieved and interpreted content.
    Content(Content),
    /// Every retrieval attempt failed.
    Unavailable,
}

impl CacheEntry {
    /// The content, unless this entry records a failed resolution.
    pub fn content(&self) -> Option<&Content> {
        match self {
            CacheEntry::Content(content) => Some(content),
            CacheEntry::Unavailable => None,
        }
    }

    /// True when this entry records a failed resolution.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CacheEntry::Unavailable)
    }
}

/// Cache key construction.
///
/// File content is keyed by the raw CID string. Derived objects parsed out
/// of a CID fetch (community metadata, post bodies) use a prefixed key so
/// they never collide with file keys and are not re-parsed on every access.
pub mod keys {
    use super::*;

    /// Key for raw file content: the CID itself.
    pub fn file(cid: &Cid) -> String {
        cid.as_str().to_string()
    }

    /// Key for a parsed community-metadata object.
    pub fn community(id: u64) -> String {
        format!("community_{id}")
    }

    /// Key for a parsed post-content object.
    pub fn post(id: u64) -> String {
        format!("post_{id}")
    }

    /// Key for a parsed profile object.
    pub fn profile(address: &Address) -> String {
        format!("profile_{address}")
    }
}

/// Process-lifetime content cache.
///
/// Explicitly constructed and passed by handle into whichever component
/// needs it; lifetime is tied to the owning session object, not to module
/// state, so tests and requests never leak entries into each other.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: DashMap<String, CacheEntry>,
}

impl ContentCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Store an entry. Entries are never mutated once set; re-inserting the
    /// same key writes an identical value.
    pub fn insert(&self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// True when the key has been resolved (successfully or not).
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry — the in-process analogue of a page reload, and the
    /// only way short of a refetch that an `Unavailable` entry is retried.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_prefers_json() {
        let content = Content::from_body(Bytes::from_static(b"{\"name\":\"rust\"}"));
        assert_eq!(content.as_json().unwrap()["name"], "rust");
    }

    #[test]
    fn test_from_body_falls_back_to_text() {
        let content = Content::from_body(Bytes::from_static(b"plain words"));
        assert_eq!(content.as_text(), Some("plain words"));
        assert!(content.as_json().is_none());
    }

    #[test]
    fn test_from_body_keeps_binary() {
        let content = Content::from_body(Bytes::from_static(&[0xff, 0xfe, 0x00]));
        assert!(matches!(content, Content::Bytes(_)));
    }

    #[test]
    fn test_unavailable_is_cached_data() {
        let cache = ContentCache::new();
        cache.insert("QmGone", CacheEntry::Unavailable);

        let entry = cache.get("QmGone").unwrap();
        assert!(entry.is_unavailable());
        assert!(entry.content().is_none());
        assert!(cache.contains("QmGone"));
    }

    #[test]
    fn test_derived_keys_do_not_collide_with_files() {
        assert_eq!(keys::community(7), "community_7");
        assert_eq!(keys::post(42), "post_42");
        assert_eq!(keys::file(&Cid::new("QmX")), "QmX");
    }

    #[test]
    fn test_clear() {
        let cache = ContentCache::new();
        cache.insert("a", CacheEntry::Unavailable);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
