//! Typed content resolvers
//!
//! Thin functions over cache + fetcher that interpret raw gateway bytes as
//! JSON, plain text, or a displayable image URL. Every path degrades to
//! `Unavailable`/`None` rather than erroring: content unavailability is
//! routine (gateway flakiness, unpinned content) and must never break the
//! consumer.

use std::sync::Arc;

use async_trait::async_trait;
use nodespeak_core::Cid;
use serde_json::Value;

use crate::cache::{CacheEntry, Content, ContentCache, keys};
use crate::error::IpfsError;
use crate::gateway::{FetchOutcome, GatewayClient, GatewayTransport};
use crate::query::QueryFetcher;

/// Cache-aware content resolution over a gateway fetcher.
pub struct ContentResolver<T: GatewayTransport> {
    cache: Arc<ContentCache>,
    gateway: GatewayClient<T>,
}

impl<T: GatewayTransport> ContentResolver<T> {
    /// Create a resolver over an injected cache and fetcher.
    pub fn new(cache: Arc<ContentCache>, gateway: GatewayClient<T>) -> Self {
        Self { cache, gateway }
    }

    /// Handle to the shared cache.
    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Resolve a CID to interpreted content, consulting the cache first.
    ///
    /// The first resolution attempt for a CID populates the cache — with
    /// `Unavailable` on total failure — so repeated requests never re-issue
    /// network calls.
    pub async fn fetch_content(&self, cid: &Cid) -> CacheEntry {
        if cid.is_empty() {
            return CacheEntry::Unavailable;
        }

        let key = keys::file(cid);
        if let Some(entry) = self.cache.get(&key) {
            return entry;
        }

        let entry = match self.gateway.fetch(cid).await {
            FetchOutcome::Body(body) => CacheEntry::Content(Content::from_body(body)),
            FetchOutcome::Unavailable => CacheEntry::Unavailable,
        };

        self.cache.insert(key, entry.clone());
        entry
    }

    /// Resolve a CID and return its JSON value, or `None` when the content
    /// is unavailable or not JSON.
    pub async fn fetch_json(&self, cid: &Cid) -> Option<Value> {
        match self.fetch_content(cid).await {
            CacheEntry::Content(Content::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Rewrite a CID into a primary-gateway URL for an image `src`.
    ///
    /// Never fetches and never caches; the consumer's HTTP layer handles
    /// retrieval.
    pub fn image_url(&self, cid: &Cid) -> String {
        self.gateway.gateway_url(cid)
    }

    /// Force a fresh resolution for a CID, overwriting the cached entry.
    ///
    /// This is the only path on which a cached `Unavailable` is retried.
    pub async fn refetch_content(&self, cid: &Cid) -> CacheEntry {
        if cid.is_empty() {
            return CacheEntry::Unavailable;
        }

        let entry = match self.gateway.fetch(cid).await {
            FetchOutcome::Body(body) => CacheEntry::Content(Content::from_body(body)),
            FetchOutcome::Unavailable => CacheEntry::Unavailable,
        };

        self.cache.insert(keys::file(cid), entry.clone());
        entry
    }
}

#[async_trait]
impl<T: GatewayTransport> QueryFetcher for ContentResolver<T> {
    async fn fetch(&self, cid: &Cid) -> Result<Option<Content>, IpfsError> {
        Ok(match self.fetch_content(cid).await {
            CacheEntry::Content(content) => Some(content),
            CacheEntry::Unavailable => None,
        })
    }

    async fn refetch(&self, cid: &Cid) -> Result<Option<Content>, IpfsError> {
        Ok(match self.refetch_content(cid).await {
            CacheEntry::Content(content) => Some(content),
            CacheEntry::Unavailable => None,
        })
    }
}
