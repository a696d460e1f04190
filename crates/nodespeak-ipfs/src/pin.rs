//! Content publishing boundary
//!
//! Writing to the forum pins content first and puts only the resulting CID
//! on-chain. Pinning is an external collaborator (a pinning service or local
//! node); this module defines the seam and an in-memory implementation used
//! by tests, simulation and the CLI demo path.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use nodespeak_core::Cid;
use serde_json::Value;
use tracing::debug;

use crate::error::IpfsError;

/// Publishes content to the content-addressed store and returns its CID.
#[async_trait]
pub trait Pinner: Send + Sync {
    /// Pin raw bytes.
    async fn pin_bytes(&self, data: Bytes) -> Result<Cid, IpfsError>;

    /// Pin a JSON document.
    async fn pin_json(&self, value: &Value) -> Result<Cid, IpfsError> {
        let body = serde_json::to_vec(value).map_err(|e| IpfsError::Pin(e.to_string()))?;
        self.pin_bytes(Bytes::from(body)).await
    }
}

/// In-memory pinner: content-addressed over BLAKE3.
///
/// Pinned bodies are retrievable by CID, which lets
/// [`crate::mock::MockGateway`] serve them back — together they form a
/// self-contained fake IPFS network.
#[derive(Debug, Default)]
pub struct InMemoryPinner {
    bodies: DashMap<String, Bytes>,
}

impl InMemoryPinner {
    /// Create an empty pinner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a pinned body by CID.
    pub fn body(&self, cid: &Cid) -> Option<Bytes> {
        self.bodies.get(cid.as_str()).map(|b| b.value().clone())
    }

    /// Number of pinned bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True when nothing has been pinned.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn derive_cid(data: &[u8]) -> Cid {
        let hash = blake3::hash(data);
        Cid::new(format!("bafm{}", hex::encode(&hash.as_bytes()[..16])))
    }
}

#[async_trait]
impl Pinner for InMemoryPinner {
    async fn pin_bytes(&self, data: Bytes) -> Result<Cid, IpfsError> {
        let cid = Self::derive_cid(&data);
        debug!(cid = %cid.short(), size = data.len(), "Pinned content");
        self.bodies.insert(cid.as_str().to_string(), data);
        Ok(cid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_pin_is_content_addressed() {
        let pinner = InMemoryPinner::new();

        let cid1 = pinner.pin_bytes(Bytes::from_static(b"same")).await.unwrap();
        let cid2 = pinner.pin_bytes(Bytes::from_static(b"same")).await.unwrap();
        let cid3 = pinner
            .pin_bytes(Bytes::from_static(b"different"))
            .await
            .unwrap();

        assert_eq!(cid1, cid2);
        assert_ne!(cid1, cid3);
        assert_eq!(pinner.len(), 2);
    }

    #[tokio::test]
    async fn test_pinned_body_is_retrievable() {
        let pinner = InMemoryPinner::new();
        let cid = pinner
            .pin_bytes(Bytes::from_static(b"hello"))
            .await
            .unwrap();

        assert_eq!(pinner.body(&cid).unwrap(), Bytes::from_static(b"hello"));
        assert!(pinner.body(&Cid::new("QmMissing")).is_none());
    }

    #[tokio::test]
    async fn test_pin_json() {
        let pinner = InMemoryPinner::new();
        let cid = pinner
            .pin_json(&json!({"title": "hello"}))
            .await
            .unwrap();

        let body = pinner.body(&cid).unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["title"], "hello");
    }
}
