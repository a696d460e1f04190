//! Content identifier type

use serde::{Deserialize, Serialize};

/// Opaque identifier for a piece of content in a content-addressed store.
///
/// The same CID always denotes byte-identical content, which is what makes
/// unconditional caching (no TTL, no invalidation) safe downstream. NodeSpeak
/// never inspects the CID's internal structure; it is carried as-is between
/// the contract and the gateway layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// Wrap a raw CID string.
    ///
    /// No validation is performed; an empty CID is representable because
    /// call sites frequently hold a "CID not yet known" value before an
    /// on-chain read completes. The fetch pipeline short-circuits on it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw CID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when there is no content to address.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short form for log output (first 12 bytes, whole string when shorter
    /// or when the cut would split a character).
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Cid {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Cid {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_detection() {
        assert!(Cid::new("").is_empty());
        assert!(Cid::new("   ").is_empty());
        assert!(!Cid::new("QmTest").is_empty());
    }

    #[test]
    fn test_short_does_not_panic_on_short_cids() {
        assert_eq!(Cid::new("Qm").short(), "Qm");
        assert_eq!(Cid::new("QmAbCdEfGhIjKlMn").short(), "QmAbCdEfGhIj");
    }

    #[test]
    fn test_serde_transparent() {
        let cid = Cid::new("QmTest");
        let json = serde_json::to_string(&cid).unwrap();
        assert_eq!(json, "\"QmTest\"");

        let back: Cid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cid);
    }
}
