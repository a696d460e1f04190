//! Off-chain content payloads.
//!
//! These are the JSON shapes pinned to IPFS and pointed at by on-chain
//! records. The contract only ever stores the CID; everything human-readable
//! lives in these structs.

use serde::{Deserialize, Serialize};

use crate::cid::Cid;

/// Community metadata pinned at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityMetadata {
    /// Display name of the community.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Topic tags members can post under.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl CommunityMetadata {
    /// Placeholder used when the metadata CID resolves to nothing.
    ///
    /// Listings must render even when a gateway has lost the content, so
    /// unavailable metadata degrades to this value rather than an error.
    pub fn unavailable() -> Self {
        Self {
            name: "Unavailable community".to_string(),
            description: String::new(),
            topics: Vec::new(),
        }
    }
}

/// Post body pinned when a post is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostContent {
    /// Post title.
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub body: String,
}

impl PostContent {
    /// Placeholder for a post whose content CID resolves to nothing.
    pub fn unavailable() -> Self {
        Self {
            title: "Content unavailable".to_string(),
            body: String::new(),
        }
    }
}

/// Comment body pinned when a comment is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentContent {
    /// Plain-text comment body.
    pub body: String,
}

impl CommentContent {
    /// Placeholder for a comment whose content CID resolves to nothing.
    pub fn unavailable() -> Self {
        Self {
            body: "Content unavailable".to_string(),
        }
    }
}

/// Profile document pinned by `setProfile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileData {
    /// Chosen username (not unique; the address is the identity).
    pub username: String,
    /// Free-form bio.
    #[serde(default)]
    pub bio: String,
    /// Avatar image CID, rendered via a gateway URL rewrite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_cid: Option<Cid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_community_metadata_defaults() {
        // Older pinned payloads omit description/topics entirely.
        let meta: CommunityMetadata = serde_json::from_str(r#"{"name":"rustaceans"}"#).unwrap();
        assert_eq!(meta.name, "rustaceans");
        assert_eq!(meta.description, "");
        assert!(meta.topics.is_empty());
    }

    #[test]
    fn test_profile_omits_missing_avatar() {
        let profile = ProfileData {
            username: "alice".to_string(),
            bio: String::new(),
            avatar_cid: None,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("avatar_cid"));
    }

    #[test]
    fn test_post_content_roundtrip() {
        let post = PostContent {
            title: "Hello".to_string(),
            body: "First post".to_string(),
        };
        let json = serde_json::to_string(&post).unwrap();
        let back: PostContent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, post);
    }
}
