//! On-chain record types
//!
//! These mirror the structs the forum contract returns from its view
//! functions. Human-readable content is never stored here — records carry
//! CIDs pointing at pinned JSON, and the off-chain pipeline joins the two.

use nodespeak_core::{Address, Cid};
use serde::{Deserialize, Serialize};

/// A community as stored on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityRecord {
    /// Sequential community id.
    pub id: u64,
    /// Account that created the community; moderates it alongside the
    /// contract owner.
    pub creator: Address,
    /// CID of the pinned community metadata JSON.
    pub content_cid: Cid,
    /// Topic tags members may post under.
    pub topics: Vec<String>,
    /// Current member count.
    pub member_count: u64,
    /// Number of posts ever created (inactive ones included).
    pub post_count: u64,
    /// Cleared by `deactivateCommunity`; inactive communities are filtered
    /// from listings.
    pub active: bool,
    /// Creation time, unix seconds.
    pub created_at: i64,
}

/// A post as stored on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Sequential post id, global across communities.
    pub id: u64,
    /// Community the post belongs to.
    pub community_id: u64,
    /// Author account.
    pub author: Address,
    /// CID of the pinned post body JSON.
    pub content_cid: Cid,
    /// Optional CID of an attached image, rendered via gateway URL rewrite.
    pub image_cid: Option<Cid>,
    /// Optional topic tag, one of the community's topics.
    pub topic: Option<String>,
    /// Number of distinct accounts that liked the post.
    pub like_count: u64,
    /// Cleared by `deactivatePost`.
    pub active: bool,
    /// Creation time, unix seconds.
    pub created_at: i64,
}

/// A comment as stored on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Sequential comment id, global across posts.
    pub id: u64,
    /// Post the comment belongs to.
    pub post_id: u64,
    /// Author account.
    pub author: Address,
    /// CID of the pinned comment body JSON.
    pub content_cid: Cid,
    /// Cleared by `deactivateComment`.
    pub active: bool,
    /// Creation time, unix seconds.
    pub created_at: i64,
}
