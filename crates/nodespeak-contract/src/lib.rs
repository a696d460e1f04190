//! # NodeSpeak Contract
//!
//! The boundary to the forum's smart contract.
//!
//! All forum state of record — communities, posts, comments, membership,
//! likes, follows, bans — lives on-chain, behind an ABI this crate mirrors
//! as the [`ForumContract`] trait. Consensus, state commitment and
//! persistence are the contract's problem; nothing here implements them.
//!
//! A handle implements the trait *bound to a caller account*, the way a
//! wallet-connected contract instance is: reads take explicit account
//! parameters, writes act as the bound caller. [`InMemoryForum`] provides a
//! whole fake chain in memory, handing out per-account handles that share
//! state and enforce the same visible rules the real contract does.

pub mod error;
pub mod memory;
pub mod types;

pub use error::ContractError;
pub use memory::{InMemoryForum, InMemoryForumContract};
pub use types::{CommentRecord, CommunityRecord, PostRecord};

use async_trait::async_trait;
use nodespeak_core::{Address, Cid};

/// ABI surface of the forum contract, bound to a caller account.
///
/// Write operations act as [`caller`](Self::caller); they return the id of
/// the created record where the contract emits one. Listing operations
/// filter inactive records, mirroring the contract's view functions.
#[async_trait]
pub trait ForumContract: Send + Sync {
    /// The account this handle signs transactions as.
    fn caller(&self) -> Address;

    // Communities

    /// All active communities.
    async fn get_active_communities(&self) -> Result<Vec<CommunityRecord>, ContractError>;

    /// A single community by id, active or not.
    async fn get_community(&self, id: u64) -> Result<CommunityRecord, ContractError>;

    /// Create a community; the caller becomes creator and first member.
    async fn create_community(
        &self,
        content_cid: Cid,
        topics: Vec<String>,
    ) -> Result<u64, ContractError>;

    /// Deactivate a community (creator or contract owner only).
    async fn deactivate_community(&self, id: u64) -> Result<(), ContractError>;

    /// Join a community.
    async fn join_community(&self, id: u64) -> Result<(), ContractError>;

    /// Leave a community.
    async fn leave_community(&self, id: u64) -> Result<(), ContractError>;

    /// Whether `account` is a member of community `id`.
    async fn is_member(&self, id: u64, account: Address) -> Result<bool, ContractError>;

    /// Current member count of community `id`.
    async fn member_count(&self, id: u64) -> Result<u64, ContractError>;

    // Posts

    /// Active posts of a community, oldest first.
    async fn get_community_posts(&self, community: u64) -> Result<Vec<PostRecord>, ContractError>;

    /// A single post by id, active or not.
    async fn get_post(&self, id: u64) -> Result<PostRecord, ContractError>;

    /// Create a post in a community the caller is a member of.
    async fn create_post(
        &self,
        community: u64,
        content_cid: Cid,
        image_cid: Option<Cid>,
        topic: Option<String>,
    ) -> Result<u64, ContractError>;

    /// Like a post; one like per account.
    async fn like_post(&self, id: u64) -> Result<(), ContractError>;

    /// Remove the caller's like from a post.
    async fn unlike_post(&self, id: u64) -> Result<(), ContractError>;

    /// Deactivate a post (author, community creator, or contract owner).
    async fn deactivate_post(&self, id: u64) -> Result<(), ContractError>;

    // Comments

    /// Active comments of a post, oldest first.
    async fn get_post_comments(&self, post: u64) -> Result<Vec<CommentRecord>, ContractError>;

    /// Comment on an active post.
    async fn add_comment(&self, post: u64, content_cid: Cid) -> Result<u64, ContractError>;

    /// Deactivate a comment (author, community creator, or contract owner).
    async fn deactivate_comment(&self, id: u64) -> Result<(), ContractError>;

    // Profiles and the social graph

    /// CID of an account's pinned profile document, if one was ever set.
    async fn profile_cid(&self, account: Address) -> Result<Option<Cid>, ContractError>;

    /// Set the caller's profile document CID.
    async fn set_profile_cid(&self, cid: Cid) -> Result<(), ContractError>;

    /// Follow another account.
    async fn follow_user(&self, account: Address) -> Result<(), ContractError>;

    /// Stop following an account.
    async fn unfollow_user(&self, account: Address) -> Result<(), ContractError>;

    /// Whether `follower` follows `followed`.
    async fn is_following(
        &self,
        follower: Address,
        followed: Address,
    ) -> Result<bool, ContractError>;

    // Moderation

    /// Ban an account from a community (creator or owner only). Banned
    /// accounts cannot join, post, comment or like there.
    async fn ban_user(&self, community: u64, account: Address) -> Result<(), ContractError>;

    /// Lift a ban (creator or owner only).
    async fn unban_user(&self, community: u64, account: Address) -> Result<(), ContractError>;

    /// Whether `account` is banned from `community`.
    async fn is_banned(&self, community: u64, account: Address) -> Result<bool, ContractError>;
}
