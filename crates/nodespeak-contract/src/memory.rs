//! In-memory forum contract
//!
//! A whole fake chain in one process: `DashMap` tables for each on-chain
//! mapping, atomic id counters, and per-account handles sharing the state.
//! Enforces the same visible rules as the deployed contract (inactive
//! records filtered from listings, bans, double-join/double-like rejection,
//! moderation authorization) so the layers above can be exercised without a
//! node.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use nodespeak_core::{Address, Cid};
use tracing::{debug, info};

use crate::ForumContract;
use crate::error::ContractError;
use crate::types::{CommentRecord, CommunityRecord, PostRecord};

#[derive(Debug, Default)]
struct ForumState {
    communities: DashMap<u64, CommunityRecord>,
    posts: DashMap<u64, PostRecord>,
    comments: DashMap<u64, CommentRecord>,
    members: DashMap<u64, BTreeSet<Address>>,
    likes: DashMap<u64, BTreeSet<Address>>,
    bans: DashMap<u64, BTreeSet<Address>>,
    follows: DashMap<Address, BTreeSet<Address>>,
    profiles: DashMap<Address, Cid>,
    next_community_id: AtomicU64,
    next_post_id: AtomicU64,
    next_comment_id: AtomicU64,
}

impl ForumState {
    fn community(&self, id: u64) -> Result<CommunityRecord, ContractError> {
        self.communities
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(ContractError::CommunityNotFound(id))
    }

    fn active_community(&self, id: u64) -> Result<CommunityRecord, ContractError> {
        let community = self.community(id)?;
        if !community.active {
            return Err(ContractError::CommunityInactive(id));
        }
        Ok(community)
    }

    fn post(&self, id: u64) -> Result<PostRecord, ContractError> {
        self.posts
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(ContractError::PostNotFound(id))
    }

    fn is_member(&self, community: u64, account: Address) -> bool {
        self.members
            .get(&community)
            .is_some_and(|m| m.contains(&account))
    }

    fn is_banned(&self, community: u64, account: Address) -> bool {
        self.bans
            .get(&community)
            .is_some_and(|b| b.contains(&account))
    }
}

/// Shared fake chain handing out per-account contract handles.
#[derive(Clone)]
pub struct InMemoryForum {
    owner: Address,
    state: Arc<ForumState>,
}

impl InMemoryForum {
    /// Deploy a fresh forum with `owner` as the contract owner (the
    /// all-communities moderator).
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            state: Arc::new(ForumState::default()),
        }
    }

    /// The contract owner account.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// A contract handle signing as `caller`, sharing this forum's state.
    pub fn contract_for(&self, caller: Address) -> InMemoryForumContract {
        InMemoryForumContract {
            caller,
            owner: self.owner,
            state: self.state.clone(),
        }
    }
}

/// Contract handle bound to one caller account.
pub struct InMemoryForumContract {
    caller: Address,
    owner: Address,
    state: Arc<ForumState>,
}

impl InMemoryForumContract {
    /// Moderator check: community creator or contract owner.
    fn can_moderate(&self, community: &CommunityRecord) -> bool {
        self.caller == community.creator || self.caller == self.owner
    }
}

#[async_trait]
impl ForumContract for InMemoryForumContract {
    fn caller(&self) -> Address {
        self.caller
    }

    async fn get_active_communities(&self) -> Result<Vec<CommunityRecord>, ContractError> {
        let mut communities: Vec<_> = self
            .state
            .communities
            .iter()
            .filter(|entry| entry.active)
            .map(|entry| entry.value().clone())
            .collect();
        communities.sort_by_key(|c| c.id);
        Ok(communities)
    }

    async fn get_community(&self, id: u64) -> Result<CommunityRecord, ContractError> {
        self.state.community(id)
    }

    async fn create_community(
        &self,
        content_cid: Cid,
        topics: Vec<String>,
    ) -> Result<u64, ContractError> {
        let id = self.state.next_community_id.fetch_add(1, Ordering::SeqCst) + 1;

        let record = CommunityRecord {
            id,
            creator: self.caller,
            content_cid,
            topics,
            member_count: 1,
            post_count: 0,
            active: true,
            created_at: Utc::now().timestamp(),
        };

        self.state.communities.insert(id, record);
        self.state
            .members
            .insert(id, BTreeSet::from([self.caller]));

        info!(community = id, creator = %self.caller.short(), "Community created");
        Ok(id)
    }

    async fn deactivate_community(&self, id: u64) -> Result<(), ContractError> {
        let community = self.state.community(id)?;
        if !self.can_moderate(&community) {
            return Err(ContractError::NotAuthorized(
                "only the creator or contract owner may deactivate a community".to_string(),
            ));
        }

        if let Some(mut record) = self.state.communities.get_mut(&id) {
            record.active = false;
        }

        info!(community = id, moderator = %self.caller.short(), "Community deactivated");
        Ok(())
    }

    async fn join_community(&self, id: u64) -> Result<(), ContractError> {
        self.state.active_community(id)?;

        if self.state.is_banned(id, self.caller) {
            return Err(ContractError::Banned(id));
        }

        let count = {
            let mut members = self.state.members.entry(id).or_default();
            if !members.insert(self.caller) {
                return Err(ContractError::AlreadyMember(id));
            }
            members.len() as u64
        };

        if let Some(mut record) = self.state.communities.get_mut(&id) {
            record.member_count = count;
        }

        debug!(community = id, account = %self.caller.short(), "Joined community");
        Ok(())
    }

    async fn leave_community(&self, id: u64) -> Result<(), ContractError> {
        self.state.community(id)?;

        let count = {
            let mut members = self.state.members.entry(id).or_default();
            if !members.remove(&self.caller) {
                return Err(ContractError::NotMember(id));
            }
            members.len() as u64
        };

        if let Some(mut record) = self.state.communities.get_mut(&id) {
            record.member_count = count;
        }

        debug!(community = id, account = %self.caller.short(), "Left community");
        Ok(())
    }

    async fn is_member(&self, id: u64, account: Address) -> Result<bool, ContractError> {
        self.state.community(id)?;
        Ok(self.state.is_member(id, account))
    }

    async fn member_count(&self, id: u64) -> Result<u64, ContractError> {
        Ok(self.state.community(id)?.member_count)
    }

    async fn get_community_posts(&self, community: u64) -> Result<Vec<PostRecord>, ContractError> {
        self.state.community(community)?;

        let mut posts: Vec<_> = self
            .state
            .posts
            .iter()
            .filter(|entry| entry.community_id == community && entry.active)
            .map(|entry| entry.value().clone())
            .collect();
        posts.sort_by_key(|p| p.id);
        Ok(posts)
    }

    async fn get_post(&self, id: u64) -> Result<PostRecord, ContractError> {
        self.state.post(id)
    }

    async fn create_post(
        &self,
        community: u64,
        content_cid: Cid,
        image_cid: Option<Cid>,
        topic: Option<String>,
    ) -> Result<u64, ContractError> {
        self.state.active_community(community)?;

        if self.state.is_banned(community, self.caller) {
            return Err(ContractError::Banned(community));
        }
        if !self.state.is_member(community, self.caller) {
            return Err(ContractError::NotMember(community));
        }

        let id = self.state.next_post_id.fetch_add(1, Ordering::SeqCst) + 1;

        let record = PostRecord {
            id,
            community_id: community,
            author: self.caller,
            content_cid,
            image_cid,
            topic,
            like_count: 0,
            active: true,
            created_at: Utc::now().timestamp(),
        };

        self.state.posts.insert(id, record);

        if let Some(mut record) = self.state.communities.get_mut(&community) {
            record.post_count += 1;
        }

        info!(post = id, community, author = %self.caller.short(), "Post created");
        Ok(id)
    }

    async fn like_post(&self, id: u64) -> Result<(), ContractError> {
        let post = self.state.post(id)?;
        if !post.active {
            return Err(ContractError::PostInactive(id));
        }
        if self.state.is_banned(post.community_id, self.caller) {
            return Err(ContractError::Banned(post.community_id));
        }

        let count = {
            let mut likes = self.state.likes.entry(id).or_default();
            if !likes.insert(self.caller) {
                return Err(ContractError::AlreadyLiked(id));
            }
            likes.len() as u64
        };

        if let Some(mut record) = self.state.posts.get_mut(&id) {
            record.like_count = count;
        }

        Ok(())
    }

    async fn unlike_post(&self, id: u64) -> Result<(), ContractError> {
        self.state.post(id)?;

        let count = {
            let mut likes = self.state.likes.entry(id).or_default();
            if !likes.remove(&self.caller) {
                return Err(ContractError::NotLiked(id));
            }
            likes.len() as u64
        };

        if let Some(mut record) = self.state.posts.get_mut(&id) {
            record.like_count = count;
        }

        Ok(())
    }

    async fn deactivate_post(&self, id: u64) -> Result<(), ContractError> {
        let post = self.state.post(id)?;
        let community = self.state.community(post.community_id)?;

        if self.caller != post.author && !self.can_moderate(&community) {
            return Err(ContractError::NotAuthorized(
                "only the author, community creator or contract owner may deactivate a post"
                    .to_string(),
            ));
        }

        if let Some(mut record) = self.state.posts.get_mut(&id) {
            record.active = false;
        }

        info!(post = id, moderator = %self.caller.short(), "Post deactivated");
        Ok(())
    }

    async fn get_post_comments(&self, post: u64) -> Result<Vec<CommentRecord>, ContractError> {
        self.state.post(post)?;

        let mut comments: Vec<_> = self
            .state
            .comments
            .iter()
            .filter(|entry| entry.post_id == post && entry.active)
            .map(|entry| entry.value().clone())
            .collect();
        comments.sort_by_key(|c| c.id);
        Ok(comments)
    }

    async fn add_comment(&self, post: u64, content_cid: Cid) -> Result<u64, ContractError> {
        let post_record = self.state.post(post)?;
        if !post_record.active {
            return Err(ContractError::PostInactive(post));
        }

        let community = post_record.community_id;
        if self.state.is_banned(community, self.caller) {
            return Err(ContractError::Banned(community));
        }
        if !self.state.is_member(community, self.caller) {
            return Err(ContractError::NotMember(community));
        }

        let id = self.state.next_comment_id.fetch_add(1, Ordering::SeqCst) + 1;

        let record = CommentRecord {
            id,
            post_id: post,
            author: self.caller,
            content_cid,
            active: true,
            created_at: Utc::now().timestamp(),
        };

        self.state.comments.insert(id, record);
        debug!(comment = id, post, author = %self.caller.short(), "Comment added");
        Ok(id)
    }

    async fn deactivate_comment(&self, id: u64) -> Result<(), ContractError> {
        let comment = self
            .state
            .comments
            .get(&id)
            .map(|c| c.value().clone())
            .ok_or(ContractError::CommentNotFound(id))?;
        let post = self.state.post(comment.post_id)?;
        let community = self.state.community(post.community_id)?;

        if self.caller != comment.author && !self.can_moderate(&community) {
            return Err(ContractError::NotAuthorized(
                "only the author, community creator or contract owner may deactivate a comment"
                    .to_string(),
            ));
        }

        if let Some(mut record) = self.state.comments.get_mut(&id) {
            record.active = false;
        }

        Ok(())
    }

    async fn profile_cid(&self, account: Address) -> Result<Option<Cid>, ContractError> {
        Ok(self.state.profiles.get(&account).map(|c| c.value().clone()))
    }

    async fn set_profile_cid(&self, cid: Cid) -> Result<(), ContractError> {
        self.state.profiles.insert(self.caller, cid);
        Ok(())
    }

    async fn follow_user(&self, account: Address) -> Result<(), ContractError> {
        if account == self.caller {
            return Err(ContractError::SelfFollow);
        }

        let mut follows = self.state.follows.entry(self.caller).or_default();
        if !follows.insert(account) {
            return Err(ContractError::AlreadyFollowing);
        }
        Ok(())
    }

    async fn unfollow_user(&self, account: Address) -> Result<(), ContractError> {
        let mut follows = self.state.follows.entry(self.caller).or_default();
        if !follows.remove(&account) {
            return Err(ContractError::NotFollowing);
        }
        Ok(())
    }

    async fn is_following(
        &self,
        follower: Address,
        followed: Address,
    ) -> Result<bool, ContractError> {
        Ok(self
            .state
            .follows
            .get(&follower)
            .is_some_and(|f| f.contains(&followed)))
    }

    async fn ban_user(&self, community: u64, account: Address) -> Result<(), ContractError> {
        let record = self.state.community(community)?;
        if !self.can_moderate(&record) {
            return Err(ContractError::NotAuthorized(
                "only the creator or contract owner may ban".to_string(),
            ));
        }

        self.state.bans.entry(community).or_default().insert(account);
        info!(community, account = %account.short(), moderator = %self.caller.short(), "Account banned");
        Ok(())
    }

    async fn unban_user(&self, community: u64, account: Address) -> Result<(), ContractError> {
        let record = self.state.community(community)?;
        if !self.can_moderate(&record) {
            return Err(ContractError::NotAuthorized(
                "only the creator or contract owner may unban".to_string(),
            ));
        }

        self.state.bans.entry(community).or_default().remove(&account);
        info!(community, account = %account.short(), moderator = %self.caller.short(), "Account unbanned");
        Ok(())
    }

    async fn is_banned(&self, community: u64, account: Address) -> Result<bool, ContractError> {
        self.state.community(community)?;
        Ok(self.state.is_banned(community, account))
    }
}
