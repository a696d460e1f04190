//! Forum service
//!
//! `ForumClient` joins the two halves of the forum: on-chain records from
//! the contract and off-chain content from the IPFS pipeline. Read paths
//! resolve record CIDs through the query layer (one batch query per
//! listing) and degrade to placeholder content where a CID is unavailable —
//! a page must render even when a gateway has lost its content. Write paths
//! pin first, then put the resulting CID on-chain.

use std::sync::Arc;

use nodespeak_contract::{CommentRecord, CommunityRecord, ForumContract, PostRecord};
use nodespeak_core::{Address, Cid, CommentContent, CommunityMetadata, PostContent, ProfileData};
use nodespeak_ipfs::{
    CacheEntry, Content, ContentCache, ContentResolver, GatewayTransport, Pinner, QueryClient, keys,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{ForumError, ForumResult};
use crate::moderation::{ModerationAction, ModerationLog};

/// A community joined with its resolved metadata.
#[derive(Debug, Clone)]
pub struct Community {
    /// The on-chain record.
    pub record: CommunityRecord,
    /// Resolved metadata, or the placeholder when unavailable.
    pub metadata: CommunityMetadata,
    /// False when `metadata` is the placeholder.
    pub metadata_available: bool,
}

/// A post joined with its resolved content.
#[derive(Debug, Clone)]
pub struct Post {
    /// The on-chain record.
    pub record: PostRecord,
    /// Resolved body, or the placeholder when unavailable.
    pub content: PostContent,
    /// False when `content` is the placeholder.
    pub content_available: bool,
    /// Gateway URL for the attached image, if any.
    pub image_url: Option<String>,
}

/// A comment joined with its resolved content.
#[derive(Debug, Clone)]
pub struct Comment {
    /// The on-chain record.
    pub record: CommentRecord,
    /// Resolved body, or the placeholder when unavailable.
    pub content: CommentContent,
    /// False when `content` is the placeholder.
    pub content_available: bool,
}

/// A profile joined with its resolved document.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The account the profile belongs to.
    pub account: Address,
    /// Resolved profile document, or a placeholder naming the account.
    pub data: ProfileData,
    /// False when `data` is the placeholder.
    pub data_available: bool,
    /// Gateway URL for the avatar, if the profile names one.
    pub avatar_url: Option<String>,
}

/// Client-side forum session: one contract handle, one content pipeline,
/// one moderation audit log.
pub struct ForumClient<C: ForumContract, T: GatewayTransport> {
    contract: C,
    resolver: Arc<ContentResolver<T>>,
    queries: QueryClient<ContentResolver<T>>,
    cache: Arc<ContentCache>,
    pinner: Arc<dyn Pinner>,
    moderation: ModerationLog,
}

impl<C: ForumContract, T: GatewayTransport> ForumClient<C, T> {
    /// Create a session over a contract handle, resolver and pinner.
    pub fn new(contract: C, resolver: Arc<ContentResolver<T>>, pinner: Arc<dyn Pinner>) -> Self {
        let cache = resolver.cache().clone();
        Self {
            contract,
            queries: QueryClient::new(resolver.clone()),
            resolver,
            cache,
            pinner,
            moderation: ModerationLog::new(),
        }
    }

    /// The account this session acts as.
    pub fn account(&self) -> Address {
        self.contract.caller()
    }

    /// The session's moderation audit log.
    pub fn moderation(&self) -> &ModerationLog {
        &self.moderation
    }

    /// The underlying query client (exposed for explicit refetches).
    pub fn queries(&self) -> &QueryClient<ContentResolver<T>> {
        &self.queries
    }

    // Communities

    /// All active communities with resolved metadata, one batch query.
    #[instrument(skip(self))]
    pub async fn communities(&self) -> ForumResult<Vec<Community>> {
        let records = self.contract.get_active_communities().await?;
        let cids: Vec<Cid> = records.iter().map(|r| r.content_cid.clone()).collect();

        let batch = self.queries.batch_query(&cids).await;
        let blobs = if batch.blobs.len() == records.len() {
            batch.blobs
        } else {
            // Settled under an error; render every record as unavailable.
            vec![None; records.len()]
        };

        let communities = records
            .into_iter()
            .zip(blobs)
            .map(|(record, blob)| {
                self.remember_derived(keys::community(record.id), blob.as_ref());
                Self::community_view(record, blob)
            })
            .collect();
        Ok(communities)
    }

    /// One community with resolved metadata, served from the derived-object
    /// cache when a listing already parsed it.
    pub async fn community(&self, id: u64) -> ForumResult<Community> {
        let record = self.contract.get_community(id).await?;

        let blob = match self.cache.get(&keys::community(id)) {
            Some(entry) => entry.content().cloned(),
            None => {
                let blob = self.queries.file_query(Some(&record.content_cid)).await.blob;
                self.remember_derived(keys::community(id), blob.as_ref());
                blob
            }
        };

        Ok(Self::community_view(record, blob))
    }

    /// Pin metadata, then create the community on-chain.
    pub async fn create_community(&self, metadata: &CommunityMetadata) -> ForumResult<u64> {
        let cid = self.pin(metadata).await?;
        let id = self
            .contract
            .create_community(cid, metadata.topics.clone())
            .await?;
        info!(community = id, name = %metadata.name, "Created community");
        Ok(id)
    }

    /// Join a community.
    pub async fn join_community(&self, id: u64) -> ForumResult<()> {
        Ok(self.contract.join_community(id).await?)
    }

    /// Leave a community.
    pub async fn leave_community(&self, id: u64) -> ForumResult<()> {
        Ok(self.contract.leave_community(id).await?)
    }

    /// Whether an account is a member of a community.
    pub async fn is_member(&self, id: u64, account: Address) -> ForumResult<bool> {
        Ok(self.contract.is_member(id, account).await?)
    }

    // Posts

    /// Active posts of a community with resolved bodies, one batch query.
    #[instrument(skip(self))]
    pub async fn posts(&self, community: u64) -> ForumResult<Vec<Post>> {
        let records = self.contract.get_community_posts(community).await?;
        let cids: Vec<Cid> = records.iter().map(|r| r.content_cid.clone()).collect();

        let batch = self.queries.batch_query(&cids).await;
        let blobs = if batch.blobs.len() == records.len() {
            batch.blobs
        } else {
            vec![None; records.len()]
        };

        let posts = records
            .into_iter()
            .zip(blobs)
            .map(|(record, blob)| {
                self.remember_derived(keys::post(record.id), blob.as_ref());
                self.post_view(record, blob)
            })
            .collect();
        Ok(posts)
    }

    /// One post with resolved body.
    pub async fn post(&self, id: u64) -> ForumResult<Post> {
        let record = self.contract.get_post(id).await?;

        let blob = match self.cache.get(&keys::post(id)) {
            Some(entry) => entry.content().cloned(),
            None => {
                let blob = self.queries.file_query(Some(&record.content_cid)).await.blob;
                self.remember_derived(keys::post(id), blob.as_ref());
                blob
            }
        };

        Ok(self.post_view(record, blob))
    }

    /// Pin the body, then create the post on-chain.
    pub async fn create_post(
        &self,
        community: u64,
        content: &PostContent,
        image_cid: Option<Cid>,
        topic: Option<String>,
    ) -> ForumResult<u64> {
        let cid = self.pin(content).await?;
        let id = self
            .contract
            .create_post(community, cid, image_cid, topic)
            .await?;
        info!(post = id, community, "Created post");
        Ok(id)
    }

    /// Like a post.
    pub async fn like_post(&self, id: u64) -> ForumResult<()> {
        Ok(self.contract.like_post(id).await?)
    }

    /// Remove a like.
    pub async fn unlike_post(&self, id: u64) -> ForumResult<()> {
        Ok(self.contract.unlike_post(id).await?)
    }

    // Comments

    /// Active comments of a post with resolved bodies, one batch query.
    pub async fn comments(&self, post: u64) -> ForumResult<Vec<Comment>> {
        let records = self.contract.get_post_comments(post).await?;
        let cids: Vec<Cid> = records.iter().map(|r| r.content_cid.clone()).collect();

        let batch = self.queries.batch_query(&cids).await;
        let blobs = if batch.blobs.len() == records.len() {
            batch.blobs
        } else {
            vec![None; records.len()]
        };

        let comments = records
            .into_iter()
            .zip(blobs)
            .map(|(record, blob)| Self::comment_view(record, blob))
            .collect();
        Ok(comments)
    }

    /// Pin the body, then add the comment on-chain.
    pub async fn add_comment(&self, post: u64, content: &CommentContent) -> ForumResult<u64> {
        let cid = self.pin(content).await?;
        let id = self.contract.add_comment(post, cid).await?;
        info!(comment = id, post, "Added comment");
        Ok(id)
    }

    // Profiles and the social graph

    /// An account's profile, or `None` when it never set one.
    pub async fn profile(&self, account: Address) -> ForumResult<Option<Profile>> {
        let Some(cid) = self.contract.profile_cid(account).await? else {
            return Ok(None);
        };

        let blob = self.queries.file_query(Some(&cid)).await.blob;
        let (data, data_available) = match parse_typed::<ProfileData>(blob.as_ref()) {
            Some(data) => (data, true),
            None => (
                ProfileData {
                    username: account.short(),
                    bio: String::new(),
                    avatar_cid: None,
                },
                false,
            ),
        };

        let avatar_url = data
            .avatar_cid
            .as_ref()
            .map(|avatar| self.resolver.image_url(avatar));

        Ok(Some(Profile {
            account,
            data,
            data_available,
            avatar_url,
        }))
    }

    /// Pin the profile document, then point the caller's profile at it.
    pub async fn update_profile(&self, data: &ProfileData) -> ForumResult<()> {
        let cid = self.pin(data).await?;
        self.contract.set_profile_cid(cid).await?;
        info!(account = %self.account().short(), "Updated profile");
        Ok(())
    }

    /// Follow another account.
    pub async fn follow(&self, account: Address) -> ForumResult<()> {
        Ok(self.contract.follow_user(account).await?)
    }

    /// Stop following an account.
    pub async fn unfollow(&self, account: Address) -> ForumResult<()> {
        Ok(self.contract.unfollow_user(account).await?)
    }

    /// Whether the session's account follows `account`.
    pub async fn is_following(&self, account: Address) -> ForumResult<bool> {
        Ok(self
            .contract
            .is_following(self.account(), account)
            .await?)
    }

    // Moderation

    /// Ban an account from a community and log the action.
    pub async fn ban_user(&self, community: u64, account: Address) -> ForumResult<()> {
        self.contract.ban_user(community, account).await?;
        self.moderation
            .record(ModerationAction::BanUser { community, account }, self.account());
        Ok(())
    }

    /// Lift a ban and log the action.
    pub async fn unban_user(&self, community: u64, account: Address) -> ForumResult<()> {
        self.contract.unban_user(community, account).await?;
        self.moderation
            .record(ModerationAction::UnbanUser { community, account }, self.account());
        Ok(())
    }

    /// Whether an account is banned from a community.
    pub async fn is_banned(&self, community: u64, account: Address) -> ForumResult<bool> {
        Ok(self.contract.is_banned(community, account).await?)
    }

    /// Deactivate a post and log the action.
    pub async fn deactivate_post(&self, post: u64) -> ForumResult<()> {
        let record = self.contract.get_post(post).await?;
        self.contract.deactivate_post(post).await?;
        self.moderation.record(
            ModerationAction::DeactivatePost {
                post,
                community: record.community_id,
            },
            self.account(),
        );
        Ok(())
    }

    /// Deactivate a comment and log the action.
    ///
    /// The community is passed explicitly: the ABI exposes no single-comment
    /// view, and the admin panel always acts from a community context.
    pub async fn deactivate_comment(&self, community: u64, comment: u64) -> ForumResult<()> {
        self.contract.deactivate_comment(comment).await?;
        self.moderation.record(
            ModerationAction::DeactivateComment { comment, community },
            self.account(),
        );
        Ok(())
    }

    /// Deactivate a community and log the action.
    pub async fn deactivate_community(&self, community: u64) -> ForumResult<()> {
        self.contract.deactivate_community(community).await?;
        self.moderation.record(
            ModerationAction::DeactivateCommunity { community },
            self.account(),
        );
        Ok(())
    }

    // Internals

    async fn pin<V: Serialize>(&self, value: &V) -> ForumResult<Cid> {
        let json = serde_json::to_value(value).map_err(|e| ForumError::Encode(e.to_string()))?;
        Ok(self.pinner.pin_json(&json).await?)
    }

    /// Store a resolved blob under a derived key so later single-item reads
    /// skip the CID fetch and the JSON re-parse.
    fn remember_derived(&self, key: String, blob: Option<&Content>) {
        let entry = match blob {
            Some(content) => CacheEntry::Content(content.clone()),
            None => CacheEntry::Unavailable,
        };
        self.cache.insert(key, entry);
    }

    fn community_view(record: CommunityRecord, blob: Option<Content>) -> Community {
        let (metadata, metadata_available) = match parse_typed::<CommunityMetadata>(blob.as_ref())
        {
            Some(metadata) => (metadata, true),
            None => {
                warn!(community = record.id, cid = %record.content_cid.short(), "Community metadata unavailable");
                (CommunityMetadata::unavailable(), false)
            }
        };
        Community {
            record,
            metadata,
            metadata_available,
        }
    }

    fn post_view(&self, record: PostRecord, blob: Option<Content>) -> Post {
        let (content, content_available) = match parse_typed::<PostContent>(blob.as_ref()) {
            Some(content) => (content, true),
            None => (PostContent::unavailable(), false),
        };
        let image_url = record
            .image_cid
            .as_ref()
            .map(|cid| self.resolver.image_url(cid));
        Post {
            record,
            content,
            content_available,
            image_url,
        }
    }

    fn comment_view(record: CommentRecord, blob: Option<Content>) -> Comment {
        let (content, content_available) = match parse_typed::<CommentContent>(blob.as_ref()) {
            Some(content) => (content, true),
            None => (CommentContent::unavailable(), false),
        };
        Comment {
            record,
            content,
            content_available,
        }
    }
}

/// Parse resolved JSON content into a typed payload; anything else (missing
/// content, text, malformed JSON) is `None`.
fn parse_typed<V: DeserializeOwned>(blob: Option<&Content>) -> Option<V> {
    let value = blob?.as_json()?;
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_rejects_text_and_garbage() {
        let text = Content::Text("not json".to_string());
        assert!(parse_typed::<CommunityMetadata>(Some(&text)).is_none());

        let wrong_shape = Content::Json(serde_json::json!({"unexpected": true}));
        assert!(parse_typed::<CommunityMetadata>(Some(&wrong_shape)).is_none());

        assert!(parse_typed::<CommunityMetadata>(None).is_none());
    }

    #[test]
    fn test_parse_typed_accepts_metadata() {
        let json = Content::Json(serde_json::json!({
            "name": "rustaceans",
            "description": "all things rust",
            "topics": ["lang", "tooling"]
        }));

        let metadata = parse_typed::<CommunityMetadata>(Some(&json)).unwrap();
        assert_eq!(metadata.name, "rustaceans");
        assert_eq!(metadata.topics.len(), 2);
    }
}
