//! Forum flows over the in-memory chain and a pinner-backed fake gateway.

use std::sync::Arc;

use nodespeak_contract::{ContractError, ForumContract, InMemoryForum};
use nodespeak_core::{Address, Cid, CommentContent, CommunityMetadata, PostContent, ProfileData};
use nodespeak_forum::{ForumClient, ForumError, ModerationAction};
use nodespeak_ipfs::{
    ContentCache, ContentResolver, GatewayClient, GatewayConfig, InMemoryPinner, MockGateway,
};

const GATEWAY: &str = "https://gw.example/ipfs/";

fn addr(byte: u8) -> Address {
    Address::new([byte; 20])
}

/// One fake network shared by every client: a chain, a pin store, and a
/// gateway serving whatever was pinned.
struct TestNet {
    forum: InMemoryForum,
    pinner: Arc<InMemoryPinner>,
}

impl TestNet {
    fn new() -> Self {
        Self {
            forum: InMemoryForum::new(addr(0xaa)),
            pinner: Arc::new(InMemoryPinner::new()),
        }
    }

    fn client(
        &self,
        account: Address,
    ) -> ForumClient<nodespeak_contract::InMemoryForumContract, MockGateway> {
        let config = GatewayConfig::new(vec![GATEWAY.to_string()]);
        let gateway = MockGateway::with_store(self.pinner.clone());
        let resolver = Arc::new(ContentResolver::new(
            Arc::new(ContentCache::new()),
            GatewayClient::new(config, gateway),
        ));
        ForumClient::new(self.forum.contract_for(account), resolver, self.pinner.clone())
    }
}

fn metadata(name: &str) -> CommunityMetadata {
    CommunityMetadata {
        name: name.to_string(),
        description: format!("{name} description"),
        topics: vec!["general".to_string()],
    }
}

#[tokio::test]
async fn community_listing_resolves_pinned_metadata() {
    let net = TestNet::new();
    let alice = net.client(addr(1));

    alice.create_community(&metadata("rustaceans")).await.unwrap();
    alice.create_community(&metadata("chainwatch")).await.unwrap();

    let communities = alice.communities().await.unwrap();
    assert_eq!(communities.len(), 2);
    assert!(communities.iter().all(|c| c.metadata_available));

    let names: Vec<_> = communities.iter().map(|c| c.metadata.name.as_str()).collect();
    assert_eq!(names, ["rustaceans", "chainwatch"]);
}

#[tokio::test]
async fn unpinned_metadata_degrades_to_placeholder() {
    let net = TestNet::new();
    let alice = net.client(addr(1));

    // Created directly on the contract with a CID nothing ever pinned.
    net.forum
        .contract_for(addr(1))
        .create_community(Cid::new("QmNeverPinned"), vec![])
        .await
        .unwrap();

    let communities = alice.communities().await.unwrap();
    assert_eq!(communities.len(), 1);
    assert!(!communities[0].metadata_available);
    assert_eq!(communities[0].metadata, CommunityMetadata::unavailable());
}

#[tokio::test]
async fn post_and_comment_round_trip() {
    let net = TestNet::new();
    let alice = net.client(addr(1));
    let bob = net.client(addr(2));

    let community = alice.create_community(&metadata("rustaceans")).await.unwrap();
    bob.join_community(community).await.unwrap();

    let body = PostContent {
        title: "Hello".to_string(),
        body: "First post".to_string(),
    };
    let post = bob
        .create_post(community, &body, None, Some("general".to_string()))
        .await
        .unwrap();

    let posts = alice.posts(community).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert!(posts[0].content_available);
    assert_eq!(posts[0].content, body);
    assert_eq!(posts[0].record.author, addr(2));

    alice
        .add_comment(post, &CommentContent { body: "welcome!".to_string() })
        .await
        .unwrap();

    let comments = bob.comments(post).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content.body, "welcome!");
    assert_eq!(comments[0].record.author, addr(1));
}

#[tokio::test]
async fn image_posts_carry_gateway_urls() {
    let net = TestNet::new();
    let alice = net.client(addr(1));

    let community = alice.create_community(&metadata("photos")).await.unwrap();
    let post = alice
        .create_post(
            community,
            &PostContent {
                title: "sunset".to_string(),
                body: String::new(),
            },
            Some(Cid::new("QmImage123")),
            None,
        )
        .await
        .unwrap();

    let post = alice.post(post).await.unwrap();
    assert_eq!(
        post.image_url.as_deref(),
        Some("https://gw.example/ipfs/QmImage123")
    );
}

#[tokio::test]
async fn likes_and_membership_pass_through() {
    let net = TestNet::new();
    let alice = net.client(addr(1));
    let bob = net.client(addr(2));

    let community = alice.create_community(&metadata("rustaceans")).await.unwrap();
    assert!(alice.is_member(community, addr(1)).await.unwrap());
    assert!(!alice.is_member(community, addr(2)).await.unwrap());

    bob.join_community(community).await.unwrap();
    let post = bob
        .create_post(
            community,
            &PostContent {
                title: "t".to_string(),
                body: "b".to_string(),
            },
            None,
            None,
        )
        .await
        .unwrap();

    alice.like_post(post).await.unwrap();
    let result = alice.like_post(post).await;
    assert!(matches!(
        result,
        Err(ForumError::Contract(ContractError::AlreadyLiked(_)))
    ));

    let view = alice.post(post).await.unwrap();
    assert_eq!(view.record.like_count, 1);
}

#[tokio::test]
async fn moderation_is_enforced_and_logged() {
    let net = TestNet::new();
    let alice = net.client(addr(1));
    let carol = net.client(addr(3));

    let community = alice.create_community(&metadata("moderated")).await.unwrap();
    carol.join_community(community).await.unwrap();
    let post = carol
        .create_post(
            community,
            &PostContent {
                title: "spam".to_string(),
                body: "spam".to_string(),
            },
            None,
            None,
        )
        .await
        .unwrap();

    alice.deactivate_post(post).await.unwrap();
    alice.ban_user(community, addr(3)).await.unwrap();
    assert!(alice.is_banned(community, addr(3)).await.unwrap());

    // The banned author can no longer post.
    let result = carol
        .create_post(
            community,
            &PostContent {
                title: "again".to_string(),
                body: String::new(),
            },
            None,
            None,
        )
        .await;
    assert!(matches!(
        result,
        Err(ForumError::Contract(ContractError::Banned(_)))
    ));

    // The deactivated post is gone from the listing.
    assert!(alice.posts(community).await.unwrap().is_empty());

    // Both actions were logged against the community, in order.
    let log = alice.moderation().for_community(community);
    assert_eq!(log.len(), 2);
    assert!(matches!(log[0].action, ModerationAction::DeactivatePost { .. }));
    assert!(matches!(log[1].action, ModerationAction::BanUser { .. }));
    assert_eq!(log[0].moderator, addr(1));
}

#[tokio::test]
async fn profiles_and_follows() {
    let net = TestNet::new();
    let alice = net.client(addr(1));
    let bob = net.client(addr(2));

    assert!(alice.profile(addr(2)).await.unwrap().is_none());

    bob.update_profile(&ProfileData {
        username: "bob".to_string(),
        bio: "hello".to_string(),
        avatar_cid: Some(Cid::new("QmAvatar")),
    })
    .await
    .unwrap();

    let profile = alice.profile(addr(2)).await.unwrap().unwrap();
    assert!(profile.data_available);
    assert_eq!(profile.data.username, "bob");
    assert_eq!(
        profile.avatar_url.as_deref(),
        Some("https://gw.example/ipfs/QmAvatar")
    );

    alice.follow(addr(2)).await.unwrap();
    assert!(alice.is_following(addr(2)).await.unwrap());
    assert!(!bob.is_following(addr(1)).await.unwrap());

    alice.unfollow(addr(2)).await.unwrap();
    assert!(!alice.is_following(addr(2)).await.unwrap());
}
