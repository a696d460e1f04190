//! NodeSpeak node binary.
//!
//! `nodespeak resolve <cid>` runs a CID through the full content pipeline
//! (gateway fallback, cache, resolver) and prints the outcome;
//! `nodespeak serve` runs the notes proxy; `nodespeak demo` exercises the
//! forum flows against the in-memory chain.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use nodespeak_contract::InMemoryForum;
use nodespeak_core::{Address, Cid, CommentContent, CommunityMetadata, PostContent};
use nodespeak_forum::ForumClient;
use nodespeak_ipfs::{
    CacheEntry, Content, ContentCache, ContentResolver, GatewayClient, HttpTransport,
    InMemoryPinner, MockGateway,
};
use nodespeak_mcp::{AppState, router};

use config::NodeConfig;

#[derive(Parser)]
#[command(name = "nodespeak", version, about = "Blockchain-backed forum data layer")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a CID through the gateway pipeline and print the content.
    Resolve {
        /// The CID to resolve.
        cid: String,
        /// Override the gateway list (repeatable, tried in order).
        #[arg(long = "gateway")]
        gateways: Vec<String>,
    },
    /// Run the notes proxy.
    Serve {
        /// Override the bind address from the config.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run a scripted forum session against the in-memory chain.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };

    match cli.command {
        Command::Resolve { cid, gateways } => resolve(config, cid, gateways).await,
        Command::Serve { bind } => serve(config, bind).await,
        Command::Demo => demo().await,
    }
}

async fn resolve(config: NodeConfig, cid: String, gateways: Vec<String>) -> anyhow::Result<()> {
    let mut gateway_config = config.gateway_config();
    if !gateways.is_empty() {
        gateway_config.gateways = gateways;
    }

    let resolver = ContentResolver::new(
        Arc::new(ContentCache::new()),
        GatewayClient::new(gateway_config, HttpTransport::new()),
    );

    let cid = Cid::new(cid);
    match resolver.fetch_content(&cid).await {
        CacheEntry::Content(Content::Json(value)) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        CacheEntry::Content(Content::Text(text)) => println!("{text}"),
        CacheEntry::Content(Content::Bytes(bytes)) => {
            println!("(binary content, {} bytes)", bytes.len());
        }
        CacheEntry::Unavailable => println!("Content unavailable"),
    }
    Ok(())
}

async fn serve(config: NodeConfig, bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| config.proxy_bind.clone());
    let app = router(AppState::new(config.proxy));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(addr = %bind, "Notes proxy listening");

    axum::serve(listener, app).await.context("proxy server")?;
    Ok(())
}

/// Scripted walk through the forum flows on an in-memory chain, with a
/// pinner-backed fake gateway serving the pinned content.
async fn demo() -> anyhow::Result<()> {
    let alice = Address::parse("0x00112233445566778899aabbccddeeff00112233")?;
    let bob = Address::parse("0xffeeddccbbaa99887766554433221100ffeeddcc")?;

    let forum = InMemoryForum::new(alice);
    let pinner = Arc::new(InMemoryPinner::new());

    let client_for = |account: Address| {
        let gateway = MockGateway::with_store(pinner.clone());
        let resolver = Arc::new(ContentResolver::new(
            Arc::new(ContentCache::new()),
            GatewayClient::new(nodespeak_ipfs::GatewayConfig::default(), gateway),
        ));
        ForumClient::new(forum.contract_for(account), resolver, pinner.clone())
    };

    let alice_client = client_for(alice);
    let bob_client = client_for(bob);

    let community = alice_client
        .create_community(&CommunityMetadata {
            name: "rustaceans".to_string(),
            description: "systems talk".to_string(),
            topics: vec!["general".to_string()],
        })
        .await?;
    bob_client.join_community(community).await?;

    let post = bob_client
        .create_post(
            community,
            &PostContent {
                title: "hello".to_string(),
                body: "first post from the demo".to_string(),
            },
            None,
            Some("general".to_string()),
        )
        .await?;
    alice_client
        .add_comment(post, &CommentContent { body: "welcome".to_string() })
        .await?;
    alice_client.like_post(post).await?;

    for community in alice_client.communities().await? {
        println!(
            "community #{} {:?} ({} members)",
            community.record.id, community.metadata.name, community.record.member_count
        );
        for post in alice_client.posts(community.record.id).await? {
            println!(
                "  post #{} {:?} by {} ({} likes)",
                post.record.id,
                post.content.title,
                post.record.author.short(),
                post.record.like_count
            );
            for comment in alice_client.comments(post.record.id).await? {
                println!(
                    "    comment #{} {:?} by {}",
                    comment.record.id,
                    comment.content.body,
                    comment.record.author.short()
                );
            }
        }
    }

    Ok(())
}
