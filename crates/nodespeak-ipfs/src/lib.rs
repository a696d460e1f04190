//! # NodeSpeak IPFS
//!
//! The content-fetch pipeline: everything between "the contract returned a
//! CID" and "the consumer has bytes to render".
//!
//! ## Data flow
//!
//! ```text
//! consumer -> QueryClient -> ContentResolver -> ContentCache (hit -> return)
//!                                            -> GatewayClient (miss -> network)
//!                                            -> ContentCache (store)
//!          <- QueryClient (settled state)
//! ```
//!
//! - [`GatewayClient`]: ordered multi-gateway fallback with per-attempt
//!   timeouts; first 200 wins; total failure is the `Unavailable` value,
//!   not an error.
//! - [`ContentCache`]: unconditional process-lifetime cache — content
//!   addressing makes entries permanently valid, so there is no TTL and no
//!   eviction, and a cached failure is not retried except via refetch.
//! - [`ContentResolver`]: interprets bodies as JSON/text/bytes and exposes
//!   the gateway URL rewrite for images.
//! - [`QueryClient`]: request deduplication and UI-facing state per query
//!   key (`["ipfs", cid]` / `["ipfs", "batch", ...]`).
//! - [`Pinner`]: the publishing seam (pin first, put the CID on-chain).
//!
//! All external collaborators sit behind traits ([`GatewayTransport`],
//! [`QueryFetcher`], [`Pinner`]) with in-memory implementations, so every
//! policy in this crate is testable without a network.

pub mod cache;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod pin;
pub mod query;
pub mod resolve;

pub use cache::{CacheEntry, Content, ContentCache, keys};
pub use error::IpfsError;
pub use gateway::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_GATEWAYS, FetchOutcome, GatewayClient, GatewayConfig,
    GatewayResponse, GatewayTransport, HttpTransport,
};
pub use mock::MockGateway;
pub use pin::{InMemoryPinner, Pinner};
pub use query::{BatchQuery, FileQuery, QueryClient, QueryConfig, QueryFetcher, QueryKey};
pub use resolve::ContentResolver;
