//! # NodeSpeak Core
//!
//! Domain types shared across the NodeSpeak workspace.
//!
//! The forum itself lives behind two external collaborators: an
//! Ethereum-compatible smart contract (reached through the `ForumContract`
//! trait in `nodespeak-contract`) and IPFS gateways (reached through the
//! fetch pipeline in `nodespeak-ipfs`). This crate holds what both sides
//! speak about: content identifiers, account addresses, and the JSON payload
//! shapes pinned to IPFS.

pub mod address;
pub mod cid;
pub mod error;
pub mod model;

pub use address::Address;
pub use cid::Cid;
pub use error::AddressError;
pub use model::{CommentContent, CommunityMetadata, PostContent, ProfileData};
