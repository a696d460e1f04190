//! # NodeSpeak Forum
//!
//! The client-side forum session: [`ForumClient`] composes a contract
//! handle (`nodespeak-contract`), the content pipeline (`nodespeak-ipfs`)
//! and a pinner into the read/write surface a frontend consumes.
//!
//! Listings issue one batch query per page of records and join each record
//! with its resolved content; a CID that resolves to nothing yields a
//! placeholder object, never an error — unavailability must not break
//! rendering. Writes pin content first and put only the CID on-chain.
//! Moderation passes through the contract and is additionally recorded in a
//! session-local [`ModerationLog`].

pub mod error;
pub mod moderation;
pub mod service;

pub use error::{ForumError, ForumResult};
pub use moderation::{ModerationAction, ModerationLog, ModerationRecord};
pub use service::{Comment, Community, ForumClient, Post, Profile};
