//! Forum service errors

use nodespeak_contract::ContractError;
use nodespeak_ipfs::IpfsError;
use thiserror::Error;

/// Top-level error for forum operations
#[derive(Debug, Error)]
pub enum ForumError {
    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("IPFS error: {0}")]
    Ipfs(#[from] IpfsError),

    #[error("Content encoding failed: {0}")]
    Encode(String),
}

/// Result type alias for forum operations
pub type ForumResult<T> = Result<T, ForumError>;
