//! Contract boundary errors
//!
//! Each variant maps to a revert reason the on-chain contract can produce;
//! `Rpc` covers the transport underneath.

use thiserror::Error;

/// Errors crossing the forum contract boundary
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Community not found: {0}")]
    CommunityNotFound(u64),

    #[error("Post not found: {0}")]
    PostNotFound(u64),

    #[error("Comment not found: {0}")]
    CommentNotFound(u64),

    #[error("Community is inactive: {0}")]
    CommunityInactive(u64),

    #[error("Post is inactive: {0}")]
    PostInactive(u64),

    #[error("Not a member of community {0}")]
    NotMember(u64),

    #[error("Already a member of community {0}")]
    AlreadyMember(u64),

    #[error("Post already liked: {0}")]
    AlreadyLiked(u64),

    #[error("Post not liked: {0}")]
    NotLiked(u64),

    #[error("Account is banned from community {0}")]
    Banned(u64),

    #[error("Cannot follow yourself")]
    SelfFollow,

    #[error("Already following account")]
    AlreadyFollowing,

    #[error("Not following account")]
    NotFollowing,

    #[error("Caller is not authorized: {0}")]
    NotAuthorized(String),

    #[error("RPC transport error: {0}")]
    Rpc(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(format!("{}", ContractError::CommunityNotFound(7)).contains("7"));
        assert!(format!("{}", ContractError::Banned(3)).contains("banned"));

        let err = ContractError::NotAuthorized("only creator may deactivate".to_string());
        assert!(format!("{}", err).contains("only creator"));
    }
}
