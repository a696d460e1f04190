//! Error types for the IPFS pipeline
//!
//! Note the narrow scope: content that cannot be retrieved is NOT an error.
//! All-gateways-failed normalizes to the `Unavailable` cache entry, so these
//! variants only cover transport-level faults, pin failures, and resolver
//! misuse — the cases a query surfaces through its `is_error` flag.

use thiserror::Error;

/// Errors raised by the gateway transport, pinner, or query fetcher
#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("Gateway transport error: {0}")]
    Transport(String),

    #[error("Pin failed: {0}")]
    Pin(String),

    #[error("Resolver failure: {0}")]
    Resolver(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IpfsError::Transport("connection refused".to_string());
        assert!(format!("{}", err).contains("connection refused"));

        let err = IpfsError::Pin("no space".to_string());
        assert!(format!("{}", err).contains("Pin failed"));
    }
}
