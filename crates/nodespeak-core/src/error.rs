//! Error types shared across NodeSpeak crates

use thiserror::Error;

/// Errors parsing account addresses
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),

    #[error("Invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_error_display() {
        let err = AddressError::InvalidFormat("garbage".to_string());
        assert!(format!("{}", err).contains("garbage"));

        let err = AddressError::InvalidLength {
            expected: 20,
            actual: 5,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("20"));
        assert!(msg.contains("5"));
    }
}
