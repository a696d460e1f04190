//! Account address type

use serde::{Deserialize, Serialize};

use crate::error::AddressError;

/// 20-byte account address on the forum's chain.
///
/// Parsed from and displayed as `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Construct from raw bytes.
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed hex address.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let hex_part = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::InvalidFormat(s.to_string()))?;

        let bytes =
            hex::decode(hex_part).map_err(|_| AddressError::InvalidFormat(s.to_string()))?;

        if bytes.len() != 20 {
            return Err(AddressError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            });
        }

        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    /// The raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Short form for log output (`0x` + first 4 bytes).
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x00112233445566778899aabbccddeeff00112233";

    #[test]
    fn test_parse_roundtrip() {
        let addr = Address::parse(ALICE).unwrap();
        assert_eq!(addr.to_string(), ALICE);
    }

    #[test]
    fn test_parse_rejects_missing_prefix() {
        let result = Address::parse("00112233445566778899aabbccddeeff00112233");
        assert!(matches!(result, Err(AddressError::InvalidFormat(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let result = Address::parse("0x001122");
        assert!(matches!(
            result,
            Err(AddressError::InvalidLength {
                expected: 20,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let result = Address::parse("0xzz112233445566778899aabbccddeeff00112233");
        assert!(result.is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let addr = Address::parse(ALICE).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{ALICE}\""));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
