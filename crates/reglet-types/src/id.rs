//! [`ExecutionId`], the opaque identifier assigned once per scheduler run.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque 128-bit identifier for one execution of a profile.
///
/// Lexically comparable (ordering on the integer value matches ordering on
/// the canonical hex string) and round-trips through its hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExecutionId(u128);

impl ExecutionId {
    /// Generates a fresh, random execution id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().as_u128())
    }

    /// Canonical lowercase 32-character hex form.
    pub fn to_hex(self) -> String {
        format!("{:032x}", self.0)
    }

    /// Parses a canonical hex form back into an id.
    pub fn from_hex(s: &str) -> Result<Self, ExecutionIdParseError> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ExecutionIdParseError(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|_| ExecutionIdParseError(s.to_string()))
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ExecutionId {
    type Err = ExecutionIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// The string was not a 32-character lowercase hex execution id.
#[derive(Debug, thiserror::Error)]
#[error("invalid execution id: {0:?}")]
pub struct ExecutionIdParseError(String);

impl Serialize for ExecutionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ExecutionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_hex() {
        let id = ExecutionId::new();
        let hex = id.to_hex();
        assert_eq!(ExecutionId::from_hex(&hex).unwrap(), id);
    }

    #[test]
    fn two_fresh_ids_differ() {
        assert_ne!(ExecutionId::new(), ExecutionId::new());
    }

    #[test]
    fn hex_form_is_32_lowercase_chars() {
        let id = ExecutionId::new();
        let hex = id.to_hex();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(ExecutionId::from_hex("not-hex").is_err());
        assert!(ExecutionId::from_hex("abc").is_err());
    }

    #[test]
    fn ordering_matches_numeric_value() {
        let a = ExecutionId::from_hex("00000000000000000000000000000001").unwrap();
        let b = ExecutionId::from_hex("00000000000000000000000000000002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_round_trip() {
        let id = ExecutionId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ExecutionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
