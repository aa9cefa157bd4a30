use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChainError;

pub const HASH_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 digest, or the empty genesis sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexHash(String);

impl HexHash {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the first `difficulty` hex chars are all `'0'`.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        let n = difficulty as usize;
        self.0.len() >= n && self.0.bytes().take(n).all(|c| c == b'0')
    }
}

impl TryFrom<String> for HexHash {
    type Error = ChainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            return Ok(Self(s));
        }
        if s.len() != HASH_HEX_LEN {
            return Err(ChainError::InvalidHash(format!(
                "expected {HASH_HEX_LEN} hex chars, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ChainError::InvalidHash(format!("not lowercase hex: {s}")));
        }
        Ok(Self(s))
    }
}

impl FromStr for HexHash {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_string())
    }
}

impl From<HexHash> for String {
    fn from(h: HexHash) -> Self {
        h.0
    }
}

impl fmt::Display for HexHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::HexHash;

    #[test]
    fn accepts_empty_and_full_digests() {
        assert!("".parse::<HexHash>().unwrap().as_str().is_empty());
        let h: HexHash = "ab".repeat(32).parse().unwrap();
        assert_eq!(h.as_str().len(), 64);
    }

    #[test]
    fn rejects_wrong_length_and_uppercase() {
        assert!("abc".parse::<HexHash>().is_err());
        assert!("AB".repeat(32).parse::<HexHash>().is_err());
        assert!(serde_json::from_str::<HexHash>("\"xyz\"").is_err());
    }

    #[test]
    fn difficulty_prefix() {
        let h: HexHash = format!("00{}", "f".repeat(62)).parse().unwrap();
        assert!(h.meets_difficulty(0));
        assert!(h.meets_difficulty(2));
        assert!(!h.meets_difficulty(3));
    }
}
