//! On-chain account addresses.
//!
//! Addresses are 32 raw bytes on the wire and base58 text everywhere else.
//! [`is_well_formed`] is the cheap syntactic filter applied to every textual
//! address before it is accepted as a participant; it does not decode.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Infrastructure accounts that are never a participant.
pub const DENYLIST: &[&str] = &[
    "11111111111111111111111111111111",
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
    "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb",
    "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
    "MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr",
    "Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo",
    "ComputeBudget111111111111111111111111111111",
    "SysvarRent111111111111111111111111111111111",
    "SysvarC1ock11111111111111111111111111111111",
    "Sysvar1nstructions1111111111111111111111111",
    "BPFLoaderUpgradeab1e11111111111111111111111",
];

const MIN_TEXT_LEN: usize = 32;
const MAX_TEXT_LEN: usize = 44;

/// Structural validity check for a base58 address.
///
/// Accepts 32..=44 characters from the base58 alphabet (no `0`, `O`, `I`, `l`).
pub fn is_well_formed(s: &str) -> bool {
    (MIN_TEXT_LEN..=MAX_TEXT_LEN).contains(&s.len()) && s.bytes().all(is_base58_char)
}

fn is_base58_char(b: u8) -> bool {
    matches!(b, b'1'..=b'9' | b'A'..=b'H' | b'J'..=b'N' | b'P'..=b'Z' | b'a'..=b'k' | b'm'..=b'z')
}

/// Whether `s` is a well-known infrastructure account.
pub fn is_denylisted(s: &str) -> bool {
    DENYLIST.contains(&s)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("invalid base58: {0}")]
    Base58(String),
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    pub const LEN: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl std::str::FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressParseError::Base58(e.to_string()))?;
        let len = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| AddressParseError::Length(len))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_addresses() {
        assert!(is_well_formed("11111111111111111111111111111111"));
        assert!(is_well_formed("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"));
        assert!(is_well_formed(&Address::new([7u8; 32]).to_base58()));
    }

    #[test]
    fn test_malformed_addresses() {
        // too short
        assert!(!is_well_formed("1111111111"));
        // too long
        assert!(!is_well_formed(&"2".repeat(45)));
        // characters outside the alphabet
        assert!(!is_well_formed("0OIl1111111111111111111111111111"));
        assert!(!is_well_formed("unknown_buyer_unknown_buyer_unknown"));
        assert!(!is_well_formed(""));
    }

    #[test]
    fn test_address_text_round_trip() {
        let address = Address::new([42u8; 32]);
        let parsed: Address = address.to_base58().parse().unwrap();
        assert_eq!(parsed, address);
    }

    #[test]
    fn test_address_rejects_wrong_length() {
        assert_eq!(
            "2".parse::<Address>(),
            Err(AddressParseError::Length(1))
        );
    }

    #[test]
    fn test_denylist_entries_are_well_formed() {
        for entry in DENYLIST {
            assert!(is_well_formed(entry), "{entry}");
            assert!(is_denylisted(entry));
        }
        assert!(!is_denylisted(&Address::new([9u8; 32]).to_base58()));
    }
}
