//! # Account Addresses
//!
//! Every participant in the ledger (creators, beneficiaries, contributors,
//! the crowdfunding service and the reward token themselves) is identified
//! by a 20-byte [`Address`], rendered as `0x`-prefixed lowercase hex.
//!
//! The all-zero address is the *null identity*. It never owns anything and
//! is rejected wherever a real counterparty is required.
//!
//! Two derivations exist for environments without real keys:
//!
//! ```text
//! from_label(label)             = SHA-256("charity/account/" || label)[12..32]
//! derive_contract(owner, nonce) = SHA-256("charity/contract/" || owner || nonce_be)[12..32]
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ACCOUNT_DOMAIN: &[u8] = b"charity/account/";
const CONTRACT_DOMAIN: &[u8] = b"charity/contract/";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced when parsing an address from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// The string contained non-hex characters.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// The decoded byte length was not 20.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Required number of bytes.
        expected: usize,
        /// Number of bytes actually decoded.
        got: usize,
    },
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; Address::LENGTH]);

impl Address {
    /// Address length in bytes.
    pub const LENGTH: usize = 20;

    /// The null identity.
    pub const ZERO: Address = Address([0u8; Address::LENGTH]);

    /// Wraps raw bytes.
    pub const fn from_bytes(bytes: [u8; Address::LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; Address::LENGTH] {
        &self.0
    }

    /// Returns `true` for the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; Address::LENGTH]
    }

    /// Deterministic account address for a human-readable label.
    ///
    /// Used by dev networks and tests ("alice", "deployer", ...). Two calls
    /// with the same label always return the same address.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(ACCOUNT_DOMAIN);
        hasher.update(label.as_bytes());
        Self::from_digest(&hasher.finalize())
    }

    /// Address of the `nonce`-th contract instantiated by `deployer`.
    pub fn derive_contract(deployer: &Address, nonce: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(CONTRACT_DOMAIN);
        hasher.update(deployer.as_bytes());
        hasher.update(nonce.to_be_bytes());
        Self::from_digest(&hasher.finalize())
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    fn from_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; Address::LENGTH];
        bytes.copy_from_slice(&digest[digest.len() - Address::LENGTH..]);
        Self(bytes)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts 40 hex characters with or without a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let decoded = hex::decode(digits).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        if decoded.len() != Address::LENGTH {
            return Err(AddressError::InvalidLength {
                expected: Address::LENGTH,
                got: decoded.len(),
            });
        }

        let mut bytes = [0u8; Address::LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
