use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Persistent identity for an account (creator or contributor).
///
/// An `AccountId` is a fixed 20-byte value, matching the address width of
/// the custody layer the engine settles against. It is opaque to the
/// engine: the engine only ever compares identities for equality and
/// forwards them in settlement instructions.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId {
    bytes: [u8; 20],
}

impl AccountId {
    /// Build an identity from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self { bytes }
    }

    /// The raw 20-byte value.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.bytes
    }

    /// Full hex-encoded string with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Short identifier (first 4 bytes), for log lines and summaries.
    pub fn short_id(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes[..4]))
    }

    /// Parse from a hex string (40 hex characters, optional `0x` prefix,
    /// case-insensitive).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        let decoded = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if decoded.len() != 20 {
            return Err(TypeError::InvalidLength {
                expected: 20,
                actual: decoded.len(),
            });
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short_id())
    }
}
