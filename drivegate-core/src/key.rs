//! Content keys
//!
//! A drive is named by a 32-byte public-key-derived identifier. On the wire
//! (and in `dat://` hosts) it is written as 64 lowercase hex characters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a content key in bytes
pub const KEY_LEN: usize = 32;

/// Fixed-length identifier naming a drive
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey([u8; KEY_LEN]);

/// Error returned when a string is not a raw content key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a {len}-character hex content key: {0}", len = KEY_LEN * 2)]
pub struct InvalidKey(pub String);

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Derive a stable key from a label.
    ///
    /// Used for drives published from local directories, which have no
    /// keypair of their own.
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// True when `host` is already a raw key and needs no name lookup
    pub fn is_raw(host: &str) -> bool {
        host.len() == KEY_LEN * 2 && host.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ContentKey {
    type Err = InvalidKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_raw(s) {
            return Err(InvalidKey(s.to_string()));
        }
        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidKey(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable
        write!(f, "ContentKey({}..)", &self.to_hex()[..8])
    }
}

impl Serialize for ContentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
