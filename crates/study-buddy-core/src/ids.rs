//! Core identifier types for study-buddy.
//!
//! This module provides strongly-typed identifiers for stream sessions and
//! a non-reversible fingerprint for client credentials.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one in-flight request/response cycle.
///
/// Every chat turn gets a fresh `StreamId`. Events produced by a stream are
/// tagged with it so that chunks arriving from a superseded stream can be
/// recognised and dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StreamId(uuid::Uuid);

impl StreamId {
    /// Create a new `StreamId` from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random `StreamId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl FromStr for StreamId {
    type Err = IdError;

    /// Parse a `StreamId` from a UUID string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamId({})", self.0)
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StreamId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<StreamId> for String {
    fn from(id: StreamId) -> Self {
        id.to_string()
    }
}

/// Number of digest bytes kept in a fingerprint.
const FINGERPRINT_LEN: usize = 8;

/// A short blake3 digest of a bearer credential.
///
/// Used to tell callers apart in logs without ever writing the credential
/// itself. Two fingerprints are equal iff they were derived from the same
/// credential (modulo truncation collisions).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientFingerprint([u8; FINGERPRINT_LEN]);

impl ClientFingerprint {
    /// Derive the fingerprint of a credential.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        let digest = blake3::hash(token.as_bytes());
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..FINGERPRINT_LEN]);
        Self(bytes)
    }

    /// Parse a fingerprint from its hex representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or has the wrong length.
    pub fn from_hex(s: &str) -> Result<Self, IdError> {
        let bytes = hex::decode(s).map_err(|_| IdError::InvalidHex)?;
        let arr: [u8; FINGERPRINT_LEN] = bytes.try_into().map_err(|_| IdError::InvalidLength {
            expected: FINGERPRINT_LEN,
            got: s.len() / 2,
        })?;
        Ok(Self(arr))
    }

    /// Return the hex-encoded string representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ClientFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClientFingerprint({})", self.to_hex())
    }
}

impl fmt::Display for ClientFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input string contains invalid hexadecimal characters.
    #[error("invalid hex encoding")]
    InvalidHex,

    /// The input has an incorrect length.
    #[error("invalid length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// The expected number of bytes.
        expected: usize,
        /// The actual number of bytes.
        got: usize,
    },

    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_roundtrip() {
        let id = StreamId::generate();
        let str_repr = id.to_string();
        let parsed = StreamId::from_str(&str_repr).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn stream_ids_are_unique() {
        assert_ne!(StreamId::generate(), StreamId::generate());
    }

    #[test]
    fn stream_id_rejects_garbage() {
        let result = StreamId::from_str("not-a-uuid");
        assert!(matches!(result, Err(IdError::InvalidUuid)));
    }

    #[test]
    fn stream_id_serde_json() {
        let id = StreamId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let parsed: StreamId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = ClientFingerprint::from_token("sb-publishable-key");
        let b = ClientFingerprint::from_token("sb-publishable-key");
        assert_eq!(a, b);
        assert_eq!(a.to_hex().len(), FINGERPRINT_LEN * 2);
        assert!(!a.to_string().contains("publishable"));
    }

    #[test]
    fn fingerprint_differs_per_token() {
        let a = ClientFingerprint::from_token("key-one");
        let b = ClientFingerprint::from_token("key-two");
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_hex_roundtrip() {
        let fp = ClientFingerprint::from_token("anything");
        let parsed = ClientFingerprint::from_hex(&fp.to_hex()).unwrap();
        assert_eq!(fp, parsed);
    }

    #[test]
    fn fingerprint_invalid_hex() {
        assert!(matches!(
            ClientFingerprint::from_hex("zz"),
            Err(IdError::InvalidHex)
        ));
        assert!(matches!(
            ClientFingerprint::from_hex("deadbeef"),
            Err(IdError::InvalidLength { .. })
        ));
    }
}
