//! Artifact key derivation
//!
//! An [`ArtifactKey`] is the first 64 bits of
//! `SHA-256("{source_type}:{normalized_url}")`, rendered as 16 lowercase hex
//! characters. It names both the raw payload and the manifest on disk.
//!
//! Collisions are not detected. Keys stand in for database-issued document
//! identifiers until those exist.

use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::types::SourceType;

/// Fixed-width artifact identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey([u8; 8]);

impl ArtifactKey {
    /// Derive the key for a source
    #[must_use]
    pub fn derive(source_type: SourceType, normalized_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source_type.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(normalized_id.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(bytes)
    }

    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Error parsing an [`ArtifactKey`] from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("artifact key must be 16 hex characters, got '{0}'")]
pub struct ParseKeyError(String);

impl FromStr for ArtifactKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 16 || !s.is_ascii() {
            return Err(ParseKeyError(s.to_string()));
        }
        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseKeyError(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

/// Hex SHA-256 checksum of a payload
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
