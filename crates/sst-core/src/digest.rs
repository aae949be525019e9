//! # Content Digests
//!
//! Defines [`ContentDigest`] and [`DigestAlgorithm`]. Every seal in the stack
//! is a SHA-256 digest rendered as 64 lowercase hex characters.
//!
//! ## Two Entry Points
//!
//! - [`sha256_digest()`] accepts only [`CanonicalBytes`] and is used for
//!   structured values.
//! - [`sha256_content()`] hashes a finished artifact byte-for-byte. The
//!   sealed markdown of an evidence record is hashed this way, because the
//!   exported document must be reproducible from exactly those bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::ValidationError;

/// The hash algorithm used to produce a content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256.
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content digest with its algorithm tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest {
    /// The hash algorithm that produced this digest.
    pub algorithm: DigestAlgorithm,
    /// The raw 32-byte digest value.
    pub bytes: [u8; 32],
}

impl ContentDigest {
    /// Create a new content digest from raw bytes and algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: [u8; 32]) -> Self {
        Self { algorithm, bytes }
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a SHA-256 digest from its 64-character hex form.
    ///
    /// Upper-case input is accepted; surrounding whitespace is not.
    pub fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidDigest(hex.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| ValidationError::InvalidDigest(hex.to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| ValidationError::InvalidDigest(hex.to_string()))?;
        }
        Ok(Self::new(DigestAlgorithm::Sha256, bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Compute a SHA-256 content digest from canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    sha256_content(data.as_bytes())
}

/// Compute a SHA-256 digest over the exact bytes of a finished artifact.
pub fn sha256_content(content: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(content);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    ContentDigest::new(DigestAlgorithm::Sha256, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_empty_object_vector() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn known_abc_vector() {
        assert_eq!(
            sha256_content(b"abc").to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn display_carries_algorithm_prefix() {
        let s = sha256_content(b"x").to_string();
        assert!(s.starts_with("sha256:"));
        assert_eq!(s.len(), 7 + 64);
    }

    #[test]
    fn hex_round_trips() {
        let digest = sha256_content(b"laudo");
        let parsed = ContentDigest::from_hex(&digest.to_hex()).unwrap();
        assert_eq!(parsed, digest);
        let upper = ContentDigest::from_hex(&digest.to_hex().to_uppercase()).unwrap();
        assert_eq!(upper, digest);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(ContentDigest::from_hex("abc").is_err());
        assert!(ContentDigest::from_hex(&"g".repeat(64)).is_err());
        assert!(ContentDigest::from_hex(&format!(" {}", "a".repeat(63))).is_err());
    }

    proptest! {
        #[test]
        fn hashing_is_idempotent(content in ".*") {
            prop_assert_eq!(
                sha256_content(content.as_bytes()),
                sha256_content(content.as_bytes())
            );
        }

        #[test]
        fn single_character_change_changes_digest(content in "[a-z ]{1,200}", idx in any::<prop::sample::Index>()) {
            let mut bytes = content.clone().into_bytes();
            let i = idx.index(bytes.len());
            bytes[i] = if bytes[i] == b'#' { b'|' } else { b'#' };
            prop_assert_ne!(sha256_content(content.as_bytes()), sha256_content(&bytes));
        }
    }
}
