// crates/launchpad-core/src/core/hashing.rs
// ============================================================================
// Module: Launchpad Integrity Verification
// Description: Streaming SHA-256 digests and payload verification.
// Purpose: Provide the digest type and the verifier gating every install.
// Dependencies: serde, sha2, thiserror
// ============================================================================

//! ## Overview
//! Payload archives are hashed by streaming file contents through SHA-256 in
//! fixed-size chunks, so multi-gigabyte runtimes never need to fit in memory.
//! Digests are carried as validated lowercase hex strings.
//!
//! Security posture: the digest comparison is the only gate between a
//! downloaded payload and the install store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs::File;
use std::io;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LENGTH: usize = 64;

/// Default read chunk size for streaming hashes.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing a hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestError {
    /// Digest has the wrong number of characters.
    #[error("sha256 digest must be {expected} hex characters (got {actual})")]
    Length {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// Digest contains a non-hex character.
    #[error("sha256 digest contains non-hex character {0:?}")]
    NonHex(char),
}

// ============================================================================
// SECTION: Digest
// ============================================================================

/// Lowercase hex-encoded SHA-256 digest.
///
/// # Invariants
/// - Exactly [`SHA256_HEX_LENGTH`] characters of `[0-9a-f]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parses a hex digest. Surrounding whitespace is trimmed and uppercase
    /// hex digits are normalized to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] when the input is not 64 hex characters.
    pub fn parse(raw: &str) -> Result<Self, DigestError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.len() != SHA256_HEX_LENGTH {
            return Err(DigestError::Length {
                expected: SHA256_HEX_LENGTH,
                actual: normalized.chars().count(),
            });
        }
        if let Some(bad) = normalized.chars().find(|ch| !ch.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(bad));
        }
        Ok(Self(normalized))
    }

    /// Builds a digest from raw SHA-256 output bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex_encode(bytes))
    }

    /// Returns the lowercase hex value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Sha256Digest> for String {
    fn from(value: Sha256Digest) -> Self {
        value.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hashes an in-memory byte slice.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> Sha256Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Sha256Digest::from_bytes(&hasher.finalize())
}

// ============================================================================
// SECTION: Integrity Verifier
// ============================================================================

/// Streaming payload verifier.
///
/// # Invariants
/// - Hashing never holds more than one chunk of the input in memory.
/// - Verification has no side effects on the inspected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityVerifier {
    /// Read chunk size in bytes.
    chunk_size: usize,
}

impl Default for IntegrityVerifier {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl IntegrityVerifier {
    /// Creates a verifier with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a verifier with a custom chunk size (minimum one byte).
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Computes the SHA-256 digest of a file.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be opened or read.
    pub fn hash(&self, path: &Path) -> io::Result<Sha256Digest> {
        let file = File::open(path)?;
        self.hash_reader(file)
    }

    /// Computes the SHA-256 digest of a reader until end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when reading fails.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<Sha256Digest> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0_u8; self.chunk_size];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            hasher.update(&buffer[.. read]);
        }
        Ok(Sha256Digest::from_bytes(&hasher.finalize()))
    }

    /// Returns true when the file's digest equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be hashed.
    pub fn verify(&self, path: &Path, expected: &Sha256Digest) -> io::Result<bool> {
        Ok(&self.hash(path)? == expected)
    }
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
