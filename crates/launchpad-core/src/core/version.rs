// crates/launchpad-core/src/core/version.rs
// ============================================================================
// Module: Launchpad Runtime Versions
// Description: Validated runtime version labels.
// Purpose: Keep version strings safe to embed in install directory names.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Runtime versions are opaque labels. Launchpad compares them by exact string
//! equality only; any difference means "update available". Because a version
//! becomes part of an install directory name, the accepted alphabet is narrow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a runtime version label in bytes.
pub const MAX_VERSION_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when validating a runtime version label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// Version label is empty after trimming.
    #[error("runtime version is empty")]
    Empty,
    /// Version label exceeds [`MAX_VERSION_LENGTH`].
    #[error("runtime version exceeds {max} bytes ({actual})")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length.
        actual: usize,
    },
    /// Version label contains a character outside the accepted alphabet.
    #[error("runtime version contains invalid character {0:?}")]
    InvalidChar(char),
    /// Version label is a path traversal token.
    #[error("runtime version may not be a relative path component")]
    Reserved,
}

// ============================================================================
// SECTION: Runtime Version
// ============================================================================

/// Validated runtime version label.
///
/// # Invariants
/// - Non-empty, at most [`MAX_VERSION_LENGTH`] bytes.
/// - Only ASCII alphanumerics and `.`, `-`, `_`, `+`.
/// - Never `.` or `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RuntimeVersion(String);

impl RuntimeVersion {
    /// Parses and validates a version label. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] when the label is empty, too long, or contains
    /// characters outside the accepted alphabet.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }
        if trimmed.len() > MAX_VERSION_LENGTH {
            return Err(VersionError::TooLong {
                max: MAX_VERSION_LENGTH,
                actual: trimmed.len(),
            });
        }
        if let Some(bad) = trimmed.chars().find(|ch| !is_version_char(*ch)) {
            return Err(VersionError::InvalidChar(bad));
        }
        if trimmed == "." || trimmed == ".." {
            return Err(VersionError::Reserved);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the version label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RuntimeVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RuntimeVersion> for String {
    fn from(value: RuntimeVersion) -> Self {
        value.0
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true for characters allowed in a version label.
const fn is_version_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_' | '+')
}
