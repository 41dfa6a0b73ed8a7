// crates/launchpad-core/src/core/staging.rs
// ============================================================================
// Module: Launchpad Staging Artifacts
// Description: Downloaded payload files awaiting verification and install.
// Purpose: Guarantee staged payloads are discarded on every exit path.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`StagingArtifact`] owns a downloaded payload file in scratch storage.
//! Dropping it removes the file, so success, failure, and early returns all
//! discard the payload without explicit cleanup code.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

// ============================================================================
// SECTION: Staging Artifact
// ============================================================================

/// Downloaded payload file in scratch storage.
///
/// # Invariants
/// - The file is removed when the artifact is dropped or discarded.
/// - The artifact is never promoted to an install location; stores extract
///   from it instead.
#[derive(Debug)]
pub struct StagingArtifact {
    /// Payload path; `None` once discarded.
    path: Option<PathBuf>,
    /// Number of bytes written.
    bytes: u64,
}

impl StagingArtifact {
    /// Takes ownership of a completed payload file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, bytes: u64) -> Self {
        Self {
            path: Some(path.into()),
            bytes,
        }
    }

    /// Returns the payload path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Returns the number of payload bytes.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Removes the payload file now, reporting removal failures.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file exists but cannot be removed.
    pub fn discard(mut self) -> io::Result<()> {
        match self.path.take() {
            Some(path) => remove_if_present(&path),
            None => Ok(()),
        }
    }
}

impl Drop for StagingArtifact {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let _ = remove_if_present(&path);
        }
    }
}

/// Removes a file, treating "already gone" as success.
fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
