// crates/launchpad-core/src/core/state.rs
// ============================================================================
// Module: Launchpad Installed Runtime State
// Description: Persisted record of the active runtime install.
// Purpose: Name the one active versioned directory and the previous good one.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! [`InstalledRuntimeState`] is the "current runtime pointer". Stores persist
//! it as a single record replaced atomically, so readers only ever observe a
//! complete value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::Sha256Digest;
use crate::core::time::Timestamp;
use crate::core::version::RuntimeVersion;

// ============================================================================
// SECTION: Installed State
// ============================================================================

/// The active runtime install.
///
/// # Invariants
/// - `install_path` is absolute and names a versioned directory that was
///   completely extracted before this record was written.
/// - `verified` is true only when the payload digest matched at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledRuntimeState {
    /// Installed runtime version.
    pub version: RuntimeVersion,
    /// Absolute path of the versioned install directory.
    pub install_path: PathBuf,
    /// Time the install completed.
    pub installed_at: Timestamp,
    /// Whether the payload digest matched the manifest at install time.
    pub verified: bool,
    /// Digest of the payload archive the install was extracted from.
    pub payload_sha256: Sha256Digest,
    /// Previously active install retained for rollback.
    #[serde(default)]
    pub previous: Option<PreviousInstall>,
}

/// Previous good install retained after an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviousInstall {
    /// Version of the previous install.
    pub version: RuntimeVersion,
    /// Absolute path of the previous install directory.
    pub install_path: PathBuf,
    /// Digest of the previous install's payload.
    pub payload_sha256: Sha256Digest,
    /// Time the previous install completed.
    pub installed_at: Timestamp,
}

impl InstalledRuntimeState {
    /// Returns this state as a [`PreviousInstall`] entry.
    #[must_use]
    pub fn as_previous(&self) -> PreviousInstall {
        PreviousInstall {
            version: self.version.clone(),
            install_path: self.install_path.clone(),
            payload_sha256: self.payload_sha256.clone(),
            installed_at: self.installed_at,
        }
    }
}
