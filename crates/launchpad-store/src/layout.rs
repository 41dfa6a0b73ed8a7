// crates/launchpad-store/src/layout.rs
// ============================================================================
// Module: Store Layout
// Description: Persisted directory layout under the user-scoped root.
// Purpose: Keep every on-disk path derived from a single root.
// Dependencies: std
// ============================================================================

//! ## Overview
//! ```text
//! <root>/
//!   runtime/versions/<version>-<millis>-<pid>/
//!   runtime/.staging-*/
//!   runtime/current.json
//!   scratch/
//!   logs/updates.jsonl
//!   logs/bootstrap.log
//!   launchpad.lock
//!   last_decision.json
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name prefix of in-progress extraction directories.
pub const STAGING_PREFIX: &str = ".staging-";

/// Name prefix of in-progress payload downloads in scratch storage.
pub const PARTIAL_PREFIX: &str = ".payload-";

/// Name suffix of in-progress payload downloads in scratch storage.
pub const PARTIAL_SUFFIX: &str = ".part";

// ============================================================================
// SECTION: Layout
// ============================================================================

/// Paths of the persisted Launchpad layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Store root directory.
    root: PathBuf,
}

impl StoreLayout {
    /// Creates a layout rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    /// Returns the store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the runtime directory holding installs and the pointer.
    #[must_use]
    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join("runtime")
    }

    /// Returns the directory holding versioned installs.
    #[must_use]
    pub fn versions_dir(&self) -> PathBuf {
        self.runtime_dir().join("versions")
    }

    /// Returns the active install pointer record path.
    #[must_use]
    pub fn pointer_path(&self) -> PathBuf {
        self.runtime_dir().join("current.json")
    }

    /// Returns the scratch directory for payload downloads.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("scratch")
    }

    /// Returns the log directory.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Returns the structured update log path.
    #[must_use]
    pub fn update_log_path(&self) -> PathBuf {
        self.logs_dir().join("updates.jsonl")
    }

    /// Returns the plain-text diagnostic log path.
    #[must_use]
    pub fn diagnostic_log_path(&self) -> PathBuf {
        self.logs_dir().join("bootstrap.log")
    }

    /// Returns the instance lock file path.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join("launchpad.lock")
    }

    /// Returns the last-decision record path.
    #[must_use]
    pub fn decision_path(&self) -> PathBuf {
        self.root.join("last_decision.json")
    }

    /// Creates the directories of the layout.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when a directory cannot be created.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(self.versions_dir())?;
        fs::create_dir_all(self.scratch_dir())?;
        fs::create_dir_all(self.logs_dir())
    }
}
