// crates/launchpad-store/src/store.rs
// ============================================================================
// Module: Filesystem Runtime Store
// Description: Versioned install arenas with an atomic active pointer.
// Purpose: Install verified payloads without ever exposing a partial runtime.
// Dependencies: launchpad-core, serde, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Every install extracts into a fresh `.staging-*` directory, is checked for
//! the configured entry point, receives an install marker, and is renamed
//! into `versions/`. Only then is the pointer record rewritten. A crash at
//! any step leaves the previous pointer intact; leftovers are reclaimed by
//! [`RuntimeStore::recover`].
//!
//! Invariants:
//! - The pointer only references directories that passed every install step.
//! - Version directories are never modified after the rename.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use launchpad_core::CancelToken;
use launchpad_core::CleanupReport;
use launchpad_core::Clock;
use launchpad_core::InstalledRuntimeState;
use launchpad_core::RecoveryReport;
use launchpad_core::RuntimeStore;
use launchpad_core::RuntimeVersion;
use launchpad_core::Sha256Digest;
use launchpad_core::StoreError;
use launchpad_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use tempfile::Builder;

use crate::clock::SystemClock;
use crate::extract::extract_archive;
use crate::layout::PARTIAL_PREFIX;
use crate::layout::PARTIAL_SUFFIX;
use crate::layout::STAGING_PREFIX;
use crate::layout::StoreLayout;
use crate::pointer::disk_error;
use crate::pointer::read_pointer;
use crate::pointer::write_atomic;
use crate::pointer::write_pointer;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File name of the install marker written into each version directory.
pub const INSTALL_MARKER: &str = ".launchpad-install.json";

/// Largest install marker accepted on read.
const MAX_MARKER_BYTES: u64 = 16 * 1024;

/// Attempts at finding an unused version directory name.
const MAX_NAME_ATTEMPTS: u32 = 16;

// ============================================================================
// SECTION: Install Marker
// ============================================================================

/// Record proving a version directory completed installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMarker {
    /// Installed runtime version.
    pub version: RuntimeVersion,
    /// Digest of the payload the directory was extracted from.
    pub payload_sha256: Sha256Digest,
    /// Time extraction completed.
    pub installed_at: Timestamp,
}

impl InstallMarker {
    /// Reads the marker inside `install_dir`, if present and well-formed.
    #[must_use]
    pub fn read(install_dir: &Path) -> Option<Self> {
        let path = install_dir.join(INSTALL_MARKER);
        let metadata = fs::metadata(&path).ok()?;
        if !metadata.is_file() || metadata.len() > MAX_MARKER_BYTES {
            return None;
        }
        let bytes = fs::read(&path).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Filesystem-backed [`RuntimeStore`].
pub struct FsRuntimeStore {
    /// Persisted layout.
    layout: StoreLayout,
    /// Entry point path relative to an install directory.
    entry_point: PathBuf,
    /// Clock used for install timestamps.
    clock: Arc<dyn Clock>,
}

impl FsRuntimeStore {
    /// Creates a store over `layout` whose installs launch `entry_point`.
    #[must_use]
    pub fn new(layout: StoreLayout, entry_point: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            entry_point: entry_point.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for install timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the persisted layout.
    #[must_use]
    pub const fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Lists the version directories currently on disk.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Disk`] when the versions directory cannot be read.
    pub fn version_dirs(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut dirs = list_dir(&self.layout.versions_dir())?
            .into_iter()
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        dirs.sort();
        Ok(dirs)
    }

    /// Re-points the active record at the recorded previous install.
    ///
    /// The replaced install becomes the new previous install, so a second
    /// rollback restores the original state. Callers must hold the instance
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoPrevious`] when no valid previous install is
    /// recorded and [`StoreError::Disk`] when the pointer cannot be written.
    pub fn rollback(&self) -> Result<InstalledRuntimeState, StoreError> {
        let current = self.current()?.ok_or(StoreError::NoPrevious)?;
        let previous = current.previous.clone().ok_or(StoreError::NoPrevious)?;
        let restored = InstalledRuntimeState {
            version: previous.version,
            install_path: previous.install_path,
            installed_at: previous.installed_at,
            verified: true,
            payload_sha256: previous.payload_sha256,
            previous: self.is_valid(&current).then(|| current.as_previous()),
        };
        if !self.is_valid(&restored) {
            return Err(StoreError::NoPrevious);
        }
        write_pointer(&self.layout.pointer_path(), &restored)?;
        Ok(restored)
    }

    /// Reserves an unused directory name for a new install.
    fn fresh_version_dir(
        &self,
        version: &RuntimeVersion,
        installed_at: Timestamp,
    ) -> Result<PathBuf, StoreError> {
        let versions = self.layout.versions_dir();
        let base = format!("{version}-{}-{}", installed_at.unix_millis(), process::id());
        for attempt in 0 .. MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 { base.clone() } else { format!("{base}-{attempt}") };
            let candidate = versions.join(name);
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(StoreError::Disk(format!("no free install directory name for {base}")))
    }
}

impl RuntimeStore for FsRuntimeStore {
    fn current(&self) -> Result<Option<InstalledRuntimeState>, StoreError> {
        read_pointer(&self.layout.pointer_path())
    }

    fn is_valid(&self, state: &InstalledRuntimeState) -> bool {
        let path = &state.install_path;
        if !path.is_absolute() || path.parent() != Some(self.layout.versions_dir().as_path()) {
            return false;
        }
        if !self.entry_point(state).is_file() {
            return false;
        }
        InstallMarker::read(path).is_some_and(|marker| {
            marker.version == state.version && marker.payload_sha256 == state.payload_sha256
        })
    }

    fn entry_point(&self, state: &InstalledRuntimeState) -> PathBuf {
        state.install_path.join(&self.entry_point)
    }

    fn scratch_dir(&self) -> Result<PathBuf, StoreError> {
        let dir = self.layout.scratch_dir();
        fs::create_dir_all(&dir).map_err(|err| disk_error("create scratch", &dir, &err))?;
        Ok(dir)
    }

    fn install(
        &self,
        version: &RuntimeVersion,
        verified_digest: &Sha256Digest,
        payload: &Path,
        cancel: &CancelToken,
    ) -> Result<InstalledRuntimeState, StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let runtime_dir = self.layout.runtime_dir();
        let versions = self.layout.versions_dir();
        fs::create_dir_all(&versions)
            .map_err(|err| disk_error("create versions", &versions, &err))?;
        let staging = Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&runtime_dir)
            .map_err(|err| disk_error("create staging", &runtime_dir, &err))?;

        extract_archive(payload, staging.path(), cancel)?;
        let entry = staging.path().join(&self.entry_point);
        if !entry.is_file() {
            return Err(StoreError::Extract(format!(
                "payload is missing entry point {}",
                self.entry_point.display()
            )));
        }

        let installed_at = self.clock.now();
        let marker = InstallMarker {
            version: version.clone(),
            payload_sha256: verified_digest.clone(),
            installed_at,
        };
        let marker_bytes = serde_json::to_vec_pretty(&marker)
            .map_err(|err| StoreError::Disk(format!("encode install marker: {err}")))?;
        let marker_path = staging.path().join(INSTALL_MARKER);
        write_atomic(&marker_path, &marker_bytes)
            .map_err(|err| disk_error("write install marker", &marker_path, &err))?;

        let previous = self
            .current()?
            .filter(|state| self.is_valid(state))
            .map(|state| state.as_previous());
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let target = self.fresh_version_dir(version, installed_at)?;
        fs::rename(staging.path(), &target)
            .map_err(|err| disk_error("promote install", &target, &err))?;
        drop(staging);

        let state = InstalledRuntimeState {
            version: version.clone(),
            install_path: target,
            installed_at,
            verified: true,
            payload_sha256: verified_digest.clone(),
            previous,
        };
        if let Err(err) = write_pointer(&self.layout.pointer_path(), &state) {
            let _ = fs::remove_dir_all(&state.install_path);
            return Err(err);
        }
        Ok(state)
    }

    fn cleanup_previous(&self, current_version: &RuntimeVersion) -> CleanupReport {
        let mut report = CleanupReport::default();
        let current = match self.current() {
            Ok(Some(state)) => state,
            Ok(None) => return report,
            Err(err) => {
                report.failed.push((self.layout.pointer_path(), err.to_string()));
                return report;
            }
        };
        if &current.version != current_version {
            return report;
        }
        let mut keep = BTreeSet::new();
        keep.insert(current.install_path.clone());
        if let Some(previous) = &current.previous {
            keep.insert(previous.install_path.clone());
        }
        let dirs = match self.version_dirs() {
            Ok(dirs) => dirs,
            Err(err) => {
                report.failed.push((self.layout.versions_dir(), err.to_string()));
                return report;
            }
        };
        for dir in dirs.into_iter().filter(|dir| !keep.contains(dir)) {
            match fs::remove_dir_all(&dir) {
                Ok(()) => report.removed.push(dir),
                Err(err) => report.failed.push((dir, err.to_string())),
            }
        }
        report
    }

    fn recover(&self) -> Result<RecoveryReport, StoreError> {
        let mut report = RecoveryReport::default();
        for path in list_dir(&self.layout.runtime_dir())? {
            if has_prefix(&path, STAGING_PREFIX) && path.is_dir() {
                fs::remove_dir_all(&path)
                    .map_err(|err| disk_error("remove staging", &path, &err))?;
                report.removed.push(path);
            }
        }
        for path in list_dir(&self.layout.scratch_dir())? {
            let partial = has_prefix(&path, PARTIAL_PREFIX)
                && path.to_string_lossy().ends_with(PARTIAL_SUFFIX);
            if partial && path.is_file() {
                fs::remove_file(&path)
                    .map_err(|err| disk_error("remove partial download", &path, &err))?;
                report.removed.push(path);
            }
        }
        Ok(report)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Lists a directory, treating a missing directory as empty.
fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(disk_error("list", dir, &err)),
    };
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| disk_error("list", dir, &err))?;
        paths.push(entry.path());
    }
    Ok(paths)
}

/// Returns true when the file name of `path` starts with `prefix`.
fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name().is_some_and(|name| name.to_string_lossy().starts_with(prefix))
}
