// crates/launchpad-core/src/runtime/memory.rs
// ============================================================================
// Module: Launchpad In-Memory Adapters
// Description: In-memory runtime store and update log for tests and demos.
// Purpose: Exercise the orchestrator without touching a real install root.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`InMemoryRuntimeStore`] tracks install directories as records rather than
//! extracting archives. It still hashes the staged payload it is handed, so
//! tests can compare installed contents against the authorizing manifest.
//! It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::InstalledRuntimeState;
use crate::core::IntegrityVerifier;
use crate::core::LogEntry;
use crate::core::RuntimeVersion;
use crate::core::Sha256Digest;
use crate::core::Timestamp;
use crate::interfaces::CleanupReport;
use crate::interfaces::LogError;
use crate::interfaces::RecoveryReport;
use crate::interfaces::RuntimeStore;
use crate::interfaces::StoreError;
use crate::interfaces::UpdateLog;
use crate::runtime::CancelToken;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Virtual root for in-memory install directories.
const MEMORY_ROOT: &str = "/launchpad-memory/versions";

/// Entry point file name reported for in-memory installs.
const MEMORY_ENTRY_POINT: &str = "runtime-entry";

// ============================================================================
// SECTION: In-Memory Runtime Store
// ============================================================================

/// Mutable store contents.
#[derive(Debug, Default)]
struct MemoryInner {
    /// Active install record.
    current: Option<InstalledRuntimeState>,
    /// Install directories mapped to the digest of their extracted payload.
    dirs: BTreeMap<PathBuf, Sha256Digest>,
    /// Sequence used for unique directory names and install timestamps.
    sequence: u64,
    /// Failure injected into the next install call.
    fail_next_install: Option<StoreError>,
    /// Number of successful installs.
    installs: usize,
}

/// In-memory runtime store for tests and examples.
#[derive(Debug, Clone)]
pub struct InMemoryRuntimeStore {
    /// Scratch directory handed to payload sources.
    scratch_dir: PathBuf,
    /// Store contents protected by a mutex.
    inner: Arc<Mutex<MemoryInner>>,
}

impl InMemoryRuntimeStore {
    /// Creates an empty store using `scratch_dir` for downloads.
    #[must_use]
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            inner: Arc::new(Mutex::new(MemoryInner::default())),
        }
    }

    /// Seeds the store with a valid active install.
    #[must_use]
    pub fn with_installed(self, version: RuntimeVersion, digest: Sha256Digest) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            let install_path = next_install_path(&mut inner, &version);
            inner.dirs.insert(install_path.clone(), digest.clone());
            let installed_at = sequence_timestamp(inner.sequence);
            inner.current = Some(InstalledRuntimeState {
                version,
                install_path,
                installed_at,
                verified: true,
                payload_sha256: digest,
                previous: None,
            });
        }
        self
    }

    /// Removes an install directory, simulating external deletion.
    pub fn remove_install_dir(&self, path: &Path) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.dirs.remove(path);
        }
    }

    /// Makes the next install call fail with `error`.
    pub fn fail_next_install(&self, error: StoreError) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_next_install = Some(error);
        }
    }

    /// Returns the number of successful installs.
    #[must_use]
    pub fn install_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.installs).unwrap_or_default()
    }

    /// Returns every install directory the store still holds.
    #[must_use]
    pub fn install_dirs(&self) -> Vec<PathBuf> {
        self.inner.lock().map(|inner| inner.dirs.keys().cloned().collect()).unwrap_or_default()
    }

    /// Returns the digest of the payload extracted into `path`.
    #[must_use]
    pub fn installed_digest(&self, path: &Path) -> Option<Sha256Digest> {
        self.inner.lock().ok().and_then(|inner| inner.dirs.get(path).cloned())
    }

    /// Locks the store contents.
    fn lock(&self) -> Result<MutexGuard<'_, MemoryInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Disk("runtime store mutex poisoned".to_string()))
    }
}

impl RuntimeStore for InMemoryRuntimeStore {
    fn current(&self) -> Result<Option<InstalledRuntimeState>, StoreError> {
        Ok(self.lock()?.current.clone())
    }

    fn is_valid(&self, state: &InstalledRuntimeState) -> bool {
        self.lock().is_ok_and(|inner| {
            inner.dirs.get(&state.install_path) == Some(&state.payload_sha256)
        })
    }

    fn entry_point(&self, state: &InstalledRuntimeState) -> PathBuf {
        state.install_path.join(MEMORY_ENTRY_POINT)
    }

    fn scratch_dir(&self) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.scratch_dir)
            .map_err(|err| StoreError::Disk(format!("scratch dir unavailable: {err}")))?;
        Ok(self.scratch_dir.clone())
    }

    fn install(
        &self,
        version: &RuntimeVersion,
        verified_digest: &Sha256Digest,
        payload: &Path,
        cancel: &CancelToken,
    ) -> Result<InstalledRuntimeState, StoreError> {
        let mut inner = self.lock()?;
        if let Some(error) = inner.fail_next_install.take() {
            return Err(error);
        }
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let extracted = IntegrityVerifier::new()
            .hash(payload)
            .map_err(|err| StoreError::Disk(format!("staged payload unreadable: {err}")))?;
        let install_path = next_install_path(&mut inner, version);
        inner.dirs.insert(install_path.clone(), extracted);
        let previous = inner
            .current
            .as_ref()
            .filter(|state| inner.dirs.get(&state.install_path) == Some(&state.payload_sha256))
            .map(InstalledRuntimeState::as_previous);
        let state = InstalledRuntimeState {
            version: version.clone(),
            install_path,
            installed_at: sequence_timestamp(inner.sequence),
            verified: true,
            payload_sha256: verified_digest.clone(),
            previous,
        };
        inner.current = Some(state.clone());
        inner.installs += 1;
        Ok(state)
    }

    fn cleanup_previous(&self, current_version: &RuntimeVersion) -> CleanupReport {
        let mut report = CleanupReport::default();
        let Ok(mut inner) = self.lock() else {
            return report;
        };
        let mut keep = Vec::new();
        let current = inner.current.as_ref().filter(|state| &state.version == current_version);
        if let Some(current) = current {
            keep.push(current.install_path.clone());
            if let Some(previous) = &current.previous {
                keep.push(previous.install_path.clone());
            }
        } else {
            return report;
        }
        let stale: Vec<PathBuf> =
            inner.dirs.keys().filter(|path| !keep.contains(path)).cloned().collect();
        for path in stale {
            inner.dirs.remove(&path);
            report.removed.push(path);
        }
        report
    }

    fn recover(&self) -> Result<RecoveryReport, StoreError> {
        drop(self.lock()?);
        Ok(RecoveryReport::default())
    }
}

/// Allocates a unique install directory for `version`.
fn next_install_path(inner: &mut MemoryInner, version: &RuntimeVersion) -> PathBuf {
    inner.sequence += 1;
    PathBuf::from(MEMORY_ROOT).join(format!("{version}-{}", inner.sequence))
}

/// Deterministic install timestamp derived from the store sequence.
fn sequence_timestamp(sequence: u64) -> Timestamp {
    i64::try_from(sequence)
        .ok()
        .and_then(|seconds| Timestamp::from_unix_millis(seconds.saturating_mul(1_000)))
        .unwrap_or(Timestamp::UNIX_EPOCH)
}

// ============================================================================
// SECTION: In-Memory Update Log
// ============================================================================

/// Update log that keeps entries in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryUpdateLog {
    /// Appended entries in order.
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl MemoryUpdateLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every appended entry.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|entries| entries.clone()).unwrap_or_default()
    }
}

impl UpdateLog for MemoryUpdateLog {
    fn append(&self, entry: &LogEntry) -> Result<(), LogError> {
        self.entries
            .lock()
            .map_err(|_| LogError::Io("update log mutex poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}
