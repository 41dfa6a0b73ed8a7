// crates/launchpad-core/src/interfaces/mod.rs
// ============================================================================
// Module: Launchpad Interfaces
// Description: Backend-agnostic traits for network, storage, locking, and logs.
// Purpose: Define the seams the bootstrap orchestrator drives.
// Dependencies: crate::{core, runtime}, thiserror
// ============================================================================

//! ## Overview
//! These traits decouple the bootstrap state machine from concrete adapters.
//! Implementations must fail closed: any error leaves the install store in
//! its previous, consistent state. Retry policy belongs to the orchestrator,
//! never to implementations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::BootstrapOutcome;
use crate::core::ErrorKind;
use crate::core::InstalledRuntimeState;
use crate::core::LogEntry;
use crate::core::Manifest;
use crate::core::RuntimeVersion;
use crate::core::Sha256Digest;
use crate::core::StagingArtifact;
use crate::core::Timestamp;
use crate::runtime::CancelToken;

// ============================================================================
// SECTION: Fetch Errors
// ============================================================================

/// Errors raised by manifest clients and payload fetchers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Transport failure, non-success status, or timeout.
    #[error("network failure: {0}")]
    Network(String),
    /// Manifest content is malformed or incomplete.
    #[error("manifest parse failure: {0}")]
    Parse(String),
    /// Scratch storage could not be written.
    #[error("scratch storage failure: {0}")]
    Disk(String),
    /// Caller deadline elapsed or the request was aborted.
    #[error("request cancelled")]
    Cancelled,
    /// Response exceeded the configured size limit.
    #[error("response exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: u64,
        /// Observed byte count.
        actual_bytes: u64,
    },
    /// URL is malformed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// URL scheme is not served by this fetcher.
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),
}

impl FetchError {
    /// Classifies the error within the shared taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(_) => ErrorKind::Parse,
            Self::Disk(_) => ErrorKind::Disk,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Network(_)
            | Self::TooLarge {
                ..
            }
            | Self::InvalidUrl(_)
            | Self::UnsupportedScheme(_) => ErrorKind::Network,
        }
    }

    /// Returns true when a retry may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

// ============================================================================
// SECTION: Manifest Source
// ============================================================================

/// Retrieves and validates the remote manifest.
pub trait ManifestSource: Send + Sync {
    /// Fetches and parses the manifest at `url` within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] on transport failure or timeout and
    /// [`FetchError::Parse`] on malformed or incomplete content.
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Manifest, FetchError>;
}

// ============================================================================
// SECTION: Payload Source
// ============================================================================

/// Inputs for a single payload download.
pub struct DownloadRequest<'a> {
    /// Payload URL.
    pub url: &'a str,
    /// Scratch directory that receives the temporary payload file.
    pub scratch_dir: &'a Path,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Cancellation token checked between chunks.
    pub cancel: &'a CancelToken,
    /// Progress callback invoked with `(downloaded, total)` byte counts.
    pub progress: &'a dyn Fn(u64, Option<u64>),
}

/// Downloads payload archives into scratch storage.
pub trait PayloadSource: Send + Sync {
    /// Streams the payload into a temporary file inside the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport, disk, size, or cancellation
    /// failures. No partial file survives an error.
    fn download(&self, request: &DownloadRequest<'_>) -> Result<StagingArtifact, FetchError>;
}

// ============================================================================
// SECTION: Runtime Store
// ============================================================================

/// Errors raised by runtime stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("runtime store disk failure: {0}")]
    Disk(String),
    /// Payload archive is corrupt or unsafe.
    #[error("runtime payload extract failure: {0}")]
    Extract(String),
    /// Install was cancelled before the pointer update.
    #[error("runtime install cancelled")]
    Cancelled,
    /// No previous install is available.
    #[error("no previous install to roll back to")]
    NoPrevious,
}

impl StoreError {
    /// Classifies the error within the shared taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Disk(_) | Self::NoPrevious => ErrorKind::Disk,
            Self::Extract(_) => ErrorKind::Extract,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Summary of a best-effort cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Directories removed.
    pub removed: Vec<PathBuf>,
    /// Directories that could not be removed, with the failure detail.
    pub failed: Vec<(PathBuf, String)>,
}

/// Summary of interrupted-run recovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Leftover staging directories and partial downloads removed.
    pub removed: Vec<PathBuf>,
}

/// Persisted record of the active runtime plus install primitives.
pub trait RuntimeStore: Send + Sync {
    /// Loads the active install record fresh from storage.
    ///
    /// Missing or corrupt records report `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Disk`] when the record exists but cannot be read.
    fn current(&self) -> Result<Option<InstalledRuntimeState>, StoreError>;

    /// Returns true when the install referenced by `state` is launchable.
    fn is_valid(&self, state: &InstalledRuntimeState) -> bool;

    /// Returns the entry point path for an install.
    fn entry_point(&self, state: &InstalledRuntimeState) -> PathBuf;

    /// Returns the scratch directory for downloads, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Disk`] when the directory cannot be created.
    fn scratch_dir(&self) -> Result<PathBuf, StoreError>;

    /// Extracts a verified payload into a new versioned directory and then
    /// atomically repoints the active record at it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem, archive, or cancellation failures;
    /// the previous active record is untouched in every error case.
    fn install(
        &self,
        version: &RuntimeVersion,
        verified_digest: &Sha256Digest,
        payload: &Path,
        cancel: &CancelToken,
    ) -> Result<InstalledRuntimeState, StoreError>;

    /// Removes superseded install directories, keeping the active install and
    /// the recorded previous install. Failures are reported, never escalated.
    fn cleanup_previous(&self, current_version: &RuntimeVersion) -> CleanupReport;

    /// Removes leftovers of interrupted runs that no record references.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Disk`] when the store layout cannot be listed.
    fn recover(&self) -> Result<RecoveryReport, StoreError>;
}

// ============================================================================
// SECTION: Update Log
// ============================================================================

/// Errors raised when appending to an update log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// Log I/O failure.
    #[error("update log io failure: {0}")]
    Io(String),
    /// Log entry could not be encoded.
    #[error("update log encode failure: {0}")]
    Encode(String),
}

/// Append-only structured event log.
pub trait UpdateLog: Send + Sync {
    /// Appends one entry and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`LogError`] when the entry cannot be written.
    fn append(&self, entry: &LogEntry) -> Result<(), LogError>;
}

// ============================================================================
// SECTION: Progress
// ============================================================================

/// Event delivered to the UI progress channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A state machine transition (mirrors the update log).
    Transition(LogEntry),
    /// Download progress in bytes.
    Download {
        /// Bytes received so far.
        downloaded: u64,
        /// Total bytes, when the server reported a length.
        total: Option<u64>,
    },
    /// The update log rejected an entry; emitted at most once per run.
    LogUnavailable(LogError),
    /// Final outcome; emitted exactly once per run.
    Finished(BootstrapOutcome),
}

/// Receives progress events in FIFO order.
pub trait ProgressSink: Send + Sync {
    /// Delivers one event. Implementations must not block.
    fn emit(&self, event: ProgressEvent);
}

/// Progress sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

// ============================================================================
// SECTION: Locking
// ============================================================================

/// Errors raised when acquiring the instance lock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Another instance held the lock for the whole wait.
    #[error("another instance holds the lock")]
    Busy,
    /// Lock resource could not be opened.
    #[error("instance lock io failure: {0}")]
    Io(String),
}

impl LockError {
    /// Classifies the error within the shared taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Busy => ErrorKind::LockBusy,
            Self::Io(_) => ErrorKind::Disk,
        }
    }
}

/// Cross-process single-instance guard.
pub trait InstanceLock: Send + Sync {
    /// Guard holding the lock; dropping it releases the lock.
    type Guard;

    /// Acquires the lock, waiting at most `wait`.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Busy`] when the lock is still held after `wait`.
    fn acquire(&self, wait: Duration) -> Result<Self::Guard, LockError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Wall-clock source supplied by the host.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
