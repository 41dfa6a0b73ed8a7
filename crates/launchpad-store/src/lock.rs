// crates/launchpad-store/src/lock.rs
// ============================================================================
// Module: Instance Lock
// Description: Cross-process single-instance guard over an advisory file lock.
// Purpose: Ensure at most one bootstrap run mutates the store at a time.
// Dependencies: launchpad-core, fs2
// ============================================================================

//! ## Overview
//! [`FileInstanceLock`] takes an exclusive advisory lock on `launchpad.lock`,
//! polling until a bounded wait elapses. The holder writes its pid into the
//! file as a liveness hint for diagnostics. The operating system drops the
//! lock when the holding process exits, so a crashed holder never blocks
//! later launches.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use fs2::FileExt;
use launchpad_core::InstanceLock;
use launchpad_core::LockError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default interval between lock attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// SECTION: Lock
// ============================================================================

/// Advisory file lock shared by every Launchpad process for one store root.
#[derive(Debug, Clone)]
pub struct FileInstanceLock {
    /// Lock file path.
    path: PathBuf,
    /// Interval between lock attempts.
    poll: Duration,
}

impl FileInstanceLock {
    /// Creates a lock over the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the polling interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll: Duration) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the pid of the live lock holder, if the lock is held.
    ///
    /// A pid left behind by a holder that exited is ignored: the lock is
    /// tested without waiting before the file is read.
    #[must_use]
    pub fn holder_pid(&self) -> Option<u32> {
        let file = File::open(&self.path).ok()?;
        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => None,
            Err(err) if is_contended(&err) => {
                fs::read_to_string(&self.path).ok()?.trim().parse().ok()
            }
            Err(_) => None,
        }
    }

    /// Opens the lock file without truncating a holder's pid.
    fn open(&self) -> Result<File, LockError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| LockError::Io(err.to_string()))?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|err| LockError::Io(format!("open {}: {err}", self.path.display())))
    }
}

impl InstanceLock for FileInstanceLock {
    type Guard = InstanceGuard;

    fn acquire(&self, wait: Duration) -> Result<InstanceGuard, LockError> {
        let file = self.open()?;
        let deadline = Instant::now() + wait;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(InstanceGuard::new(file, self.path.clone())),
                Err(err) if is_contended(&err) => {}
                Err(err) => {
                    return Err(LockError::Io(format!("lock {}: {err}", self.path.display())));
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Busy);
            }
            thread::sleep(self.poll.min(deadline - now));
        }
    }
}

/// Returns true when a lock attempt failed only because another holder exists.
fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

// ============================================================================
// SECTION: Guard
// ============================================================================

/// Held instance lock; released on drop.
#[derive(Debug)]
pub struct InstanceGuard {
    /// Locked file handle.
    file: File,
    /// Lock file path.
    path: PathBuf,
}

impl InstanceGuard {
    /// Wraps a locked file and records the holder pid.
    fn new(file: File, path: PathBuf) -> Self {
        if file.set_len(0).is_ok() {
            let _ = writeln!(&file, "{}", process::id());
            let _ = file.sync_data();
        }
        Self {
            file,
            path,
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        let _ = self.file.set_len(0);
        let _ = FileExt::unlock(&self.file);
    }
}
