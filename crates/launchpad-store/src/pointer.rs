// crates/launchpad-store/src/pointer.rs
// ============================================================================
// Module: Install Pointer Record
// Description: Atomic on-disk record of the active runtime install.
// Purpose: Ensure readers only ever observe a complete pointer record.
// Dependencies: launchpad-core, serde, serde_json, tempfile
// ============================================================================

//! ## Overview
//! The pointer record is rewritten with write-temp, sync, then rename, so a
//! crash leaves either the old record or the new one. Missing, oversized,
//! malformed, or unknown-format records read as "not installed".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

use launchpad_core::InstalledRuntimeState;
use launchpad_core::StoreError;
use serde::Deserialize;
use serde::Serialize;
use tempfile::Builder;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Current pointer record format.
pub const POINTER_FORMAT: u32 = 1;

/// Largest pointer record accepted on read.
pub const MAX_POINTER_BYTES: u64 = 64 * 1024;

// ============================================================================
// SECTION: Record
// ============================================================================

/// Versioned envelope persisted in `current.json`.
#[derive(Debug, Serialize, Deserialize)]
struct PointerRecord {
    /// Record format number.
    format: u32,
    /// Active install.
    state: InstalledRuntimeState,
}

/// Reads the active install record.
///
/// # Errors
///
/// Returns [`StoreError::Disk`] when the record exists but cannot be read.
pub fn read_pointer(path: &Path) -> Result<Option<InstalledRuntimeState>, StoreError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(disk_error("stat pointer record", path, &err)),
    };
    if !metadata.is_file() || metadata.len() > MAX_POINTER_BYTES {
        return Ok(None);
    }
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(disk_error("read pointer record", path, &err)),
    };
    let Ok(record) = serde_json::from_slice::<PointerRecord>(&bytes) else {
        return Ok(None);
    };
    if record.format != POINTER_FORMAT {
        return Ok(None);
    }
    Ok(Some(record.state))
}

/// Atomically replaces the active install record.
///
/// # Errors
///
/// Returns [`StoreError::Disk`] when the record cannot be written.
pub fn write_pointer(path: &Path, state: &InstalledRuntimeState) -> Result<(), StoreError> {
    let record = PointerRecord {
        format: POINTER_FORMAT,
        state: state.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&record)
        .map_err(|err| StoreError::Disk(format!("encode pointer record: {err}")))?;
    write_atomic(path, &bytes).map_err(|err| disk_error("write pointer record", path, &err))
}

// ============================================================================
// SECTION: Atomic Writes
// ============================================================================

/// Writes `bytes` to a sibling temp file, syncs it, and renames it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(parent)?;
    let mut temp = Builder::new().prefix(".record-").suffix(".tmp").tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
    Ok(())
}

/// Formats a filesystem failure as a store disk error.
pub(crate) fn disk_error(action: &str, path: &Path, err: &io::Error) -> StoreError {
    StoreError::Disk(format!("{action} {}: {err}", path.display()))
}
