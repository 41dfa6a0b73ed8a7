// crates/launchpad-store/src/extract.rs
// ============================================================================
// Module: Payload Extraction
// Description: Safe tar.gz extraction into a staging directory.
// Purpose: Unpack verified payloads without escaping the destination.
// Dependencies: launchpad-core, tar, flate2
// ============================================================================

//! ## Overview
//! Regular files, directories, and relative symlinks are extracted. Absolute
//! paths, `..` components, hard links, and special entries are rejected as
//! [`StoreError::Extract`]. A symlink target may climb with leading `..`
//! components only as far as `dest`, and nothing is ever written through an
//! existing symlink. Global pax headers are skipped.
//! Cancellation is checked between entries and between copy chunks.
//! Security posture: archive contents are untrusted even after the digest
//! matched, since the digest only proves the publisher produced them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::GzDecoder;
use launchpad_core::CancelToken;
use launchpad_core::StoreError;
use tar::Archive;
use tar::EntryType;

use crate::pointer::disk_error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Copy buffer size for archive entries.
const COPY_CHUNK_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Extracts the tar.gz archive at `archive` into `dest`.
///
/// Returns the number of regular files written.
///
/// # Errors
///
/// Returns [`StoreError::Extract`] for corrupt or unsafe archives,
/// [`StoreError::Disk`] for write failures, and [`StoreError::Cancelled`]
/// when `cancel` fires.
pub fn extract_archive(
    archive: &Path,
    dest: &Path,
    cancel: &CancelToken,
) -> Result<u64, StoreError> {
    let file = File::open(archive).map_err(|err| disk_error("open payload", archive, &err))?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    let entries =
        archive.entries().map_err(|err| StoreError::Extract(format!("read archive: {err}")))?;
    let mut files = 0_u64;
    for entry in entries {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let mut entry = entry.map_err(|err| StoreError::Extract(format!("read entry: {err}")))?;
        let raw_path = entry
            .path()
            .map_err(|err| StoreError::Extract(format!("entry path: {err}")))?
            .into_owned();
        let relative = sanitize_entry_path(&raw_path)?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let entry_type = entry.header().entry_type();
        if entry_type == EntryType::XGlobalHeader {
            continue;
        }
        ensure_no_link_in_path(dest, &relative)?;
        let target = dest.join(&relative);
        match entry_type {
            EntryType::Directory => {
                fs::create_dir_all(&target)
                    .map_err(|err| disk_error("create directory", &target, &err))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|err| disk_error("create directory", parent, &err))?;
                }
                let mode = entry.header().mode().unwrap_or(0o644);
                copy_entry(&mut entry, &target, cancel)?;
                apply_mode(&target, mode)
                    .map_err(|err| disk_error("set permissions", &target, &err))?;
                files = files.saturating_add(1);
            }
            EntryType::Symlink => {
                let link = entry
                    .link_name()
                    .map_err(|err| StoreError::Extract(format!("link target: {err}")))?
                    .ok_or_else(|| {
                        let path = raw_path.display();
                        StoreError::Extract(format!("symlink without target: {path}"))
                    })?
                    .into_owned();
                check_link_target(&relative, &link)?;
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|err| disk_error("create directory", parent, &err))?;
                }
                create_symlink(&link, &target)
                    .map_err(|err| disk_error("create symlink", &target, &err))?;
            }
            other => {
                return Err(StoreError::Extract(format!(
                    "unsupported entry type '{}' at {}",
                    char::from(other.as_byte()),
                    raw_path.display()
                )));
            }
        }
    }
    Ok(files)
}

/// Normalizes an archive path, rejecting anything that could escape `dest`.
fn sanitize_entry_path(path: &Path) -> Result<PathBuf, StoreError> {
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(StoreError::Extract(format!(
                    "unsafe archive path: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(clean)
}

/// Rejects entries whose path crosses a symlink already extracted into `dest`.
fn ensure_no_link_in_path(dest: &Path, relative: &Path) -> Result<(), StoreError> {
    let mut current = dest.to_path_buf();
    for component in relative.components() {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(StoreError::Extract(format!(
                    "archive entry {} passes through a symlink",
                    relative.display()
                )));
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(disk_error("inspect path", &current, &err)),
        }
    }
    Ok(())
}

/// Accepts relative link targets whose leading `..` stay inside the archive root.
///
/// `..` after a normal component is refused so traversal never depends on
/// what an intermediate component resolves to.
fn check_link_target(relative: &Path, link: &Path) -> Result<(), StoreError> {
    let unsafe_link = || {
        StoreError::Extract(format!(
            "unsafe symlink {} -> {}",
            relative.display(),
            link.display()
        ))
    };
    let mut depth = relative.parent().map_or(0, |parent| parent.components().count());
    let mut descended = false;
    for component in link.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(_) => descended = true,
            Component::ParentDir if !descended && depth > 0 => depth -= 1,
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_link());
            }
        }
    }
    if link.as_os_str().is_empty() {
        return Err(unsafe_link());
    }
    Ok(())
}

/// Creates the symlink `target -> link`.
#[cfg(unix)]
fn create_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

/// Symlinks are not extracted on this platform.
#[cfg(not(unix))]
fn create_symlink(_link: &Path, target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("symlinks unsupported: {}", target.display()),
    ))
}

/// Copies one entry to `target`, separating archive errors from disk errors.
fn copy_entry<R: Read>(
    entry: &mut R,
    target: &Path,
    cancel: &CancelToken,
) -> Result<(), StoreError> {
    let mut out = File::create(target).map_err(|err| disk_error("create file", target, &err))?;
    let mut buffer = vec![0_u8; COPY_CHUNK_BYTES];
    loop {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        let read = match entry.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(StoreError::Extract(format!(
                    "read {}: {err}",
                    target.display()
                )));
            }
        };
        out.write_all(&buffer[.. read]).map_err(|err| disk_error("write file", target, &err))?;
    }
    out.flush().map_err(|err| disk_error("flush file", target, &err))
}

/// Applies owner-executable bits from the archive; everything else is 0644.
#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode((mode & 0o111) | 0o644))
}

/// Permissions are not applied on this platform.
#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
