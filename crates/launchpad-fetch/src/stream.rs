// crates/launchpad-fetch/src/stream.rs
// ============================================================================
// Module: Launchpad Payload Streaming
// Description: Chunked copy of a payload stream into scratch storage.
// Purpose: Share size limits, cancellation, and cleanup across fetch adapters.
// Dependencies: launchpad-core, tempfile
// ============================================================================

//! ## Overview
//! The payload is written into a [`tempfile::NamedTempFile`] inside the
//! scratch directory. The temp file deletes itself on every early return, so
//! only a completely received payload is handed back as a
//! [`StagingArtifact`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::io::Read;
use std::io::Write;

use launchpad_core::DownloadRequest;
use launchpad_core::FetchError;
use launchpad_core::StagingArtifact;
use tempfile::Builder;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Copy chunk size.
const CHUNK_SIZE: usize = 64 * 1024;

// ============================================================================
// SECTION: Streaming
// ============================================================================

/// Streams `reader` into a temp file inside the request's scratch directory.
///
/// # Errors
///
/// Returns [`FetchError::TooLarge`] when the stream exceeds `max_bytes`,
/// [`FetchError::Cancelled`] when the token fires between chunks,
/// [`FetchError::Network`] on read failures or truncation, and
/// [`FetchError::Disk`] when scratch storage cannot be written.
pub(crate) fn stream_to_scratch<R: Read>(
    mut reader: R,
    request: &DownloadRequest<'_>,
    total: Option<u64>,
    max_bytes: u64,
) -> Result<StagingArtifact, FetchError> {
    if let Some(total) = total
        && total > max_bytes
    {
        return Err(FetchError::TooLarge {
            max_bytes,
            actual_bytes: total,
        });
    }
    fs::create_dir_all(request.scratch_dir)
        .map_err(|err| FetchError::Disk(format!("scratch dir unavailable: {err}")))?;
    let mut file = Builder::new()
        .prefix(".payload-")
        .suffix(".part")
        .tempfile_in(request.scratch_dir)
        .map_err(|err| FetchError::Disk(format!("scratch file create failed: {err}")))?;

    let mut buffer = vec![0_u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    (request.progress)(0, total);
    loop {
        if request.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(FetchError::Network(format!("payload read failed: {err}"))),
        };
        downloaded = downloaded.saturating_add(u64::try_from(read).unwrap_or(u64::MAX));
        if downloaded > max_bytes {
            return Err(FetchError::TooLarge {
                max_bytes,
                actual_bytes: downloaded,
            });
        }
        file.write_all(&buffer[.. read])
            .map_err(|err| FetchError::Disk(format!("scratch write failed: {err}")))?;
        (request.progress)(downloaded, total);
    }
    if let Some(total) = total
        && downloaded < total
    {
        return Err(FetchError::Network(format!(
            "payload truncated: received {downloaded} of {total} bytes"
        )));
    }
    file.flush().map_err(|err| FetchError::Disk(format!("scratch flush failed: {err}")))?;
    file.as_file()
        .sync_all()
        .map_err(|err| FetchError::Disk(format!("scratch sync failed: {err}")))?;
    let path = file
        .into_temp_path()
        .keep()
        .map_err(|err| FetchError::Disk(format!("scratch file persist failed: {err}")))?;
    Ok(StagingArtifact::new(path, downloaded))
}
