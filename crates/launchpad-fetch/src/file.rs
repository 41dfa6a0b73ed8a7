// crates/launchpad-fetch/src/file.rs
// ============================================================================
// Module: Launchpad File Sources
// Description: Manifest and payload sources backed by local `file://` URLs.
// Purpose: Serve staging mirrors and offline media through the fetch seams.
// Dependencies: launchpad-core, url
// ============================================================================

//! ## Overview
//! [`FileSource`] resolves `file://` URLs to local paths and applies the same
//! manifest parser, size limits, cancellation, and scratch streaming as the
//! HTTP adapters. A missing or unreadable source file is reported as a
//! network failure so it follows the offline-fallback rules.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use launchpad_core::DownloadRequest;
use launchpad_core::FetchError;
use launchpad_core::Manifest;
use launchpad_core::ManifestSource;
use launchpad_core::PayloadSource;
use launchpad_core::StagingArtifact;

use crate::manifest::parse_manifest;
use crate::policy::SourceScheme;
use crate::policy::TransportPolicy;
use crate::stream::stream_to_scratch;

// ============================================================================
// SECTION: File Source
// ============================================================================

/// Manifest and payload source for `file://` URLs.
#[derive(Debug, Clone)]
pub struct FileSource {
    /// Transport policy; `allow_file` must be set.
    policy: TransportPolicy,
}

impl FileSource {
    /// Creates a file source.
    #[must_use]
    pub const fn new(policy: TransportPolicy) -> Self {
        Self {
            policy,
        }
    }

    /// Resolves and opens a permitted `file://` URL.
    fn open(&self, raw: &str) -> Result<(PathBuf, File, u64), FetchError> {
        let path = match self.policy.classify(raw)? {
            (url, SourceScheme::File) => url
                .to_file_path()
                .map_err(|()| FetchError::InvalidUrl(format!("{raw}: not a local file path")))?,
            (url, SourceScheme::Http) => {
                return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
            }
        };
        let file = File::open(&path)
            .map_err(|err| FetchError::Network(format!("{} unavailable: {err}", path.display())))?;
        let len = file
            .metadata()
            .map_err(|err| FetchError::Network(format!("{} unavailable: {err}", path.display())))?
            .len();
        Ok((path, file, len))
    }
}

impl ManifestSource for FileSource {
    fn fetch(&self, url: &str, _timeout: Duration) -> Result<Manifest, FetchError> {
        let (path, file, len) = self.open(url)?;
        let max_bytes = self.policy.max_manifest_bytes;
        if len > max_bytes {
            return Err(FetchError::TooLarge {
                max_bytes,
                actual_bytes: len,
            });
        }
        let mut body = Vec::new();
        file.take(max_bytes.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|err| FetchError::Network(format!("{} unreadable: {err}", path.display())))?;
        parse_manifest(&body, &self.policy)
    }
}

impl PayloadSource for FileSource {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<StagingArtifact, FetchError> {
        if request.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let (_, file, len) = self.open(request.url)?;
        stream_to_scratch(file, request, Some(len), self.policy.max_payload_bytes)
    }
}
