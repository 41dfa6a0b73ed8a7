// crates/launchpad-fetch/src/router.rs
// ============================================================================
// Module: Launchpad Fetch Router
// Description: Scheme-routed manifest and payload source.
// Purpose: Give the orchestrator one adapter for every permitted URL scheme.
// Dependencies: launchpad-core
// ============================================================================

//! ## Overview
//! [`FetchRouter`] classifies each URL against the transport policy and hands
//! it to the HTTP or file adapter. Schemes the policy does not permit are
//! rejected before any I/O.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use launchpad_core::DownloadRequest;
use launchpad_core::FetchError;
use launchpad_core::Manifest;
use launchpad_core::ManifestSource;
use launchpad_core::PayloadSource;
use launchpad_core::StagingArtifact;

use crate::file::FileSource;
use crate::http::HttpManifestClient;
use crate::http::HttpPayloadFetcher;
use crate::http::build_client;
use crate::http::build_payload_client;
use crate::policy::SourceScheme;
use crate::policy::TransportPolicy;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Manifest and payload source routing by URL scheme.
#[derive(Debug, Clone)]
pub struct FetchRouter {
    /// Transport policy.
    policy: TransportPolicy,
    /// HTTP manifest client.
    manifests: HttpManifestClient,
    /// HTTP payload fetcher.
    payloads: HttpPayloadFetcher,
    /// Local file source.
    files: FileSource,
}

impl FetchRouter {
    /// Builds a router with one manifest client and one payload client.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] when the HTTP client cannot be built.
    pub fn new(policy: TransportPolicy) -> Result<Self, FetchError> {
        Ok(Self {
            manifests: HttpManifestClient::with_client(build_client(&policy)?, policy.clone()),
            payloads: HttpPayloadFetcher::with_client(
                build_payload_client(&policy)?,
                policy.clone(),
            ),
            files: FileSource::new(policy.clone()),
            policy,
        })
    }

    /// Returns the transport policy.
    #[must_use]
    pub const fn policy(&self) -> &TransportPolicy {
        &self.policy
    }
}

impl ManifestSource for FetchRouter {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<Manifest, FetchError> {
        match self.policy.classify(url)?.1 {
            SourceScheme::Http => self.manifests.fetch(url, timeout),
            SourceScheme::File => self.files.fetch(url, timeout),
        }
    }
}

impl PayloadSource for FetchRouter {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<StagingArtifact, FetchError> {
        match self.policy.classify(request.url)?.1 {
            SourceScheme::Http => self.payloads.download(request),
            SourceScheme::File => self.files.download(request),
        }
    }
}
