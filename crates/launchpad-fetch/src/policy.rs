// crates/launchpad-fetch/src/policy.rs
// ============================================================================
// Module: Launchpad Transport Policy
// Description: Scheme, size, and timeout limits for outbound fetches.
// Purpose: Keep every fetch adapter under one fail-closed policy.
// Dependencies: launchpad-core, url
// ============================================================================

//! ## Overview
//! [`TransportPolicy`] decides which URL schemes are reachable and how large
//! manifests and payloads may be. Cleartext HTTP and local `file://` sources
//! are disabled unless a host enables them for test or staging endpoints.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use launchpad_core::FetchError;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default manifest body limit (64 KiB).
pub const DEFAULT_MAX_MANIFEST_BYTES: u64 = 64 * 1024;

/// Default payload size limit (4 GiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 4 * 1024 * 1024 * 1024;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// SECTION: Policy
// ============================================================================

/// URL scheme served by an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScheme {
    /// `https://` or permitted `http://`.
    Http,
    /// Permitted `file://`.
    File,
}

/// Outbound fetch policy.
///
/// # Invariants
/// - `allow_http = false` rejects cleartext `http://` URLs.
/// - `allow_file = false` rejects `file://` URLs.
/// - URLs with embedded credentials are always rejected.
/// - Size limits are hard upper bounds on bytes read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPolicy {
    /// Allow cleartext HTTP.
    pub allow_http: bool,
    /// Allow local `file://` sources.
    pub allow_file: bool,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum manifest body size in bytes.
    pub max_manifest_bytes: u64,
    /// Maximum payload size in bytes.
    pub max_payload_bytes: u64,
    /// User agent for outbound requests.
    pub user_agent: String,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            allow_http: false,
            allow_file: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            user_agent: format!("launchpad/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportPolicy {
    /// Parses `raw` and classifies it against the policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for malformed URLs or embedded
    /// credentials and [`FetchError::UnsupportedScheme`] for schemes the
    /// policy does not permit.
    pub fn classify(&self, raw: &str) -> Result<(Url, SourceScheme), FetchError> {
        let url = Url::parse(raw.trim())
            .map_err(|err| FetchError::InvalidUrl(format!("{raw}: {err}")))?;
        if !url.username().is_empty() || url.password().is_some() {
            return Err(FetchError::InvalidUrl("url credentials are not allowed".to_string()));
        }
        let scheme = match url.scheme() {
            "https" => SourceScheme::Http,
            "http" if self.allow_http => SourceScheme::Http,
            "file" if self.allow_file => SourceScheme::File,
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        };
        Ok((url, scheme))
    }
}
