// crates/launchpad-fetch/src/manifest.rs
// ============================================================================
// Module: Launchpad Manifest Parsing
// Description: Strict parsing and validation of manifest documents.
// Purpose: Turn untrusted manifest bytes into a validated core manifest.
// Dependencies: launchpad-core, serde, serde_json
// ============================================================================

//! ## Overview
//! A manifest is a JSON object with string fields `runtime_version`,
//! `payload_url`, `payload_sha256`, and `published_at`. Unknown fields are
//! ignored. Every required field must be present, a non-empty string, and
//! well-formed; anything else is a parse error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use launchpad_core::FetchError;
use launchpad_core::Manifest;
use launchpad_core::RuntimeVersion;
use launchpad_core::Sha256Digest;
use launchpad_core::Timestamp;
use serde::Deserialize;

use crate::policy::TransportPolicy;

// ============================================================================
// SECTION: Wire Shape
// ============================================================================

/// Manifest document as received.
#[derive(Debug, Deserialize)]
struct RawManifest {
    /// Published runtime version.
    runtime_version: Option<String>,
    /// Payload download location.
    payload_url: Option<String>,
    /// Payload digest.
    payload_sha256: Option<String>,
    /// Publication timestamp.
    published_at: Option<String>,
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses and validates a manifest document.
///
/// # Errors
///
/// Returns [`FetchError::Parse`] when the document is not a JSON object, a
/// required field is missing, empty, or not a string, or a field value is
/// malformed (version label, digest, timestamp, or a payload URL the policy
/// does not permit).
pub fn parse_manifest(bytes: &[u8], policy: &TransportPolicy) -> Result<Manifest, FetchError> {
    let raw: RawManifest = serde_json::from_slice(bytes)
        .map_err(|err| FetchError::Parse(format!("manifest is not a valid document: {err}")))?;

    let runtime_version = required("runtime_version", raw.runtime_version)?;
    let runtime_version = RuntimeVersion::parse(&runtime_version)
        .map_err(|err| FetchError::Parse(format!("runtime_version: {err}")))?;

    let payload_url = required("payload_url", raw.payload_url)?;
    policy
        .classify(&payload_url)
        .map_err(|err| FetchError::Parse(format!("payload_url: {err}")))?;

    let payload_sha256 = required("payload_sha256", raw.payload_sha256)?;
    let payload_sha256 = Sha256Digest::parse(&payload_sha256)
        .map_err(|err| FetchError::Parse(format!("payload_sha256: {err}")))?;

    let published_at = required("published_at", raw.published_at)?;
    let published_at = Timestamp::parse_rfc3339(&published_at)
        .map_err(|err| FetchError::Parse(format!("published_at: {err}")))?;

    Ok(Manifest {
        runtime_version,
        payload_url: payload_url.trim().to_string(),
        payload_sha256,
        published_at,
    })
}

/// Requires a present, non-blank string field.
fn required(field: &str, value: Option<String>) -> Result<String, FetchError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(FetchError::Parse(format!("{field} must not be empty"))),
        None => Err(FetchError::Parse(format!("missing required field {field}"))),
    }
}
