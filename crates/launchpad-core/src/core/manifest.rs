// crates/launchpad-core/src/core/manifest.rs
// ============================================================================
// Module: Launchpad Manifest
// Description: Remote version descriptor naming the latest runtime payload.
// Purpose: Carry the validated manifest fields through one launch decision.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Manifest`] is immutable once fetched. Parsing and field validation live
//! with the manifest client; this type only holds values that already passed
//! validation, so every consumer can trust its fields.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::Sha256Digest;
use crate::core::time::Timestamp;
use crate::core::version::RuntimeVersion;

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// Remote runtime descriptor.
///
/// # Invariants
/// - `payload_url` is a non-empty absolute URL accepted by the fetch policy.
/// - `payload_sha256` is the digest every installed payload must match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Version published by the manifest.
    pub runtime_version: RuntimeVersion,
    /// Download location of the payload archive.
    pub payload_url: String,
    /// Expected digest of the payload archive.
    pub payload_sha256: Sha256Digest,
    /// Publication time of the manifest.
    pub published_at: Timestamp,
}
