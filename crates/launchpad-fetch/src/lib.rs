// crates/launchpad-fetch/src/lib.rs
// ============================================================================
// Module: Launchpad Fetch Library
// Description: Manifest client and payload fetcher over HTTP(S) and file URLs.
// Purpose: Provide the network adapters driven by the bootstrap orchestrator.
// Dependencies: launchpad-core, reqwest, serde_json, tempfile, url
// ============================================================================

//! ## Overview
//! Fetch adapters issue exactly one request per call; retry policy lives in
//! the orchestrator. Manifests are parsed and validated before they leave this
//! crate, and payloads stream into scratch storage under a temp-file guard so
//! no partial download survives an error.
//!
//! Security posture: manifest and payload bytes are untrusted until the
//! payload digest is verified by the core.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod file;
pub mod http;
pub mod manifest;
pub mod policy;
pub mod router;
mod stream;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use file::FileSource;
pub use http::HttpManifestClient;
pub use http::HttpPayloadFetcher;
pub use manifest::parse_manifest;
pub use policy::TransportPolicy;
pub use router::FetchRouter;
