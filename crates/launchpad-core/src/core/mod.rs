// crates/launchpad-core/src/core/mod.rs
// ============================================================================
// Module: Launchpad Core Types
// Description: Data model shared by every Launchpad crate.
// Purpose: Group manifests, install records, digests, and log entries.
// Dependencies: serde, sha2, time
// ============================================================================

//! ## Overview
//! Core types are plain data with validating constructors. They carry no
//! behavior that touches the network or the install store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod hashing;
pub mod log;
pub mod manifest;
pub mod outcome;
pub mod staging;
pub mod state;
pub mod time;
pub mod version;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hashing::DigestError;
pub use hashing::IntegrityVerifier;
pub use hashing::Sha256Digest;
pub use log::LogEntry;
pub use log::Outcome;
pub use log::Phase;
pub use manifest::Manifest;
pub use outcome::BootstrapOutcome;
pub use outcome::BootstrapState;
pub use outcome::ErrorKind;
pub use outcome::FatalReport;
pub use outcome::LaunchTarget;
pub use outcome::PlannedAction;
pub use outcome::ReadySource;
pub use outcome::UpdateCheck;
pub use staging::StagingArtifact;
pub use state::InstalledRuntimeState;
pub use state::PreviousInstall;
pub use self::time::Timestamp;
pub use version::RuntimeVersion;
pub use version::VersionError;
