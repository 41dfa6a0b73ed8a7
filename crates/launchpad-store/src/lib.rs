// crates/launchpad-store/src/lib.rs
// ============================================================================
// Module: Launchpad Store Library
// Description: Filesystem adapters for the Launchpad bootstrap core.
// Purpose: Persist installs, serialize instances, and record outcomes on disk.
// Dependencies: launchpad-core, tar, flate2, fs2, serde_json, tempfile
// ============================================================================

//! ## Overview
//! This crate implements the storage-side interfaces of `launchpad-core`
//! against a user-scoped directory tree described by [`StoreLayout`]:
//! versioned install arenas with an atomically replaced pointer record, an
//! advisory instance lock, append-only update logs, and the last-decision
//! record consumed by diagnostics.
//!
//! Security posture: archive contents and on-disk records are untrusted.
//! Unsafe archive paths are rejected and unreadable records fail closed to
//! "not installed".

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod clock;
pub mod decision;
pub mod extract;
pub mod layout;
pub mod lock;
pub mod log;
pub mod pointer;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use decision::DecisionAction;
pub use decision::DecisionError;
pub use decision::DecisionRecord;
pub use decision::read_decision;
pub use decision::write_decision;
pub use extract::extract_archive;
pub use layout::StoreLayout;
pub use lock::FileInstanceLock;
pub use lock::InstanceGuard;
pub use log::CompositeLog;
pub use log::DiagnosticLog;
pub use log::FileUpdateLog;
pub use log::read_log;
pub use pointer::read_pointer;
pub use pointer::write_pointer;
pub use store::FsRuntimeStore;
pub use store::InstallMarker;
