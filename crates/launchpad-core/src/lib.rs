// crates/launchpad-core/src/lib.rs
// ============================================================================
// Module: Launchpad Core Library
// Description: Public API surface for the Launchpad bootstrap core.
// Purpose: Expose the data model, interfaces, and the bootstrap state machine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Launchpad core decides, on every start, whether to launch the installed
//! versioned runtime or to fetch, verify, and install a newer one first. It is
//! backend-agnostic: network, storage, locking, and logging are reached only
//! through the traits in [`interfaces`], so hosts wire in concrete adapters.
//!
//! Invariants:
//! - A payload is installed only after its recomputed digest matches the
//!   manifest that named it.
//! - Any failure while a valid install exists degrades to that install.
//! - Exactly one final outcome is emitted per run.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Clock;
pub use interfaces::CleanupReport;
pub use interfaces::DownloadRequest;
pub use interfaces::FetchError;
pub use interfaces::InstanceLock;
pub use interfaces::LockError;
pub use interfaces::LogError;
pub use interfaces::ManifestSource;
pub use interfaces::NoopProgress;
pub use interfaces::PayloadSource;
pub use interfaces::ProgressEvent;
pub use interfaces::ProgressSink;
pub use interfaces::RecoveryReport;
pub use interfaces::RuntimeStore;
pub use interfaces::StoreError;
pub use interfaces::UpdateLog;
pub use runtime::BootstrapOrchestrator;
pub use runtime::CancelToken;
pub use runtime::InMemoryRuntimeStore;
pub use runtime::MemoryUpdateLog;
pub use runtime::OrchestratorConfig;
pub use runtime::Reporting;
pub use runtime::RetryPolicy;
