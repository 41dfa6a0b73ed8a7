// crates/launchpad-cli/src/lib.rs
// ============================================================================
// Module: Launchpad CLI Library
// Description: Adapter wiring and progress rendering for the launchpad binary.
// Purpose: Keep command logic testable outside of the binary entry point.
// Dependencies: launchpad-config, launchpad-core, launchpad-fetch, launchpad-store
// ============================================================================

//! ## Overview
//! [`wiring`] assembles the production adapters from a validated
//! configuration; [`progress`] bridges orchestrator progress events onto a
//! tokio channel and renders them as JSON lines.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod progress;
pub mod wiring;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use progress::ChannelProgress;
pub use progress::ProgressLine;
pub use progress::render_event;
pub use wiring::BootstrapRun;
pub use wiring::CleanupFailure;
pub use wiring::CleanupSummary;
pub use wiring::Launcher;
pub use wiring::LauncherError;
pub use wiring::LauncherOrchestrator;
pub use wiring::StatusReport;
pub use wiring::spawn_runtime;
