// crates/launchpad-core/src/runtime/mod.rs
// ============================================================================
// Module: Launchpad Runtime
// Description: Bootstrap state machine, cancellation, and in-memory adapters.
// Purpose: Sequence manifest checks, downloads, verification, and installs.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules drive the bootstrap decision. The orchestrator is the only
//! place retry policy and fallback rules live; adapters stay single-shot.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cancel;
pub mod memory;
pub mod orchestrator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cancel::CancelToken;
pub use memory::InMemoryRuntimeStore;
pub use memory::MemoryUpdateLog;
pub use orchestrator::BootstrapOrchestrator;
pub use orchestrator::OrchestratorConfig;
pub use orchestrator::Reporting;
pub use orchestrator::RetryPolicy;
