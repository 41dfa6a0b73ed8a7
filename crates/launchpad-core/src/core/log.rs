// crates/launchpad-core/src/core/log.rs
// ============================================================================
// Module: Launchpad Update Log Entries
// Description: Structured records appended once per bootstrap transition.
// Purpose: Give the UI and diagnostics a stable, tail-able event shape.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every transition of the bootstrap state machine produces one [`LogEntry`].
//! Entries are write-once; logs only ever append them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::outcome::BootstrapState;
use crate::core::outcome::ErrorKind;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Labels
// ============================================================================

/// Bootstrap phase a log entry belongs to.
///
/// # Invariants
/// - Variants are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Lock acquisition, state load, and manifest check.
    Check,
    /// Payload download.
    Download,
    /// Payload digest verification.
    Verify,
    /// Payload extraction and pointer update.
    Install,
    /// Final launch decision.
    Launch,
}

impl Phase {
    /// Returns a stable label for the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Download => "download",
            Self::Verify => "verify",
            Self::Install => "install",
            Self::Launch => "launch",
        }
    }
}

/// Result classification of a log entry.
///
/// # Invariants
/// - Variants are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Step succeeded.
    Ok,
    /// Step failed and is being retried.
    Retry,
    /// Step failed.
    Fail,
}

impl Outcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Retry => "retry",
            Self::Fail => "fail",
        }
    }
}

// ============================================================================
// SECTION: Log Entry
// ============================================================================

/// One structured update-log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Time the entry was recorded.
    pub timestamp: Timestamp,
    /// Phase the entry belongs to.
    pub phase: Phase,
    /// Result classification.
    pub outcome: Outcome,
    /// State machine state the entry was recorded in.
    pub state: BootstrapState,
    /// Error classification when the entry reports a failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Human-readable detail.
    pub detail: String,
}
