// crates/launchpad-store/src/decision.rs
// ============================================================================
// Module: Last Decision Record
// Description: Atomically rewritten summary of the latest launch decision.
// Purpose: Give diagnostics a single record of what the last run decided.
// Dependencies: launchpad-core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each launch replaces `last_decision.json` with a [`DecisionRecord`]
//! derived from its [`BootstrapOutcome`]. The record is informational only;
//! the orchestrator never reads it back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io;
use std::path::Path;

use launchpad_core::BootstrapOutcome;
use launchpad_core::ErrorKind;
use launchpad_core::ReadySource;
use launchpad_core::RuntimeVersion;
use launchpad_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::pointer::write_atomic;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when persisting or loading decision records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    /// Record I/O failure.
    #[error("decision record io failure: {0}")]
    Io(String),
    /// Record could not be encoded or decoded.
    #[error("decision record codec failure: {0}")]
    Codec(String),
}

// ============================================================================
// SECTION: Record
// ============================================================================

/// Launch decision classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// The installed runtime was current.
    LaunchCurrent,
    /// A new runtime was installed.
    Updated,
    /// The manifest was unavailable; the installed runtime launched.
    Offline,
    /// An update failed; the installed runtime launched.
    Fallback,
    /// Another instance held the lock; its runtime launched.
    Deferred,
    /// Nothing could be launched.
    Fatal,
}

/// Summary of one launch decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Time the decision was made.
    pub checked_at: Timestamp,
    /// Version launched, when any.
    pub installed_version: Option<RuntimeVersion>,
    /// Version named by the manifest, when it was fetched.
    pub remote_version: Option<RuntimeVersion>,
    /// Decision classification.
    pub action: DecisionAction,
    /// Error that degraded or blocked the run.
    pub error: Option<ErrorKind>,
}

impl DecisionRecord {
    /// Summarizes a bootstrap outcome.
    #[must_use]
    pub fn from_outcome(outcome: &BootstrapOutcome, checked_at: Timestamp) -> Self {
        match outcome {
            BootstrapOutcome::Ready(target) => Self {
                checked_at,
                installed_version: Some(target.version.clone()),
                remote_version: target.remote_version.clone(),
                action: match target.source {
                    ReadySource::Current => DecisionAction::LaunchCurrent,
                    ReadySource::Updated => DecisionAction::Updated,
                    ReadySource::Offline => DecisionAction::Offline,
                    ReadySource::Fallback => DecisionAction::Fallback,
                    ReadySource::Deferred => DecisionAction::Deferred,
                },
                error: target.degraded,
            },
            BootstrapOutcome::Fatal(report) => Self {
                checked_at,
                installed_version: None,
                remote_version: report.remote_version.clone(),
                action: DecisionAction::Fatal,
                error: Some(report.error),
            },
        }
    }
}

/// Atomically replaces the decision record at `path`.
///
/// # Errors
///
/// Returns [`DecisionError`] when the record cannot be encoded or written.
pub fn write_decision(path: &Path, record: &DecisionRecord) -> Result<(), DecisionError> {
    let bytes =
        serde_json::to_vec_pretty(record).map_err(|err| DecisionError::Codec(err.to_string()))?;
    write_atomic(path, &bytes).map_err(|err| DecisionError::Io(err.to_string()))
}

/// Reads the decision record at `path`; a missing record reads as `None`.
///
/// # Errors
///
/// Returns [`DecisionError`] when the record cannot be read or decoded.
pub fn read_decision(path: &Path) -> Result<Option<DecisionRecord>, DecisionError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(DecisionError::Io(err.to_string())),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|err| DecisionError::Codec(err.to_string()))
}
