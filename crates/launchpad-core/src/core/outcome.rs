// crates/launchpad-core/src/core/outcome.rs
// ============================================================================
// Module: Launchpad Bootstrap Outcomes
// Description: State machine states, error taxonomy, and launch decisions.
// Purpose: Describe what a bootstrap run decided and why.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A bootstrap run ends in exactly one [`BootstrapOutcome`]: either a
//! [`LaunchTarget`] naming a complete, verified runtime directory, or a
//! [`FatalReport`] when no runtime can be launched at all.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::core::manifest::Manifest;
use crate::core::state::InstalledRuntimeState;
use crate::core::version::RuntimeVersion;

// ============================================================================
// SECTION: States
// ============================================================================

/// Bootstrap state machine states.
///
/// # Invariants
/// - Variants are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapState {
    /// Run started; acquiring the instance lock.
    Start,
    /// Fetching the remote manifest.
    CheckManifest,
    /// Installed version equals the manifest version.
    UpToDate,
    /// Manifest names a different version (or the install needs repair).
    UpdateAvailable,
    /// Manifest could not be fetched or parsed.
    ManifestUnavailable,
    /// Payload download in progress.
    Downloading,
    /// Payload digest verification in progress.
    Verifying,
    /// Payload extraction and pointer update in progress.
    Installing,
    /// Integrity failure; the payload was discarded.
    Blocked,
    /// A runtime is ready to launch.
    Ready,
    /// No runtime can be launched.
    Fatal,
}

/// Error taxonomy shared by all components.
///
/// # Invariants
/// - Variants are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport failure or timeout.
    Network,
    /// Malformed or incomplete manifest.
    Parse,
    /// Payload digest mismatch.
    Integrity,
    /// Filesystem failure (space, permissions, I/O).
    Disk,
    /// Corrupt or unsafe archive contents.
    Extract,
    /// Caller deadline elapsed or the run was aborted.
    Cancelled,
    /// Another instance held the lock past the bounded wait.
    LockBusy,
}

impl ErrorKind {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Integrity => "integrity",
            Self::Disk => "disk",
            Self::Extract => "extract",
            Self::Cancelled => "cancelled",
            Self::LockBusy => "lock_busy",
        }
    }
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Why a runtime was chosen for launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadySource {
    /// The installed runtime already matches the manifest.
    Current,
    /// A new runtime was installed during this run.
    Updated,
    /// The manifest was unavailable; launching the installed runtime.
    Offline,
    /// An update failed; launching the installed runtime.
    Fallback,
    /// Another instance held the lock; launching the runtime it left behind.
    Deferred,
}

impl ReadySource {
    /// Returns a stable label for the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Updated => "updated",
            Self::Offline => "offline",
            Self::Fallback => "fallback",
            Self::Deferred => "deferred",
        }
    }
}

/// A complete, verified runtime ready for launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchTarget {
    /// Runtime version to launch.
    pub version: RuntimeVersion,
    /// Versioned install directory.
    pub install_path: PathBuf,
    /// Entry point inside the install directory.
    pub entry_point: PathBuf,
    /// Why this runtime was chosen.
    pub source: ReadySource,
    /// Error that forced a degraded launch, when any.
    pub degraded: Option<ErrorKind>,
    /// Version named by the manifest, when it was fetched.
    pub remote_version: Option<RuntimeVersion>,
    /// Version replaced by this run and eligible for cleanup.
    pub superseded: Option<RuntimeVersion>,
}

/// Blocking failure: no runtime can be launched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatalReport {
    /// Error that prevented obtaining a runtime.
    pub error: ErrorKind,
    /// Human-readable detail.
    pub detail: String,
    /// Version named by the manifest, when it was fetched.
    pub remote_version: Option<RuntimeVersion>,
}

/// Final result of one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// A runtime is ready to launch.
    Ready(LaunchTarget),
    /// No runtime can be launched; user remediation is required.
    Fatal(FatalReport),
}

impl BootstrapOutcome {
    /// Returns the launch target when the run reached `Ready`.
    #[must_use]
    pub const fn launch_target(&self) -> Option<&LaunchTarget> {
        match self {
            Self::Ready(target) => Some(target),
            Self::Fatal(_) => None,
        }
    }

    /// Returns true when the run reached `Ready`.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

// ============================================================================
// SECTION: Update Check
// ============================================================================

/// Action a bootstrap run would take, as reported by a dry-run check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    /// Installed runtime is current and valid.
    LaunchCurrent,
    /// A different version would be installed.
    Update {
        /// Installed version, when any.
        from: Option<RuntimeVersion>,
        /// Version named by the manifest.
        to: RuntimeVersion,
    },
    /// The installed version matches but its directory is invalid.
    Repair {
        /// Version that would be reinstalled.
        version: RuntimeVersion,
    },
    /// Manifest unavailable; the installed runtime would launch offline.
    Offline,
    /// Manifest unavailable and nothing valid is installed.
    Unavailable,
}

/// Dry-run report of the bootstrap decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheck {
    /// Installed state, when any.
    pub installed: Option<InstalledRuntimeState>,
    /// Whether the installed state is launchable.
    pub installed_valid: bool,
    /// Fetched manifest, when available.
    pub manifest: Option<Manifest>,
    /// Manifest failure classification, when the fetch failed.
    pub error: Option<ErrorKind>,
    /// Manifest failure detail, when the fetch failed.
    pub error_detail: Option<String>,
    /// Action a full run would take.
    pub action: PlannedAction,
}
