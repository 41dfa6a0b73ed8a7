// crates/launchpad-cli/src/wiring.rs
// ============================================================================
// Module: Launcher Wiring
// Description: Production adapter assembly and maintenance operations.
// Purpose: Build the bootstrap orchestrator from a validated configuration.
// Dependencies: launchpad-config, launchpad-core, launchpad-fetch, launchpad-store
// ============================================================================

//! ## Overview
//! [`Launcher`] owns the validated configuration and the store layout. It
//! builds orchestrators over the filesystem store, the scheme-routing
//! fetcher, the advisory file lock, and the paired update/diagnostic logs.
//! Orchestrator work is blocking and must run off the async executor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::Child;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;

use launchpad_config::ConfigError;
use launchpad_config::LaunchpadConfig;
use launchpad_core::BootstrapOrchestrator;
use launchpad_core::BootstrapOutcome;
use launchpad_core::BootstrapState;
use launchpad_core::CancelToken;
use launchpad_core::CleanupReport;
use launchpad_core::Clock;
use launchpad_core::FetchError;
use launchpad_core::InstalledRuntimeState;
use launchpad_core::InstanceLock;
use launchpad_core::LaunchTarget;
use launchpad_core::LockError;
use launchpad_core::LogEntry;
use launchpad_core::LogError;
use launchpad_core::Outcome;
use launchpad_core::Phase;
use launchpad_core::ProgressSink;
use launchpad_core::Reporting;
use launchpad_core::RuntimeStore;
use launchpad_core::StoreError;
use launchpad_core::UpdateLog;
use launchpad_fetch::FetchRouter;
use launchpad_store::CompositeLog;
use launchpad_store::DecisionError;
use launchpad_store::DecisionRecord;
use launchpad_store::DiagnosticLog;
use launchpad_store::FileInstanceLock;
use launchpad_store::FileUpdateLog;
use launchpad_store::FsRuntimeStore;
use launchpad_store::StoreLayout;
use launchpad_store::SystemClock;
use launchpad_store::read_decision;
use launchpad_store::write_decision;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Orchestrator over the production adapters.
pub type LauncherOrchestrator =
    BootstrapOrchestrator<FetchRouter, FetchRouter, FsRuntimeStore, FileInstanceLock>;

/// Errors raised while wiring or running launcher commands.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// Configuration failed to load or validate.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Fetch adapters could not be built.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Runtime store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Instance lock could not be acquired.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// Update log could not be opened or written.
    #[error(transparent)]
    Log(#[from] LogError),
    /// Decision record could not be read or written.
    #[error(transparent)]
    Decision(#[from] DecisionError),
    /// Store layout or process I/O failure.
    #[error("io failure: {0}")]
    Io(String),
}

/// Snapshot of the install store for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Store root directory.
    pub store_root: PathBuf,
    /// Active install record, when any.
    pub installed: Option<InstalledRuntimeState>,
    /// Whether the active install is launchable.
    pub installed_valid: bool,
    /// Entry point of the active install, when any.
    pub entry_point: Option<PathBuf>,
    /// Most recent launch decision, when any.
    pub last_decision: Option<DecisionRecord>,
    /// Pid recorded by the current lock holder, when the lock is held.
    pub lock_holder: Option<u32>,
}

/// Result of one launcher bootstrap.
#[derive(Debug)]
pub struct BootstrapRun {
    /// Final orchestrator outcome.
    pub outcome: BootstrapOutcome,
    /// Post-launch cleanup, when it ran.
    pub cleanup: Option<CleanupSummary>,
    /// Failure persisting the decision record, when any.
    pub decision_error: Option<LauncherError>,
}

/// Printable summary of a cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupSummary {
    /// Directories removed.
    pub removed: Vec<PathBuf>,
    /// Directories left behind with the failure detail.
    pub failed: Vec<CleanupFailure>,
    /// True when the pass was skipped because another instance held the lock.
    pub skipped: bool,
}

/// One directory a cleanup pass could not remove.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupFailure {
    /// Directory path.
    pub path: PathBuf,
    /// Failure detail.
    pub reason: String,
}

impl From<CleanupReport> for CleanupSummary {
    fn from(report: CleanupReport) -> Self {
        Self {
            removed: report.removed,
            failed: report
                .failed
                .into_iter()
                .map(|(path, reason)| CleanupFailure {
                    path,
                    reason,
                })
                .collect(),
            skipped: false,
        }
    }
}

// ============================================================================
// SECTION: Launcher
// ============================================================================

/// Validated configuration bound to its store layout.
#[derive(Debug, Clone)]
pub struct Launcher {
    /// Validated configuration.
    config: LaunchpadConfig,
    /// Store layout under the configured root.
    layout: StoreLayout,
}

impl Launcher {
    /// Binds a validated configuration to its store root.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Config`] when the store root cannot be resolved.
    pub fn new(config: LaunchpadConfig) -> Result<Self, LauncherError> {
        let layout = StoreLayout::new(config.store_root()?);
        Ok(Self {
            config,
            layout,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &LaunchpadConfig {
        &self.config
    }

    /// Returns the store layout.
    #[must_use]
    pub const fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Returns the filesystem runtime store.
    #[must_use]
    pub fn store(&self) -> FsRuntimeStore {
        FsRuntimeStore::new(self.layout.clone(), self.config.runtime.entry_point.clone())
    }

    /// Returns the instance lock.
    #[must_use]
    pub fn lock(&self) -> FileInstanceLock {
        FileInstanceLock::new(self.layout.lock_path())
    }

    /// Opens the structured update log paired with the diagnostic log.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError`] when the logs directory or either file cannot be
    /// opened.
    pub fn update_log(&self) -> Result<CompositeLog, LauncherError> {
        self.layout.ensure().map_err(|err| LauncherError::Io(err.to_string()))?;
        let structured: Arc<dyn UpdateLog> =
            Arc::new(FileUpdateLog::open(self.layout.update_log_path())?);
        let diagnostic: Arc<dyn UpdateLog> =
            Arc::new(DiagnosticLog::open(self.layout.diagnostic_log_path())?);
        Ok(CompositeLog::new(vec![structured, diagnostic]))
    }

    /// Builds an orchestrator reporting progress to `progress`.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError`] when the store layout, logs, or fetch adapters
    /// cannot be prepared.
    pub fn orchestrator(
        &self,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<LauncherOrchestrator, LauncherError> {
        let log = self.update_log()?;
        let router = FetchRouter::new(self.config.transport_policy())?;
        let reporting = Reporting::new(Arc::new(log), progress, Arc::new(SystemClock));
        Ok(BootstrapOrchestrator::new(
            router.clone(),
            router,
            self.store(),
            self.lock(),
            reporting,
            self.config.orchestrator_config(),
        ))
    }

    /// Runs one bootstrap, records the decision, and prunes superseded
    /// installs when a runtime is ready.
    ///
    /// Decision-record failures do not change the outcome; they are returned
    /// alongside it.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError`] when the orchestrator cannot be built.
    pub fn bootstrap(
        &self,
        progress: Arc<dyn ProgressSink>,
        cancel: &CancelToken,
    ) -> Result<BootstrapRun, LauncherError> {
        let orchestrator = self.orchestrator(progress)?;
        let outcome = orchestrator.run(cancel);
        let decision_error = self.record_decision(&outcome).err();
        let cleanup = outcome
            .launch_target()
            .and_then(|target| orchestrator.cleanup_superseded(&target.version))
            .map(CleanupSummary::from);
        Ok(BootstrapRun {
            outcome,
            cleanup,
            decision_error,
        })
    }

    /// Persists the decision summary for a finished run.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Decision`] when the record cannot be written.
    pub fn record_decision(
        &self,
        outcome: &BootstrapOutcome,
    ) -> Result<DecisionRecord, LauncherError> {
        let record = DecisionRecord::from_outcome(outcome, SystemClock.now());
        write_decision(&self.layout.decision_path(), &record)?;
        Ok(record)
    }

    /// Reports the install store without taking the lock.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError`] when the pointer or decision record cannot be
    /// read.
    pub fn status(&self) -> Result<StatusReport, LauncherError> {
        let store = self.store();
        let installed = store.current()?;
        let installed_valid = installed.as_ref().is_some_and(|state| store.is_valid(state));
        let entry_point = installed.as_ref().map(|state| store.entry_point(state));
        Ok(StatusReport {
            store_root: self.layout.root().to_path_buf(),
            installed,
            installed_valid,
            entry_point,
            last_decision: read_decision(&self.layout.decision_path())?,
            lock_holder: self.lock().holder_pid(),
        })
    }

    /// Removes superseded installs under the instance lock.
    ///
    /// Skips the pass when another instance holds the lock past the
    /// configured wait.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError`] when the lock or pointer cannot be read.
    pub fn cleanup(&self) -> Result<CleanupSummary, LauncherError> {
        let _guard = match self.lock().acquire(self.config.orchestrator_config().lock_wait) {
            Ok(guard) => guard,
            Err(LockError::Busy) => {
                return Ok(CleanupSummary {
                    skipped: true,
                    ..CleanupSummary::default()
                });
            }
            Err(err) => return Err(err.into()),
        };
        let store = self.store();
        let summary = match store.current()? {
            Some(state) => CleanupSummary::from(store.cleanup_previous(&state.version)),
            None => CleanupSummary::default(),
        };
        let log = self.update_log()?;
        for path in &summary.removed {
            let detail = format!("removed superseded install {}", path.display());
            append_maintenance(&log, Outcome::Ok, detail)?;
        }
        for failure in &summary.failed {
            append_maintenance(
                &log,
                Outcome::Fail,
                format!("could not remove {}: {}", failure.path.display(), failure.reason),
            )?;
        }
        Ok(summary)
    }

    /// Repoints the active record at the previous install under the lock.
    ///
    /// # Errors
    ///
    /// Returns [`LauncherError::Lock`] when another instance holds the lock and
    /// [`LauncherError::Store`] when no valid previous install exists.
    pub fn rollback(&self) -> Result<InstalledRuntimeState, LauncherError> {
        let _guard = self.lock().acquire(self.config.orchestrator_config().lock_wait)?;
        let log = self.update_log()?;
        match self.store().rollback() {
            Ok(state) => {
                let detail = format!("rolled back to {}", state.version.as_str());
                append_maintenance(&log, Outcome::Ok, detail)?;
                Ok(state)
            }
            Err(err) => {
                append_maintenance(&log, Outcome::Fail, format!("rollback failed: {err}"))?;
                Err(err.into())
            }
        }
    }
}

/// Appends a maintenance entry to the update log.
fn append_maintenance(
    log: &CompositeLog,
    outcome: Outcome,
    detail: String,
) -> Result<(), LauncherError> {
    let entry = LogEntry {
        timestamp: SystemClock.now(),
        phase: Phase::Install,
        outcome,
        state: BootstrapState::Ready,
        error: None,
        detail,
    };
    log.append(&entry)?;
    Ok(())
}

// ============================================================================
// SECTION: Process Launch
// ============================================================================

/// Starts the runtime entry point inside its install directory.
///
/// The child is detached from the launcher's stdio; callers own the handle.
///
/// # Errors
///
/// Returns [`LauncherError::Io`] when the process cannot be started.
pub fn spawn_runtime(target: &LaunchTarget, args: &[String]) -> Result<Child, LauncherError> {
    Command::new(&target.entry_point)
        .args(args)
        .current_dir(&target.install_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| {
            LauncherError::Io(format!("failed to start {}: {err}", target.entry_point.display()))
        })
}
