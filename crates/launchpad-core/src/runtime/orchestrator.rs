// crates/launchpad-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Launchpad Bootstrap Orchestrator
// Description: State machine that turns one launch into one launch decision.
// Purpose: Sequence lock, manifest check, download, verify, and install.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! [`BootstrapOrchestrator`] runs the bootstrap state machine:
//!
//! `Start -> CheckManifest -> {UpToDate, UpdateAvailable, ManifestUnavailable}
//! -> Downloading -> Verifying -> Installing -> Ready`, with the error branches
//! `Blocked` (integrity failure) and `Fatal` (nothing launchable).
//!
//! Invariants:
//! - Every transition appends exactly one [`LogEntry`] and forwards it to the
//!   progress sink. The first append failure in a run is forwarded as
//!   [`ProgressEvent::LogUnavailable`]; later ones are dropped.
//! - Any failure while a valid install exists degrades to that install.
//! - The final outcome is emitted exactly once per run.
//! - Retries apply to network errors only; adapters never retry on their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::core::BootstrapOutcome;
use crate::core::BootstrapState;
use crate::core::ErrorKind;
use crate::core::FatalReport;
use crate::core::InstalledRuntimeState;
use crate::core::IntegrityVerifier;
use crate::core::LaunchTarget;
use crate::core::LogEntry;
use crate::core::Manifest;
use crate::core::Outcome;
use crate::core::Phase;
use crate::core::PlannedAction;
use crate::core::ReadySource;
use crate::core::RuntimeVersion;
use crate::core::StagingArtifact;
use crate::core::UpdateCheck;
use crate::interfaces::CleanupReport;
use crate::interfaces::Clock;
use crate::interfaces::DownloadRequest;
use crate::interfaces::FetchError;
use crate::interfaces::InstanceLock;
use crate::interfaces::LockError;
use crate::interfaces::ManifestSource;
use crate::interfaces::PayloadSource;
use crate::interfaces::ProgressEvent;
use crate::interfaces::ProgressSink;
use crate::interfaces::RuntimeStore;
use crate::interfaces::UpdateLog;
use crate::runtime::CancelToken;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default manifest request timeout.
const DEFAULT_MANIFEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default payload download timeout.
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Default bounded wait for the instance lock.
const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Retry policy for transient network failures.
///
/// # Invariants
/// - `attempts` counts the first try; zero behaves like one.
/// - Backoff grows linearly: attempt `n` waits `backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub attempts: u32,
    /// Base delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a retry policy.
    #[must_use]
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts,
            backoff,
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Returns the delay after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    /// Returns the effective attempt count.
    const fn max_attempts(&self) -> u32 {
        if self.attempts == 0 { 1 } else { self.attempts }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Orchestrator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Manifest URL.
    pub manifest_url: String,
    /// Direct payload URL tried after the manifest's payload URL fails.
    pub fallback_payload_url: Option<String>,
    /// Per-request manifest timeout.
    pub manifest_timeout: Duration,
    /// Per-request payload download timeout.
    pub download_timeout: Duration,
    /// Bounded wait for the instance lock.
    pub lock_wait: Duration,
    /// Retry policy for manifest fetches.
    pub manifest_retry: RetryPolicy,
    /// Retry policy for each payload URL.
    pub download_retry: RetryPolicy,
}

impl OrchestratorConfig {
    /// Creates a configuration with default timeouts and retries.
    #[must_use]
    pub fn new(manifest_url: impl Into<String>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            fallback_payload_url: None,
            manifest_timeout: DEFAULT_MANIFEST_TIMEOUT,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            lock_wait: DEFAULT_LOCK_WAIT,
            manifest_retry: RetryPolicy::default(),
            download_retry: RetryPolicy::default(),
        }
    }
}

/// Sinks and clock shared by every transition record.
#[derive(Clone)]
pub struct Reporting {
    /// Structured update log.
    pub log: Arc<dyn UpdateLog>,
    /// UI progress channel.
    pub progress: Arc<dyn ProgressSink>,
    /// Wall-clock source.
    pub clock: Arc<dyn Clock>,
}

impl Reporting {
    /// Bundles the reporting sinks.
    #[must_use]
    pub fn new(
        log: Arc<dyn UpdateLog>,
        progress: Arc<dyn ProgressSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log,
            progress,
            clock,
        }
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Bootstrap state machine over pluggable adapters.
pub struct BootstrapOrchestrator<M, P, S, L> {
    /// Manifest client.
    manifests: M,
    /// Payload fetcher.
    payloads: P,
    /// Runtime store.
    store: S,
    /// Instance lock.
    lock: L,
    /// Log, progress, and clock.
    reporting: Reporting,
    /// Payload verifier.
    verifier: IntegrityVerifier,
    /// Orchestrator configuration.
    config: OrchestratorConfig,
    /// Set once an update log append has failed during the current run.
    log_failed: AtomicBool,
}

impl<M, P, S, L> BootstrapOrchestrator<M, P, S, L>
where
    M: ManifestSource,
    P: PayloadSource,
    S: RuntimeStore,
    L: InstanceLock,
{
    /// Creates a new orchestrator.
    #[must_use]
    pub fn new(
        manifests: M,
        payloads: P,
        store: S,
        lock: L,
        reporting: Reporting,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            manifests,
            payloads,
            store,
            lock,
            reporting,
            verifier: IntegrityVerifier::new(),
            config,
            log_failed: AtomicBool::new(false),
        }
    }

    /// Replaces the payload verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: IntegrityVerifier) -> Self {
        self.verifier = verifier;
        self
    }

    /// Returns the runtime store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the orchestrator configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Runs one bootstrap and emits its final outcome exactly once.
    pub fn run(&self, cancel: &CancelToken) -> BootstrapOutcome {
        self.log_failed.store(false, Ordering::Relaxed);
        let outcome = self.bootstrap(cancel);
        self.reporting.progress.emit(ProgressEvent::Finished(outcome.clone()));
        outcome
    }

    /// Reports what a run would do without locking, downloading, or mutating.
    pub fn check(&self, cancel: &CancelToken) -> UpdateCheck {
        let (installed, store_error) = match self.store.current() {
            Ok(state) => (state, None),
            Err(err) => (None, Some((err.kind(), err.to_string()))),
        };
        let installed_valid = installed.as_ref().is_some_and(|state| self.store.is_valid(state));
        let fetched = cancel
            .bound(self.config.manifest_timeout)
            .ok_or(FetchError::Cancelled)
            .and_then(|timeout| self.manifests.fetch(&self.config.manifest_url, timeout));
        match fetched {
            Ok(manifest) => {
                let action = match &installed {
                    Some(state) if state.version == manifest.runtime_version => {
                        if installed_valid {
                            PlannedAction::LaunchCurrent
                        } else {
                            PlannedAction::Repair {
                                version: state.version.clone(),
                            }
                        }
                    }
                    _ => PlannedAction::Update {
                        from: installed.as_ref().map(|state| state.version.clone()),
                        to: manifest.runtime_version.clone(),
                    },
                };
                UpdateCheck {
                    installed,
                    installed_valid,
                    manifest: Some(manifest),
                    error: store_error.as_ref().map(|(kind, _)| *kind),
                    error_detail: store_error.map(|(_, detail)| detail),
                    action,
                }
            }
            Err(err) => UpdateCheck {
                installed,
                installed_valid,
                manifest: None,
                error: Some(err.kind()),
                error_detail: Some(err.to_string()),
                action: if installed_valid {
                    PlannedAction::Offline
                } else {
                    PlannedAction::Unavailable
                },
            },
        }
    }

    /// Removes superseded installs after a launch without waiting for the lock.
    ///
    /// Returns `None` when another instance holds the lock.
    pub fn cleanup_superseded(&self, current_version: &RuntimeVersion) -> Option<CleanupReport> {
        let _guard = self.lock.acquire(Duration::ZERO).ok()?;
        let report = self.store.cleanup_previous(current_version);
        for path in &report.removed {
            self.append_log(
                Phase::Install,
                Outcome::Ok,
                BootstrapState::Ready,
                None,
                format!("removed superseded install {}", path.display()),
            );
        }
        for (path, reason) in &report.failed {
            self.append_log(
                Phase::Install,
                Outcome::Fail,
                BootstrapState::Ready,
                Some(ErrorKind::Disk),
                format!("could not remove superseded install {}: {reason}", path.display()),
            );
        }
        Some(report)
    }

    // ------------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------------

    /// Runs the state machine up to its final outcome.
    fn bootstrap(&self, cancel: &CancelToken) -> BootstrapOutcome {
        self.record(Phase::Check, Outcome::Ok, BootstrapState::Start, None, "bootstrap started");
        let _guard = match self.lock.acquire(self.config.lock_wait) {
            Ok(guard) => guard,
            Err(err) => return self.lock_unavailable(&err),
        };

        match self.store.recover() {
            Ok(report) if !report.removed.is_empty() => self.record(
                Phase::Check,
                Outcome::Ok,
                BootstrapState::Start,
                None,
                format!("removed {} leftovers of an interrupted run", report.removed.len()),
            ),
            Ok(_) => {}
            Err(err) => self.record(
                Phase::Check,
                Outcome::Fail,
                BootstrapState::Start,
                Some(err.kind()),
                format!("recovery of interrupted run failed: {err}"),
            ),
        }

        let installed = match self.store.current() {
            Ok(state) => state,
            Err(err) => {
                return self.fatal(err.kind(), format!("install record unreadable: {err}"), None);
            }
        };
        let fallback = installed.clone().filter(|state| self.store.is_valid(state));

        self.record(
            Phase::Check,
            Outcome::Ok,
            BootstrapState::CheckManifest,
            None,
            format!("fetching manifest from {}", self.config.manifest_url),
        );
        let manifest = match self.fetch_manifest(cancel) {
            Ok(manifest) => manifest,
            Err(err) => {
                let detail = format!("manifest unavailable: {err}");
                self.record(
                    Phase::Check,
                    Outcome::Fail,
                    BootstrapState::ManifestUnavailable,
                    Some(err.kind()),
                    detail.clone(),
                );
                return self.fallback_or_fatal(
                    fallback,
                    ReadySource::Offline,
                    err.kind(),
                    detail,
                    None,
                );
            }
        };

        let remote = manifest.runtime_version.clone();
        if let Some(state) = installed.as_ref().filter(|state| state.version == remote) {
            if fallback.is_some() {
                self.record(
                    Phase::Check,
                    Outcome::Ok,
                    BootstrapState::UpToDate,
                    None,
                    format!("runtime {remote} is up to date"),
                );
                return self.ready(state, ReadySource::Current, None, Some(remote), None);
            }
            self.record(
                Phase::Check,
                Outcome::Fail,
                BootstrapState::UpToDate,
                None,
                format!("installed runtime {remote} is not launchable; reinstalling"),
            );
        }

        self.record(
            Phase::Check,
            Outcome::Ok,
            BootstrapState::UpdateAvailable,
            None,
            match installed.as_ref() {
                Some(state) => format!("update available: {} -> {remote}", state.version),
                None => format!("update available: none -> {remote}"),
            },
        );
        self.update(&manifest, installed.as_ref(), fallback, cancel)
    }

    /// Downloads, verifies, and installs the manifest's payload.
    fn update(
        &self,
        manifest: &Manifest,
        installed: Option<&InstalledRuntimeState>,
        fallback: Option<InstalledRuntimeState>,
        cancel: &CancelToken,
    ) -> BootstrapOutcome {
        let remote = Some(manifest.runtime_version.clone());

        let artifact = match self.download(manifest, cancel) {
            Ok(artifact) => artifact,
            Err(err) => {
                let detail = format!("payload download failed: {err}");
                self.record(
                    Phase::Download,
                    Outcome::Fail,
                    BootstrapState::Downloading,
                    Some(err.kind()),
                    detail.clone(),
                );
                return self.fallback_or_fatal(
                    fallback,
                    ReadySource::Fallback,
                    err.kind(),
                    detail,
                    remote,
                );
            }
        };

        self.record(
            Phase::Verify,
            Outcome::Ok,
            BootstrapState::Verifying,
            None,
            format!("verifying {} payload bytes", artifact.bytes()),
        );
        let actual = match self.verifier.hash(artifact.path()) {
            Ok(digest) => digest,
            Err(err) => {
                self.discard(artifact);
                let detail = format!("staged payload unreadable: {err}");
                self.record(
                    Phase::Verify,
                    Outcome::Fail,
                    BootstrapState::Verifying,
                    Some(ErrorKind::Disk),
                    detail.clone(),
                );
                return self.fallback_or_fatal(
                    fallback,
                    ReadySource::Fallback,
                    ErrorKind::Disk,
                    detail,
                    remote,
                );
            }
        };
        if actual != manifest.payload_sha256 {
            self.discard(artifact);
            let detail = format!(
                "payload digest mismatch: expected {}, got {actual}; payload discarded",
                manifest.payload_sha256
            );
            self.record(
                Phase::Verify,
                Outcome::Fail,
                BootstrapState::Blocked,
                Some(ErrorKind::Integrity),
                detail.clone(),
            );
            return self.fallback_or_fatal(
                fallback,
                ReadySource::Fallback,
                ErrorKind::Integrity,
                detail,
                remote,
            );
        }

        self.record(
            Phase::Install,
            Outcome::Ok,
            BootstrapState::Installing,
            None,
            format!("installing runtime {}", manifest.runtime_version),
        );
        let installed_state = self.store.install(
            &manifest.runtime_version,
            &manifest.payload_sha256,
            artifact.path(),
            cancel,
        );
        self.discard(artifact);
        match installed_state {
            Ok(state) => {
                let superseded = installed.map(|previous| previous.version.clone());
                self.ready(&state, ReadySource::Updated, None, remote, superseded)
            }
            Err(err) => {
                let detail = format!("runtime install failed: {err}");
                self.record(
                    Phase::Install,
                    Outcome::Fail,
                    BootstrapState::Installing,
                    Some(err.kind()),
                    detail.clone(),
                );
                self.fallback_or_fatal(fallback, ReadySource::Fallback, err.kind(), detail, remote)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Network steps
    // ------------------------------------------------------------------------

    /// Fetches the manifest under the manifest retry policy.
    fn fetch_manifest(&self, cancel: &CancelToken) -> Result<Manifest, FetchError> {
        self.retrying(
            self.config.manifest_retry,
            cancel,
            Phase::Check,
            BootstrapState::CheckManifest,
            "manifest fetch",
            || {
                let timeout =
                    cancel.bound(self.config.manifest_timeout).ok_or(FetchError::Cancelled)?;
                self.manifests.fetch(&self.config.manifest_url, timeout)
            },
        )
    }

    /// Downloads the payload from the manifest URL, then the fallback URL.
    fn download(
        &self,
        manifest: &Manifest,
        cancel: &CancelToken,
    ) -> Result<StagingArtifact, FetchError> {
        let scratch_dir =
            self.store.scratch_dir().map_err(|err| FetchError::Disk(err.to_string()))?;
        let mut urls = vec![manifest.payload_url.as_str()];
        if let Some(fallback) = self.config.fallback_payload_url.as_deref()
            && fallback != manifest.payload_url
        {
            urls.push(fallback);
        }
        let progress = |downloaded: u64, total: Option<u64>| {
            self.reporting.progress.emit(ProgressEvent::Download {
                downloaded,
                total,
            });
        };

        let mut last_error = FetchError::Network("no payload url available".to_string());
        for (index, url) in urls.iter().copied().enumerate() {
            self.record(
                Phase::Download,
                Outcome::Ok,
                BootstrapState::Downloading,
                None,
                format!("downloading payload from {url}"),
            );
            let result = self.retrying(
                self.config.download_retry,
                cancel,
                Phase::Download,
                BootstrapState::Downloading,
                "payload download",
                || {
                    let timeout =
                        cancel.bound(self.config.download_timeout).ok_or(FetchError::Cancelled)?;
                    self.payloads.download(&DownloadRequest {
                        url,
                        scratch_dir: &scratch_dir,
                        timeout,
                        cancel,
                        progress: &progress,
                    })
                },
            );
            match result {
                Ok(artifact) => return Ok(artifact),
                Err(err @ (FetchError::Cancelled | FetchError::Disk(_))) => return Err(err),
                Err(err) => {
                    if index + 1 < urls.len() {
                        self.record(
                            Phase::Download,
                            Outcome::Retry,
                            BootstrapState::Downloading,
                            Some(err.kind()),
                            format!("payload source {url} failed: {err}; trying fallback source"),
                        );
                    }
                    last_error = err;
                }
            }
        }
        Err(last_error)
    }

    /// Runs `op` under `policy`, retrying network errors only.
    fn retrying<T>(
        &self,
        policy: RetryPolicy,
        cancel: &CancelToken,
        phase: Phase,
        state: BootstrapState,
        label: &str,
        mut op: impl FnMut() -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let attempts = policy.max_attempts();
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    self.record(
                        phase,
                        Outcome::Retry,
                        state,
                        Some(err.kind()),
                        format!("{label} attempt {attempt}/{attempts} failed: {err}"),
                    );
                    if !cancel.sleep(policy.delay(attempt)) {
                        return Err(FetchError::Cancelled);
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Terminal states
    // ------------------------------------------------------------------------

    /// Handles a lock that could not be acquired.
    fn lock_unavailable(&self, err: &LockError) -> BootstrapOutcome {
        let detail = format!("instance lock unavailable: {err}");
        self.record(
            Phase::Check,
            Outcome::Fail,
            BootstrapState::Start,
            Some(err.kind()),
            detail.clone(),
        );
        let current = match self.store.current() {
            Ok(Some(state)) if self.store.is_valid(&state) => Some(state),
            _ => None,
        };
        self.fallback_or_fatal(current, ReadySource::Deferred, err.kind(), detail, None)
    }

    /// Launches the fallback install when valid, otherwise fails.
    fn fallback_or_fatal(
        &self,
        fallback: Option<InstalledRuntimeState>,
        source: ReadySource,
        error: ErrorKind,
        detail: String,
        remote_version: Option<RuntimeVersion>,
    ) -> BootstrapOutcome {
        match fallback {
            Some(state) => self.ready(&state, source, Some(error), remote_version, None),
            None => self.fatal(error, detail, remote_version),
        }
    }

    /// Enters `Ready` with `state`.
    fn ready(
        &self,
        state: &InstalledRuntimeState,
        source: ReadySource,
        degraded: Option<ErrorKind>,
        remote_version: Option<RuntimeVersion>,
        superseded: Option<RuntimeVersion>,
    ) -> BootstrapOutcome {
        self.record(
            Phase::Launch,
            Outcome::Ok,
            BootstrapState::Ready,
            degraded,
            format!(
                "launching runtime {} from {} ({})",
                state.version,
                state.install_path.display(),
                source.as_str()
            ),
        );
        BootstrapOutcome::Ready(LaunchTarget {
            version: state.version.clone(),
            install_path: state.install_path.clone(),
            entry_point: self.store.entry_point(state),
            source,
            degraded,
            remote_version,
            superseded,
        })
    }

    /// Enters `Fatal`.
    fn fatal(
        &self,
        error: ErrorKind,
        detail: String,
        remote_version: Option<RuntimeVersion>,
    ) -> BootstrapOutcome {
        self.record(
            Phase::Launch,
            Outcome::Fail,
            BootstrapState::Fatal,
            Some(error),
            format!("no launchable runtime: {detail}"),
        );
        BootstrapOutcome::Fatal(FatalReport {
            error,
            detail,
            remote_version,
        })
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    /// Removes a staged payload, logging removal failures.
    fn discard(&self, artifact: StagingArtifact) {
        let path = artifact.path().to_path_buf();
        if let Err(err) = artifact.discard() {
            self.append_log(
                Phase::Install,
                Outcome::Fail,
                BootstrapState::Installing,
                Some(ErrorKind::Disk),
                format!("could not remove staged payload {}: {err}", path.display()),
            );
        }
    }

    /// Records a transition in the update log and the progress channel.
    fn record(
        &self,
        phase: Phase,
        outcome: Outcome,
        state: BootstrapState,
        error: Option<ErrorKind>,
        detail: impl Into<String>,
    ) {
        let entry = self.entry(phase, outcome, state, error, detail.into());
        self.write_log(&entry);
        self.reporting.progress.emit(ProgressEvent::Transition(entry));
    }

    /// Records an entry in the update log only.
    fn append_log(
        &self,
        phase: Phase,
        outcome: Outcome,
        state: BootstrapState,
        error: Option<ErrorKind>,
        detail: String,
    ) {
        let entry = self.entry(phase, outcome, state, error, detail);
        self.write_log(&entry);
    }

    /// Appends to the update log, forwarding the first failure of a run.
    fn write_log(&self, entry: &LogEntry) {
        if let Err(err) = self.reporting.log.append(entry)
            && !self.log_failed.swap(true, Ordering::Relaxed)
        {
            self.reporting.progress.emit(ProgressEvent::LogUnavailable(err));
        }
    }

    /// Builds a timestamped log entry.
    fn entry(
        &self,
        phase: Phase,
        outcome: Outcome,
        state: BootstrapState,
        error: Option<ErrorKind>,
        detail: String,
    ) -> LogEntry {
        LogEntry {
            timestamp: self.reporting.clock.now(),
            phase,
            outcome,
            state,
            error,
            detail,
        }
    }
}
