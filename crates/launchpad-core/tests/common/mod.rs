// crates/launchpad-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Scripted adapters and a harness for orchestrator tests.
// Purpose: Drive the bootstrap state machine deterministically.
// Dependencies: launchpad-core, tempfile
// ============================================================================

//! ## Overview
//! Fakes share their state through `Arc`, so a test keeps a clone to inspect
//! call counts after handing the original to the orchestrator.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use launchpad_core::BootstrapOrchestrator;
use launchpad_core::BootstrapState;
use launchpad_core::Clock;
use launchpad_core::DownloadRequest;
use launchpad_core::FetchError;
use launchpad_core::InMemoryRuntimeStore;
use launchpad_core::InstanceLock;
use launchpad_core::LockError;
use launchpad_core::LogError;
use launchpad_core::LogEntry;
use launchpad_core::Manifest;
use launchpad_core::ManifestSource;
use launchpad_core::MemoryUpdateLog;
use launchpad_core::OrchestratorConfig;
use launchpad_core::PayloadSource;
use launchpad_core::ProgressEvent;
use launchpad_core::ProgressSink;
use launchpad_core::Reporting;
use launchpad_core::RetryPolicy;
use launchpad_core::RuntimeVersion;
use launchpad_core::StagingArtifact;
use launchpad_core::Timestamp;
use launchpad_core::UpdateLog;
use launchpad_core::core::hashing::hash_bytes;
use tempfile::TempDir;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Manifest URL used by every harness.
pub const MANIFEST_URL: &str = "https://updates.test/manifest.json";

/// Payload URL named by sample manifests.
pub const PAYLOAD_URL: &str = "https://updates.test/runtime.tar.gz";

/// Direct payload URL configured as the fallback source.
pub const FALLBACK_URL: &str = "https://mirror.test/runtime.tar.gz";

// ============================================================================
// SECTION: Builders
// ============================================================================

/// Parses a version literal.
pub fn version(raw: &str) -> RuntimeVersion {
    RuntimeVersion::parse(raw).expect("valid version")
}

/// Builds a manifest whose digest matches `payload`.
pub fn manifest_for(raw_version: &str, payload: &[u8]) -> Manifest {
    Manifest {
        runtime_version: version(raw_version),
        payload_url: PAYLOAD_URL.to_string(),
        payload_sha256: hash_bytes(payload),
        published_at: Timestamp::parse_rfc3339("2026-03-01T12:00:00Z").expect("timestamp"),
    }
}

// ============================================================================
// SECTION: Manifest Source
// ============================================================================

/// Manifest source replaying scripted responses; the last one repeats.
#[derive(Clone)]
pub struct ScriptedManifests {
    /// Remaining responses.
    script: Arc<Mutex<VecDeque<Result<Manifest, FetchError>>>>,
    /// Number of fetch calls.
    calls: Arc<AtomicUsize>,
}

impl ScriptedManifests {
    /// Always answers with `response`.
    pub fn always(response: Result<Manifest, FetchError>) -> Self {
        Self::sequence(vec![response])
    }

    /// Answers with `responses` in order.
    pub fn sequence(responses: Vec<Result<Manifest, FetchError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(responses.into_iter().collect())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the number of fetch calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ManifestSource for ScriptedManifests {
    fn fetch(&self, _url: &str, _timeout: Duration) -> Result<Manifest, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().expect("script lock");
        if script.len() > 1 {
            return script.pop_front().expect("scripted response");
        }
        script.front().cloned().unwrap_or_else(|| Err(FetchError::Network("no script".into())))
    }
}

// ============================================================================
// SECTION: Payload Source
// ============================================================================

/// Payload source serving fixed bytes per URL.
#[derive(Clone, Default)]
pub struct ScriptedPayloads {
    /// Response per URL.
    responses: Arc<Mutex<BTreeMap<String, Result<Vec<u8>, FetchError>>>>,
    /// URLs requested, in order.
    requested: Arc<Mutex<Vec<String>>>,
    /// Sequence for unique file names.
    sequence: Arc<AtomicUsize>,
}

impl ScriptedPayloads {
    /// Serves `bytes` at `url`.
    pub fn serve(self, url: &str, bytes: &[u8]) -> Self {
        self.replace(url, bytes);
        self
    }

    /// Replaces the bytes served at `url` on every clone.
    pub fn replace(&self, url: &str, bytes: &[u8]) {
        self.responses.lock().expect("responses lock").insert(url.to_string(), Ok(bytes.to_vec()));
    }

    /// Fails requests for `url` with `error`.
    pub fn fail(self, url: &str, error: FetchError) -> Self {
        self.responses.lock().expect("responses lock").insert(url.to_string(), Err(error));
        self
    }

    /// Returns the URLs requested so far.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("requested lock").clone()
    }
}

impl PayloadSource for ScriptedPayloads {
    fn download(&self, request: &DownloadRequest<'_>) -> Result<StagingArtifact, FetchError> {
        self.requested.lock().expect("requested lock").push(request.url.to_string());
        if request.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let response = self
            .responses
            .lock()
            .expect("responses lock")
            .get(request.url)
            .cloned()
            .unwrap_or_else(|| Err(FetchError::Network(format!("404 for {}", request.url))));
        let bytes = response?;
        let id = self.sequence.fetch_add(1, Ordering::SeqCst);
        let path = request.scratch_dir.join(format!("payload-{id}.part"));
        fs::write(&path, &bytes).map_err(|err| FetchError::Disk(err.to_string()))?;
        let total = bytes.len() as u64;
        (request.progress)(total / 2, Some(total));
        (request.progress)(total, Some(total));
        Ok(StagingArtifact::new(path, total))
    }
}

// ============================================================================
// SECTION: Lock, Clock, Progress
// ============================================================================

/// In-process lock; a second acquire fails immediately while held.
#[derive(Clone, Default)]
pub struct FlagLock {
    /// Held flag.
    held: Arc<AtomicBool>,
}

/// Guard releasing a [`FlagLock`].
pub struct FlagGuard {
    /// Held flag.
    held: Arc<AtomicBool>,
}

impl Drop for FlagGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

impl FlagLock {
    /// Returns true while a guard is alive.
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl InstanceLock for FlagLock {
    type Guard = FlagGuard;

    fn acquire(&self, _wait: Duration) -> Result<Self::Guard, LockError> {
        if self.held.swap(true, Ordering::SeqCst) {
            return Err(LockError::Busy);
        }
        Ok(FlagGuard {
            held: Arc::clone(&self.held),
        })
    }
}

/// Clock pinned to the Unix epoch.
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::UNIX_EPOCH
    }
}

/// Progress sink that records every event.
#[derive(Default)]
pub struct RecordingProgress {
    /// Recorded events.
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Returns recorded events.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

/// Update log whose every append fails.
#[derive(Default)]
pub struct FailingLog {
    /// Append attempts so far.
    attempts: AtomicUsize,
}

impl FailingLog {
    /// Returns the number of append attempts.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl UpdateLog for FailingLog {
    fn append(&self, _entry: &LogEntry) -> Result<(), LogError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(LogError::Io("disk full".to_string()))
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Orchestrator under test.
pub type TestOrchestrator =
    BootstrapOrchestrator<ScriptedManifests, ScriptedPayloads, InMemoryRuntimeStore, FlagLock>;

/// Adapters wired around one orchestrator.
pub struct Harness {
    /// Scratch root.
    pub scratch: TempDir,
    /// Runtime store.
    pub store: InMemoryRuntimeStore,
    /// Manifest source.
    pub manifests: ScriptedManifests,
    /// Payload source.
    pub payloads: ScriptedPayloads,
    /// Instance lock.
    pub lock: FlagLock,
    /// Update log.
    pub log: MemoryUpdateLog,
    /// Progress events.
    pub progress: Arc<RecordingProgress>,
}

impl Harness {
    /// Creates a harness with an empty store.
    pub fn new(manifests: ScriptedManifests, payloads: ScriptedPayloads) -> Self {
        let scratch = TempDir::new().expect("scratch dir");
        let store = InMemoryRuntimeStore::new(scratch.path().join("scratch"));
        Self {
            scratch,
            store,
            manifests,
            payloads,
            lock: FlagLock::default(),
            log: MemoryUpdateLog::new(),
            progress: Arc::new(RecordingProgress::default()),
        }
    }

    /// Replaces the store, keeping the harness scratch directory.
    pub fn with_store(mut self, build: impl FnOnce(InMemoryRuntimeStore) -> InMemoryRuntimeStore) -> Self {
        self.store = build(self.store);
        self
    }

    /// Default configuration without retries or backoff.
    pub fn config() -> OrchestratorConfig {
        let mut config = OrchestratorConfig::new(MANIFEST_URL);
        config.manifest_retry = RetryPolicy::none();
        config.download_retry = RetryPolicy::none();
        config.lock_wait = Duration::ZERO;
        config
    }

    /// Builds an orchestrator with `config`.
    pub fn orchestrator_with(&self, config: OrchestratorConfig) -> TestOrchestrator {
        self.orchestrator_logging_to(Arc::new(self.log.clone()), config)
    }

    /// Builds an orchestrator that appends to `log` instead of the harness log.
    pub fn orchestrator_logging_to(
        &self,
        log: Arc<dyn UpdateLog>,
        config: OrchestratorConfig,
    ) -> TestOrchestrator {
        let reporting = Reporting::new(
            log,
            Arc::clone(&self.progress) as Arc<dyn ProgressSink>,
            Arc::new(FixedClock),
        );
        BootstrapOrchestrator::new(
            self.manifests.clone(),
            self.payloads.clone(),
            self.store.clone(),
            self.lock.clone(),
            reporting,
            config,
        )
    }

    /// Builds an orchestrator with the default configuration.
    pub fn orchestrator(&self) -> TestOrchestrator {
        self.orchestrator_with(Self::config())
    }

    /// Returns the logged states in order.
    pub fn states(&self) -> Vec<BootstrapState> {
        self.log.entries().iter().map(|entry| entry.state).collect()
    }

    /// Returns logged entries recorded in `state`.
    pub fn entries_in(&self, state: BootstrapState) -> Vec<LogEntry> {
        self.log.entries().into_iter().filter(|entry| entry.state == state).collect()
    }

    /// Returns files left in the scratch directory.
    pub fn scratch_files(&self) -> Vec<PathBuf> {
        let dir = self.scratch.path().join("scratch");
        match fs::read_dir(dir) {
            Ok(entries) => entries.filter_map(Result::ok).map(|entry| entry.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}
