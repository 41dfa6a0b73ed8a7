// crates/launchpad-cli/tests/progress_channel.rs
// ============================================================================
// Module: Progress Channel Tests
// Description: Tests for the tokio progress sink and JSON-line rendering.
// ============================================================================

//! ## Overview
//! Events must arrive in emission order and render with a stable `event` tag.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use launchpad_cli::ChannelProgress;
use launchpad_cli::render_event;
use launchpad_core::BootstrapOutcome;
use launchpad_core::BootstrapState;
use launchpad_core::ErrorKind;
use launchpad_core::FatalReport;
use launchpad_core::LogEntry;
use launchpad_core::LogError;
use launchpad_core::Outcome;
use launchpad_core::Phase;
use launchpad_core::ProgressEvent;
use launchpad_core::ProgressSink;
use launchpad_core::Timestamp;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn render(event: &ProgressEvent) -> serde_json::Value {
    serde_json::from_str(&render_event(event).unwrap()).unwrap()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Verifies the channel preserves FIFO order.
#[test]
fn events_arrive_in_emission_order() {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let sink = ChannelProgress::new(sender);
    for downloaded in [0_u64, 512, 1024] {
        sink.emit(ProgressEvent::Download {
            downloaded,
            total: Some(1024),
        });
    }
    for expected in [0_u64, 512, 1024] {
        assert_eq!(
            receiver.try_recv().unwrap(),
            ProgressEvent::Download {
                downloaded: expected,
                total: Some(1024),
            }
        );
    }
    assert!(receiver.try_recv().is_err());
}

#[test]
fn emit_after_receiver_closed_is_dropped() {
    let (sender, receiver) = mpsc::unbounded_channel();
    let sink = ChannelProgress::new(sender);
    drop(receiver);
    sink.emit(ProgressEvent::Download {
        downloaded: 1,
        total: None,
    });
}

#[test]
fn download_renders_byte_counts() {
    let line = render(&ProgressEvent::Download {
        downloaded: 2048,
        total: None,
    });
    assert_eq!(line["event"], "download");
    assert_eq!(line["downloaded"], 2048);
    assert!(line["total"].is_null());
}

#[test]
fn transition_renders_log_entry_fields() {
    let line = render(&ProgressEvent::Transition(LogEntry {
        timestamp: Timestamp::UNIX_EPOCH,
        phase: Phase::Check,
        outcome: Outcome::Retry,
        state: BootstrapState::CheckManifest,
        error: Some(ErrorKind::Network),
        detail: "manifest fetch failed".to_string(),
    }));
    assert_eq!(line["event"], "transition");
    assert_eq!(line["phase"], "check");
    assert_eq!(line["outcome"], "retry");
    assert_eq!(line["state"], "check_manifest");
    assert_eq!(line["error"], "network");
}

/// Verifies update log failures render their description.
#[test]
fn log_failure_renders_detail() {
    let line = render(&ProgressEvent::LogUnavailable(LogError::Io("disk full".to_string())));
    assert_eq!(line["event"], "log_unavailable");
    assert_eq!(line["detail"], "update log io failure: disk full");
}

#[test]
fn finished_renders_outcome_status() {
    let line = render(&ProgressEvent::Finished(BootstrapOutcome::Fatal(FatalReport {
        error: ErrorKind::Integrity,
        detail: "digest mismatch".to_string(),
        remote_version: None,
    })));
    assert_eq!(line["event"], "finished");
    assert_eq!(line["status"], "fatal");
    assert_eq!(line["error"], "integrity");
    assert_eq!(line["detail"], "digest mismatch");
}
