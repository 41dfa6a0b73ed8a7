// crates/launchpad-cli/src/progress.rs
// ============================================================================
// Module: Progress Channel
// Description: Tokio channel progress sink and JSON-line rendering.
// Purpose: Stream orchestrator events to the foreground UI in FIFO order.
// Dependencies: launchpad-core, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! The orchestrator runs on a blocking worker and emits events through
//! [`ChannelProgress`]. The sender never blocks; events sent after the
//! receiver closed are dropped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use launchpad_core::BootstrapOutcome;
use launchpad_core::LogEntry;
use launchpad_core::ProgressEvent;
use launchpad_core::ProgressSink;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Progress sink forwarding events into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    /// Channel sender.
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    /// Wraps a channel sender.
    #[must_use]
    pub const fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender,
        }
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Wire form of one progress event.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressLine<'a> {
    /// State machine transition.
    Transition(&'a LogEntry),
    /// Download progress.
    Download {
        /// Bytes received so far.
        downloaded: u64,
        /// Total bytes, when known.
        total: Option<u64>,
    },
    /// Update log write failure.
    LogUnavailable {
        /// Failure description.
        detail: String,
    },
    /// Final outcome.
    Finished(&'a BootstrapOutcome),
}

impl<'a> From<&'a ProgressEvent> for ProgressLine<'a> {
    fn from(event: &'a ProgressEvent) -> Self {
        match event {
            ProgressEvent::Transition(entry) => Self::Transition(entry),
            ProgressEvent::Download {
                downloaded,
                total,
            } => Self::Download {
                downloaded: *downloaded,
                total: *total,
            },
            ProgressEvent::LogUnavailable(err) => Self::LogUnavailable {
                detail: err.to_string(),
            },
            ProgressEvent::Finished(outcome) => Self::Finished(outcome),
        }
    }
}

/// Renders an event as a single JSON line without the trailing newline.
///
/// # Errors
///
/// Returns [`serde_json::Error`] when the event cannot be encoded.
pub fn render_event(event: &ProgressEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&ProgressLine::from(event))
}
