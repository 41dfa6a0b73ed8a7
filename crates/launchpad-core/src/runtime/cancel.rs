// crates/launchpad-core/src/runtime/cancel.rs
// ============================================================================
// Module: Launchpad Cancellation
// Description: Shared cancellation flag with an optional deadline.
// Purpose: Let hosts abort long-running fetch and extract phases.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A [`CancelToken`] is cloned into every suspension point. It reports
//! cancelled once [`CancelToken::cancel`] is called on any clone or once its
//! deadline passes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use std::time::Instant;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sleep slice used by [`CancelToken::sleep`].
const SLEEP_SLICE: Duration = Duration::from_millis(25);

// ============================================================================
// SECTION: Cancel Token
// ============================================================================

/// Cooperative cancellation handle.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    /// Explicit cancellation flag shared across clones.
    flag: Arc<AtomicBool>,
    /// Optional absolute deadline.
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Creates a token with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that expires `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Creates a token that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Cancels this token and every clone of it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true when cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Returns the time left before the deadline, when one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Clamps `timeout` to the remaining deadline.
    ///
    /// Returns `None` when the token is already cancelled.
    #[must_use]
    pub fn bound(&self, timeout: Duration) -> Option<Duration> {
        if self.is_cancelled() {
            return None;
        }
        match self.remaining() {
            Some(remaining) if remaining.is_zero() => None,
            Some(remaining) => Some(timeout.min(remaining)),
            None => Some(timeout),
        }
    }

    /// Sleeps for `duration`, waking early on cancellation.
    ///
    /// Returns false when the token was cancelled before the sleep finished.
    pub fn sleep(&self, duration: Duration) -> bool {
        let end = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= end {
                return true;
            }
            thread::sleep(SLEEP_SLICE.min(end - now));
        }
    }
}
