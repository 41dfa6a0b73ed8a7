// crates/launchpad-store/src/clock.rs
// ============================================================================
// Module: System Clock
// Description: Wall-clock source backed by the operating system.
// Dependencies: launchpad-core, time
// ============================================================================

//! ## Overview
//! Hosts inject [`SystemClock`] into the orchestrator and the runtime store;
//! tests substitute fixed clocks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use launchpad_core::Clock;
use launchpad_core::Timestamp;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Clock reading the current UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_offset(OffsetDateTime::now_utc())
    }
}
