// crates/launchpad-core/src/core/time.rs
// ============================================================================
// Module: Launchpad Time Model
// Description: Canonical UTC timestamps for install records and log entries.
// Purpose: Provide a single serializable time value with RFC 3339 wire form.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Launchpad records timestamps in install records, log entries, and decision
//! records. The core never reads wall-clock time directly; hosts supply
//! timestamps through [`crate::interfaces::Clock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC timestamp serialized as an RFC 3339 string.
///
/// # Invariants
/// - The wrapped value is always normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    /// The Unix epoch.
    pub const UNIX_EPOCH: Self = Self(OffsetDateTime::UNIX_EPOCH);

    /// Wraps an offset date-time, normalizing it to UTC.
    #[must_use]
    pub fn from_offset(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    /// Builds a timestamp from Unix epoch milliseconds.
    ///
    /// Returns `None` when the value is outside the supported range.
    #[must_use]
    pub fn from_unix_millis(millis: i64) -> Option<Self> {
        let nanos = i128::from(millis) * 1_000_000;
        OffsetDateTime::from_unix_timestamp_nanos(nanos).ok().map(Self)
    }

    /// Parses an RFC 3339 timestamp (for example `2026-01-31T12:00:00Z`).
    ///
    /// # Errors
    ///
    /// Returns [`time::error::Parse`] when the input is not RFC 3339.
    pub fn parse_rfc3339(raw: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(raw.trim(), &Rfc3339).map(Self::from_offset)
    }

    /// Returns the wrapped date-time.
    #[must_use]
    pub const fn as_offset(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns milliseconds since the Unix epoch.
    #[must_use]
    pub fn unix_millis(&self) -> i128 {
        self.0.unix_timestamp_nanos() / 1_000_000
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "@{}", self.0.unix_timestamp()),
        }
    }
}
