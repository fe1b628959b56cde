// crates/ledger-query-core/src/core/time.rs
// ============================================================================
// Module: Ledger Query Time Model
// Description: Canonical timestamp representation for blocks and transactions.
// Purpose: Provide deterministic time values across ledger records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Timestamps are explicit unix-millisecond values embedded in blocks and
//! transactions at commit time. The query engine never reads wall-clock time
//! itself; values flow in from the block production pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used in ledger records.
///
/// # Invariants
/// - Values are explicitly provided by block production; the engine never
///   reads wall-clock time.
/// - No validation is performed; monotonicity is a producer responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = OffsetDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok());
        match rendered {
            Some(text) => text.fmt(f),
            None => self.0.fmt(f),
        }
    }
}
