// crates/workload-policy-core/src/core/time.rs
// ============================================================================
// Module: Workload Policy Time Model
// Description: Canonical timestamp representation for records and events.
// Purpose: Provide a serializable wall-clock value with millisecond precision.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Records carry unix-epoch milliseconds. Durations are stored alongside as
//! plain millisecond counts so payloads stay stable across serializers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Wall-clock timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Clocks set before the epoch collapse to zero rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Captures the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
    }

    /// Builds a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(&self) -> i64 {
        self.0
    }

    /// Returns the elapsed time between `earlier` and this timestamp.
    ///
    /// Negative spans saturate to zero.
    #[must_use]
    pub fn since(&self, earlier: Self) -> Duration {
        let delta = self.0.saturating_sub(earlier.0);
        Duration::from_millis(u64::try_from(delta).unwrap_or(0))
    }
}

/// Returns wall-clock unix-epoch nanoseconds, used to suffix generated ids.
#[must_use]
pub fn unix_nanos() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos()
}

/// Converts a duration into whole milliseconds, saturating on overflow.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
