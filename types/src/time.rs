//! Timestamp type and the clock abstraction.
//!
//! Timestamps are Unix epoch seconds (UTC), the analog of a block timestamp.
//! The engine never reads a clock itself: the caller reads a [`Clock`] once
//! per operation and passes the resulting `Timestamp` down.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs`, saturating at `u64::MAX`.
    pub fn plus(&self, secs: u64) -> Timestamp {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whether this timestamp + duration has passed relative to `now`.
    pub fn has_expired(&self, duration_secs: u64, now: Timestamp) -> bool {
        now.0 >= self.0.saturating_add(duration_secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // A clock set before 1970 reads as the epoch.
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_expired_is_inclusive_at_boundary() {
        let start = Timestamp::new(100);
        assert!(!start.has_expired(50, Timestamp::new(149)));
        assert!(start.has_expired(50, Timestamp::new(150)));
    }

    #[test]
    fn plus_saturates() {
        assert_eq!(Timestamp::new(u64::MAX - 1).plus(10), Timestamp::new(u64::MAX));
        assert!(!Timestamp::new(u64::MAX - 1).has_expired(10, Timestamp::new(u64::MAX - 1)));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().as_secs() > 1_577_836_800);
    }
}
