//! Time utilities and the clock seam.
//!
//! All timestamps are `i64` milliseconds since the Unix epoch, UTC. The
//! engine consumes time exclusively through the [`Clock`] trait so tests can
//! drive it deterministically; the elapsed-time no-op guard in settlement
//! protects against any residual clock skew.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Monotonic clock source consumed from the hosting process.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Wall-clock implementation backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations.
///
/// # Example
///
/// ```rust
/// use farmledger_core::time::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_700_000_000_000);
/// clock.advance_ms(2_000);
/// assert_eq!(clock.now_ms(), 1_700_000_002_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `now_ms`.
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Moves the clock forward by `delta_ms`.
    pub fn advance_ms(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute instant. Moving it backwards is allowed
    /// here precisely so tests can exercise the engine's skew guard.
    pub fn set_ms(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[inline]
pub fn now_ms() -> i64 {
    SystemClock.now_ms()
}

/// Formats a millisecond timestamp as an ISO 8601 string in UTC, e.g.
/// `2024-01-01T12:00:00.000Z`. Returns `None` for timestamps chrono cannot
/// represent.
pub fn iso8601(timestamp_ms: i64) -> Option<String> {
    let secs = timestamp_ms.div_euclid(1000);
    let nsecs = (timestamp_ms.rem_euclid(1000) * 1_000_000) as u32;
    DateTime::<Utc>::from_timestamp(secs, nsecs)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_plausible() {
        let now = now_ms();
        assert!(now > 1_600_000_000_000); // after 2020
        assert!(now < 4_102_444_800_000); // before 2100
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1000);
        assert_eq!(clock.now_ms(), 1000);
        clock.advance_ms(500);
        assert_eq!(clock.now_ms(), 1500);
        clock.set_ms(100);
        assert_eq!(clock.now_ms(), 100);
    }

    #[test]
    fn iso8601_formats_utc() {
        assert_eq!(
            iso8601(1_704_110_400_000).as_deref(),
            Some("2024-01-01T12:00:00.000Z")
        );
        assert_eq!(
            iso8601(1_704_110_400_123).as_deref(),
            Some("2024-01-01T12:00:00.123Z")
        );
    }
}
