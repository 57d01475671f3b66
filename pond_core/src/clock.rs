//! Pond time.
//!
//! Every core operation receives an explicit [`Timestamp`]; only the
//! coordinator reads a [`Clock`].  Tests drive a [`ManualClock`] so cooldown
//! and pulse rules can be checked without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ════════════════════════════════════════════════════════════════════════════
// Timestamp
// ════════════════════════════════════════════════════════════════════════════

/// Milliseconds since the pond started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self { Timestamp(ms) }

    pub fn as_millis(self) -> u64 { self.0 }

    /// Time elapsed since `earlier`; zero if `earlier` lies in the future.
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}s", self.0 / 1000, self.0 % 1000)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Clock implementations
// ════════════════════════════════════════════════════════════════════════════

pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time measured from construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self { MonotonicClock { origin: Instant::now() } }
}

impl Default for MonotonicClock {
    fn default() -> Self { Self::new() }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.origin.elapsed().as_millis() as u64)
    }
}

/// A clock that only moves when told to.  Clones share the same time, so a
/// test can keep one handle while the pond owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self { Self::default() }

    pub fn advance(&self, d: Duration) {
        self.ms.fetch_add(d.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp { Timestamp(self.ms.load(Ordering::SeqCst)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturating_since_never_negative() {
        let a = Timestamp(500);
        let b = Timestamp(1200);
        assert_eq!(b.saturating_since(a), Duration::from_millis(700));
        assert_eq!(a.saturating_since(b), Duration::ZERO);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance_ms(1500);
        assert_eq!(clock.now(), Timestamp(1500));
    }

    #[test]
    fn display_is_seconds() {
        assert_eq!(Timestamp(7042).to_string(), "7.042s");
    }
}
