//! Engine time sources

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Monotonic time source the engine reads for position bookkeeping.
///
/// The engine never calls `Instant::now()` directly; injecting the clock lets
/// tests drive transport scenarios on a simulated timeline.
pub trait TapeClock: Send {
    /// Current engine time in seconds since an arbitrary origin.
    fn now(&self) -> f64;
}

/// Wall-clock time source backed by `Instant`.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TapeClock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for tests. Clones share the same timeline, so a test can
/// keep one handle while the engine owns another.
#[derive(Clone, Default)]
pub struct ManualClock {
    secs: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `secs`.
    pub fn advance(&self, secs: f64) {
        *self.secs.lock() += secs;
    }

    pub fn set(&self, secs: f64) {
        *self.secs.lock() = secs;
    }
}

impl TapeClock for ManualClock {
    fn now(&self) -> f64 {
        *self.secs.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        clock.advance(1.5);
        assert_eq!(handle.now(), 1.5);

        handle.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
