use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Source of the timestamps reservoirs are updated and queried with.
pub trait TimeSource: Send + Sync {
    /// Nanoseconds since an origin fixed for the lifetime of the source.
    fn now_nanos(&self) -> i64;
}

/// Monotonic clock anchored at its creation.
pub struct MonotonicClock {
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_nanos(&self) -> i64 {
        i64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    nanos: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        let delta = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.nanos.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set(&self, duration: Duration) {
        let nanos = i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX);
        self.nanos.store(nanos, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now_nanos(&self) -> i64 {
        self.nanos.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_nanos(), 0);
        clock.advance(Duration::from_millis(3));
        assert_eq!(clock.now_nanos(), 3_000_000);
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now_nanos(), 1_000_000_000);
    }

    #[test]
    fn monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let first = clock.now_nanos();
        assert!(clock.now_nanos() >= first);
    }
}
