//! Time sources for the timer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic millisecond reads. `None` means the source is unavailable and
/// the timer should fall back to the last value it measured.
pub trait Clock {
    fn now_ms(&self) -> Option<u64>;
}

/// Wall clock measured from when it was created
#[derive(Debug, Clone, Copy)]
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

impl Clock for SystemClock {
    fn now_ms(&self) -> Option<u64> {
        u64::try_from(self.origin.elapsed().as_millis()).ok()
    }
}

const UNAVAILABLE: u64 = u64::MAX;

/// Hand-driven clock. Clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    /// Move forward; also makes an unavailable clock readable again at 0 + `ms`
    pub fn advance(&self, ms: u64) {
        let current = match self.now.load(Ordering::SeqCst) {
            UNAVAILABLE => 0,
            n => n,
        };
        self.set(current.saturating_add(ms));
    }

    pub fn set_unavailable(&self) {
        self.now.store(UNAVAILABLE, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Option<u64> {
        match self.now.load(Ordering::SeqCst) {
            UNAVAILABLE => None,
            n => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_ms(), Some(150));

        other.set_unavailable();
        assert_eq!(clock.now_ms(), None);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms().unwrap();
        let b = clock.now_ms().unwrap();
        assert!(b >= a);
    }
}
