//! Millisecond time sources for the game clock.

use std::time::Instant;

/// A monotonic millisecond time source.
pub trait Clock: Send {
    /// Milliseconds since an arbitrary fixed origin.  Never goes backwards.
    fn now_millis(&self) -> u64;
}

/// Wall-clock source backed by [`Instant`], anchored at construction.
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
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock.  Clones share the same time so a test can keep one
/// handle while the timer owns another.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: std::sync::Arc<std::sync::atomic::AtomicU64>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: u64) -> Self {
        let clock = Self::default();
        clock.set(start);
        clock
    }

    pub fn set(&self, millis: u64) {
        self.now
            .store(millis, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, millis: u64) {
        self.now
            .fetch_add(millis, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}
