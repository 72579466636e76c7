//! Dropped-write accounting.
//!
//! One atomic word carries three states: `0` is healthy, `n > 0` counts
//! writes dropped since the last report, and `u64::MAX` marks a writer whose
//! sink has failed. The disabled value is terminal: no increment or reset
//! ever leaves it.

use std::sync::atomic::{AtomicU64, Ordering};

const DISABLED: u64 = u64::MAX;

/// Observable state of an async writer's loss counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossState {
    /// No writes dropped since the last report.
    Healthy,
    /// This many writes were dropped and not yet reported.
    Lossy(u64),
    /// The sink failed; async writes are discarded.
    Disabled,
}

impl LossState {
    fn from_raw(raw: u64) -> Self {
        match raw {
            0 => Self::Healthy,
            DISABLED => Self::Disabled,
            n => Self::Lossy(n),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LossCounter {
    value: AtomicU64,
}

impl LossCounter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn state(&self) -> LossState {
        LossState::from_raw(self.value.load(Ordering::Acquire))
    }

    /// Counts one dropped write unless the counter is disabled.
    pub(crate) fn record_drop(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                n.checked_add(1).filter(|&next| next != DISABLED)
            });
    }

    pub(crate) fn disable(&self) {
        self.value.store(DISABLED, Ordering::Release);
    }

    /// Resets the counter to zero, starting from the last observed count.
    ///
    /// Retries while other producers keep bumping the count. Returns the
    /// count that was cleared, or `None` if the counter got disabled or
    /// another thread already reported it.
    pub(crate) fn take(&self, mut seen: u64) -> Option<u64> {
        loop {
            match self
                .value
                .compare_exchange(seen, 0, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return Some(seen),
                Err(0 | DISABLED) => return None,
                Err(actual) => seen = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_healthy() {
        assert_eq!(LossCounter::new().state(), LossState::Healthy);
    }

    #[test]
    fn drops_are_counted() {
        let counter = LossCounter::new();
        counter.record_drop();
        counter.record_drop();
        assert_eq!(counter.state(), LossState::Lossy(2));
    }

    #[test]
    fn disabled_is_terminal() {
        let counter = LossCounter::new();
        counter.record_drop();
        counter.disable();
        counter.record_drop();
        assert_eq!(counter.state(), LossState::Disabled);
        assert_eq!(counter.take(1), None);
        assert_eq!(counter.state(), LossState::Disabled);
    }

    #[test]
    fn take_follows_concurrent_increments() {
        let counter = LossCounter::new();
        for _ in 0..3 {
            counter.record_drop();
        }
        // Observed 1, but the counter moved on to 3 meanwhile.
        assert_eq!(counter.take(1), Some(3));
        assert_eq!(counter.state(), LossState::Healthy);
    }

    #[test]
    fn take_after_someone_else_reported() {
        let counter = LossCounter::new();
        counter.record_drop();
        assert_eq!(counter.take(1), Some(1));
        assert_eq!(counter.take(1), None);
    }

    #[test]
    fn concurrent_drops_are_exact() {
        let counter = Arc::new(LossCounter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        counter.record_drop();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.state(), LossState::Lossy(8_000));
    }
}
