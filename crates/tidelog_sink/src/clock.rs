//! Clock abstraction for archive timestamps.

use chrono::{Local, NaiveDateTime, TimeDelta};
use parking_lot::Mutex;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// A source of local wall-clock time.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current local time.
    fn now(&self) -> NaiveDateTime;
}

/// Real system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fake clock for testing with controllable time.
///
/// Clones share the same current time.
#[derive(Debug, Clone)]
pub struct FakeClock {
    current: Arc<Mutex<NaiveDateTime>>,
}

impl FakeClock {
    /// Creates a fake clock frozen at `start`.
    #[must_use]
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, duration: Duration) {
        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
        let mut current = self.current.lock();
        *current = current.checked_add_signed(delta).unwrap_or(*current);
    }

    /// Sets the clock to a specific time.
    pub fn set(&self, time: NaiveDateTime) {
        *self.current.lock() = time;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 1, 2)
            .unwrap()
    }

    #[test]
    fn fake_clock_can_be_advanced() {
        let clock = FakeClock::new(start());
        clock.advance(Duration::from_secs(61));
        assert_eq!(clock.now(), start() + TimeDelta::seconds(61));
    }

    #[test]
    fn fake_clock_is_cloneable_and_shared() {
        let clock1 = FakeClock::new(start());
        let clock2 = clock1.clone();
        clock2.advance(Duration::from_secs(30));
        assert_eq!(clock1.now(), start() + TimeDelta::seconds(30));
    }

    #[test]
    fn fake_clock_can_be_set() {
        let clock = FakeClock::new(start());
        let later = start() + TimeDelta::days(1);
        clock.set(later);
        assert_eq!(clock.now(), later);
    }
}
