//! Source of the local time of day used for window checks.

use chrono::{Local, NaiveTime, Timelike};
use std::sync::atomic::{AtomicU32, Ordering};

/// Provides the current local time of day.
pub trait Clock: Send + Sync {
    fn local_time(&self) -> NaiveTime;
}

/// Wall clock of the host, in its local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn local_time(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// A clock pinned to a settable time of day (second resolution).
#[derive(Debug, Default)]
pub struct FixedClock {
    seconds_from_midnight: AtomicU32,
}

impl FixedClock {
    pub fn new(time: NaiveTime) -> Self {
        Self {
            seconds_from_midnight: AtomicU32::new(time.num_seconds_from_midnight()),
        }
    }

    /// Pins the clock to `hour:minute:00`. Out-of-range values saturate to `23:59:59`.
    pub fn at(hour: u32, minute: u32) -> Self {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default());
        Self::new(time)
    }

    pub fn set(&self, time: NaiveTime) {
        self.seconds_from_midnight
            .store(time.num_seconds_from_midnight(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn local_time(&self) -> NaiveTime {
        let secs = self.seconds_from_midnight.load(Ordering::SeqCst);
        NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or_default()
    }
}
