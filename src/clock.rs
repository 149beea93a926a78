/// Clock abstraction
///
/// All time-dependent logic (rate-limit windows, lockout expiry, session
/// TTL, last-login stamps) reads the current time through this trait so
/// tests can drive it deterministically instead of sleeping.
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::RwLock;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
#[derive(Debug)]
pub struct ManualClock {
    current: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: RwLock::new(start),
        }
    }

    /// Fixed, arbitrary starting point
    pub fn fixed() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.current.write().unwrap() = to;
    }

    pub fn advance(&self, by: Duration) {
        let mut current = self.current.write().unwrap();
        *current += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.read().unwrap()
    }
}
