// libs/appointment-cell/src/services/clock.rs
use chrono::{Local, NaiveDateTime, Utc};

/// Source of the clinic's wall-clock "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local time of the host, which is the clinic's single locale.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Record timestamps are kept in UTC regardless of the wall clock.
pub fn record_timestamp() -> chrono::DateTime<Utc> {
    Utc::now()
}
