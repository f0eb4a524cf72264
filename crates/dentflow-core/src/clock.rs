//! Time source for date validation.

use chrono::{NaiveDate, Utc};

/// Supplies the current date.
pub trait Clock: Send {
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time (UTC).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
