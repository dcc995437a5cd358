use chrono::NaiveDate;

/// Source of the order date stamped onto reconciled rows.
pub trait Clock {
    fn current_date(&self) -> NaiveDate;
}

/// Wall-clock date in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_date(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn current_date(&self) -> NaiveDate {
        self.0
    }
}

/// ISO `YYYY-MM-DD` text of the clock's date.
pub fn iso_date(clock: &dyn Clock) -> String {
    clock.current_date().format("%Y-%m-%d").to_string()
}
