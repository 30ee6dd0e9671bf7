//! Target-date arithmetic and calendar labels.

use chrono::{Datelike, Days, Local, NaiveDate};

/// The calendar day a run books, derived once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDate {
    date: NaiveDate,
}

impl TargetDate {
    /// The date `days_ahead` days from today. Zero books today.
    pub fn from_today(days_ahead: u32) -> Self {
        let today = Local::now().date_naive();
        Self {
            date: today
                .checked_add_days(Days::new(u64::from(days_ahead)))
                .unwrap_or(today),
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Calendar-cell label: "M/D" with no zero padding, e.g. "11/14", "3/2".
    pub fn label(&self) -> String {
        format!("{}/{}", self.date.month(), self.date.day())
    }

    /// Human-readable form for logs and notifications.
    pub fn human(&self) -> String {
        self.date.format("%A, %B %d").to_string()
    }
}
