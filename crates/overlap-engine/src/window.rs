//! Date windows bounding expansion cost.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::pattern::RecurrencePattern;

/// Inclusive `[from, to]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn is_empty(&self) -> bool {
        self.from > self.to
    }

    /// Number of dates in the window, 0 when empty.
    pub fn num_days(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            (self.to - self.from).num_days() + 1
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Window over which two recurring patterns must be compared.
///
/// Starts at the later start date and ends at the earlier end date. If either pattern
/// is open-ended the window is additionally capped to `cap_days` dates. Returns `None`
/// when the date ranges do not overlap at all, before any cap is applied.
pub fn comparison_window(
    a: &RecurrencePattern,
    b: &RecurrencePattern,
    cap_days: u32,
) -> Option<DateWindow> {
    let from = a.start_date.max(b.start_date);
    let natural_end = match (a.end_date, b.end_date) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    };

    if natural_end.is_some_and(|end| end < from) {
        return None;
    }

    let to = match natural_end {
        Some(end) if !(a.is_open_ended() || b.is_open_ended()) => end,
        _ => {
            let capped = from
                .checked_add_days(Days::new(u64::from(cap_days.max(1) - 1)))
                .unwrap_or(NaiveDate::MAX);
            natural_end.map_or(capped, |end| end.min(capped))
        }
    };

    Some(DateWindow::new(from, to))
}
