//! Conversions at the persistence boundary.
//!
//! Stores commonly encode "no end date" as a far-future sentinel so the column can be
//! non-null and range queries stay simple. Inside the engine an open end is always
//! `None`; these helpers translate at the edge.

use chrono::NaiveDate;

/// Sentinel end date used by storage for open-ended recurrences.
pub fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Stored end date → engine end date. The sentinel (or anything past it) is `None`.
pub fn end_date_from_storage(stored: NaiveDate) -> Option<NaiveDate> {
    (stored < far_future()).then_some(stored)
}

/// Engine end date → stored end date.
pub fn end_date_to_storage(end: Option<NaiveDate>) -> NaiveDate {
    end.unwrap_or_else(far_future)
}
