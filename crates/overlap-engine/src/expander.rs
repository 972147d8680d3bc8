//! Recurrence expansion -- converts a pattern into concrete occurrence dates.
//!
//! Expansion is plain calendar arithmetic over [`NaiveDate`]s, so it needs no time
//! zone and is a pure function of its inputs. Occurrence dates become absolute
//! instants only when an [`Occurrence`] is resolved against the pattern's zone.
//!
//! Interval alignment:
//! - DAILY: day offset from the start date is a multiple of the interval.
//! - WEEKLY: the Monday-based week offset from the start date's week is a multiple
//!   of the interval, and the weekday is in the pattern's day set.
//! - MONTHLY: the month offset is a multiple of the interval; the day of month is
//!   clamped to the last day of shorter months.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;

use crate::dst::{resolve_local, DstPolicy};
use crate::pattern::{Frequency, RecurrencePattern};
use crate::types::Interval;
use crate::window::DateWindow;

/// A single occurrence of a pattern on a concrete date, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Occurrence {
    pub fn of(pattern: &RecurrencePattern, date: NaiveDate) -> Self {
        Occurrence {
            date,
            start_time: pattern.start_time,
            end_time: pattern.end_time,
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_time < self.start_time
    }

    pub fn local_start(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    /// Local end, on the following day for overnight occurrences.
    pub fn local_end(&self) -> Option<NaiveDateTime> {
        let end_date = if self.crosses_midnight() {
            self.date.succ_opt()?
        } else {
            self.date
        };
        Some(end_date.and_time(self.end_time))
    }

    /// Absolute `[start, end)` span of this occurrence in `tz`.
    ///
    /// `None` when a DST gap swallows either end under [`DstPolicy::Skip`].
    pub fn interval(&self, tz: Tz, policy: DstPolicy) -> Option<Interval> {
        let start = resolve_local(tz, self.local_start(), policy)?;
        let end = resolve_local(tz, self.local_end()?, policy)?;
        (end > start).then_some(Interval { start, end })
    }
}

/// Expand `pattern` over `[from, to]`, excluding `skip_dates`.
///
/// The result is a lazy, restartable (cloneable) iterator of ascending dates. It never
/// yields dates before the pattern's start date or after its end date, and is empty
/// when `from > to`.
pub fn expand<'a>(
    pattern: &'a RecurrencePattern,
    from: NaiveDate,
    to: NaiveDate,
    skip_dates: &'a BTreeSet<NaiveDate>,
) -> Occurrences<'a> {
    let last = pattern.end_date.map_or(to, |end| end.min(to));
    Occurrences {
        pattern,
        skip_dates,
        cursor: (from <= to).then(|| from.max(pattern.start_date)),
        last,
    }
}

/// Occurrences of `pattern` (minus its own skip dates) inside `window`.
pub fn occurrences_in(pattern: &RecurrencePattern, window: DateWindow) -> Vec<Occurrence> {
    expand(pattern, window.from, window.to, &pattern.skip_dates)
        .map(|date| Occurrence::of(pattern, date))
        .collect()
}

/// Whether `pattern` has an occurrence on `date`, honouring its skip dates.
pub fn occurs_on(pattern: &RecurrencePattern, date: NaiveDate) -> bool {
    !pattern.skip_dates.contains(&date) && matches_schedule(pattern, date)
}

/// Whether `date` satisfies the pattern's rule and range, ignoring skip dates.
pub fn matches_schedule(pattern: &RecurrencePattern, date: NaiveDate) -> bool {
    pattern.in_range(date) && next_on_or_after(pattern, date) == Some(date)
}

/// Iterator returned by [`expand`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    pattern: &'a RecurrencePattern,
    skip_dates: &'a BTreeSet<NaiveDate>,
    cursor: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            let date = self
                .cursor
                .and_then(|cursor| next_on_or_after(self.pattern, cursor))
                .filter(|date| *date <= self.last);
            let Some(date) = date else {
                self.cursor = None;
                return None;
            };
            self.cursor = date.succ_opt();
            if !self.skip_dates.contains(&date) {
                return Some(date);
            }
        }
    }
}

/// Source of occurrence dates for the recurring conflict detector.
///
/// [`PatternExpander`] is the only production implementation; the seam exists so
/// callers can observe which windows get expanded.
pub trait Expander {
    fn expand_dates(&self, pattern: &RecurrencePattern, window: DateWindow) -> Vec<NaiveDate>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatternExpander;

impl Expander for PatternExpander {
    fn expand_dates(&self, pattern: &RecurrencePattern, window: DateWindow) -> Vec<NaiveDate> {
        expand(pattern, window.from, window.to, &pattern.skip_dates).collect()
    }
}

/// First date `>= date` (and `>= start_date`) matching the rule, ignoring the end date
/// and skip dates.
fn next_on_or_after(pattern: &RecurrencePattern, date: NaiveDate) -> Option<NaiveDate> {
    let date = date.max(pattern.start_date);
    let interval = i64::from(pattern.rule.interval.max(1));

    match pattern.rule.frequency {
        Frequency::Unspecified => None,
        Frequency::Daily => {
            let rem = (date - pattern.start_date).num_days() % interval;
            if rem == 0 {
                Some(date)
            } else {
                date.checked_add_days(Days::new((interval - rem) as u64))
            }
        }
        Frequency::Weekly => next_weekly(pattern, date, interval),
        Frequency::Monthly => next_monthly(pattern, date, interval),
    }
}

fn next_weekly(pattern: &RecurrencePattern, mut date: NaiveDate, interval: i64) -> Option<NaiveDate> {
    let days = pattern.weekdays();
    let start = pattern.start_date;
    let anchor = start
        .checked_sub_days(Days::new(u64::from(start.weekday().num_days_from_monday())))
        .unwrap_or(start);

    loop {
        let week = (date - anchor).num_days() / 7;
        let rem = week % interval;
        if rem != 0 {
            // Jump to the Monday of the next week aligned with the interval.
            date = anchor.checked_add_days(Days::new(((week + interval - rem) * 7) as u64))?;
            continue;
        }
        let sunday = anchor.checked_add_days(Days::new((week * 7 + 6) as u64))?;
        while date <= sunday {
            if days.contains(date.weekday()) {
                return Some(date);
            }
            date = date.succ_opt()?;
        }
    }
}

fn next_monthly(pattern: &RecurrencePattern, date: NaiveDate, interval: i64) -> Option<NaiveDate> {
    let day = pattern.day_of_month();
    let base = month_index(pattern.start_date);

    let mut offset = month_index(date) - base;
    let rem = offset % interval;
    if rem != 0 {
        offset += interval - rem;
    }

    loop {
        let candidate = clamped_date(base + offset, day)?;
        if candidate >= date {
            return Some(candidate);
        }
        offset += interval;
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// `day` of the month at `index`, clamped to that month's last day.
fn clamped_date(index: i64, day: u32) -> Option<NaiveDate> {
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?.day();
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}
