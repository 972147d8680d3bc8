//! Conflict detection against a user's existing events.
//!
//! Three detectors share one verdict type:
//!
//! - [`single::SingleEventDetector`] — a timed span vs plain and recurring events
//! - [`recurring::RecurringConflictDetector`] — a recurring pattern vs recurring events
//! - [`skip_days::SkipDayValidator`] — dates being removed from a skip list
//!
//! Two spans overlap when `a.start < b.end && b.start < a.end`. Adjacent spans, where
//! one ends exactly when another starts, are NOT conflicts.

pub mod recurring;
pub mod single;
pub mod skip_days;

use std::collections::BTreeSet;

use chrono::{Days, NaiveDate};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::dst::DstPolicy;
use crate::error::{EngineError, Result};
use crate::expander::Occurrence;
use crate::pattern::RecurrencePattern;
use crate::types::{EventId, EventStatus, Interval, OwnerId};

/// How many local dates apart two overlapping occurrences can fall.
///
/// UTC offsets run from -12:00 to +14:00 and an occurrence lasts under a day, so an
/// occurrence dated `d` in one zone can meet one dated `d - 3 ..= d + 3` in another.
pub(crate) const SPILL_DAYS: u64 = 3;

/// `date` moved back by `days`, saturating at the earliest representable date.
pub(crate) fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// `date` moved forward by `days`, saturating at the latest representable date.
pub(crate) fn days_after(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

/// Outcome of a conflict check. Built fresh for every call.
///
/// Serializes as `{"has_conflict": .., "conflicting_ids": [..]}`. The flag is derived
/// from the ids, so a `has_conflict` field read back from JSON is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConflictVerdict {
    #[serde(default)]
    conflicting_ids: BTreeSet<EventId>,
}

impl ConflictVerdict {
    /// A verdict with no conflicts.
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn has_conflict(&self) -> bool {
        !self.conflicting_ids.is_empty()
    }

    pub fn conflicting_ids(&self) -> &BTreeSet<EventId> {
        &self.conflicting_ids
    }

    pub(crate) fn record(&mut self, id: EventId) {
        self.conflicting_ids.insert(id);
    }

    /// Turn a positive verdict into [`EngineError::Conflict`].
    pub fn into_result(self) -> Result<Self> {
        if self.has_conflict() {
            Err(EngineError::Conflict {
                ids: self.conflicting_ids,
            })
        } else {
            Ok(self)
        }
    }
}

impl Serialize for ConflictVerdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ConflictVerdict", 2)?;
        state.serialize_field("has_conflict", &self.has_conflict())?;
        state.serialize_field("conflicting_ids", &self.conflicting_ids)?;
        state.end()
    }
}

/// A detected overlap between a candidate span and an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clash {
    pub candidate: Interval,
    pub existing: Interval,
    pub overlap_minutes: i64,
}

/// Find the first overlap between two span lists.
///
/// Each list must be sorted by start and free of internal overlaps, which holds for
/// the occurrences of a single pattern. Runs in `O(a + b)`.
pub fn first_clash(candidate: &[Interval], existing: &[Interval]) -> Option<Clash> {
    let (mut i, mut j) = (0, 0);
    while i < candidate.len() && j < existing.len() {
        let (a, b) = (candidate[i], existing[j]);
        if a.overlaps(&b) {
            return Some(Clash {
                candidate: a,
                existing: b,
                overlap_minutes: a.overlap_minutes(&b),
            });
        }
        if a.end <= b.end {
            i += 1;
        } else {
            j += 1;
        }
    }
    None
}

/// Absolute spans of `pattern`'s occurrences on `dates`, sorted by start.
pub(crate) fn occurrence_spans(
    pattern: &RecurrencePattern,
    dates: impl IntoIterator<Item = NaiveDate>,
    policy: DstPolicy,
) -> Vec<Interval> {
    let mut spans: Vec<Interval> = dates
        .into_iter()
        .filter_map(|date| {
            let span = Occurrence::of(pattern, date).interval(pattern.timezone, policy);
            if span.is_none() {
                debug!(%date, tz = %pattern.timezone, "occurrence dropped by DST gap");
            }
            span
        })
        .collect();
    spans.sort();
    spans
}

/// Whether an event returned by a lookup takes part in the check at all.
pub(crate) fn is_comparable(
    id: &EventId,
    owner: &OwnerId,
    status: EventStatus,
    expected_owner: &OwnerId,
    exclude_id: Option<&EventId>,
) -> bool {
    status == EventStatus::Confirmed && owner == expected_owner && exclude_id != Some(id)
}
