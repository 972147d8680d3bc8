//! Recurring patterns against the owner's other recurring events.
//!
//! Each pair is compared over [`comparison_window`]: the intersection of both date
//! ranges, capped to `window_cap_days` when either side is open-ended, plus a few edge
//! days for occurrences spilling across midnight or zones. Pairs whose ranges lie
//! further apart, or whose day-of-week / day-of-month sets cannot coincide, are
//! rejected before anything is expanded.

use chrono::Days;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::expander::{occurs_on, Expander, PatternExpander};
use crate::lookup::RecurringEventLookup;
use crate::pattern::{Frequency, RecurrencePattern};
use crate::types::{EventId, Interval, OwnerId};
use crate::window::{comparison_window, DateWindow};

use super::{
    days_after, days_before, first_clash, is_comparable, occurrence_spans, ConflictVerdict,
    SPILL_DAYS,
};

static PATTERN_EXPANDER: PatternExpander = PatternExpander;

pub struct RecurringConflictDetector<'a> {
    lookup: &'a dyn RecurringEventLookup,
    expander: &'a dyn Expander,
    config: EngineConfig,
}

impl<'a> RecurringConflictDetector<'a> {
    pub fn new(lookup: &'a dyn RecurringEventLookup, config: EngineConfig) -> Self {
        Self {
            lookup,
            expander: &PATTERN_EXPANDER,
            config,
        }
    }

    /// Replace the expander used for window expansion.
    #[must_use]
    pub fn with_expander(mut self, expander: &'a dyn Expander) -> Self {
        self.expander = expander;
        self
    }

    /// Collect every recurring event of `owner` whose occurrences overlap `candidate`'s.
    ///
    /// `exclude_id` removes the candidate's own persisted row from the lookup result;
    /// a pattern is never compared against itself.
    ///
    /// # Errors
    /// `InvalidPattern` / `InvalidTimeRange` for an invalid candidate; lookup failures
    /// are returned unchanged.
    pub fn validate_no_conflict(
        &self,
        owner: &OwnerId,
        candidate: &RecurrencePattern,
        exclude_id: Option<&EventId>,
    ) -> Result<ConflictVerdict> {
        candidate.validate()?;
        let mut verdict = ConflictVerdict::clear();

        if candidate.rule.is_unspecified() {
            debug!(owner = %owner, "draft pattern has no occurrences");
            return Ok(verdict);
        }

        // Patterns ending or starting a few days off can still meet across zones.
        let from = days_before(candidate.start_date, SPILL_DAYS);
        let to = candidate.end_date.map(|end| days_after(end, SPILL_DAYS));
        let others = self.lookup.find_overlapping_recurring_events(owner, from, to)?;
        for other in others {
            if !is_comparable(&other.id, &other.owner, other.status, owner, exclude_id) {
                continue;
            }
            if self.patterns_collide(candidate, &other.pattern) {
                trace!(id = %other.id, "recurring event overlaps candidate");
                verdict.record(other.id);
            }
        }

        debug!(
            owner = %owner,
            summary = %candidate.summary(),
            conflicts = verdict.conflicting_ids().len(),
            "checked recurring pattern"
        );
        Ok(verdict)
    }

    /// Like [`Self::validate_no_conflict`], but a conflict becomes `EngineError::Conflict`.
    pub fn ensure_no_conflict(
        &self,
        owner: &OwnerId,
        candidate: &RecurrencePattern,
        exclude_id: Option<&EventId>,
    ) -> Result<ConflictVerdict> {
        self.validate_no_conflict(owner, candidate, exclude_id)?.into_result()
    }

    /// Whether any occurrence of `a` overlaps any occurrence of `b`.
    pub fn patterns_collide(&self, a: &RecurrencePattern, b: &RecurrencePattern) -> bool {
        let window = comparison_window(a, b, self.config.cap_days()).or_else(|| seam(a, b));
        let Some(window) = window else {
            trace!("date ranges do not overlap");
            return false;
        };
        if memberships_disjoint(a, b) {
            trace!("day sets cannot coincide");
            return false;
        }

        let spans_a = self.spans_around(a, window);
        if spans_a.is_empty() {
            return false;
        }
        let spans_b = self.spans_around(b, window);

        match first_clash(&spans_a, &spans_b) {
            Some(clash) => {
                trace!(
                    at = %clash.candidate.start,
                    overlap_minutes = clash.overlap_minutes,
                    "occurrences overlap"
                );
                true
            }
            None => false,
        }
    }

    /// Occurrence spans inside `window`, plus up to [`SPILL_DAYS`] days either side.
    ///
    /// The edge days catch overnight spill-over and zone offsets without widening the
    /// expanded window itself.
    fn spans_around(&self, pattern: &RecurrencePattern, window: DateWindow) -> Vec<Interval> {
        let before = (1..=SPILL_DAYS).map(|n| window.from.checked_sub_days(Days::new(n)));
        let after = (1..=SPILL_DAYS).map(|n| window.to.checked_add_days(Days::new(n)));
        let edges = before
            .chain(after)
            .flatten()
            .filter(|date| occurs_on(pattern, *date));

        let mut dates = self.expander.expand_dates(pattern, window);
        dates.extend(edges);
        occurrence_spans(pattern, dates, self.config.dst_policy)
    }
}

/// First date of the later pattern when it starts shortly after the other one ends.
///
/// Only relevant when an occurrence can reach into a later calendar day, either by
/// crossing midnight or through differing zones.
fn seam(a: &RecurrencePattern, b: &RecurrencePattern) -> Option<DateWindow> {
    if a.timezone == b.timezone && !a.crosses_midnight() && !b.crosses_midnight() {
        return None;
    }
    let from = a.start_date.max(b.start_date);
    let end = [a.end_date, b.end_date].into_iter().flatten().min()?;
    (from <= days_after(end, SPILL_DAYS)).then(|| DateWindow::single(from))
}

/// Cheap check that two patterns can never fire on the same local date.
///
/// Only conclusive when both share a zone and neither crosses midnight; otherwise
/// occurrences on different dates may still overlap and this returns `false`.
pub fn memberships_disjoint(a: &RecurrencePattern, b: &RecurrencePattern) -> bool {
    if a.rule.is_unspecified() || b.rule.is_unspecified() {
        return true;
    }
    if a.timezone != b.timezone || a.crosses_midnight() || b.crosses_midnight() {
        return false;
    }
    match (a.rule.frequency, b.rule.frequency) {
        (Frequency::Weekly, Frequency::Weekly) => a.weekdays().intersection(b.weekdays()).is_empty(),
        (Frequency::Monthly, Frequency::Monthly) => {
            let (x, y) = (a.day_of_month(), b.day_of_month());
            // Days from the 28th up can clamp onto the same month end.
            x != y && x.min(y) < 28
        }
        _ => false,
    }
}
