//! Re-checking occurrences that come back when dates leave a skip list.
//!
//! Removing a skip date does not go through full pattern validation, so each
//! reactivated date is checked on its own against the owner's other events. Only the
//! reactivated dates are examined; the rest of the pattern was validated when saved.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::expander::{matches_schedule, occurs_on, Occurrence};
use crate::lookup::{PlainEventLookup, RecurringEventLookup};
use crate::pattern::RecurrencePattern;
use crate::types::{Interval, RecurringEvent};

use super::{days_after, days_before, is_comparable, ConflictVerdict, SPILL_DAYS};

pub struct SkipDayValidator<'a> {
    plain: &'a dyn PlainEventLookup,
    recurring: &'a dyn RecurringEventLookup,
    config: EngineConfig,
}

impl<'a> SkipDayValidator<'a> {
    pub fn new(
        plain: &'a dyn PlainEventLookup,
        recurring: &'a dyn RecurringEventLookup,
        config: EngineConfig,
    ) -> Self {
        Self {
            plain,
            recurring,
            config,
        }
    }

    /// Collect the events that would overlap `event` once `dates_to_unskip` are active.
    ///
    /// Dates on which the rule would not fire anyway (wrong weekday, outside the
    /// range) reactivate nothing and are ignored. The event itself is never reported.
    pub fn validate_no_conflict_for_skip_days(
        &self,
        event: &RecurringEvent,
        dates_to_unskip: &BTreeSet<NaiveDate>,
    ) -> Result<ConflictVerdict> {
        let pattern = &event.pattern;
        pattern.validate()?;
        let mut verdict = ConflictVerdict::clear();

        let reactivated: Vec<(NaiveDate, Interval)> = dates_to_unskip
            .iter()
            .copied()
            .filter(|date| matches_schedule(pattern, *date))
            .filter_map(|date| {
                Occurrence::of(pattern, date)
                    .interval(pattern.timezone, self.config.dst_policy)
                    .map(|span| (date, span))
            })
            .collect();

        let (Some(&(first, _)), Some(&(last, _))) = (reactivated.first(), reactivated.last())
        else {
            debug!(id = %event.id, "no occurrences reactivated");
            return Ok(verdict);
        };

        let from = days_before(first, SPILL_DAYS);
        let to = days_after(last, SPILL_DAYS);
        let others = self
            .recurring
            .find_overlapping_recurring_events(&event.owner, from, Some(to))?;
        for other in others {
            if !is_comparable(&other.id, &other.owner, other.status, &event.owner, Some(&event.id)) {
                continue;
            }
            let hit = reactivated
                .iter()
                .any(|(date, span)| self.occupied_near(&other.pattern, *date, span));
            if hit {
                trace!(id = %other.id, "recurring event occupies a reactivated date");
                verdict.record(other.id);
            }
        }

        for (date, span) in &reactivated {
            let plain = self
                .plain
                .find_overlapping_plain_events(&event.owner, span.start, span.end)?;
            for candidate in plain {
                if !is_comparable(
                    &candidate.id,
                    &candidate.span.owner,
                    candidate.status,
                    &event.owner,
                    Some(&event.id),
                ) {
                    continue;
                }
                if candidate.span.interval().overlaps(span) {
                    trace!(id = %candidate.id, %date, "plain event occupies a reactivated date");
                    verdict.record(candidate.id);
                }
            }
        }

        debug!(
            id = %event.id,
            dates = reactivated.len(),
            conflicts = verdict.conflicting_ids().len(),
            "checked reactivated skip dates"
        );
        Ok(verdict)
    }

    /// Like [`Self::validate_no_conflict_for_skip_days`], but a conflict becomes
    /// `EngineError::Conflict`.
    pub fn ensure_no_conflict_for_skip_days(
        &self,
        event: &RecurringEvent,
        dates_to_unskip: &BTreeSet<NaiveDate>,
    ) -> Result<ConflictVerdict> {
        self.validate_no_conflict_for_skip_days(event, dates_to_unskip)?.into_result()
    }

    /// Whether `other` has an occurrence around `date` overlapping `span`.
    ///
    /// The neighbouring days cover overnight occurrences and zone offsets.
    fn occupied_near(&self, other: &RecurrencePattern, date: NaiveDate, span: &Interval) -> bool {
        let first = days_before(date, SPILL_DAYS);
        (0..=2 * SPILL_DAYS)
            .map(|n| days_after(first, n))
            .filter(|day| occurs_on(other, *day))
            .filter_map(|day| {
                Occurrence::of(other, day).interval(other.timezone, self.config.dst_policy)
            })
            .any(|occupied| occupied.overlaps(span))
    }
}
