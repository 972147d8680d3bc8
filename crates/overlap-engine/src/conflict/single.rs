//! Single-occurrence events against the owner's plain and recurring events.

use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::expander::occurrences_in;
use crate::lookup::{ConfirmedRecurringLookup, PlainEventLookup};
use crate::pattern::RecurrencePattern;
use crate::types::{EventId, Interval, TimeSpan};
use crate::window::DateWindow;

use super::{days_after, days_before, is_comparable, ConflictVerdict, SPILL_DAYS};

/// Checks one timed candidate against everything its owner already has.
pub struct SingleEventDetector<'a> {
    plain: &'a dyn PlainEventLookup,
    recurring: &'a dyn ConfirmedRecurringLookup,
    config: EngineConfig,
}

impl<'a> SingleEventDetector<'a> {
    pub fn new(
        plain: &'a dyn PlainEventLookup,
        recurring: &'a dyn ConfirmedRecurringLookup,
        config: EngineConfig,
    ) -> Self {
        Self {
            plain,
            recurring,
            config,
        }
    }

    /// Collect every plain and recurring event of the candidate's owner that overlaps it.
    ///
    /// `exclude_id` is the candidate's own persisted ID when it is being updated.
    ///
    /// # Errors
    /// `InvalidTimeRange` for a span whose end is not after its start; lookup failures
    /// are returned unchanged.
    pub fn validate_no_conflict(
        &self,
        candidate: &TimeSpan,
        exclude_id: Option<&EventId>,
    ) -> Result<ConflictVerdict> {
        candidate.validate()?;
        let span = candidate.interval();
        let owner = &candidate.owner;
        let mut verdict = ConflictVerdict::clear();

        // Plain hits do not short-circuit: the verdict reports both sources together.
        let plain = self
            .plain
            .find_overlapping_plain_events(owner, span.start, span.end)?;
        for event in plain {
            if !is_comparable(&event.id, &event.span.owner, event.status, owner, exclude_id) {
                continue;
            }
            if event.span.interval().overlaps(&span) {
                trace!(id = %event.id, "plain event overlaps candidate");
                verdict.record(event.id);
            }
        }

        // Widened so every zone's local dates around the span are covered.
        let from = days_before(span.start.date_naive(), SPILL_DAYS);
        let to = days_after(span.end.date_naive(), SPILL_DAYS);
        let recurring = self
            .recurring
            .find_confirmed_recurring_events_between(owner, from, to)?;
        for event in recurring {
            if !is_comparable(&event.id, &event.owner, event.status, owner, exclude_id) {
                continue;
            }
            if self.pattern_occupies(&event.pattern, &span) {
                trace!(id = %event.id, "recurring occurrence overlaps candidate");
                verdict.record(event.id);
            }
        }

        debug!(
            owner = %owner,
            start = %span.start,
            end = %span.end,
            conflicts = verdict.conflicting_ids().len(),
            "checked single event"
        );
        Ok(verdict)
    }

    /// Like [`Self::validate_no_conflict`], but a conflict becomes `EngineError::Conflict`.
    pub fn ensure_no_conflict(
        &self,
        candidate: &TimeSpan,
        exclude_id: Option<&EventId>,
    ) -> Result<ConflictVerdict> {
        self.validate_no_conflict(candidate, exclude_id)?.into_result()
    }

    /// Whether any occurrence of `pattern` intersects `span`.
    fn pattern_occupies(&self, pattern: &RecurrencePattern, span: &Interval) -> bool {
        let tz = pattern.timezone;
        let first_local = span.start.with_timezone(&tz).date_naive();
        // The previous day's overnight occurrence can reach into the span.
        let from = first_local.pred_opt().unwrap_or(first_local);
        let to = span.end.with_timezone(&tz).date_naive();

        occurrences_in(pattern, DateWindow::new(from, to))
            .iter()
            .filter_map(|occurrence| occurrence.interval(tz, self.config.dst_policy))
            .any(|occupied| occupied.overlaps(span))
    }
}
