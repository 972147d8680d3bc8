//! In-memory implementation of every lookup, for tools and tests.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::lookup::{ConfirmedRecurringLookup, PlainEventLookup, RecurringEventLookup};
use crate::types::{EventId, EventStatus, Interval, OwnerId, PlainEvent, RecurringEvent};

/// A snapshot of plain and recurring events held in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryCalendar {
    #[serde(default)]
    pub plain_events: Vec<PlainEvent>,
    #[serde(default)]
    pub recurring_events: Vec<RecurringEvent>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_plain(mut self, event: PlainEvent) -> Self {
        self.plain_events.push(event);
        self
    }

    #[must_use]
    pub fn with_recurring(mut self, event: RecurringEvent) -> Self {
        self.recurring_events.push(event);
        self
    }

    pub fn recurring_event(&self, id: &EventId) -> Option<&RecurringEvent> {
        self.recurring_events.iter().find(|event| &event.id == id)
    }

    fn confirmed_recurring<'a>(
        &'a self,
        owner: &'a OwnerId,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> impl Iterator<Item = &'a RecurringEvent> + 'a {
        self.recurring_events.iter().filter(move |event| {
            event.status == EventStatus::Confirmed
                && &event.owner == owner
                && to.is_none_or(|to| event.pattern.start_date <= to)
                && event.pattern.end_date.is_none_or(|end| end >= from)
        })
    }
}

impl PlainEventLookup for InMemoryCalendar {
    fn find_overlapping_plain_events(
        &self,
        owner: &OwnerId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlainEvent>, LookupError> {
        let query = Interval { start, end };
        Ok(self
            .plain_events
            .iter()
            .filter(|event| {
                event.status == EventStatus::Confirmed
                    && &event.span.owner == owner
                    && event.span.interval().overlaps(&query)
            })
            .cloned()
            .collect())
    }
}

impl RecurringEventLookup for InMemoryCalendar {
    fn find_overlapping_recurring_events(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<RecurringEvent>, LookupError> {
        Ok(self.confirmed_recurring(owner, from, to).cloned().collect())
    }
}

impl ConfirmedRecurringLookup for InMemoryCalendar {
    fn find_confirmed_recurring_events_between(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RecurringEvent>, LookupError> {
        Ok(self.confirmed_recurring(owner, from, Some(to)).cloned().collect())
    }
}
