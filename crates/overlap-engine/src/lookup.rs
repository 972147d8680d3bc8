//! Read-only collaborators the detectors query for candidate overlap sets.
//!
//! Each lookup is a one-method trait so it can be passed as `&dyn` into a detector.
//! Closures with the matching signature implement the traits directly, which keeps
//! tests free of mock types:
//!
//! ```
//! use overlap_engine::lookup::PlainEventLookup;
//! use overlap_engine::types::{OwnerId, PlainEvent};
//! use overlap_engine::LookupError;
//! use chrono::{DateTime, Utc};
//!
//! let none = |_: &OwnerId, _: DateTime<Utc>, _: DateTime<Utc>| {
//!     Ok::<Vec<PlainEvent>, LookupError>(Vec::new())
//! };
//! let lookup: &dyn PlainEventLookup = &none;
//! # let _ = lookup;
//! ```
//!
//! Lookups are coarse filters: the detectors re-check owner, status, exclusion and
//! strict overlap on whatever they return.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::LookupError;
use crate::types::{OwnerId, PlainEvent, RecurringEvent};

/// Confirmed plain events of `owner` whose instant range intersects `[start, end]`.
pub trait PlainEventLookup {
    fn find_overlapping_plain_events(
        &self,
        owner: &OwnerId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlainEvent>, LookupError>;
}

/// Confirmed recurring events of `owner` whose date range may overlap `[from, to]`.
///
/// `to: None` asks for everything from `from` onwards; open-ended events always match.
pub trait RecurringEventLookup {
    fn find_overlapping_recurring_events(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<RecurringEvent>, LookupError>;
}

/// Confirmed recurring events of `owner` active at some point in `[from, to]`.
pub trait ConfirmedRecurringLookup {
    fn find_confirmed_recurring_events_between(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RecurringEvent>, LookupError>;
}

impl<F> PlainEventLookup for F
where
    F: Fn(&OwnerId, DateTime<Utc>, DateTime<Utc>) -> Result<Vec<PlainEvent>, LookupError>,
{
    fn find_overlapping_plain_events(
        &self,
        owner: &OwnerId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlainEvent>, LookupError> {
        self(owner, start, end)
    }
}

impl<F> RecurringEventLookup for F
where
    F: Fn(&OwnerId, NaiveDate, Option<NaiveDate>) -> Result<Vec<RecurringEvent>, LookupError>,
{
    fn find_overlapping_recurring_events(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: Option<NaiveDate>,
    ) -> Result<Vec<RecurringEvent>, LookupError> {
        self(owner, from, to)
    }
}

impl<F> ConfirmedRecurringLookup for F
where
    F: Fn(&OwnerId, NaiveDate, NaiveDate) -> Result<Vec<RecurringEvent>, LookupError>,
{
    fn find_confirmed_recurring_events_between(
        &self,
        owner: &OwnerId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RecurringEvent>, LookupError> {
        self(owner, from, to)
    }
}
