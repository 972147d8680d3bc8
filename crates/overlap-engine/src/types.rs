//! Entity snapshots handed to the engine by the calling layer.
//!
//! Nothing here is persisted or mutated by the engine. Plain events are stored as
//! absolute UTC instants; recurring events carry a [`RecurrencePattern`] whose
//! times are local to the event's zone.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::pattern::RecurrencePattern;

/// Opaque identifier of a persisted plain or recurring event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        EventId(id.to_string())
    }
}

impl From<String> for EventId {
    fn from(id: String) -> Self {
        EventId(id)
    }
}

/// Identifier of the user who owns events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        OwnerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        OwnerId(id.to_string())
    }
}

/// Whether an event takes part in conflict checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Confirmed,
    /// Unconfirmed placeholder; never considered a conflict source.
    Draft,
}

/// A timed span owned by a user.
///
/// A missing `end` is a zero-duration point at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub owner: OwnerId,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeSpan {
    /// Build a span, rejecting an end that is not strictly after the start.
    pub fn new(
        owner: impl Into<OwnerId>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let span = TimeSpan {
            owner: owner.into(),
            start,
            end,
        };
        span.validate()?;
        Ok(span)
    }

    pub fn validate(&self) -> Result<()> {
        match self.end {
            Some(end) if end <= self.start => Err(EngineError::InvalidTimeRange(format!(
                "span end {} is not after start {}",
                end.to_rfc3339(),
                self.start.to_rfc3339()
            ))),
            _ => Ok(()),
        }
    }

    /// End instant, collapsing an open end onto the start.
    pub fn end_or_start(&self) -> DateTime<Utc> {
        self.end.unwrap_or(self.start)
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end_or_start(),
        }
    }
}

/// Half-open `[start, end)` range of absolute instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Strictly positive overlap, or a point strictly inside the other range.
    ///
    /// Adjacent intervals where one ends exactly when another starts do NOT overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn overlap_minutes(&self, other: &Interval) -> i64 {
        if !self.overlaps(other) {
            return 0;
        }
        (self.end.min(other.end) - self.start.max(other.start)).num_minutes()
    }
}

/// A persisted single-occurrence event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainEvent {
    pub id: EventId,
    pub span: TimeSpan,
    #[serde(default)]
    pub status: EventStatus,
}

/// A persisted recurring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringEvent {
    pub id: EventId,
    pub owner: OwnerId,
    pub pattern: RecurrencePattern,
    #[serde(default)]
    pub status: EventStatus,
}
