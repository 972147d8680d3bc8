//! Error types for overlap-engine operations.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::types::EventId;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or self-contradictory recurrence text.
    #[error("Invalid recurrence pattern at `{token}`: {reason}")]
    InvalidPattern { token: String, reason: String },

    /// An end that is not strictly after its start.
    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    /// The candidate overlaps one or more existing events.
    #[error("Conflicts with {}", format_ids(.ids))]
    Conflict { ids: BTreeSet<EventId> },

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl EngineError {
    pub(crate) fn invalid_pattern(token: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidPattern {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// The conflicting IDs when this is a [`EngineError::Conflict`].
    pub fn conflicting_ids(&self) -> Option<&BTreeSet<EventId>> {
        match self {
            EngineError::Conflict { ids } => Some(ids),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure raised by an injected lookup. The collaborator's error is kept as the source.
#[derive(Error, Debug)]
#[error("calendar lookup failed")]
pub struct LookupError(#[source] Box<dyn std::error::Error + Send + Sync + 'static>);

impl LookupError {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        LookupError(source.into())
    }

    /// Borrow the underlying collaborator error.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

fn format_ids(ids: &BTreeSet<EventId>) -> String {
    ids.iter()
        .map(EventId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
