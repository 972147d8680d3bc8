//! # overlap-engine
//!
//! Recurrence expansion and time-conflict detection for calendar backends.
//!
//! The engine decides whether a candidate event, single or recurring, would overlap
//! an event the same user already owns. It is a pure decision function: it reads
//! snapshots through injected lookups and returns a [`ConflictVerdict`], never
//! storing or mutating anything. Recurring patterns are defined in local time and
//! compared against events stored as UTC instants, and comparisons involving
//! open-ended recurrences are bounded to a fixed window.
//!
//! ## Modules
//!
//! - [`pattern`] — rule text ⇄ [`RecurrenceRule`], canonical summaries, patterns
//! - [`expander`] — pattern + date window → occurrence dates
//! - [`conflict`] — single-event, recurring and skip-day detectors
//! - [`window`] — comparison windows and the open-ended cap
//! - [`dst`] — DST gap/overlap policies
//! - [`lookup`] — collaborator traits the detectors query
//! - [`memory`] — in-memory lookup implementation
//! - [`rfc5545`] — `RRULE` export via the `rrule` crate
//! - [`storage`] — far-future sentinel handling at the persistence boundary
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use overlap_engine::{parse, expand};
//! use overlap_engine::pattern::RecurrencePattern;
//! use chrono::{NaiveDate, NaiveTime};
//!
//! let rule = parse("WEEKLY,2").unwrap();
//! let start = NaiveDate::from_ymd_opt(2025, 7, 7).unwrap();
//! let pattern = RecurrencePattern::new(
//!     rule,
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
//!     start,
//!     None,
//! )
//! .unwrap();
//!
//! let end = NaiveDate::from_ymd_opt(2025, 8, 3).unwrap();
//! let dates: Vec<_> = expand(&pattern, start, end, &pattern.skip_dates).collect();
//! assert_eq!(dates, vec![start, NaiveDate::from_ymd_opt(2025, 7, 21).unwrap()]);
//! ```

pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod expander;
pub mod lookup;
pub mod memory;
pub mod pattern;
pub mod rfc5545;
pub mod storage;
pub mod types;
pub mod window;

pub use config::EngineConfig;
pub use conflict::recurring::RecurringConflictDetector;
pub use conflict::single::SingleEventDetector;
pub use conflict::skip_days::SkipDayValidator;
pub use conflict::ConflictVerdict;
pub use error::{EngineError, LookupError};
pub use expander::{expand, occurs_on, Occurrence};
pub use memory::InMemoryCalendar;
pub use pattern::{build_summary, parse, parse_with_bounds, RecurrencePattern, RecurrenceRule};
pub use types::{EventId, OwnerId, PlainEvent, RecurringEvent, TimeSpan};
