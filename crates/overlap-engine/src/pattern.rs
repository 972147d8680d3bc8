//! Recurrence rules and patterns: parsing compact rule text and rendering it back.
//!
//! A [`RecurrenceRule`] is the frequency part of a schedule (`"WEEKLY,2,MON,WED"`).
//! A [`RecurrencePattern`] binds a rule to local times, a date range, skip dates and
//! the time zone the local times are expressed in.
//!
//! # Grammar
//!
//! ```text
//! rule     := "UNSPECIFIED" | freq ("," item)* (";" bound)*
//! freq     := DAILY | WEEKLY | BIWEEKLY | MONTHLY
//! item     := interval | weekday | WEEKDAYS | WEEKENDS | "DAY=" 1..31
//! bound    := "FROM=" YYYY-MM-DD | "UNTIL=" YYYY-MM-DD
//! ```
//!
//! Tokens are case-insensitive. Weekdays accept two-letter, three-letter and full
//! English names. The canonical form produced by [`build_summary`] always parses back
//! to an equal rule.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Reserved rule text for an unconfirmed draft schedule.
pub const UNSPECIFIED: &str = "UNSPECIFIED";

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Draft placeholder. Never produces an occurrence.
    Unspecified,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Unspecified => UNSPECIFIED,
        }
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A set of weekdays, iterated Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DaySet(u8);

impl DaySet {
    pub const EMPTY: DaySet = DaySet(0);
    pub const WEEKDAYS: DaySet = DaySet(0b0001_1111);
    pub const WEEKENDS: DaySet = DaySet(0b0110_0000);

    pub fn single(day: Weekday) -> Self {
        DaySet(1 << day.num_days_from_monday())
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn union(self, other: DaySet) -> DaySet {
        DaySet(self.0 | other.0)
    }

    pub fn intersection(self, other: DaySet) -> DaySet {
        DaySet(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEK.into_iter().filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = DaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// The repeating part of a schedule, independent of dates and times.
///
/// An empty `days_of_week` on a weekly rule and a missing `day_of_month` on a monthly
/// rule both defer to the start date of the pattern the rule is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub days_of_week: DaySet,
    pub day_of_month: Option<u32>,
}

impl RecurrenceRule {
    pub fn daily() -> Self {
        Self::with_frequency(Frequency::Daily)
    }

    pub fn weekly(days: impl IntoIterator<Item = Weekday>) -> Self {
        RecurrenceRule {
            days_of_week: days.into_iter().collect(),
            ..Self::with_frequency(Frequency::Weekly)
        }
    }

    pub fn monthly(day_of_month: Option<u32>) -> Self {
        RecurrenceRule {
            day_of_month,
            ..Self::with_frequency(Frequency::Monthly)
        }
    }

    pub fn unspecified() -> Self {
        Self::with_frequency(Frequency::Unspecified)
    }

    /// Repeat every `interval` periods.
    #[must_use]
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    fn with_frequency(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency,
            interval: 1,
            days_of_week: DaySet::EMPTY,
            day_of_month: None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.frequency == Frequency::Unspecified
    }

    /// Check the frequency/qualifier combination. [`parse`] only ever yields valid rules;
    /// this guards rules assembled by hand or deserialized from elsewhere.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(EngineError::invalid_pattern("0", "interval must be at least 1"));
        }
        if self.frequency != Frequency::Weekly && !self.days_of_week.is_empty() {
            let token = self.days_of_week.iter().map(weekday_code).collect::<Vec<_>>();
            return Err(EngineError::invalid_pattern(
                token.join(","),
                format!("day-of-week qualifiers do not apply to {}", self.frequency.as_str()),
            ));
        }
        match (self.frequency, self.day_of_month) {
            (Frequency::Monthly, Some(day)) if !(1..=31).contains(&day) => Err(
                EngineError::invalid_pattern(format!("DAY={day}"), "day of month must be 1..=31"),
            ),
            (Frequency::Monthly, _) | (_, None) => Ok(()),
            (freq, Some(day)) => Err(EngineError::invalid_pattern(
                format!("DAY={day}"),
                format!("DAY= does not apply to {}", freq.as_str()),
            )),
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.frequency.as_str())?;
        if self.is_unspecified() {
            return Ok(());
        }
        if self.interval != 1 {
            write!(f, ",{}", self.interval)?;
        }
        for day in self.days_of_week.iter() {
            write!(f, ",{}", weekday_code(day))?;
        }
        if let Some(day) = self.day_of_month {
            write!(f, ",DAY={day}")?;
        }
        Ok(())
    }
}

impl FromStr for RecurrenceRule {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl TryFrom<String> for RecurrenceRule {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self> {
        parse(&value)
    }
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.to_string()
    }
}

/// A rule together with the optional `FROM`/`UNTIL` bounds found in its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRule {
    pub rule: RecurrenceRule,
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

/// Parse rule text into a [`RecurrenceRule`], accepting and validating any bounds.
///
/// # Errors
/// Returns `EngineError::InvalidPattern` naming the first offending token.
pub fn parse(text: &str) -> Result<RecurrenceRule> {
    parse_with_bounds(text).map(|parsed| parsed.rule)
}

/// Parse rule text, keeping the `FROM`/`UNTIL` bounds of a rendered summary.
pub fn parse_with_bounds(text: &str) -> Result<ParsedRule> {
    let text = text.trim();
    if text.is_empty() {
        return Err(EngineError::invalid_pattern("", "empty recurrence text"));
    }

    let mut sections = text.split(';');
    let rule = parse_rule(sections.next().unwrap_or_default())?;

    let mut from = None;
    let mut until = None;
    for section in sections {
        let section = section.trim();
        if rule.is_unspecified() {
            return Err(EngineError::invalid_pattern(section, "UNSPECIFIED takes no bounds"));
        }
        let (key, value) = section.split_once('=').ok_or_else(|| {
            EngineError::invalid_pattern(section, "expected FROM=<date> or UNTIL=<date>")
        })?;
        let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| EngineError::invalid_pattern(section, "expected a YYYY-MM-DD date"))?;
        let slot = match key.trim().to_ascii_uppercase().as_str() {
            "FROM" => &mut from,
            "UNTIL" => &mut until,
            _ => return Err(EngineError::invalid_pattern(section, "unknown bound")),
        };
        if slot.replace(date).is_some() {
            return Err(EngineError::invalid_pattern(section, "bound given more than once"));
        }
    }

    if let (Some(from), Some(until)) = (from, until) {
        if until < from {
            return Err(EngineError::invalid_pattern(
                format!("UNTIL={until}"),
                format!("ends before FROM={from}"),
            ));
        }
    }

    Ok(ParsedRule { rule, from, until })
}

fn parse_rule(head: &str) -> Result<RecurrenceRule> {
    let mut tokens = head.split(',').map(str::trim);
    let freq_token = tokens.next().unwrap_or_default();

    let (frequency, mut interval) = match freq_token.to_ascii_uppercase().as_str() {
        "DAILY" => (Frequency::Daily, None),
        "WEEKLY" => (Frequency::Weekly, None),
        "BIWEEKLY" => (Frequency::Weekly, Some(2)),
        "MONTHLY" => (Frequency::Monthly, None),
        UNSPECIFIED => (Frequency::Unspecified, None),
        "" => return Err(EngineError::invalid_pattern(head, "missing frequency")),
        _ => return Err(EngineError::invalid_pattern(freq_token, "unknown frequency")),
    };

    let mut days = DaySet::EMPTY;
    let mut day_of_month = None;
    let mut qualified = false;

    for token in tokens {
        if token.is_empty() {
            return Err(EngineError::invalid_pattern(head, "empty token"));
        }
        if frequency == Frequency::Unspecified {
            return Err(EngineError::invalid_pattern(
                token,
                "UNSPECIFIED takes no qualifiers",
            ));
        }
        let upper = token.to_ascii_uppercase();

        if upper.bytes().all(|b| b.is_ascii_digit()) {
            let n: u32 = upper
                .parse()
                .map_err(|_| EngineError::invalid_pattern(token, "interval out of range"))?;
            if interval.is_some() {
                return Err(EngineError::invalid_pattern(token, "interval given more than once"));
            }
            if qualified {
                return Err(EngineError::invalid_pattern(
                    token,
                    "interval must precede day qualifiers",
                ));
            }
            if n == 0 {
                return Err(EngineError::invalid_pattern(token, "interval must be at least 1"));
            }
            interval = Some(n);
            continue;
        }

        if let Some(value) = upper.strip_prefix("DAY=") {
            if frequency != Frequency::Monthly {
                return Err(EngineError::invalid_pattern(
                    token,
                    format!("DAY= does not apply to {}", frequency.as_str()),
                ));
            }
            let day = value
                .parse::<u32>()
                .ok()
                .filter(|d| (1..=31).contains(d))
                .ok_or_else(|| EngineError::invalid_pattern(token, "day of month must be 1..=31"))?;
            if day_of_month.replace(day).is_some() {
                return Err(EngineError::invalid_pattern(token, "DAY= given more than once"));
            }
            qualified = true;
            continue;
        }

        let set = match upper.as_str() {
            "WEEKDAYS" => DaySet::WEEKDAYS,
            "WEEKENDS" => DaySet::WEEKENDS,
            _ => parse_weekday(&upper)
                .map(DaySet::single)
                .ok_or_else(|| EngineError::invalid_pattern(token, "unknown token"))?,
        };
        if frequency != Frequency::Weekly {
            return Err(EngineError::invalid_pattern(
                token,
                format!("day-of-week qualifiers do not apply to {}", frequency.as_str()),
            ));
        }
        days = days.union(set);
        qualified = true;
    }

    Ok(RecurrenceRule {
        frequency,
        interval: interval.unwrap_or(1),
        days_of_week: days,
        day_of_month,
    })
}

fn parse_weekday(upper: &str) -> Option<Weekday> {
    match upper {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        // chrono accepts three-letter and full names, case-insensitively.
        _ => upper.parse().ok(),
    }
}

pub(crate) fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

/// Render the canonical text for a rule bound to a date range.
///
/// The same rule and bounds always produce the same string, and the string parses back
/// (via [`parse_with_bounds`]) to an equal rule and equal bounds. A draft rule renders
/// as `UNSPECIFIED` alone; its bounds are dropped.
pub fn build_summary(rule: &RecurrenceRule, start: NaiveDate, end: Option<NaiveDate>) -> String {
    if rule.is_unspecified() {
        return rule.to_string();
    }
    let mut summary = format!("{rule};FROM={}", start.format("%Y-%m-%d"));
    if let Some(end) = end {
        summary.push_str(&format!(";UNTIL={}", end.format("%Y-%m-%d")));
    }
    summary
}

fn default_timezone() -> Tz {
    Tz::UTC
}

/// A rule bound to local times, a date range and skip dates.
///
/// `end_time < start_time` means every occurrence crosses midnight and ends on the
/// following calendar day. `end_date: None` is an open-ended recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub rule: RecurrenceRule,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub skip_dates: BTreeSet<NaiveDate>,
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl RecurrencePattern {
    /// Bind `rule` to a schedule in UTC. Use [`RecurrencePattern::in_timezone`] for
    /// local schedules.
    ///
    /// # Errors
    /// `InvalidPattern` for a bad rule, `InvalidTimeRange` when the local start equals
    /// the local end or the end date precedes the start date.
    pub fn new(
        rule: RecurrenceRule,
        start_time: NaiveTime,
        end_time: NaiveTime,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self> {
        let pattern = RecurrencePattern {
            rule,
            start_time,
            end_time,
            start_date,
            end_date,
            skip_dates: BTreeSet::new(),
            timezone: Tz::UTC,
        };
        pattern.validate()?;
        Ok(pattern)
    }

    #[must_use]
    pub fn in_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    #[must_use]
    pub fn with_skip_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.skip_dates.extend(dates);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.rule.validate()?;
        if self.start_time == self.end_time {
            return Err(EngineError::InvalidTimeRange(format!(
                "local start {} equals local end",
                self.start_time
            )));
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(EngineError::InvalidTimeRange(format!(
                    "end date {end} is before start date {}",
                    self.start_date
                )));
            }
        }
        Ok(())
    }

    /// Occurrences end on the calendar day after they start.
    pub fn crosses_midnight(&self) -> bool {
        self.end_time < self.start_time
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// Weekdays a weekly rule fires on, defaulting to the start date's weekday.
    pub fn weekdays(&self) -> DaySet {
        if self.rule.days_of_week.is_empty() {
            DaySet::single(self.start_date.weekday())
        } else {
            self.rule.days_of_week
        }
    }

    /// Day of month a monthly rule fires on, defaulting to the start date's day.
    pub fn day_of_month(&self) -> u32 {
        self.rule.day_of_month.unwrap_or_else(|| self.start_date.day())
    }

    /// Whether `date` lies inside `[start_date, end_date]`.
    pub fn in_range(&self, date: NaiveDate) -> bool {
        date >= self.start_date && self.end_date.is_none_or(|end| date <= end)
    }

    /// Canonical summary of this pattern's rule and date range.
    pub fn summary(&self) -> String {
        build_summary(&self.rule, self.start_date, self.end_date)
    }
}
