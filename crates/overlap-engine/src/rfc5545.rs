//! RFC 5545 export -- renders a pattern as an `RRULE` and an [`RRuleSet`].
//!
//! Expansion inside the engine never goes through `rrule`; the export is for handing
//! schedules to iCalendar consumers. Monthly rules for the 29th-31st use
//! `BYMONTHDAY=n,-1;BYSETPOS=1` so shorter months clamp to their last day instead of
//! being skipped.

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::error::{EngineError, Result};
use crate::pattern::{Frequency, RecurrencePattern, UNSPECIFIED};

const ICAL_DATETIME: &str = "%Y%m%dT%H%M%S";

/// `RRULE` value for `pattern`, or `None` for a draft (`UNSPECIFIED`) pattern.
pub fn to_rrule_line(pattern: &RecurrencePattern) -> Option<String> {
    let rule = &pattern.rule;
    let mut line = match rule.frequency {
        Frequency::Daily => "FREQ=DAILY".to_string(),
        Frequency::Weekly => "FREQ=WEEKLY".to_string(),
        Frequency::Monthly => "FREQ=MONTHLY".to_string(),
        Frequency::Unspecified => return None,
    };

    if rule.interval > 1 {
        line.push_str(&format!(";INTERVAL={}", rule.interval));
    }

    match rule.frequency {
        Frequency::Weekly => {
            let days: Vec<&str> = pattern.weekdays().iter().map(ical_weekday).collect();
            line.push_str(&format!(";BYDAY={}", days.join(",")));
        }
        Frequency::Monthly => {
            let day = pattern.day_of_month();
            if day > 28 {
                line.push_str(&format!(";BYMONTHDAY={day},-1;BYSETPOS=1"));
            } else {
                line.push_str(&format!(";BYMONTHDAY={day}"));
            }
        }
        Frequency::Daily | Frequency::Unspecified => {}
    }

    if let Some(end) = pattern.end_date {
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        let mut until = end.and_time(last_second).format(ICAL_DATETIME).to_string();
        // UNTIL must share DTSTART's form: UTC carries a "Z", other zones stay local.
        if pattern.timezone == Tz::UTC {
            until.push('Z');
        }
        line.push_str(&format!(";UNTIL={until}"));
    }

    Some(line)
}

/// Full iCalendar recurrence set: `DTSTART`, `RRULE` and one `EXDATE` per skip date.
///
/// # Errors
/// Returns `EngineError::InvalidPattern` for draft patterns, or if `rrule` rejects the
/// rendered text.
pub fn to_rrule_set(pattern: &RecurrencePattern) -> Result<RRuleSet> {
    let line = to_rrule_line(pattern).ok_or_else(|| {
        EngineError::invalid_pattern(UNSPECIFIED, "draft patterns have no RFC 5545 form")
    })?;

    let tz = pattern.timezone.name();
    let dtstart = pattern
        .start_date
        .and_time(pattern.start_time)
        .format(ICAL_DATETIME);
    let mut text = format!("DTSTART;TZID={tz}:{dtstart}\nRRULE:{line}");

    if !pattern.skip_dates.is_empty() {
        let exdates: Vec<String> = pattern
            .skip_dates
            .iter()
            .map(|date| date.and_time(pattern.start_time).format(ICAL_DATETIME).to_string())
            .collect();
        text.push_str(&format!("\nEXDATE;TZID={tz}:{}", exdates.join(",")));
    }

    text.parse()
        .map_err(|e: rrule::RRuleError| EngineError::invalid_pattern(line, e.to_string()))
}

fn ical_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}
