//! RFC 5545 export, cross-checked against the `rrule` crate's own expansion.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::America::New_York;
use overlap_engine::rfc5545::{to_rrule_line, to_rrule_set};
use overlap_engine::{expand, parse, EngineError, RecurrencePattern};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn pattern(rule: &str, start: NaiveDate, end: Option<NaiveDate>) -> RecurrencePattern {
    RecurrencePattern::new(
        parse(rule).unwrap(),
        NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        start,
        end,
    )
    .unwrap()
}

/// Local dates `rrule` produces for the exported set, at most `limit` of them.
fn rrule_dates(pattern: &RecurrencePattern, limit: u16) -> Vec<NaiveDate> {
    let set = to_rrule_set(pattern).expect("export should parse");
    set.all(limit)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&pattern.timezone).date_naive())
        .collect()
}

fn engine_dates(pattern: &RecurrencePattern, to: NaiveDate) -> Vec<NaiveDate> {
    expand(pattern, pattern.start_date, to, &pattern.skip_dates).collect()
}

// ---------------------------------------------------------------------------
// RRULE text
// ---------------------------------------------------------------------------

#[test]
fn daily_line() {
    let p = pattern("DAILY", date(2025, 7, 1), None);
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=DAILY");
}

#[test]
fn biweekly_line_lists_days_monday_first() {
    let p = pattern("WEEKLY,2,WED,MON", date(2025, 7, 7), None);
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE");
}

#[test]
fn weekly_without_days_uses_start_weekday() {
    // 2025-07-03 is a Thursday.
    let p = pattern("WEEKLY", date(2025, 7, 3), None);
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=WEEKLY;BYDAY=TH");
}

#[test]
fn late_month_day_clamps_with_setpos() {
    let p = pattern("MONTHLY,DAY=31", date(2026, 1, 31), None);
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=MONTHLY;BYMONTHDAY=31,-1;BYSETPOS=1");

    let p = pattern("MONTHLY,DAY=12", date(2026, 1, 12), None);
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=MONTHLY;BYMONTHDAY=12");
}

#[test]
fn until_carries_end_of_day() {
    let p = pattern("DAILY", date(2025, 7, 1), Some(date(2025, 7, 31)));
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=DAILY;UNTIL=20250731T235959Z");

    let p = p.in_timezone(New_York);
    assert_eq!(to_rrule_line(&p).unwrap(), "FREQ=DAILY;UNTIL=20250731T235959");
}

#[test]
fn draft_has_no_rrule() {
    let p = pattern("UNSPECIFIED", date(2025, 7, 1), None);
    assert_eq!(to_rrule_line(&p), None);
    assert!(matches!(to_rrule_set(&p), Err(EngineError::InvalidPattern { .. })));
}

// ---------------------------------------------------------------------------
// Agreement with rrule
// ---------------------------------------------------------------------------

#[test]
fn every_third_day_agrees() {
    let p = pattern("DAILY,3", date(2025, 7, 1), Some(date(2025, 8, 31)));
    assert_eq!(rrule_dates(&p, 500), engine_dates(&p, date(2025, 8, 31)));
}

#[test]
fn biweekly_multi_day_agrees() {
    let p = pattern("WEEKLY,2,MON,WED", date(2026, 1, 5), Some(date(2026, 3, 31)));
    let engine = engine_dates(&p, date(2026, 3, 31));
    let first_weeks = [date(2026, 1, 5), date(2026, 1, 7), date(2026, 1, 19), date(2026, 1, 21)];
    assert_eq!(engine[..4], first_weeks);
    assert_eq!(rrule_dates(&p, 500), engine);
}

#[test]
fn weekends_agree() {
    // 2025-07-05 is a Saturday.
    let p = pattern("WEEKLY,WEEKENDS", date(2025, 7, 5), Some(date(2025, 9, 30)));
    assert_eq!(rrule_dates(&p, 500), engine_dates(&p, date(2025, 9, 30)));
}

#[test]
fn clamped_month_end_agrees() {
    let p = pattern("MONTHLY,DAY=31", date(2026, 1, 31), Some(date(2026, 12, 31)));
    let engine = engine_dates(&p, date(2026, 12, 31));
    assert_eq!(engine.len(), 12);
    assert_eq!(engine[1], date(2026, 2, 28));
    assert_eq!(engine[3], date(2026, 4, 30));
    assert_eq!(rrule_dates(&p, 500), engine);
}

#[test]
fn every_other_month_agrees() {
    let p = pattern("MONTHLY,2,DAY=15", date(2025, 1, 15), Some(date(2025, 12, 31)));
    assert_eq!(rrule_dates(&p, 500), engine_dates(&p, date(2025, 12, 31)));
}

#[test]
fn skip_dates_become_exdates_in_zone() {
    let p = pattern("WEEKLY,TUE,THU", date(2025, 10, 28), None)
        .in_timezone(New_York)
        .with_skip_dates([date(2025, 10, 30), date(2025, 11, 4)]);

    // Crosses the November DST change; dates stay on local Tuesdays and Thursdays.
    let mut engine = engine_dates(&p, date(2025, 12, 31));
    engine.truncate(8);
    assert_eq!(engine[0], date(2025, 10, 28));
    assert_eq!(engine[1], date(2025, 11, 6));
    // The rrule limit counts instances before EXDATE filtering.
    let mut exported = rrule_dates(&p, 20);
    exported.truncate(8);
    assert_eq!(exported, engine);
}
