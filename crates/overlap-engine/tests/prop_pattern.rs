//! Property-based tests for rule text and pattern expansion using proptest.
//!
//! These check invariants that hold for any valid rule, complementing the fixed
//! examples in `pattern_tests.rs` and `expander_tests.rs`.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};
use overlap_engine::pattern::{Frequency, ParsedRule};
use overlap_engine::{build_summary, expand, occurs_on, parse_with_bounds};
use overlap_engine::{RecurrencePattern, RecurrenceRule};
use proptest::prelude::*;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_weekdays() -> impl Strategy<Value = Vec<Weekday>> {
    (0u8..128).prop_map(|mask| {
        WEEK.into_iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, day)| day)
            .collect()
    })
}

fn arb_rule() -> impl Strategy<Value = RecurrenceRule> {
    let interval = 1u32..=4;
    prop_oneof![
        interval.clone().prop_map(|n| RecurrenceRule::daily().every(n)),
        (interval.clone(), arb_weekdays())
            .prop_map(|(n, days)| RecurrenceRule::weekly(days).every(n)),
        (interval, proptest::option::of(1u32..=31))
            .prop_map(|(n, day)| RecurrenceRule::monthly(day).every(n)),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2024i32..=2027, 1u32..=12, 1u32..=31).prop_map(|(y, m, d)| {
        (1..=d)
            .rev()
            .find_map(|day| NaiveDate::from_ymd_opt(y, m, day))
            .unwrap()
    })
}

prop_compose! {
    fn arb_pattern()(
        rule in arb_rule(),
        start in arb_date(),
        length in proptest::option::of(0u64..400),
        skip_offsets in proptest::collection::vec(0u64..120, 0..6),
    ) -> RecurrencePattern {
        let end = length.map(|days| start + Days::new(days));
        let skips: Vec<_> = skip_offsets.into_iter().map(|days| start + Days::new(days)).collect();
        RecurrencePattern::new(
            rule,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            start,
            end,
        )
        .unwrap()
        .with_skip_dates(skips)
    }
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: summaries parse back to the same rule and bounds
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn summary_round_trips(
        rule in arb_rule(),
        start in arb_date(),
        length in proptest::option::of(0u64..2000),
    ) {
        let end = length.map(|days| start + Days::new(days));
        let summary = build_summary(&rule, start, end);
        let parsed = parse_with_bounds(&summary).unwrap();
        prop_assert_eq!(parsed, ParsedRule { rule, from: Some(start), until: end });
    }
}

// ---------------------------------------------------------------------------
// Property 2: expansion is ascending, bounded and honours skips
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_stays_in_bounds(
        pattern in arb_pattern(),
        lead in 0u64..60,
        span in 0u64..120,
    ) {
        let from = pattern.start_date - Days::new(lead);
        let to = from + Days::new(span);
        let dates: Vec<_> = expand(&pattern, from, to, &pattern.skip_dates).collect();

        for pair in dates.windows(2) {
            prop_assert!(pair[0] < pair[1], "not strictly ascending: {:?}", pair);
        }
        for date in &dates {
            prop_assert!(from <= *date && *date <= to, "{} outside window", date);
            prop_assert!(pattern.in_range(*date), "{} outside pattern range", date);
            prop_assert!(!pattern.skip_dates.contains(date), "{} is skipped", date);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: expansion agrees with single-date membership
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn expansion_matches_occurs_on(pattern in arb_pattern(), span in 0u64..120) {
        let from = pattern.start_date;
        let to = from + Days::new(span);
        let expanded: BTreeSet<_> = expand(&pattern, from, to, &pattern.skip_dates).collect();
        let checked: BTreeSet<_> = from
            .iter_days()
            .take_while(|date| *date <= to)
            .filter(|date| occurs_on(&pattern, *date))
            .collect();
        prop_assert_eq!(expanded, checked);
    }
}

// ---------------------------------------------------------------------------
// Property 4: expanded dates respect the rule's qualifiers
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn dates_respect_qualifiers(pattern in arb_pattern()) {
        let to = pattern.start_date + Days::new(400);
        let days = pattern.weekdays();
        let ordinal = pattern.day_of_month();

        for date in expand(&pattern, pattern.start_date, to, &pattern.skip_dates) {
            match pattern.rule.frequency {
                Frequency::Weekly => prop_assert!(days.contains(date.weekday())),
                Frequency::Monthly => {
                    let last = (28..=31)
                        .rev()
                        .find(|d| NaiveDate::from_ymd_opt(date.year(), date.month(), *d).is_some())
                        .unwrap();
                    prop_assert_eq!(date.day(), ordinal.min(last));
                }
                Frequency::Daily => {
                    let offset = (date - pattern.start_date).num_days();
                    prop_assert_eq!(offset % i64::from(pattern.rule.interval), 0);
                }
                Frequency::Unspecified => prop_assert!(false, "draft rules never expand"),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: the iterator is restartable
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn cloned_iterator_replays(pattern in arb_pattern()) {
        let to = pattern.start_date + Days::new(90);
        let iter = expand(&pattern, pattern.start_date, to, &pattern.skip_dates);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        prop_assert_eq!(first, second);
    }
}
