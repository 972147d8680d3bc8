use std::hint::black_box;

use chrono::{NaiveDate, NaiveTime};
use criterion::{criterion_group, criterion_main, Criterion};
use overlap_engine::types::EventStatus;
use overlap_engine::{
    expand, parse, EngineConfig, EventId, InMemoryCalendar, OwnerId, RecurrencePattern,
    RecurringConflictDetector, RecurringEvent,
};

fn pattern(rule: &str, start: (u32, u32), end: Option<NaiveDate>) -> RecurrencePattern {
    RecurrencePattern::new(
        parse(rule).unwrap(),
        NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        NaiveTime::from_hms_opt(start.0 + 1, start.1, 0).unwrap(),
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        end,
    )
    .unwrap()
}

fn bench_expand(c: &mut Criterion) {
    let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();

    let mut group = c.benchmark_group("expand_year");
    for rule in ["DAILY", "WEEKLY,2,MON,WED,FRI", "MONTHLY,DAY=31"] {
        let p = pattern(rule, (9, 0), None);
        group.bench_function(rule, |b| {
            b.iter(|| expand(black_box(&p), from, to, &p.skip_dates).count())
        });
    }
    group.finish();
}

fn bench_recurring_conflicts(c: &mut Criterion) {
    let mut calendar = InMemoryCalendar::new();
    for hour in 0..20 {
        calendar = calendar.with_recurring(RecurringEvent {
            id: EventId::new(format!("r{hour}")),
            owner: OwnerId::from("u"),
            pattern: pattern("WEEKLY,WEEKDAYS", (hour, 30), None),
            status: EventStatus::Confirmed,
        });
    }
    let detector = RecurringConflictDetector::new(&calendar, EngineConfig::default());
    let owner = OwnerId::from("u");
    let candidate = pattern("DAILY", (21, 0), None);

    c.bench_function("recurring_vs_20_open_ended", |b| {
        b.iter(|| {
            detector
                .validate_no_conflict(&owner, black_box(&candidate), None)
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_expand, bench_recurring_conflicts);
criterion_main!(benches);
