//! Integration tests for the `overlap` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the parse, summary,
//! expand and check subcommands through the actual binary, including stdin input,
//! exit codes and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn overlap() -> Command {
    let mut cmd = Command::cargo_bin("overlap").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn line_count(expected: usize) -> impl Predicate<str> {
    predicate::function(move |out: &str| out.lines().count() == expected)
}

// ─────────────────────────────────────────────────────────────────────────────
// parse / summary
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn parse_prints_rule_parts() {
    overlap()
        .args(["parse", "WEEKLY,2,MON,FRI;FROM=2025-07-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""frequency": "WEEKLY""#))
        .stdout(predicate::str::contains(r#""interval": 2"#))
        .stdout(predicate::str::contains(r#""MON""#))
        .stdout(predicate::str::contains(r#""FRI""#))
        .stdout(predicate::str::contains(r#""from": "2025-07-01""#))
        .stdout(predicate::str::contains(r#""until": null"#));
}

#[test]
fn parse_rejects_unknown_frequency() {
    overlap()
        .args(["parse", "FORTNIGHTLY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FORTNIGHTLY"));
}

#[test]
fn summary_is_canonical() {
    overlap()
        .args(["summary", "weekly, fri, mon", "--from", "2025-07-01", "--until", "2025-12-31"])
        .assert()
        .success()
        .stdout("WEEKLY,MON,FRI;FROM=2025-07-01;UNTIL=2025-12-31\n");
}

#[test]
fn summary_open_ended_omits_until() {
    overlap()
        .args(["summary", "biweekly", "--from", "2025-07-01"])
        .assert()
        .success()
        .stdout("WEEKLY,2;FROM=2025-07-01\n");
}

#[test]
fn summary_rejects_inverted_range() {
    overlap()
        .args(["summary", "DAILY", "--from", "2025-07-01", "--until", "2025-06-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("before"));
}

// ─────────────────────────────────────────────────────────────────────────────
// expand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn expand_biweekly_lists_two_dates_in_four_weeks() {
    overlap()
        .args(["expand", "WEEKLY,2;FROM=2025-07-07", "--start", "09:00", "--end", "10:00"])
        .args(["--to", "2025-08-03"])
        .assert()
        .success()
        .stdout(line_count(2))
        .stdout(predicate::str::contains(
            "2025-07-07  2025-07-07T09:00:00+00:00  2025-07-07T10:00:00+00:00",
        ))
        .stdout(predicate::str::contains("2025-07-21  "));
}

#[test]
fn expand_resolves_local_times_in_zone() {
    overlap()
        .args(["expand", "DAILY;FROM=2025-07-01;UNTIL=2025-07-01"])
        .args(["--start", "09:00", "--end", "10:00", "--tz", "Europe/Berlin"])
        .assert()
        .success()
        .stdout("2025-07-01  2025-07-01T07:00:00+00:00  2025-07-01T08:00:00+00:00\n");
}

#[test]
fn expand_open_ended_stops_at_window_cap() {
    let args = ["expand", "DAILY;FROM=2025-07-01", "--start", "09:00", "--end", "10:00"];
    overlap().args(args).assert().success().stdout(line_count(31));
    overlap()
        .args(args)
        .args(["--window-cap-days", "7"])
        .assert()
        .success()
        .stdout(line_count(7));
}

#[test]
fn expand_leaves_out_skipped_dates() {
    overlap()
        .args(["expand", "DAILY;FROM=2025-07-01;UNTIL=2025-07-03"])
        .args(["--start", "09:00", "--end", "10:00", "--skip", "2025-07-02"])
        .assert()
        .success()
        .stdout(line_count(2))
        .stdout(predicate::str::contains("2025-07-02").not());
}

#[test]
fn expand_dst_gap_follows_policy() {
    let args = [
        "expand",
        "DAILY;FROM=2025-03-09;UNTIL=2025-03-09",
        "--start",
        "02:30",
        "--end",
        "04:00",
        "--tz",
        "America/New_York",
    ];
    overlap()
        .args(args)
        .assert()
        .success()
        .stdout("2025-03-09  2025-03-09T07:30:00+00:00  2025-03-09T08:00:00+00:00\n");
    overlap()
        .args(args)
        .args(["--dst-policy", "skip"])
        .assert()
        .success()
        .stdout("2025-03-09  skipped (DST gap)\n");
}

#[test]
fn expand_prints_rrule_line() {
    overlap()
        .args(["expand", "MONTHLY,DAY=31;FROM=2026-01-31", "--start", "09:00", "--end", "10:00"])
        .arg("--rrule")
        .assert()
        .success()
        .stdout("FREQ=MONTHLY;BYMONTHDAY=31,-1;BYSETPOS=1\n");
}

#[test]
fn expand_requires_from_bound() {
    overlap()
        .args(["expand", "DAILY", "--start", "09:00", "--end", "10:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FROM="));
}

#[test]
fn expand_rejects_equal_times() {
    overlap()
        .args(["expand", "DAILY;FROM=2025-07-01", "--start", "09:00", "--end", "09:00"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// check
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn check_plain_conflict_exits_with_two() {
    overlap()
        .args(["check", "-i", &fixture("plain_conflict.json")])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""has_conflict": true"#))
        .stdout(predicate::str::contains(r#""commute""#))
        .stdout(predicate::str::contains("dentist").not());
}

#[test]
fn check_touching_plain_event_is_clear_via_stdin() {
    let snapshot = std::fs::read_to_string(fixture("plain_clear.json")).unwrap();
    overlap()
        .arg("check")
        .write_stdin(snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""has_conflict": false"#));
}

#[test]
fn check_recurring_on_different_weekday_is_clear() {
    overlap()
        .args(["check", "-i", &fixture("recurring_clear.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""conflicting_ids": []"#));
}

#[test]
fn check_unskip_reports_reactivated_conflict() {
    overlap()
        .args(["check", "-i", &fixture("unskip_conflict.json")])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(r#""book-club""#));
}

#[test]
fn check_unskip_unknown_event_fails() {
    overlap()
        .args(["check", "-i", &fixture("unskip_missing.json")])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn check_rejects_malformed_snapshot() {
    overlap()
        .arg("check")
        .write_stdin("{ not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse snapshot JSON"));
}

#[test]
fn check_missing_file_fails() {
    overlap()
        .args(["check", "-i", "/nonexistent/snapshot.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

// ─────────────────────────────────────────────────────────────────────────────
// logging
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn verbose_json_logs_go_to_stderr() {
    overlap()
        .args(["check", "-i", &fixture("plain_clear.json"), "-v", "--log-format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains(r#""level":"DEBUG""#))
        .stdout(predicate::str::contains("level").not());
}
