//! `overlap` CLI: parse recurrence rules, expand them, and check calendar snapshots
//! for conflicts from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Parse rule text into its parts
//! overlap parse "WEEKLY,2,MON,FRI;FROM=2025-07-01"
//!
//! # Render the canonical summary for a rule and date range
//! overlap summary "weekly, fri, mon" --from 2025-07-01 --until 2025-12-31
//!
//! # List occurrences of a pattern in a zone
//! overlap expand "WEEKLY,MON;FROM=2025-07-01" --start 09:00 --end 10:00 --tz Europe/Berlin
//!
//! # Print the RFC 5545 RRULE line instead
//! overlap expand "MONTHLY,DAY=31;FROM=2026-01-31" --start 09:00 --end 10:00 --rrule
//!
//! # Check a JSON snapshot (stdin or -i); exits with 2 on conflict
//! overlap check -i snapshot.json
//! ```

mod logging;

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::process;

use anyhow::{bail, Context, Result};
use chrono::{Days, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use overlap_engine::dst::DstPolicy;
use overlap_engine::rfc5545::to_rrule_line;
use overlap_engine::{
    build_summary, expand, parse, parse_with_bounds, ConflictVerdict, EngineConfig, EventId,
    InMemoryCalendar, Occurrence, OwnerId, RecurrencePattern, RecurringConflictDetector,
    SingleEventDetector, SkipDayValidator, TimeSpan,
};

use crate::logging::LogFormat;

/// Exit status of `check` when the candidate conflicts.
const EXIT_CONFLICT: i32 = 2;

#[derive(Parser)]
#[command(
    name = "overlap",
    version,
    about = "Recurrence expansion and conflict checks for calendar snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Days compared when either recurring pattern is open-ended
    #[arg(long, global = true)]
    window_cap_days: Option<u32>,

    /// Handling of local times inside a DST gap
    #[arg(long, global = true, value_enum)]
    dst_policy: Option<DstArg>,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse rule text and print its parts as JSON
    Parse {
        /// Rule text, optionally with FROM=/UNTIL= bounds
        text: String,
    },
    /// Print the canonical summary of a rule and date range
    Summary {
        /// Rule text
        text: String,
        /// First date of the range
        #[arg(long)]
        from: NaiveDate,
        /// Last date of the range (open-ended if omitted)
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// List the occurrences of a pattern
    Expand {
        /// Rule text with a FROM= bound and an optional UNTIL= bound
        text: String,
        /// Local start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        /// Local end time (HH:MM); earlier than --start means overnight
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        /// IANA time zone of the local times
        #[arg(long, default_value = "UTC")]
        tz: Tz,
        /// Date to leave out (repeatable)
        #[arg(long)]
        skip: Vec<NaiveDate>,
        /// Last date to list (defaults to UNTIL, or the window cap for open-ended rules)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Print the RFC 5545 RRULE line instead of occurrences
        #[arg(long)]
        rrule: bool,
    },
    /// Check a JSON snapshot for conflicts and print the verdict
    Check {
        /// Snapshot file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DstArg {
    Skip,
    ShiftForward,
}

impl From<DstArg> for DstPolicy {
    fn from(arg: DstArg) -> Self {
        match arg {
            DstArg::Skip => DstPolicy::Skip,
            DstArg::ShiftForward => DstPolicy::ShiftForward,
        }
    }
}

/// Input of the `check` subcommand.
#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    config: EngineConfig,
    #[serde(default)]
    calendar: InMemoryCalendar,
    candidate: Candidate,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Candidate {
    /// A single timed span
    Plain {
        span: TimeSpan,
        #[serde(default)]
        exclude_id: Option<EventId>,
    },
    /// A recurring pattern
    Recurring {
        owner: OwnerId,
        pattern: RecurrencePattern,
        #[serde(default)]
        exclude_id: Option<EventId>,
    },
    /// Dates leaving the skip list of a recurring event in the calendar
    Unskip {
        event_id: EventId,
        dates: BTreeSet<NaiveDate>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format, cli.verbose)?;

    let mut config = EngineConfig::default();
    apply_overrides(&cli, &mut config);

    match cli.command {
        Commands::Parse { ref text } => {
            let parsed = parse_with_bounds(text)?;
            let rule = &parsed.rule;
            let days: Vec<String> = rule
                .days_of_week
                .iter()
                .map(|day| day.to_string().to_uppercase())
                .collect();
            let out = json!({
                "rule": rule.to_string(),
                "frequency": rule.frequency.as_str(),
                "interval": rule.interval,
                "days_of_week": days,
                "day_of_month": rule.day_of_month,
                "from": parsed.from,
                "until": parsed.until,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Summary {
            ref text,
            from,
            until,
        } => {
            let rule = parse(text)?;
            if let Some(until) = until.filter(|until| *until < from) {
                bail!("--until {until} is before --from {from}");
            }
            println!("{}", build_summary(&rule, from, until));
        }
        Commands::Expand {
            ref text,
            start,
            end,
            tz,
            ref skip,
            to,
            rrule,
        } => {
            let parsed = parse_with_bounds(text)?;
            let from = parsed
                .from
                .context("expand needs a FROM=<date> bound in the rule text")?;
            let pattern = RecurrencePattern::new(parsed.rule, start, end, from, parsed.until)?
                .in_timezone(tz)
                .with_skip_dates(skip.iter().copied());

            if rrule {
                match to_rrule_line(&pattern) {
                    Some(line) => println!("{line}"),
                    None => bail!("UNSPECIFIED rules have no RRULE form"),
                }
                return Ok(());
            }

            let cap = u64::from(config.window_cap_days.max(1) - 1);
            let last = to
                .or(pattern.end_date)
                .or_else(|| from.checked_add_days(Days::new(cap)))
                .unwrap_or(from);
            print_occurrences(&pattern, from, last, config.dst_policy);
        }
        Commands::Check { ref input } => {
            let raw = read_input(input.as_deref())?;
            let snapshot: Snapshot =
                serde_json::from_str(&raw).context("Failed to parse snapshot JSON")?;
            let mut config = snapshot.config;
            apply_overrides(&cli, &mut config);

            let verdict = check(&snapshot.calendar, &snapshot.candidate, config)?;
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            if verdict.has_conflict() {
                info!(conflicts = verdict.conflicting_ids().len(), "candidate conflicts");
                process::exit(EXIT_CONFLICT);
            }
        }
    }

    Ok(())
}

/// Command-line flags win over configuration read from a snapshot.
fn apply_overrides(cli: &Cli, config: &mut EngineConfig) {
    if let Some(days) = cli.window_cap_days {
        config.window_cap_days = days;
    }
    if let Some(policy) = cli.dst_policy {
        config.dst_policy = policy.into();
    }
}

fn check(
    calendar: &InMemoryCalendar,
    candidate: &Candidate,
    config: EngineConfig,
) -> Result<ConflictVerdict> {
    let verdict = match candidate {
        Candidate::Plain { span, exclude_id } => {
            debug!(owner = %span.owner, "checking plain candidate");
            SingleEventDetector::new(calendar, calendar, config)
                .validate_no_conflict(span, exclude_id.as_ref())?
        }
        Candidate::Recurring {
            owner,
            pattern,
            exclude_id,
        } => {
            debug!(%owner, summary = %pattern.summary(), "checking recurring candidate");
            RecurringConflictDetector::new(calendar, config).validate_no_conflict(
                owner,
                pattern,
                exclude_id.as_ref(),
            )?
        }
        Candidate::Unskip { event_id, dates } => {
            let event = calendar
                .recurring_event(event_id)
                .with_context(|| format!("No recurring event `{event_id}` in the snapshot"))?;
            debug!(id = %event_id, dates = dates.len(), "checking reactivated dates");
            SkipDayValidator::new(calendar, calendar, config)
                .validate_no_conflict_for_skip_days(event, dates)?
        }
    };
    Ok(verdict)
}

/// One line per occurrence: local date, then the UTC start and end.
fn print_occurrences(
    pattern: &RecurrencePattern,
    from: NaiveDate,
    to: NaiveDate,
    policy: DstPolicy,
) {
    for date in expand(pattern, from, to, &pattern.skip_dates) {
        match Occurrence::of(pattern, date).interval(pattern.timezone, policy) {
            Some(span) => println!(
                "{date}  {}  {}",
                span.start.to_rfc3339(),
                span.end.to_rfc3339()
            ),
            None => println!("{date}  skipped (DST gap)"),
        }
    }
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .with_context(|| format!("expected HH:MM, got `{value}`"))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
