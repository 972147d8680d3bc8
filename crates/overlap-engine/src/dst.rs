//! DST transition policies for local occurrence times.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for local times that fall inside a spring-forward gap.
///
/// Times repeated by a fall-back transition always resolve to the earlier instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the occurrence (e.g., 02:30 on the spring-forward night never happens)
    Skip,
    /// Move forward by the length of the gap (02:30 becomes 03:30)
    #[default]
    ShiftForward,
}

/// Resolve a wall-clock time in `tz` to a UTC instant.
///
/// Returns `None` only when the time is inside a gap and the policy is [`DstPolicy::Skip`].
pub fn resolve_local(tz: Tz, local: NaiveDateTime, policy: DstPolicy) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(a, b) => Some(a.with_timezone(&Utc).min(b.with_timezone(&Utc))),
        LocalResult::None => match policy {
            DstPolicy::Skip => None,
            DstPolicy::ShiftForward => {
                // Read the wall time with the offset in force before the gap opened.
                let before = tz
                    .offset_from_utc_datetime(&(local - Duration::days(1)))
                    .fix();
                let utc = local - Duration::seconds(i64::from(before.local_minus_utc()));
                Some(Utc.from_utc_datetime(&utc))
            }
        },
    }
}
