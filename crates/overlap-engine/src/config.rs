//! Engine configuration shared by every detector.

use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;

/// Maximum number of days compared when either recurring pattern is open-ended.
pub const DEFAULT_WINDOW_CAP_DAYS: u32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the comparison window for open-ended recurring pairs, counted from
    /// the later of the two start dates. Values below 1 are treated as 1.
    pub window_cap_days: u32,
    /// How local occurrence times inside a DST gap are resolved.
    pub dst_policy: DstPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_cap_days: DEFAULT_WINDOW_CAP_DAYS,
            dst_policy: DstPolicy::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_window_cap_days(mut self, days: u32) -> Self {
        self.window_cap_days = days;
        self
    }

    #[must_use]
    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    pub(crate) fn cap_days(&self) -> u32 {
        self.window_cap_days.max(1)
    }
}
