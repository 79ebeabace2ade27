//! How a search ended, and what it looked like when it did.

use serde::{Deserialize, Serialize};

use crate::path::TracedPath;

/// Why the worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    /// A path was found.
    Success,
    /// A stop was requested.
    Cancelled,
    /// The wall-clock budget ran out.
    TimedOut,
    /// Every open set emptied without reaching the goal.
    PointsExhausted,
    /// Node storage could not grow.
    OutOfMemory,
}

impl ExitReason {
    /// Stable upper-case name used in logs and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut => "TIMED_OUT",
            Self::PointsExhausted => "POINTS_EXHAUSTED",
            Self::OutOfMemory => "OUT_OF_MEMORY",
        }
    }

    #[must_use]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters at the moment a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Completed expansions.
    pub loops: u64,
    pub open_from_start: usize,
    pub closed_from_start: usize,
    pub open_from_goal: usize,
    pub closed_from_goal: usize,
    /// Largest combined open-set size seen.
    pub open_high_water: usize,
    /// Wall-clock time from worker start to finish, pauses included.
    pub elapsed_millis: u64,
}

impl SearchStats {
    /// Open plus closed nodes across both directions.
    #[must_use]
    pub fn points_in_search(&self) -> usize {
        self.open_from_start + self.closed_from_start + self.open_from_goal + self.closed_from_goal
    }
}

/// Terminal result of a search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub exit_reason: ExitReason,
    /// Present exactly when `exit_reason` is [`ExitReason::Success`].
    pub path: Option<TracedPath>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_reason.is_success()
    }
}
