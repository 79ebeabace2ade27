//! Search policy: the tunables of one run.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Iterations between timeout and progress checks.
pub const CHECK_EVERY_LOOPS: u64 = 1000;

/// Direction, cost floor, time budget and reporting cadence for one search.
///
/// Deserializes from partial JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPolicy {
    /// Grow a second frontier from the goal and stop where the two meet.
    pub bidirectional: bool,
    /// Floor applied to every voxel cost. Also the scale of the Euclidean
    /// heuristic, so it should not exceed the cheapest real cost.
    pub minimum_cost_per_unit_distance: f64,
    /// Wall-clock budget in seconds; 0 disables it.
    pub timeout_seconds: u64,
    /// Minimum interval between progress reports; 0 disables them.
    pub report_every_milliseconds: u64,
    /// Begin in the paused state.
    pub start_paused: bool,
    /// How long a paused worker sleeps between status reports.
    pub pause_poll_milliseconds: u64,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            bidirectional: false,
            minimum_cost_per_unit_distance: 0.0,
            timeout_seconds: 0,
            report_every_milliseconds: 1000,
            start_paused: false,
            pause_poll_milliseconds: 4000,
        }
    }
}

impl SearchPolicy {
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidPolicy`] for a negative or non-finite
    /// cost floor or a zero pause interval.
    pub fn validate(&self) -> Result<(), SearchError> {
        let floor = self.minimum_cost_per_unit_distance;
        if !floor.is_finite() || floor < 0.0 {
            return Err(SearchError::InvalidPolicy {
                detail: format!("minimum_cost_per_unit_distance must be finite and >= 0, got {floor}"),
            });
        }
        if self.pause_poll_milliseconds == 0 {
            return Err(SearchError::InvalidPolicy {
                detail: "pause_poll_milliseconds must be positive".into(),
            });
        }
        Ok(())
    }
}
