//! Heuristic estimates of remaining cost.

use neurite_kernel::volume::{Calibration, Voxel};

use crate::node::Direction;

/// Estimates the remaining cost from `voxel` to the objective of
/// `direction`.
///
/// Implementations must be deterministic. Admissibility is not enforced;
/// an over-estimating heuristic trades optimality for speed.
pub trait Heuristic: Send + Sync {
    fn estimate(&self, voxel: Voxel, direction: Direction) -> f32;
}

impl<F> Heuristic for F
where
    F: Fn(Voxel, Direction) -> f32 + Send + Sync,
{
    fn estimate(&self, voxel: Voxel, direction: Direction) -> f32 {
        self(voxel, direction)
    }
}

/// Always 0: plain Dijkstra.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn estimate(&self, _voxel: Voxel, _direction: Direction) -> f32 {
        0.0
    }
}

/// Straight-line physical distance to the opposite end, scaled by the
/// cheapest cost per unit distance.
///
/// Admissible as long as no step costs less than `minimum_cost` per unit.
#[derive(Debug, Clone)]
pub struct EuclideanHeuristic {
    start: Voxel,
    goal: Voxel,
    calibration: Calibration,
    minimum_cost: f64,
}

impl EuclideanHeuristic {
    #[must_use]
    pub fn new(start: Voxel, goal: Voxel, calibration: Calibration, minimum_cost: f64) -> Self {
        Self {
            start,
            goal,
            calibration,
            minimum_cost,
        }
    }
}

impl Heuristic for EuclideanHeuristic {
    #[allow(clippy::cast_possible_truncation)]
    fn estimate(&self, voxel: Voxel, direction: Direction) -> f32 {
        let target = match direction {
            Direction::FromStart => self.goal,
            Direction::FromGoal => self.start,
        };
        (self.minimum_cost * self.calibration.distance(voxel, target)) as f32
    }
}
