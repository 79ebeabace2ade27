//! Per-voxel movement cost strategies.
//!
//! A [`CostFn`] turns one voxel's normalized intensity (0–255) into the cost
//! of stepping onto that voxel. The cost does not include the step length;
//! the search multiplies it by the physical distance of the move.

use crate::error::FieldError;
use crate::volume::stack::ImageStack;
use crate::volume::Voxel;

/// What a cost strategy sees for one voxel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSample {
    pub voxel: Voxel,
    /// Intensity mapped onto 0–255.
    pub normalized: f64,
}

/// Pluggable per-voxel cost.
///
/// Implementations must be cheap and must return a non-negative value;
/// brighter voxels should be cheaper to traverse.
pub trait CostFn: Send + Sync {
    /// Cost of moving onto `sample.voxel`.
    fn cost(&self, sample: VoxelSample) -> f64;

    /// A sensible lower bound on cost per unit distance for this strategy,
    /// suitable for an admissible straight-line heuristic.
    fn suggested_minimum_cost(&self) -> f64 {
        0.0
    }

    /// Check that any per-voxel data the strategy carries covers `stack`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::MeasureShapeMismatch`] when it does not.
    fn check_shape(&self, _stack: &ImageStack) -> Result<(), FieldError> {
        Ok(())
    }
}

impl<F> CostFn for F
where
    F: Fn(VoxelSample) -> f64 + Send + Sync,
{
    fn cost(&self, sample: VoxelSample) -> f64 {
        self(sample)
    }
}

/// Cost used for a zero-intensity voxel under [`ReciprocalCost`].
pub const ZERO_INTENSITY_COST: f64 = 2.0;

/// `1 / v`, with [`ZERO_INTENSITY_COST`] for black voxels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReciprocalCost;

impl CostFn for ReciprocalCost {
    fn cost(&self, sample: VoxelSample) -> f64 {
        if sample.normalized == 0.0 {
            ZERO_INTENSITY_COST
        } else {
            1.0 / sample.normalized
        }
    }

    fn suggested_minimum_cost(&self) -> f64 {
        1.0 / 255.0
    }
}

/// `256 - v`: linear rather than reciprocal preference for bright voxels.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvertedCost;

impl CostFn for InvertedCost {
    fn cost(&self, sample: VoxelSample) -> f64 {
        (256.0 - sample.normalized).max(0.0)
    }

    fn suggested_minimum_cost(&self) -> f64 {
        1.0
    }
}

/// Measure substituted for zero entries in a [`PrecomputedCost`].
pub const ZERO_MEASURE_SUBSTITUTE: f32 = 0.2;

/// Cost from a precomputed per-voxel measure (for example a cached
/// tubeness filter response): `1 / measure`.
///
/// The measure slices use the same layout as the image stack.
#[derive(Debug, Clone)]
pub struct PrecomputedCost {
    width: u32,
    slices: Vec<Vec<f32>>,
}

impl PrecomputedCost {
    #[must_use]
    pub fn new(width: u32, slices: Vec<Vec<f32>>) -> Self {
        Self { width, slices }
    }
}

impl CostFn for PrecomputedCost {
    fn cost(&self, sample: VoxelSample) -> f64 {
        let v = sample.voxel;
        let i = v.y as usize * self.width as usize + v.x as usize;
        let mut measure = self.slices[v.z as usize][i];
        if measure == 0.0 || measure.is_nan() {
            measure = ZERO_MEASURE_SUBSTITUTE;
        }
        1.0 / f64::from(measure.abs())
    }

    fn suggested_minimum_cost(&self) -> f64 {
        1.0 / 60.0
    }

    fn check_shape(&self, stack: &ImageStack) -> Result<(), FieldError> {
        let expected_depth = stack.depth() as usize;
        let expected_len = stack.slice_len();
        let actual_depth = self.slices.len();
        let bad = self.slices.iter().find(|s| s.len() != expected_len);
        if self.width != stack.width() || actual_depth != expected_depth || bad.is_some() {
            return Err(FieldError::MeasureShapeMismatch {
                expected_depth,
                expected_len,
                actual_depth,
                actual_len: bad.or(self.slices.first()).map_or(0, Vec::len),
            });
        }
        Ok(())
    }
}
