//! Read-only cost view over an image stack.

use std::sync::Arc;

use crate::error::FieldError;
use crate::volume::calibration::Calibration;
use crate::volume::cost::{CostFn, ReciprocalCost, VoxelSample};
use crate::volume::stack::{ImageStack, IntensityRange};
use crate::volume::Voxel;

/// Per-voxel movement cost plus physical spacing over one image stack.
///
/// The field never mutates after construction. The pixel buffers are held
/// behind an `Arc` so several searches can read the same image at once.
///
/// 8-bit samples are used as-is. 16/32-bit samples are rescaled with
/// `(v - min) / (max - min) * 255` against a global [`IntensityRange`],
/// computed from the stack unless the caller supplies one.
#[derive(Clone)]
pub struct VolumetricCostField {
    stack: Arc<ImageStack>,
    calibration: Calibration,
    range: IntensityRange,
    cost: Arc<dyn CostFn>,
}

impl std::fmt::Debug for VolumetricCostField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumetricCostField")
            .field("width", &self.stack.width())
            .field("height", &self.stack.height())
            .field("depth", &self.stack.depth())
            .field("pixel_type", &self.stack.pixel_type())
            .field("calibration", &self.calibration)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl VolumetricCostField {
    /// A field using [`ReciprocalCost`] and the stack's own intensity range.
    #[must_use]
    pub fn new(stack: Arc<ImageStack>, calibration: Calibration) -> Self {
        let range = stack.intensity_range();
        Self {
            stack,
            calibration,
            range,
            cost: Arc::new(ReciprocalCost),
        }
    }

    /// Normalize against an externally known range instead of the stack's.
    #[must_use]
    pub fn with_intensity_range(mut self, range: IntensityRange) -> Self {
        self.range = range;
        self
    }

    /// Replace the cost strategy.
    ///
    /// # Errors
    ///
    /// Returns the strategy's shape error if it carries per-voxel data that
    /// does not cover the stack.
    pub fn with_cost_fn(mut self, cost: Arc<dyn CostFn>) -> Result<Self, FieldError> {
        cost.check_shape(&self.stack)?;
        self.cost = cost;
        Ok(self)
    }

    #[must_use]
    pub fn stack(&self) -> &Arc<ImageStack> {
        &self.stack
    }

    #[must_use]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[must_use]
    pub fn intensity_range(&self) -> IntensityRange {
        self.range
    }

    #[must_use]
    pub fn cost_fn(&self) -> &Arc<dyn CostFn> {
        &self.cost
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.stack.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.stack.height()
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.stack.depth()
    }

    #[must_use]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        self.stack.contains(x, y, z)
    }

    #[must_use]
    pub fn contains_voxel(&self, voxel: Voxel) -> bool {
        self.stack.contains_voxel(voxel)
    }

    /// Intensity at `voxel` on the 0–255 scale. NaN samples read as 0.
    #[must_use]
    pub fn normalized_at(&self, voxel: Voxel) -> f64 {
        let raw = self.stack.raw_value(voxel);
        if raw.is_nan() {
            return 0.0;
        }
        if self.stack.pixel_type().needs_normalization() {
            self.range.normalize(raw)
        } else {
            raw
        }
    }

    /// Cost of moving onto `voxel`, never negative.
    #[must_use]
    pub fn cost_at(&self, voxel: Voxel) -> f64 {
        let sample = VoxelSample {
            voxel,
            normalized: self.normalized_at(voxel),
        };
        let cost = self.cost.cost(sample);
        if cost.is_nan() || cost < 0.0 {
            0.0
        } else {
            cost
        }
    }
}
