//! Volume module: image stacks, calibration, cost strategies and the
//! read-only [`VolumetricCostField`] that searches consume.

pub mod calibration;
pub mod cost;
pub mod field;
pub mod pixel;
pub mod stack;

use serde::{Deserialize, Serialize};

pub use calibration::{Axis, Calibration};
pub use cost::{CostFn, InvertedCost, PrecomputedCost, ReciprocalCost, VoxelSample};
pub use field::VolumetricCostField;
pub use pixel::PixelType;
pub use stack::{ImageStack, IntensityRange, PixelData};

/// Integer grid coordinates of one voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Voxel {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Voxel {
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for Voxel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// A point in calibrated (physical) space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}
