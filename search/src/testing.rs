//! Small synthetic fields shared by unit tests.

use std::sync::Arc;

use neurite_kernel::volume::{Calibration, ImageStack, VolumetricCostField};

/// Every voxel has intensity `value`.
pub(crate) fn uniform_field(width: u32, height: u32, depth: u32, value: u8) -> VolumetricCostField {
    let len = width as usize * height as usize;
    let slices = (0..depth).map(|_| vec![value; len]).collect();
    let stack = ImageStack::gray8(width, height, slices).unwrap();
    VolumetricCostField::new(Arc::new(stack), Calibration::uncalibrated())
}

/// Black volume with one bright row along x at `y = height / 2` in every slice.
pub(crate) fn tube_field(width: u32, height: u32, depth: u32) -> VolumetricCostField {
    let w = width as usize;
    let row = (height / 2) as usize;
    let slices = (0..depth)
        .map(|_| {
            let mut slice = vec![0_u8; w * height as usize];
            slice[row * w..(row + 1) * w].fill(255);
            slice
        })
        .collect();
    let stack = ImageStack::gray8(width, height, slices).unwrap();
    VolumetricCostField::new(Arc::new(stack), Calibration::uncalibrated())
}
