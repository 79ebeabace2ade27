//! Typed construction errors for volumes, calibration and cost strategies.
//!
//! Every variant is a programmer or configuration error detected before a
//! search exists. Search-time terminations are not errors; they are exit
//! reasons reported by the search crate.

use thiserror::Error;

use crate::volume::calibration::Axis;

/// Failure building a [`crate::volume::VolumetricCostField`] or one of its parts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    /// A calibration axis has zero spacing.
    #[error("calibration spacing on the {axis} axis is zero")]
    ZeroSpacing { axis: Axis },

    /// A calibration axis has NaN, infinite, or negative spacing.
    #[error("calibration spacing on the {axis} axis is invalid: {value}")]
    InvalidSpacing { axis: Axis, value: f64 },

    /// Only 8, 16 and 32 bit grayscale samples are supported.
    #[error("unsupported pixel bit depth: {bits}")]
    UnsupportedPixelType { bits: u32 },

    /// The stack has no z-slices.
    #[error("image stack has no slices")]
    EmptyStack,

    /// Width or height is zero.
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    /// A slice does not hold `width * height` samples.
    #[error("slice {z} holds {actual} samples, expected {expected}")]
    SliceLengthMismatch {
        z: usize,
        expected: usize,
        actual: usize,
    },

    /// A raw slice buffer is not a whole number of samples.
    #[error("slice {z} holds {len} bytes, not a multiple of {sample_bytes}")]
    RawSliceMisaligned {
        z: usize,
        len: usize,
        sample_bytes: usize,
    },

    /// The normalization range is inverted or non-finite.
    #[error("intensity range is invalid: min {min}, max {max}")]
    InvalidIntensityRange { min: f64, max: f64 },

    /// Precomputed per-voxel costs do not cover the image volume.
    #[error("precomputed measure has {actual_depth} slices of {actual_len}, expected {expected_depth} of {expected_len}")]
    MeasureShapeMismatch {
        expected_depth: usize,
        expected_len: usize,
        actual_depth: usize,
        actual_len: usize,
    },
}
