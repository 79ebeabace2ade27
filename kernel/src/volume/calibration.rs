//! Physical voxel spacing and per-axis length units.

use crate::error::FieldError;
use crate::volume::{Voxel, WorldPoint};

/// Spatial axis of the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
            Self::Z => f.write_str("z"),
        }
    }
}

/// Unit reported for uncalibrated images.
pub const DEFAULT_UNIT: &str = "pixel";

/// Normalize a free-form unit label.
///
/// Empty labels and anything starting with `pixel` become [`DEFAULT_UNIT`];
/// the common spellings of micrometre become `µm`. Anything else is kept.
#[must_use]
pub fn sanitize_unit(unit: &str) -> String {
    let trimmed = unit.trim();
    let lower = trimmed.to_lowercase();
    if lower.is_empty() || lower.starts_with("pixel") {
        DEFAULT_UNIT.to_string()
    } else if matches!(lower.as_str(), "um" | "micron" | "microns") {
        "\u{b5}m".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Anisotropic voxel spacing with a length unit per axis.
///
/// Spacing is validated once at construction: every axis must be finite and
/// strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    spacing: [f64; 3],
    units: [String; 3],
}

impl Calibration {
    /// Calibration sharing one unit across all three axes.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ZeroSpacing`] or [`FieldError::InvalidSpacing`]
    /// for the first offending axis.
    pub fn new(x: f64, y: f64, z: f64, unit: &str) -> Result<Self, FieldError> {
        let unit = sanitize_unit(unit);
        Self::with_axis_units([x, y, z], [unit.clone(), unit.clone(), unit])
    }

    /// Calibration with an individual unit label per axis.
    ///
    /// # Errors
    ///
    /// Same as [`Calibration::new`].
    pub fn with_axis_units(spacing: [f64; 3], units: [String; 3]) -> Result<Self, FieldError> {
        for (axis, value) in [Axis::X, Axis::Y, Axis::Z].into_iter().zip(spacing) {
            if value == 0.0 {
                return Err(FieldError::ZeroSpacing { axis });
            }
            if !value.is_finite() || value < 0.0 {
                return Err(FieldError::InvalidSpacing { axis, value });
            }
        }
        Ok(Self { spacing, units })
    }

    /// Unit spacing on every axis, in pixels.
    #[must_use]
    pub fn uncalibrated() -> Self {
        Self {
            spacing: [1.0; 3],
            units: [
                DEFAULT_UNIT.to_string(),
                DEFAULT_UNIT.to_string(),
                DEFAULT_UNIT.to_string(),
            ],
        }
    }

    #[must_use]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    #[must_use]
    pub fn spacing_along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.spacing[0],
            Axis::Y => self.spacing[1],
            Axis::Z => self.spacing[2],
        }
    }

    #[must_use]
    pub fn unit(&self, axis: Axis) -> &str {
        match axis {
            Axis::X => &self.units[0],
            Axis::Y => &self.units[1],
            Axis::Z => &self.units[2],
        }
    }

    /// The x-axis unit, used as the label for path lengths.
    #[must_use]
    pub fn length_unit(&self) -> &str {
        &self.units[0]
    }

    /// Voxel coordinates scaled by spacing.
    #[must_use]
    pub fn to_world(&self, voxel: Voxel) -> WorldPoint {
        WorldPoint {
            x: f64::from(voxel.x) * self.spacing[0],
            y: f64::from(voxel.y) * self.spacing[1],
            z: f64::from(voxel.z) * self.spacing[2],
        }
    }

    /// Physical length of a grid step `(dx, dy, dz)`.
    #[must_use]
    pub fn step_length(&self, dx: i64, dy: i64, dz: i64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let (dx, dy, dz) = (
            dx as f64 * self.spacing[0],
            dy as f64 * self.spacing[1],
            dz as f64 * self.spacing[2],
        );
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Physical straight-line distance between two voxels.
    #[must_use]
    pub fn distance(&self, a: Voxel, b: Voxel) -> f64 {
        self.step_length(
            i64::from(b.x) - i64::from(a.x),
            i64::from(b.y) - i64::from(a.y),
            i64::from(b.z) - i64::from(a.z),
        )
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::uncalibrated()
    }
}
