//! Materialize a [`VolumeSource`] into a cost field.

use std::sync::Arc;

use neurite_kernel::volume::{
    CostFn, ImageStack, InvertedCost, ReciprocalCost, VolumetricCostField,
};

use crate::config::{CostStrategy, TraceConfig, VolumeSource};
use crate::error::HarnessError;

/// Build the image stack a source describes.
///
/// # Errors
///
/// - [`HarnessError::Io`] if a raw file cannot be read
/// - [`HarnessError::InvalidConfig`] if a raw file has the wrong size or a
///   tube waypoint lies outside the volume
/// - [`HarnessError::Field`] if the stack itself is rejected
pub fn build_stack(source: &VolumeSource) -> Result<ImageStack, HarnessError> {
    match source {
        VolumeSource::Uniform {
            width,
            height,
            depth,
            value,
        } => {
            let len = *width as usize * *height as usize;
            let slices = vec![vec![*value; len]; *depth as usize];
            Ok(ImageStack::gray8(*width, *height, slices)?)
        }
        VolumeSource::Tube {
            width,
            height,
            depth,
            background,
            foreground,
            waypoints,
        } => {
            if let Some(p) = waypoints
                .iter()
                .find(|p| p[0] >= *width || p[1] >= *height || p[2] >= *depth)
            {
                return Err(HarnessError::InvalidConfig {
                    detail: format!("waypoint {p:?} is outside {width}x{height}x{depth}"),
                });
            }
            let (w, h) = (*width as usize, *height as usize);
            let mut slices = vec![vec![*background; w * h]; *depth as usize];
            for [x, y, z] in polyline(waypoints) {
                slices[z as usize][y as usize * w + x as usize] = *foreground;
            }
            Ok(ImageStack::gray8(*width, *height, slices)?)
        }
        VolumeSource::Raw {
            path,
            pixel_type,
            width,
            height,
            depth,
        } => {
            let bytes = std::fs::read(path).map_err(|source| HarnessError::Io {
                path: path.clone(),
                source,
            })?;
            let slice_bytes =
                *width as usize * *height as usize * pixel_type.bytes_per_sample();
            let expected = slice_bytes * *depth as usize;
            if bytes.len() != expected {
                return Err(HarnessError::InvalidConfig {
                    detail: format!(
                        "{} holds {} bytes, expected {expected}",
                        path.display(),
                        bytes.len()
                    ),
                });
            }
            let slices: Vec<Vec<u8>> = bytes.chunks_exact(slice_bytes).map(<[u8]>::to_vec).collect();
            Ok(ImageStack::from_le_bytes(*pixel_type, *width, *height, &slices)?)
        }
    }
}

/// Build the cost field for a whole configuration.
///
/// # Errors
///
/// As [`build_stack`], plus calibration errors.
pub fn build_field(config: &TraceConfig) -> Result<VolumetricCostField, HarnessError> {
    let stack = build_stack(&config.volume)?;
    let calibration = config.calibration.build()?;
    let field = VolumetricCostField::new(Arc::new(stack), calibration)
        .with_cost_fn(cost_fn(config.cost))?;
    Ok(field)
}

#[must_use]
pub fn cost_fn(strategy: CostStrategy) -> Arc<dyn CostFn> {
    match strategy {
        CostStrategy::Reciprocal => Arc::new(ReciprocalCost),
        CostStrategy::Inverted => Arc::new(InvertedCost),
    }
}

/// Voxels of the polyline through `waypoints`. Each segment takes
/// `max(|dx|, |dy|, |dz|)` steps with rounded intermediate coordinates, so
/// consecutive voxels are 26-neighbors.
fn polyline(waypoints: &[[u32; 3]]) -> Vec<[u32; 3]> {
    let mut out: Vec<[u32; 3]> = waypoints.first().copied().into_iter().collect();
    for pair in waypoints.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let delta: [i64; 3] = std::array::from_fn(|i| i64::from(b[i]) - i64::from(a[i]));
        let steps = delta.iter().map(|d| d.abs()).max().unwrap_or(0);
        for s in 1..=steps {
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let p: [u32; 3] = std::array::from_fn(|i| {
                let t = s as f64 / steps as f64;
                (f64::from(a[i]) + delta[i] as f64 * t).round() as u32
            });
            out.push(p);
        }
    }
    out
}
