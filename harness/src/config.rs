//! Trace configuration: one JSON document describing the volume, the
//! endpoints and the search policy of a run.
//!
//! ```json
//! {
//!   "volume": { "kind": "tube", "width": 32, "height": 32, "depth": 4,
//!               "background": 0, "foreground": 255,
//!               "waypoints": [[0, 16, 0], [31, 16, 3]] },
//!   "calibration": { "spacing": [0.5, 0.5, 2.0], "unit": "micron" },
//!   "start": [0, 16, 0],
//!   "goal": [31, 16, 3],
//!   "policy": { "bidirectional": true }
//! }
//! ```

use std::path::{Path, PathBuf};

use neurite_kernel::digest::{canonical_hash, ContentHash, HashDomain};
use neurite_kernel::volume::{Calibration, PixelType, Voxel};
use neurite_search::SearchPolicy;
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Default time allowed for the worker to report completion.
pub const DEFAULT_LIVENESS_SECONDS: u64 = 300;

/// Longest liveness window accepted: one week.
pub const MAX_LIVENESS_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Where the voxels come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum VolumeSource {
    /// Every voxel has intensity `value` (8-bit).
    Uniform {
        width: u32,
        height: u32,
        depth: u32,
        value: u8,
    },
    /// `background` everywhere except a one-voxel-wide polyline of
    /// `foreground` through `waypoints` (8-bit).
    Tube {
        width: u32,
        height: u32,
        depth: u32,
        background: u8,
        foreground: u8,
        waypoints: Vec<[u32; 3]>,
    },
    /// Contiguous little-endian slices in a raw file, slice 0 first.
    Raw {
        path: PathBuf,
        pixel_type: PixelType,
        width: u32,
        height: u32,
        depth: u32,
    },
}

impl VolumeSource {
    /// `(width, height, depth)` as declared.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32, u32) {
        match self {
            Self::Uniform { width, height, depth, .. }
            | Self::Tube { width, height, depth, .. }
            | Self::Raw { width, height, depth, .. } => (*width, *height, *depth),
        }
    }
}

/// Voxel spacing and unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    pub spacing: [f64; 3],
    pub unit: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            spacing: [1.0; 3],
            unit: String::new(),
        }
    }
}

impl CalibrationConfig {
    /// # Errors
    ///
    /// Returns [`HarnessError::Field`] for zero or non-finite spacing.
    pub fn build(&self) -> Result<Calibration, HarnessError> {
        let [x, y, z] = self.spacing;
        Ok(Calibration::new(x, y, z, &self.unit)?)
    }
}

/// Per-voxel cost strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostStrategy {
    #[default]
    Reciprocal,
    Inverted,
}

/// Heuristic strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicStrategy {
    #[default]
    Euclidean,
    Zero,
}

/// A complete run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceConfig {
    pub volume: VolumeSource,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    pub start: [u32; 3],
    #[serde(default)]
    pub goal: Option<[u32; 3]>,
    #[serde(default)]
    pub cost: CostStrategy,
    #[serde(default)]
    pub heuristic: HeuristicStrategy,
    /// Overrides `policy.minimum_cost_per_unit_distance`. When absent the
    /// cost strategy's suggested floor is used.
    #[serde(default)]
    pub minimum_cost: Option<f64>,
    #[serde(default)]
    pub policy: SearchPolicy,
    #[serde(default = "default_liveness")]
    pub liveness_seconds: u64,
}

fn default_liveness() -> u64 {
    DEFAULT_LIVENESS_SECONDS
}

impl TraceConfig {
    /// Parse and validate.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::ConfigParse`] for malformed JSON or unknown fields
    /// - [`HarnessError::InvalidConfig`] for inconsistent values
    pub fn from_json_str(json: &str) -> Result<Self, HarnessError> {
        let config: Self = serde_json::from_str(json).map_err(HarnessError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read from a file. A relative raw volume path is resolved against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// As [`TraceConfig::from_json_str`], plus [`HarnessError::Io`].
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_json_str(&text)?;
        if let VolumeSource::Raw { path: raw, .. } = &mut config.volume {
            if raw.is_relative() {
                if let Some(dir) = path.parent() {
                    *raw = dir.join(&*raw);
                }
            }
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidConfig`] for a zero dimension, a
    /// tube without waypoints, an endpoint or waypoint outside the volume,
    /// a liveness window of zero or above [`MAX_LIVENESS_SECONDS`], or a
    /// bad policy.
    pub fn validate(&self) -> Result<(), HarnessError> {
        let (w, h, d) = self.volume.dimensions();
        if w == 0 || h == 0 || d == 0 {
            return Err(invalid(format!("volume dimensions must be positive, got {w}x{h}x{d}")));
        }
        let inside = |p: [u32; 3]| p[0] < w && p[1] < h && p[2] < d;
        if !inside(self.start) {
            return Err(invalid(format!("start {:?} is outside {w}x{h}x{d}", self.start)));
        }
        if let Some(goal) = self.goal {
            if !inside(goal) {
                return Err(invalid(format!("goal {goal:?} is outside {w}x{h}x{d}")));
            }
        }
        if let VolumeSource::Tube { waypoints, .. } = &self.volume {
            if waypoints.is_empty() {
                return Err(invalid("tube needs at least one waypoint".to_string()));
            }
            if let Some(p) = waypoints.iter().find(|p| !inside(**p)) {
                return Err(invalid(format!("waypoint {p:?} is outside {w}x{h}x{d}")));
            }
        }
        if let Some(floor) = self.minimum_cost {
            if !floor.is_finite() || floor < 0.0 {
                return Err(invalid(format!("minimum_cost must be finite and >= 0, got {floor}")));
            }
        }
        if self.liveness_seconds == 0 || self.liveness_seconds > MAX_LIVENESS_SECONDS {
            return Err(invalid(format!(
                "liveness_seconds must be in 1..={MAX_LIVENESS_SECONDS}, got {}",
                self.liveness_seconds
            )));
        }
        self.policy
            .validate()
            .map_err(|e| invalid(e.to_string()))
    }

    #[must_use]
    pub fn start_voxel(&self) -> Voxel {
        to_voxel(self.start)
    }

    #[must_use]
    pub fn goal_voxel(&self) -> Option<Voxel> {
        self.goal.map(to_voxel)
    }

    /// Digest of the configuration's canonical JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigParse`] if serialization fails.
    pub fn digest(&self) -> Result<ContentHash, HarnessError> {
        let bytes = serde_json::to_vec(self).map_err(HarnessError::ConfigParse)?;
        Ok(canonical_hash(HashDomain::TraceConfig, &bytes))
    }
}

fn to_voxel(p: [u32; 3]) -> Voxel {
    Voxel::new(p[0], p[1], p[2])
}

fn invalid(detail: String) -> HarnessError {
    HarnessError::InvalidConfig { detail }
}
