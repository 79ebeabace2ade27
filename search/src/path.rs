//! Path reconstruction from predecessor chains, and the traced path itself.

use neurite_kernel::digest::{canonical_hash, ContentHash, HashDomain};
use neurite_kernel::volume::{Calibration, VolumetricCostField, Voxel, WorldPoint};
use serde::{Deserialize, Serialize};

use crate::frontier::Frontier;
use crate::node::NodeId;

/// An ordered voxel sequence from the start towards the goal, with its
/// calibrated coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedPath {
    voxels: Vec<Voxel>,
    points: Vec<WorldPoint>,
    unit: String,
}

impl TracedPath {
    #[must_use]
    pub fn new(voxels: Vec<Voxel>, calibration: &Calibration) -> Self {
        let points = voxels.iter().map(|&v| calibration.to_world(v)).collect();
        Self {
            voxels,
            points,
            unit: calibration.length_unit().to_string(),
        }
    }

    #[must_use]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    #[must_use]
    pub fn points(&self) -> &[WorldPoint] {
        &self.points
    }

    /// Length unit of [`TracedPath::points`].
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<Voxel> {
        self.voxels.first().copied()
    }

    #[must_use]
    pub fn last(&self) -> Option<Voxel> {
        self.voxels.last().copied()
    }

    /// Physical length in [`TracedPath::unit`].
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| {
                let (a, b) = (w[0], w[1]);
                ((b.x - a.x).powi(2) + (b.y - a.y).powi(2) + (b.z - a.z).powi(2)).sqrt()
            })
            .sum()
    }

    /// Total cost of walking this path from its first voxel: each step costs
    /// its physical length times the destination voxel's cost, floored at
    /// `minimum_cost`.
    #[must_use]
    pub fn cost_under(&self, field: &VolumetricCostField, minimum_cost: f64) -> f64 {
        let calibration = field.calibration();
        self.voxels
            .windows(2)
            .map(|w| {
                let (a, b) = (w[0], w[1]);
                let step = calibration.step_length(
                    i64::from(b.x) - i64::from(a.x),
                    i64::from(b.y) - i64::from(a.y),
                    i64::from(b.z) - i64::from(a.z),
                );
                step * field.cost_at(b).max(minimum_cost)
            })
            .sum()
    }

    /// Whether consecutive voxels are 26-neighbors with no repeats in a row.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.voxels.windows(2).all(|w| {
            let d = |a: u32, b: u32| a.abs_diff(b);
            let (dx, dy, dz) = (d(w[0].x, w[1].x), d(w[0].y, w[1].y), d(w[0].z, w[1].z));
            dx <= 1 && dy <= 1 && dz <= 1 && (dx, dy, dz) != (0, 0, 0)
        })
    }

    /// Domain-separated digest of the voxel sequence.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        let mut bytes = Vec::with_capacity(self.voxels.len() * 12);
        for v in &self.voxels {
            bytes.extend_from_slice(&v.x.to_le_bytes());
            bytes.extend_from_slice(&v.y.to_le_bytes());
            bytes.extend_from_slice(&v.z.to_le_bytes());
        }
        canonical_hash(HashDomain::TracedPath, &bytes)
    }
}

/// Builds start-to-goal paths out of one or two frontiers.
///
/// Reconstruction only reads predecessor links; calling it twice on the same
/// state yields the same path.
#[derive(Debug, Clone, Copy)]
pub struct PathReconstructor<'a> {
    calibration: &'a Calibration,
}

impl<'a> PathReconstructor<'a> {
    #[must_use]
    pub fn new(calibration: &'a Calibration) -> Self {
        Self { calibration }
    }

    /// Origin first, `id` last.
    #[must_use]
    pub fn from_origin(&self, frontier: &Frontier, id: NodeId) -> TracedPath {
        let mut voxels: Vec<Voxel> = frontier.ancestors(id).collect();
        voxels.reverse();
        TracedPath::new(voxels, self.calibration)
    }

    /// `id` first, origin last.
    #[must_use]
    pub fn to_origin(&self, frontier: &Frontier, id: NodeId) -> TracedPath {
        TracedPath::new(frontier.ancestors(id).collect(), self.calibration)
    }

    /// Splice the start-side chain ending at `start_id` onto the goal-side
    /// chain ending at `goal_id`.
    #[must_use]
    pub fn meeting(
        &self,
        from_start: &Frontier,
        start_id: NodeId,
        from_goal: &Frontier,
        goal_id: NodeId,
    ) -> TracedPath {
        let mut voxels: Vec<Voxel> = from_start.ancestors(start_id).collect();
        voxels.reverse();
        voxels.extend(from_goal.ancestors(goal_id));
        TracedPath::new(voxels, self.calibration)
    }
}
