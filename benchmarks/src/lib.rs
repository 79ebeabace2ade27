//! Shared scenarios for the neurite benchmark suites.

use std::sync::Arc;

use neurite_harness::config::VolumeSource;
use neurite_harness::volumes::build_stack;
use neurite_kernel::digest::{canonical_hash, ContentHash, HashDomain};
use neurite_kernel::volume::{Calibration, VolumetricCostField, Voxel};
use neurite_search::{SearchPolicy, SearchRequest};

/// One benchmark scenario: a field and the endpoints to trace between.
pub struct Regime {
    pub name: &'static str,
    pub field: VolumetricCostField,
    pub start: Voxel,
    pub goal: Voxel,
}

impl Regime {
    /// A request for this regime with the given direction mode.
    #[must_use]
    pub fn request(&self, bidirectional: bool) -> SearchRequest {
        SearchRequest::new(self.field.clone(), self.start)
            .with_goal(self.goal)
            .with_policy(SearchPolicy {
                bidirectional,
                minimum_cost_per_unit_distance: 1.0 / 255.0,
                report_every_milliseconds: 0,
                ..SearchPolicy::default()
            })
    }

    /// Digest of the source volume, printed with results so runs on
    /// different inputs are never compared.
    #[must_use]
    pub fn input_digest(&self) -> ContentHash {
        let stack = self.field.stack();
        let mut bytes = Vec::new();
        for z in 0..stack.depth() {
            for y in 0..stack.height() {
                for x in 0..stack.width() {
                    bytes.extend_from_slice(&stack.raw_value(Voxel::new(x, y, z)).to_le_bytes());
                }
            }
        }
        canonical_hash(HashDomain::BenchInput, &bytes)
    }
}

fn tube_regime(
    name: &'static str,
    (width, height, depth): (u32, u32, u32),
    background: u8,
    waypoints: Vec<[u32; 3]>,
) -> Regime {
    let start = waypoints.first().copied().unwrap_or([0; 3]);
    let goal = waypoints.last().copied().unwrap_or([0; 3]);
    let stack = build_stack(&VolumeSource::Tube {
        width,
        height,
        depth,
        background,
        foreground: 255,
        waypoints,
    })
    .expect("benchmark volume");
    Regime {
        name,
        field: VolumetricCostField::new(Arc::new(stack), Calibration::uncalibrated()),
        start: Voxel::new(start[0], start[1], start[2]),
        goal: Voxel::new(goal[0], goal[1], goal[2]),
    }
}

/// Straight bright tube in a dark volume: the heuristic is nearly exact.
#[must_use]
pub fn regime_straight_tube() -> Regime {
    tube_regime("straight_tube", (96, 32, 16), 0, vec![[0, 16, 8], [95, 16, 8]])
}

/// Winding tube: the heuristic underestimates badly at every bend.
#[must_use]
pub fn regime_winding_tube() -> Regime {
    tube_regime(
        "winding_tube",
        (64, 64, 16),
        20,
        vec![[2, 2, 0], [60, 10, 4], [8, 30, 8], [60, 50, 12], [4, 60, 15]],
    )
}

/// Mid-gray volume crossed by a bright diagonal: off-diagonal voxels cost
/// only twice as much, so the frontier grows nearly as a ball.
#[must_use]
pub fn regime_open_volume() -> Regime {
    tube_regime("open_volume", (40, 40, 40), 128, vec![[0, 0, 0], [39, 39, 39]])
}

/// Every regime, in reporting order.
#[must_use]
pub fn all_regimes() -> Vec<Regime> {
    vec![regime_straight_tube(), regime_winding_tube(), regime_open_volume()]
}
