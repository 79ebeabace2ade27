//! Shared fixtures for the lock tests: synthetic fields, a slow cost
//! strategy for control tests, and a reference Dijkstra.

#![forbid(unsafe_code)]

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::hint::black_box;
use std::sync::Arc;

use neurite_kernel::volume::{Calibration, ImageStack, VolumetricCostField, Voxel, VoxelSample};

/// Every voxel has intensity `value`.
///
/// # Panics
///
/// Panics on zero dimensions.
#[must_use]
pub fn uniform_field(width: u32, height: u32, depth: u32, value: u8) -> VolumetricCostField {
    let len = width as usize * height as usize;
    let stack = ImageStack::gray8(width, height, vec![vec![value; len]; depth as usize]).unwrap();
    VolumetricCostField::new(Arc::new(stack), Calibration::uncalibrated())
}

/// Pseudo-random intensities in `1..=255` from a fixed seed.
///
/// # Panics
///
/// Panics on zero dimensions.
#[must_use]
pub fn speckle_field(width: u32, height: u32, depth: u32, seed: u64) -> VolumetricCostField {
    let mut state = seed;
    let len = width as usize * height as usize;
    let slices = (0..depth)
        .map(|_| {
            (0..len)
                .map(|_| {
                    state = state
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(1_442_695_040_888_963_407);
                    let byte = u8::try_from((state >> 56) % 255).unwrap();
                    byte + 1
                })
                .collect()
        })
        .collect();
    let stack = ImageStack::gray8(width, height, slices).unwrap();
    VolumetricCostField::new(Arc::new(stack), Calibration::uncalibrated())
}

/// A uniform field whose cost function burns `spin` iterations per call.
///
/// # Panics
///
/// Panics on zero dimensions.
#[must_use]
pub fn slow_field(width: u32, height: u32, depth: u32, spin: u32) -> VolumetricCostField {
    let slow = move |_sample: VoxelSample| {
        let mut acc = 0_u64;
        for i in 0..spin {
            acc = black_box(acc.wrapping_add(u64::from(i)));
        }
        black_box(acc);
        1.0
    };
    uniform_field(width, height, depth, 128)
        .with_cost_fn(Arc::new(slow))
        .unwrap()
}

/// Cheapest start-to-goal cost over the 26-neighborhood, with each step
/// costing its physical length times the destination cost floored at
/// `minimum_cost`.
#[must_use]
pub fn reference_cost(
    field: &VolumetricCostField,
    start: Voxel,
    goal: Voxel,
    minimum_cost: f64,
) -> Option<f64> {
    let mut best: BTreeMap<Voxel, f64> = BTreeMap::new();
    let mut heap = BinaryHeap::new();
    best.insert(start, 0.0);
    heap.push(Reverse((Ordered(0.0), start)));
    while let Some(Reverse((Ordered(g), voxel))) = heap.pop() {
        if voxel == goal {
            return Some(g);
        }
        if best.get(&voxel).is_some_and(|&b| b < g) {
            continue;
        }
        for (dx, dy, dz) in offsets() {
            let (Some(x), Some(y), Some(z)) = (
                voxel.x.checked_add_signed(dx),
                voxel.y.checked_add_signed(dy),
                voxel.z.checked_add_signed(dz),
            ) else {
                continue;
            };
            let next = Voxel::new(x, y, z);
            if !field.contains_voxel(next) {
                continue;
            }
            let step = field
                .calibration()
                .step_length(i64::from(dx), i64::from(dy), i64::from(dz));
            let candidate = g + step * field.cost_at(next).max(minimum_cost);
            let improves = match best.get(&next) {
                Some(&known) => candidate < known,
                None => true,
            };
            if improves {
                best.insert(next, candidate);
                heap.push(Reverse((Ordered(candidate), next)));
            }
        }
    }
    None
}

fn offsets() -> impl Iterator<Item = (i32, i32, i32)> {
    (-1..=1).flat_map(|dz| {
        (-1..=1).flat_map(move |dy| {
            (-1..=1)
                .map(move |dx| (dx, dy, dz))
                .filter(|&d| d != (0, 0, 0))
        })
    })
}

#[derive(Debug, Clone, Copy)]
struct Ordered(f64);

impl PartialEq for Ordered {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for Ordered {}

impl PartialOrd for Ordered {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ordered {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Configuration used by the cross-process determinism fixture.
pub const FIXTURE_CONFIG: &str = r#"{
    "volume": { "kind": "tube", "width": 24, "height": 16, "depth": 6,
                "background": 12, "foreground": 240,
                "waypoints": [[1, 8, 0], [12, 3, 2], [22, 12, 5]] },
    "calibration": { "spacing": [0.5, 0.5, 1.5], "unit": "micron" },
    "start": [1, 8, 0],
    "goal": [22, 12, 5],
    "policy": { "bidirectional": true, "report_every_milliseconds": 0 }
}"#;
