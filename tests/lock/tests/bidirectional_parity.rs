//! Bidirectional searches agree with unidirectional ones on tube-shaped
//! fields, where the bright voxels leave no room for a different optimum.
//!
//! On noisy fields the two frontiers stop at their first meeting, which
//! can miss the optimum; there the bidirectional cost is only bounded
//! below, except on fields where the meeting is known to land on it.

use std::sync::Arc;

use lock_tests::{reference_cost, speckle_field};
use neurite_harness::config::VolumeSource;
use neurite_harness::volumes::build_stack;
use neurite_kernel::volume::{Calibration, VolumetricCostField, Voxel};
use neurite_search::{
    Direction, ExitReason, FinishedSearch, SearchEngine, SearchPolicy, SearchRequest,
};

const FLOOR: f64 = 1.0 / 255.0;

fn tube(width: u32, height: u32, depth: u32, waypoints: Vec<[u32; 3]>) -> VolumetricCostField {
    let stack = build_stack(&VolumeSource::Tube {
        width,
        height,
        depth,
        background: 0,
        foreground: 255,
        waypoints,
    })
    .unwrap();
    VolumetricCostField::new(Arc::new(stack), Calibration::uncalibrated())
}

fn run(field: &VolumetricCostField, start: Voxel, goal: Voxel, bidirectional: bool) -> FinishedSearch {
    let finished = SearchEngine::new(
        SearchRequest::new(field.clone(), start)
            .with_goal(goal)
            .with_policy(SearchPolicy {
                bidirectional,
                minimum_cost_per_unit_distance: FLOOR,
                ..SearchPolicy::default()
            }),
    )
    .unwrap()
    .run_blocking()
    .unwrap();
    assert_eq!(finished.exit_reason(), ExitReason::Success);
    finished
}

#[test]
fn straight_tube_gives_identical_paths() {
    let field = tube(16, 7, 3, vec![[0, 3, 1], [15, 3, 1]]);
    let (start, goal) = (Voxel::new(0, 3, 1), Voxel::new(15, 3, 1));
    let uni = run(&field, start, goal, false);
    let bi = run(&field, start, goal, true);

    let expected: Vec<Voxel> = (0..16).map(|x| Voxel::new(x, 3, 1)).collect();
    assert_eq!(uni.path().unwrap().voxels(), expected.as_slice());
    assert_eq!(bi.path().unwrap().voxels(), expected.as_slice());
    assert_eq!(uni.path().unwrap().digest(), bi.path().unwrap().digest());

    // Both directions did work, and only the start side did in the
    // unidirectional run.
    assert!(bi.stats().closed_from_goal > 0);
    assert!(bi.stats().closed_from_start > 0);
    assert_eq!(uni.stats().closed_from_goal, 0);
    assert!(uni.core().frontier(Direction::FromGoal).is_none());
}

#[test]
fn bent_tube_is_followed_from_both_ends() {
    let field = tube(12, 12, 1, vec![[0, 2, 0], [9, 2, 0], [9, 10, 0]]);
    let (start, goal) = (Voxel::new(0, 2, 0), Voxel::new(9, 10, 0));
    let uni = run(&field, start, goal, false);
    let bi = run(&field, start, goal, true);

    let uni_path = uni.path().unwrap();
    let bi_path = bi.path().unwrap();
    for path in [uni_path, bi_path] {
        assert_eq!(path.first(), Some(start));
        assert_eq!(path.last(), Some(goal));
        assert!(path.is_connected());
        assert!(
            path.voxels().iter().all(|&v| field.cost_at(v) < 1.0),
            "path leaves the tube: {:?}",
            path.voxels()
        );
    }
    // The optimum cuts the corner diagonally.
    let best = (15.0 + std::f64::consts::SQRT_2) * FLOOR;
    let uni_cost = uni_path.cost_under(&field, FLOOR);
    assert!((uni_cost - best).abs() < 1e-6, "uni cost {uni_cost}");
    let bi_cost = bi_path.cost_under(&field, FLOOR);
    assert!((bi_cost - uni_cost).abs() < 1e-6, "uni {uni_cost} bi {bi_cost}");
    assert_eq!(bi_path.len(), uni_path.len());
}

#[test]
fn bidirectional_explores_no_more_than_it_needs() {
    let field = tube(40, 9, 1, vec![[0, 4, 0], [39, 4, 0]]);
    let (start, goal) = (Voxel::new(0, 4, 0), Voxel::new(39, 4, 0));
    let bi = run(&field, start, goal, true);
    // Each side closes roughly half the tube before they meet.
    let closed = bi.stats().closed_from_start + bi.stats().closed_from_goal;
    assert!(closed <= 42, "closed {closed}");
    assert_eq!(bi.path().unwrap().len(), 40);
}

const SPECKLE_ENDPOINTS: [(Voxel, Voxel); 3] = [
    (Voxel::new(0, 0, 0), Voxel::new(4, 4, 4)),
    (Voxel::new(4, 0, 2), Voxel::new(0, 4, 2)),
    (Voxel::new(2, 2, 0), Voxel::new(2, 2, 4)),
];

#[test]
fn speckle_fields_meet_on_the_optimum() {
    for seed in [1_u64, 1999] {
        let field = speckle_field(5, 5, 5, seed);
        for (start, goal) in SPECKLE_ENDPOINTS {
            let uni = run(&field, start, goal, false).path().unwrap().cost_under(&field, FLOOR);
            let bi = run(&field, start, goal, true).path().unwrap().cost_under(&field, FLOOR);
            assert!(
                (uni - bi).abs() <= uni * 1e-5,
                "seed {seed} {start}->{goal}: uni {uni} bi {bi}"
            );
        }
    }
}

#[test]
fn bidirectional_never_beats_the_optimum() {
    for seed in [7_u64, 42] {
        let field = speckle_field(5, 5, 5, seed);
        for (start, goal) in SPECKLE_ENDPOINTS {
            let best = reference_cost(&field, start, goal, FLOOR).unwrap();
            let finished = run(&field, start, goal, true);
            let path = finished.path().unwrap();
            assert!(path.is_connected());
            assert_eq!(path.first(), Some(start));
            assert_eq!(path.last(), Some(goal));
            let bi = path.cost_under(&field, FLOOR);
            assert!(bi >= best * (1.0 - 1e-5), "seed {seed}: bi {bi} below optimum {best}");
        }
    }
}
