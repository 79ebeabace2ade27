//! Unidirectional searches find minimum-cost paths.
//!
//! Every found path is re-costed in f64 and compared against an
//! independent Dijkstra over the same field and cost floor.

use std::sync::Arc;

use lock_tests::{reference_cost, speckle_field, uniform_field};
use neurite_kernel::volume::{Calibration, VolumetricCostField, Voxel};
use neurite_search::{
    ExitReason, Heuristic, SearchEngine, SearchPolicy, SearchRequest, ZeroHeuristic,
};

const FLOOR: f64 = 1.0 / 255.0;

fn policy() -> SearchPolicy {
    SearchPolicy {
        minimum_cost_per_unit_distance: FLOOR,
        ..SearchPolicy::default()
    }
}

fn trace(
    field: VolumetricCostField,
    start: Voxel,
    goal: Voxel,
    heuristic: Option<Arc<dyn Heuristic>>,
) -> f64 {
    let mut request = SearchRequest::new(field.clone(), start)
        .with_goal(goal)
        .with_policy(policy());
    if let Some(h) = heuristic {
        request = request.with_heuristic(h);
    }
    let finished = SearchEngine::new(request).unwrap().run_blocking().unwrap();
    assert_eq!(finished.exit_reason(), ExitReason::Success);
    let path = finished.path().unwrap();
    assert_eq!(path.first(), Some(start));
    assert_eq!(path.last(), Some(goal));
    assert!(path.is_connected());
    path.cost_under(&field, FLOOR)
}

fn assert_close(found: f64, best: f64) {
    assert!(
        (found - best).abs() <= best * 1e-5 + 1e-9,
        "found {found}, optimum {best}"
    );
}

#[test]
fn speckle_fields_match_reference_dijkstra() {
    let endpoints = [
        (Voxel::new(0, 0, 0), Voxel::new(4, 4, 4)),
        (Voxel::new(4, 0, 2), Voxel::new(0, 4, 2)),
        (Voxel::new(2, 2, 0), Voxel::new(2, 2, 4)),
    ];
    for seed in [1_u64, 7, 42, 1999] {
        let field = speckle_field(5, 5, 5, seed);
        for (start, goal) in endpoints {
            let best = reference_cost(&field, start, goal, FLOOR).unwrap();
            let with_euclid = trace(field.clone(), start, goal, None);
            assert_close(with_euclid, best);
            let with_zero = trace(field.clone(), start, goal, Some(Arc::new(ZeroHeuristic)));
            assert_close(with_zero, best);
        }
    }
}

#[test]
fn anisotropic_spacing_is_respected() {
    let base = speckle_field(6, 6, 4, 3);
    let field = VolumetricCostField::new(
        Arc::clone(base.stack()),
        Calibration::new(0.5, 0.5, 2.0, "micron").unwrap(),
    );
    let (start, goal) = (Voxel::new(0, 5, 0), Voxel::new(5, 0, 3));
    let best = reference_cost(&field, start, goal, FLOOR).unwrap();
    assert_close(trace(field, start, goal, None), best);
}

#[test]
fn uniform_diagonal_is_straight() {
    let field = uniform_field(8, 8, 1, 255);
    let finished = SearchEngine::new(
        SearchRequest::new(field, Voxel::new(0, 0, 0))
            .with_goal(Voxel::new(7, 7, 0))
            .with_policy(policy()),
    )
    .unwrap()
    .run_blocking()
    .unwrap();
    let path = finished.path().unwrap();
    let expected: Vec<Voxel> = (0..8).map(|i| Voxel::new(i, i, 0)).collect();
    assert_eq!(path.voxels(), expected.as_slice());
    assert!((path.length() - 7.0 * std::f64::consts::SQRT_2).abs() < 1e-9);
}
