//! End-to-end: configuration file on disk, trace, report on disk.

use std::path::Path;

use neurite_harness::{trace_to_dir, HarnessError, TraceConfig, TraceReport, REPORT_FILENAME};
use neurite_search::{ExitReason, ThreadStatus};

fn write(dir: &Path, name: &str, contents: &[u8]) {
    std::fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn raw_sixteen_bit_stack_is_traced_along_its_bright_row() {
    let dir = tempfile::tempdir().unwrap();
    let (w, h, d) = (8_u32, 4_u32, 2_u32);
    let mut bytes = Vec::new();
    for _z in 0..d {
        for y in 0..h {
            for _x in 0..w {
                let sample: u16 = if y == 2 { 4000 } else { 100 };
                bytes.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }
    write(dir.path(), "stack.raw", &bytes);
    write(
        dir.path(),
        "trace.json",
        br#"{
            "volume": { "kind": "raw", "path": "stack.raw", "pixel_type": "gray16",
                        "width": 8, "height": 4, "depth": 2 },
            "start": [0, 2, 0],
            "goal": [7, 2, 0],
            "policy": { "bidirectional": true }
        }"#,
    );

    let out = dir.path().join("out");
    let report = trace_to_dir(&dir.path().join("trace.json"), &out).unwrap();
    assert!(out.join(REPORT_FILENAME).is_file());
    assert_eq!(report.exit_reason, ExitReason::Success);
    assert_eq!(report.status_changes.first(), Some(&ThreadStatus::Running));
    let path = report.path.as_ref().unwrap();
    assert_eq!(path.voxel_count, 8);
    assert_eq!((path.start, path.end), ([0, 2, 0], [7, 2, 0]));
    assert!((path.cost - 7.0 / 255.0).abs() < 1e-9, "cost {}", path.cost);

    let back = TraceReport::read_json(&out).unwrap();
    assert_eq!(back.digest().unwrap(), report.digest().unwrap());
}

#[test]
fn exploration_reports_exhaustion_without_a_path() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "explore.json",
        br#"{
            "volume": { "kind": "uniform", "width": 5, "height": 4, "depth": 3, "value": 90 },
            "start": [2, 2, 1],
            "cost": "inverted"
        }"#,
    );
    let out = dir.path().join("out");
    let report = trace_to_dir(&dir.path().join("explore.json"), &out).unwrap();
    assert_eq!(report.exit_reason, ExitReason::PointsExhausted);
    assert!(!report.success);
    assert!(report.path.is_none());
    assert_eq!(report.stats.closed_from_start, 5 * 4 * 3);
    assert_eq!(report.stats.open_from_start, 0);
}

#[test]
fn configuration_errors_surface_before_running() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "bad.json",
        br#"{
            "volume": { "kind": "uniform", "width": 5, "height": 4, "depth": 3, "value": 90 },
            "start": [0, 0, 0],
            "policy": { "bidirectional": true }
        }"#,
    );
    let err = trace_to_dir(&dir.path().join("bad.json"), &dir.path().join("out")).unwrap_err();
    assert!(
        matches!(err, HarnessError::Search(neurite_search::SearchError::BidirectionalWithoutGoal)),
        "got {err:?}"
    );
    assert!(!dir.path().join("out").exists());

    let missing = TraceConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, HarnessError::Io { .. }));
}
