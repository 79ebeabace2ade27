//! Cross-process determinism: the `trace_fixture` binary prints identical
//! results regardless of working directory, locale or log settings.

use std::path::Path;
use std::process::Command;

use lock_tests::FIXTURE_CONFIG;

fn run_variant(config: &Path, work_dir: &Path, env_overrides: &[(&str, &str)]) -> String {
    let bin = env!("CARGO_BIN_EXE_trace_fixture");
    let mut command = Command::new(bin);
    command
        .arg(config)
        .current_dir(work_dir)
        .env_remove("LC_ALL")
        .env_remove("LANG")
        .env_remove("RUST_LOG");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }
    let output = command
        .output()
        .unwrap_or_else(|e| panic!("failed to spawn {bin}: {e}"));
    assert!(
        output.status.success(),
        "trace_fixture exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

#[test]
fn three_environments_agree() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("fixture.json");
    std::fs::write(&config, FIXTURE_CONFIG).unwrap();
    let other = tempfile::tempdir().unwrap();

    let baseline = run_variant(&config, dir.path(), &[]);
    let moved = run_variant(&config, other.path(), &[("LC_ALL", "C")]);
    let noisy = run_variant(&config, other.path(), &[("LANG", "de_DE.UTF-8"), ("RUST_LOG", "trace")]);

    assert!(baseline.contains("exit_reason=SUCCESS"), "{baseline}");
    assert!(baseline.contains("path_digest=sha256:"), "{baseline}");
    assert_eq!(baseline, moved);
    assert_eq!(baseline, noisy);
}

#[test]
fn in_process_run_matches_fixture_output() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("fixture.json");
    std::fs::write(&config_path, FIXTURE_CONFIG).unwrap();
    let printed = run_variant(&config_path, dir.path(), &[]);

    let config = neurite_harness::TraceConfig::load(&config_path).unwrap();
    let run = neurite_harness::run_trace(&config).unwrap();
    let path = run.path().unwrap();
    assert!(printed.contains(&format!("path_digest={}", path.digest())));
    assert!(printed.contains(&format!("voxel_count={}", path.len())));
}
