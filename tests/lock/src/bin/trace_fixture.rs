//! Runs one trace configuration and prints its deterministic results as
//! `key=value` lines, for cross-process comparison.
//!
//! Usage: `trace_fixture <config.json>`

use std::path::PathBuf;
use std::process::ExitCode;

use neurite_harness::{run_trace, TraceConfig, TraceReport};

fn main() -> ExitCode {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: trace_fixture <config.json>");
        return ExitCode::from(2);
    };
    match run(&path) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("trace_fixture: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &std::path::Path) -> Result<Vec<String>, neurite_harness::HarnessError> {
    let config = TraceConfig::load(path)?;
    let run = run_trace(&config)?;
    let report = TraceReport::new(&config, &run)?;
    let mut lines = vec![
        format!("config_digest={}", report.config_digest),
        format!("exit_reason={}", report.exit_reason),
        format!("loops={}", report.stats.loops),
        format!("points_in_search={}", report.stats.points_in_search()),
    ];
    if let Some(summary) = &report.path {
        lines.push(format!("voxel_count={}", summary.voxel_count));
        lines.push(format!("path_digest={}", summary.digest));
        lines.push(format!("cost_bits={:016x}", summary.cost.to_bits()));
    }
    lines.push(format!("report_digest={}", report.digest()?));
    Ok(lines)
}
