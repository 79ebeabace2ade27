//! Trace report: the JSON summary of one run, written atomically into an
//! output directory.
//!
//! # Digest surface
//!
//! [`TraceReport::digest`] covers the configuration digest, the exit reason,
//! the path summary and the loop and node counts. Wall-clock time and the
//! number of progress notifications depend on scheduling and are excluded.

use std::path::{Path, PathBuf};

use neurite_kernel::digest::{canonical_hash, ContentHash, HashDomain};
use neurite_search::{ExitReason, SearchStats, ThreadStatus, TracedPath};
use serde::{Deserialize, Serialize};

use crate::config::TraceConfig;
use crate::error::HarnessError;
use crate::runner::TraceRun;

/// File name of the report inside an output directory.
pub const REPORT_FILENAME: &str = "trace_report.json";

pub const REPORT_SCHEMA_VERSION: &str = "trace_report.v1";

/// The found path, summarized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    pub voxel_count: usize,
    /// Physical length in `unit`.
    pub length: f64,
    pub unit: String,
    pub cost: f64,
    pub digest: String,
    pub start: [u32; 3],
    pub end: [u32; 3],
}

impl PathSummary {
    #[must_use]
    pub fn new(path: &TracedPath, cost: f64) -> Self {
        let corner = |v: Option<neurite_kernel::volume::Voxel>| v.map_or([0; 3], |v| [v.x, v.y, v.z]);
        Self {
            voxel_count: path.len(),
            length: path.length(),
            unit: path.unit().to_string(),
            cost,
            digest: path.digest().as_str().to_string(),
            start: corner(path.first()),
            end: corner(path.last()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceReport {
    pub schema_version: String,
    pub config_digest: String,
    pub exit_reason: ExitReason,
    pub success: bool,
    pub path: Option<PathSummary>,
    pub stats: SearchStats,
    pub progress_reports: usize,
    pub status_changes: Vec<ThreadStatus>,
}

impl TraceReport {
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigParse`] if the configuration cannot be
    /// serialized for its digest.
    pub fn new(config: &TraceConfig, run: &TraceRun) -> Result<Self, HarnessError> {
        let path = run
            .path()
            .map(|p| PathSummary::new(p, run.path_cost.unwrap_or_default()));
        Ok(Self {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            config_digest: config.digest()?.as_str().to_string(),
            exit_reason: run.exit_reason(),
            success: run.outcome.success(),
            path,
            stats: run.outcome.stats,
            progress_reports: run.progress_reports,
            status_changes: run.status_changes.clone(),
        })
    }

    /// Digest of the scheduling-independent part of the report.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ConfigParse`] if serialization fails.
    pub fn digest(&self) -> Result<ContentHash, HarnessError> {
        let basis = serde_json::json!({
            "schema_version": self.schema_version,
            "config_digest": self.config_digest,
            "exit_reason": self.exit_reason,
            "path": self.path,
            "loops": self.stats.loops,
            "open_from_start": self.stats.open_from_start,
            "closed_from_start": self.stats.closed_from_start,
            "open_from_goal": self.stats.open_from_goal,
            "closed_from_goal": self.stats.closed_from_goal,
            "open_high_water": self.stats.open_high_water,
        });
        let bytes = serde_json::to_vec(&basis).map_err(HarnessError::ConfigParse)?;
        Ok(canonical_hash(HashDomain::TraceReport, &bytes))
    }

    /// Write `trace_report.json` into `dir`, creating `dir` if needed.
    /// Returns the report path.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::ReportWrite`] on any I/O or serialization
    /// failure.
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf, HarnessError> {
        let path = dir.join(REPORT_FILENAME);
        let write_err = |detail: String| HarnessError::ReportWrite {
            path: path.clone(),
            detail,
        };
        std::fs::create_dir_all(dir).map_err(|e| write_err(format!("create directory: {e}")))?;
        let mut bytes = serde_json::to_vec_pretty(self).map_err(|e| write_err(e.to_string()))?;
        bytes.push(b'\n');
        write_atomic(&path, &bytes).map_err(write_err)?;
        Ok(path)
    }

    /// Read `trace_report.json` from `dir`.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::Io`] if the file cannot be read
    /// - [`HarnessError::ConfigParse`] if it is not a report
    pub fn read_json(dir: &Path) -> Result<Self, HarnessError> {
        let path = dir.join(REPORT_FILENAME);
        let bytes = std::fs::read(&path).map_err(|source| HarnessError::Io { path, source })?;
        serde_json::from_slice(&bytes).map_err(HarnessError::ConfigParse)
    }
}

/// Write to a temp file in the same directory, then rename over `path`.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), String> {
    let dir = path.parent().ok_or_else(|| "no parent directory".to_string())?;
    let temp_name = format!(
        ".tmp_{}",
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = dir.join(temp_name);
    std::fs::write(&temp_path, content)
        .map_err(|e| format!("write {}: {e}", temp_path.display()))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| format!("rename {} to {}: {e}", temp_path.display(), path.display()))
}

/// Load `config_path`, run the trace and write its report into `out_dir`.
///
/// # Errors
///
/// Any error from loading, running or writing.
pub fn trace_to_dir(config_path: &Path, out_dir: &Path) -> Result<TraceReport, HarnessError> {
    let config = TraceConfig::load(config_path)?;
    let run = crate::runner::run_trace(&config)?;
    let report = TraceReport::new(&config, &run)?;
    report.write_json(out_dir)?;
    Ok(report)
}
