//! Neurite Harness: runs traces described by JSON configuration files and
//! writes their reports.
//!
//! The harness does NOT implement search logic; it builds a request, hands
//! it to `neurite_search`'s worker and listens for notifications.
//!
//! ```text
//! config (TraceConfig) → volumes (cost field) → runner (engine + sink)
//!   → report (trace_report.json)
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod report;
pub mod runner;
pub mod volumes;

pub use config::{TraceConfig, VolumeSource};
pub use error::HarnessError;
pub use report::{trace_to_dir, PathSummary, TraceReport, REPORT_FILENAME};
pub use runner::{build_request, run_trace, ChannelSink, TraceRun};
