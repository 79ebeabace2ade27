//! Harness errors.

use std::path::PathBuf;

use neurite_kernel::FieldError;
use neurite_search::SearchError;
use thiserror::Error;

/// Failure to configure, run or report a trace.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed trace configuration: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("invalid trace configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("no finished notification within {seconds} s")]
    NoNotification { seconds: u64 },

    #[error("cannot write report to {path}: {detail}")]
    ReportWrite { path: PathBuf, detail: String },
}
