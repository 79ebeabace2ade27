//! Progress notifications from a running search.
//!
//! Every callback runs on the worker thread, in the order the worker makes
//! its observations. `on_finished` is always the last call and is made at
//! most once per run (never when the worker panics).

use std::sync::{Arc, Mutex, PoisonError};

use crate::outcome::ExitReason;
use crate::path::TracedPath;

/// Run state of a search worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreadStatus {
    Running,
    Paused,
    Stopping,
}

impl ThreadStatus {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Paused => 1,
            Self::Stopping => 2,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Running,
            1 => Self::Paused,
            _ => Self::Stopping,
        }
    }
}

impl std::fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Stopping => "STOPPING",
        })
    }
}

/// Receives notifications from a search worker.
///
/// Implementations must not block for long; the search waits on them. They
/// may call the engine's control methods.
pub trait ProgressSink: Send + Sync {
    fn on_thread_status(&self, _status: ThreadStatus) {}

    /// Current open and closed node counts, summed over both directions.
    fn on_points_in_search(&self, _open: usize, _closed: usize) {}

    /// The run is over. `path` is present exactly when `success` is true.
    fn on_finished(&self, success: bool, exit_reason: ExitReason, path: Option<&TracedPath>);
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ThreadStatus(ThreadStatus),
    PointsInSearch {
        open: usize,
        closed: usize,
    },
    Finished {
        success: bool,
        exit_reason: ExitReason,
        path: Option<TracedPath>,
    },
}

impl ProgressEvent {
    pub(crate) fn finished(success: bool, exit_reason: ExitReason, path: Option<&TracedPath>) -> Self {
        Self::Finished {
            success,
            exit_reason,
            path: path.cloned(),
        }
    }
}

/// A sink that keeps every event, for tests and post-run inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Thread statuses in the order they were reported.
    #[must_use]
    pub fn statuses(&self) -> Vec<ThreadStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::ThreadStatus(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// The finished event, if one arrived.
    #[must_use]
    pub fn finished(&self) -> Option<ProgressEvent> {
        self.events()
            .into_iter()
            .find(|e| matches!(e, ProgressEvent::Finished { .. }))
    }

    fn push(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl ProgressSink for RecordingSink {
    fn on_thread_status(&self, status: ThreadStatus) {
        self.push(ProgressEvent::ThreadStatus(status));
    }

    fn on_points_in_search(&self, open: usize, closed: usize) {
        self.push(ProgressEvent::PointsInSearch { open, closed });
    }

    fn on_finished(&self, success: bool, exit_reason: ExitReason, path: Option<&TracedPath>) {
        self.push(ProgressEvent::finished(success, exit_reason, path));
    }
}

/// Fan-out to every registered sink, in registration order.
#[derive(Clone, Default)]
pub(crate) struct Notifier {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl Notifier {
    pub(crate) fn push(&mut self, sink: Arc<dyn ProgressSink>) {
        self.sinks.push(sink);
    }

    pub(crate) fn thread_status(&self, status: ThreadStatus) {
        for sink in &self.sinks {
            sink.on_thread_status(status);
        }
    }

    pub(crate) fn points_in_search(&self, open: usize, closed: usize) {
        for sink in &self.sinks {
            sink.on_points_in_search(open, closed);
        }
    }

    pub(crate) fn finished(&self, exit_reason: ExitReason, path: Option<&TracedPath>) {
        for sink in &self.sinks {
            sink.on_finished(exit_reason.is_success(), exit_reason, path);
        }
    }
}
