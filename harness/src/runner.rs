//! Harness runner: builds a search from a [`TraceConfig`], runs it on the
//! engine's worker thread and waits for the finished notification.
//!
//! # Pipeline
//!
//! ```text
//! TraceConfig → build_field() → build_request() → SearchEngine::start()
//!   → [progress events over a channel] → Finished → join() → TraceRun
//! ```
//!
//! The runner only observes the worker through a [`ProgressSink`]; it never
//! touches the core while the search runs.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info};
use neurite_search::{
    ExitReason, FinishedSearch, ProgressEvent, ProgressSink, SearchEngine, SearchError,
    SearchOutcome, SearchRequest, ThreadStatus, TracedPath, ZeroHeuristic,
};

use crate::config::{HeuristicStrategy, TraceConfig};
use crate::error::HarnessError;
use crate::volumes::{build_field, cost_fn};

/// How long one wait on the event channel lasts before the runner checks
/// the worker and the liveness deadline.
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Forwards every notification into a channel.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Mutex<Sender<ProgressEvent>>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx: Mutex::new(tx) }
    }

    /// A sink plus the receiving end of its channel.
    #[must_use]
    pub fn pair() -> (Arc<Self>, Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self::new(tx)), rx)
    }

    fn send(&self, event: ProgressEvent) {
        // A dropped receiver means nobody is listening any more.
        let _ = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(event);
    }
}

impl ProgressSink for ChannelSink {
    fn on_thread_status(&self, status: ThreadStatus) {
        self.send(ProgressEvent::ThreadStatus(status));
    }

    fn on_points_in_search(&self, open: usize, closed: usize) {
        self.send(ProgressEvent::PointsInSearch { open, closed });
    }

    fn on_finished(&self, success: bool, exit_reason: ExitReason, path: Option<&TracedPath>) {
        self.send(ProgressEvent::Finished {
            success,
            exit_reason,
            path: path.cloned(),
        });
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone)]
pub struct TraceRun {
    pub outcome: SearchOutcome,
    /// Floor on cost per unit distance the search used.
    pub minimum_cost: f64,
    /// Cost of the found path under the run's field and floor.
    pub path_cost: Option<f64>,
    /// Number of points-in-search notifications.
    pub progress_reports: usize,
    /// Thread statuses in notification order.
    pub status_changes: Vec<ThreadStatus>,
}

impl TraceRun {
    #[must_use]
    pub fn exit_reason(&self) -> ExitReason {
        self.outcome.exit_reason
    }

    #[must_use]
    pub fn path(&self) -> Option<&TracedPath> {
        self.outcome.path.as_ref()
    }
}

/// Build the search request a configuration describes.
///
/// The cost floor is the configured `minimum_cost`, or the cost strategy's
/// suggested minimum when none is given.
///
/// # Errors
///
/// Returns [`HarnessError::InvalidConfig`] if the configuration does not
/// validate, and field construction errors from [`build_field`].
pub fn build_request(config: &TraceConfig) -> Result<SearchRequest, HarnessError> {
    config.validate()?;
    let field = build_field(config)?;
    let minimum_cost = config
        .minimum_cost
        .unwrap_or_else(|| cost_fn(config.cost).suggested_minimum_cost());
    let mut policy = config.policy.clone();
    policy.minimum_cost_per_unit_distance = minimum_cost;

    let mut request = SearchRequest::new(field, config.start_voxel()).with_policy(policy);
    if let Some(goal) = config.goal_voxel() {
        request = request.with_goal(goal);
    }
    if config.heuristic == HeuristicStrategy::Zero {
        request = request.with_heuristic(Arc::new(ZeroHeuristic));
    }
    Ok(request)
}

/// Run one trace to completion on a worker thread.
///
/// # Errors
///
/// - configuration and field errors from [`build_request`]
/// - [`SearchError`] if the engine cannot start or the worker panics
/// - [`HarnessError::NoNotification`] if no finished notification arrives
///   within `config.liveness_seconds`; the worker is asked to stop
pub fn run_trace(config: &TraceConfig) -> Result<TraceRun, HarnessError> {
    let request = build_request(config)?;
    let minimum_cost = request.policy.minimum_cost_per_unit_distance;
    let mut engine = SearchEngine::new(request)?;
    let (sink, rx) = ChannelSink::pair();
    engine.add_progress_sink(sink)?;
    engine.start()?;
    debug!("trace started, liveness window {} s", config.liveness_seconds);

    let mut observed = Observed::default();
    let deadline = Instant::now().checked_add(Duration::from_secs(config.liveness_seconds));
    loop {
        match rx.recv_timeout(WAIT_SLICE) {
            Ok(event) => {
                if observed.record(event) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if engine.is_finished() {
                    // Drain anything sent just before the worker ended.
                    let finished = rx.try_iter().any(|event| observed.record(event));
                    if !finished {
                        engine.join()?;
                        return Err(SearchError::WorkerPanicked.into());
                    }
                    break;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    engine.request_stop();
                    return Err(HarnessError::NoNotification {
                        seconds: config.liveness_seconds,
                    });
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                engine.join()?;
                return Err(SearchError::WorkerPanicked.into());
            }
        }
    }

    let finished = engine.join()?;
    let run = observed.into_run(finished, minimum_cost);
    info!(
        "trace finished: {} after {} loops",
        run.exit_reason(),
        run.outcome.stats.loops
    );
    Ok(run)
}

#[derive(Default)]
struct Observed {
    progress_reports: usize,
    status_changes: Vec<ThreadStatus>,
}

impl Observed {
    /// Record one event; `true` once the finished notification arrives.
    fn record(&mut self, event: ProgressEvent) -> bool {
        match event {
            ProgressEvent::ThreadStatus(status) => self.status_changes.push(status),
            ProgressEvent::PointsInSearch { .. } => self.progress_reports += 1,
            ProgressEvent::Finished { .. } => return true,
        }
        false
    }

    fn into_run(self, finished: FinishedSearch, minimum_cost: f64) -> TraceRun {
        let path_cost = finished
            .path()
            .map(|p| p.cost_under(finished.core().field(), minimum_cost));
        TraceRun {
            outcome: finished.into_outcome(),
            minimum_cost,
            path_cost,
            progress_reports: self.progress_reports,
            status_changes: self.status_changes,
        }
    }
}
