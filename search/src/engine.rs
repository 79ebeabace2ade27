//! The search worker: runs a [`SearchCore`] on its own thread under pause,
//! stop and timeout control, and reports progress to registered sinks.
//!
//! # Control model
//!
//! The run state lives in an atomic read once per iteration. Control
//! methods change it under a mutex and signal a condition variable, so a
//! paused worker wakes at once on resume or stop. A paused worker also
//! wakes every `pause_poll_milliseconds` to re-report its status.
//!
//! Sinks are only ever called from the worker. The worker reports each
//! status change it observes, so `on_finished` is always the final call.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, trace, warn};

use crate::error::SearchError;
use crate::outcome::{ExitReason, SearchOutcome, SearchStats};
use crate::path::TracedPath;
use crate::policy::CHECK_EVERY_LOOPS;
use crate::progress::{Notifier, ProgressSink, ThreadStatus};
use crate::search::{SearchCore, SearchRequest, StepOutcome};

/// Name given to worker threads.
pub const WORKER_THREAD_NAME: &str = "neurite-search";

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Control {
    status: AtomicU8,
    lock: Mutex<()>,
    wake: Condvar,
}

impl Control {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(ThreadStatus::Paused.to_u8()),
            lock: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    fn status(&self) -> ThreadStatus {
        ThreadStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn update(&self, f: impl FnOnce(ThreadStatus) -> ThreadStatus) -> ThreadStatus {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let next = f(self.status());
        self.status.store(next.to_u8(), Ordering::Release);
        self.wake.notify_all();
        next
    }

    /// Enter the initial run state unless a stop already arrived.
    fn begin(&self, start_paused: bool) -> ThreadStatus {
        self.update(|current| match current {
            ThreadStatus::Stopping => ThreadStatus::Stopping,
            _ if start_paused => ThreadStatus::Paused,
            _ => ThreadStatus::Running,
        })
    }

    fn toggle_pause(&self) -> ThreadStatus {
        self.update(|current| match current {
            ThreadStatus::Running => ThreadStatus::Paused,
            ThreadStatus::Paused => ThreadStatus::Running,
            ThreadStatus::Stopping => ThreadStatus::Stopping,
        })
    }

    fn stop(&self) {
        self.update(|_| ThreadStatus::Stopping);
    }

    /// Block while paused, for at most `poll`.
    fn wait_while_paused(&self, poll: Duration) {
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _woken = self
            .wake
            .wait_timeout_while(guard, poll, |_| self.status() == ThreadStatus::Paused)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

// ---------------------------------------------------------------------------
// Finished search
// ---------------------------------------------------------------------------

/// A completed run: its outcome plus the search state it ended in, for
/// statistics and rendering queries.
#[derive(Debug)]
pub struct FinishedSearch {
    outcome: SearchOutcome,
    core: SearchCore,
}

impl FinishedSearch {
    #[must_use]
    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    #[must_use]
    pub fn exit_reason(&self) -> ExitReason {
        self.outcome.exit_reason
    }

    #[must_use]
    pub fn path(&self) -> Option<&TracedPath> {
        self.outcome.path.as_ref()
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.outcome.stats
    }

    #[must_use]
    pub fn core(&self) -> &SearchCore {
        &self.core
    }

    #[must_use]
    pub fn into_outcome(self) -> SearchOutcome {
        self.outcome
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

enum Stage {
    Ready(Box<SearchCore>),
    Running(JoinHandle<Option<FinishedSearch>>),
    Joined,
}

/// Owns one search from set-up to join.
///
/// Before [`SearchEngine::start`] the thread status reads
/// [`ThreadStatus::Paused`]; the worker replaces it with the policy's start
/// state, unless a stop was requested first.
pub struct SearchEngine {
    control: Arc<Control>,
    exit_reason: Arc<OnceLock<ExitReason>>,
    notifier: Notifier,
    stage: Stage,
}

impl std::fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match &self.stage {
            Stage::Ready(_) => "ready",
            Stage::Running(_) => "running",
            Stage::Joined => "joined",
        };
        f.debug_struct("SearchEngine")
            .field("stage", &stage)
            .field("thread_status", &self.thread_status())
            .field("exit_reason", &self.exit_reason())
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    /// # Errors
    ///
    /// Returns the [`SearchCore::new`] validation error for a bad request.
    pub fn new(request: SearchRequest) -> Result<Self, SearchError> {
        Ok(Self::from_core(SearchCore::new(request)?))
    }

    /// Wrap an already prepared (for example, extra-seeded) core.
    #[must_use]
    pub fn from_core(core: SearchCore) -> Self {
        Self {
            control: Arc::new(Control::new()),
            exit_reason: Arc::new(OnceLock::new()),
            notifier: Notifier::default(),
            stage: Stage::Ready(Box::new(core)),
        }
    }

    /// The core, while the search has not started.
    #[must_use]
    pub fn core(&self) -> Option<&SearchCore> {
        match &self.stage {
            Stage::Ready(core) => Some(&**core),
            _ => None,
        }
    }

    /// Mutable access for seeding, while the search has not started.
    pub fn core_mut(&mut self) -> Option<&mut SearchCore> {
        match &mut self.stage {
            Stage::Ready(core) => Some(&mut **core),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns [`SearchError::AlreadyStarted`] once the worker is running.
    pub fn add_progress_sink(&mut self, sink: Arc<dyn ProgressSink>) -> Result<(), SearchError> {
        if !matches!(self.stage, Stage::Ready(_)) {
            return Err(SearchError::AlreadyStarted);
        }
        self.notifier.push(sink);
        Ok(())
    }

    /// Spawn the worker thread.
    ///
    /// # Errors
    ///
    /// - [`SearchError::AlreadyStarted`] if called twice
    /// - [`SearchError::WorkerSpawn`] if the OS refuses the thread
    pub fn start(&mut self) -> Result<(), SearchError> {
        if !matches!(self.stage, Stage::Ready(_)) {
            return Err(SearchError::AlreadyStarted);
        }
        let Stage::Ready(core) = std::mem::replace(&mut self.stage, Stage::Joined) else {
            return Err(SearchError::AlreadyStarted);
        };
        let control = Arc::clone(&self.control);
        let exit_reason = Arc::clone(&self.exit_reason);
        let notifier = self.notifier.clone();
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut core = *core;
                let run = catch_unwind(AssertUnwindSafe(|| {
                    drive(&mut core, &control, &notifier, &exit_reason)
                }));
                match run {
                    Ok(outcome) => Some(FinishedSearch { outcome, core }),
                    Err(payload) => {
                        error!("search worker panicked: {}", panic_message(payload.as_ref()));
                        None
                    }
                }
            })
            .map_err(SearchError::WorkerSpawn)?;
        self.stage = Stage::Running(handle);
        Ok(())
    }

    /// Flip between running and paused. A stopping search stays stopping.
    /// Returns the new state.
    pub fn request_pause_or_resume(&self) -> ThreadStatus {
        let next = self.control.toggle_pause();
        debug!("pause/resume requested, now {next}");
        next
    }

    /// Ask the worker to stop at its next iteration.
    pub fn request_stop(&self) {
        debug!("stop requested");
        self.control.stop();
    }

    #[must_use]
    pub fn thread_status(&self) -> ThreadStatus {
        self.control.status()
    }

    /// Set once, when the worker leaves its loop.
    #[must_use]
    pub fn exit_reason(&self) -> Option<ExitReason> {
        self.exit_reason.get().copied()
    }

    /// Whether the worker thread has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        match &self.stage {
            Stage::Ready(_) => false,
            Stage::Running(handle) => handle.is_finished(),
            Stage::Joined => true,
        }
    }

    /// Wait for the worker and take its result.
    ///
    /// # Errors
    ///
    /// - [`SearchError::NotStarted`] before [`SearchEngine::start`] or after
    ///   a previous join
    /// - [`SearchError::WorkerPanicked`] if the worker died in a panic
    pub fn join(&mut self) -> Result<FinishedSearch, SearchError> {
        match std::mem::replace(&mut self.stage, Stage::Joined) {
            Stage::Running(handle) => handle
                .join()
                .ok()
                .flatten()
                .ok_or(SearchError::WorkerPanicked),
            other => {
                self.stage = other;
                Err(SearchError::NotStarted)
            }
        }
    }

    /// Run the whole search on the calling thread.
    ///
    /// Sinks are still notified; control methods have no other thread to
    /// act from, so they only matter if a sink calls them.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::AlreadyStarted`] if the worker was spawned.
    pub fn run_blocking(mut self) -> Result<FinishedSearch, SearchError> {
        let Stage::Ready(core) = std::mem::replace(&mut self.stage, Stage::Joined) else {
            return Err(SearchError::AlreadyStarted);
        };
        let mut core = *core;
        let outcome = drive(&mut core, &self.control, &self.notifier, &self.exit_reason);
        Ok(FinishedSearch { outcome, core })
    }
}

impl Drop for SearchEngine {
    fn drop(&mut self) {
        if let Stage::Running(handle) = &self.stage {
            if !handle.is_finished() {
                self.control.stop();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

fn drive(
    core: &mut SearchCore,
    control: &Control,
    notifier: &Notifier,
    exit: &OnceLock<ExitReason>,
) -> SearchOutcome {
    let policy = core.policy().clone();
    let poll = Duration::from_millis(policy.pause_poll_milliseconds);
    let timeout = (policy.timeout_seconds > 0).then(|| Duration::from_secs(policy.timeout_seconds));
    let report_every = (policy.report_every_milliseconds > 0)
        .then(|| Duration::from_millis(policy.report_every_milliseconds));

    let started = Instant::now();
    let mut last_report = started;
    let mut loops_at_last_report = core.loops();
    let mut reported = control.begin(policy.start_paused);
    debug!("search worker started, {reported}");
    notifier.thread_status(reported);

    let (exit_reason, path) = loop {
        let status = control.status();
        if status != reported {
            debug!("search worker now {status}");
            notifier.thread_status(status);
            reported = status;
        }
        match status {
            ThreadStatus::Stopping => break (ExitReason::Cancelled, None),
            ThreadStatus::Paused => {
                control.wait_while_paused(poll);
                if control.status() == ThreadStatus::Paused {
                    notifier.thread_status(ThreadStatus::Paused);
                }
                continue;
            }
            ThreadStatus::Running => {}
        }

        let loops = core.loops();
        if loops % CHECK_EVERY_LOOPS == 0 {
            let now = Instant::now();
            if let Some(limit) = timeout {
                if now.duration_since(started) > limit {
                    info!("search timed out after {} s and {loops} loops", limit.as_secs());
                    break (ExitReason::TimedOut, None);
                }
            }
            if let Some(every) = report_every {
                let since = now.duration_since(last_report);
                if since > every {
                    let done = loops - loops_at_last_report;
                    if done > 0 {
                        #[allow(clippy::cast_precision_loss)]
                        let per_loop = since.as_secs_f64() * 1000.0 / done as f64;
                        trace!("{per_loop:.4} ms per loop over the last {done} loops");
                    }
                    notifier.points_in_search(core.open_len(), core.closed_len());
                    last_report = now;
                    loops_at_last_report = loops;
                }
            }
        }

        match core.step() {
            StepOutcome::Expanded => {}
            StepOutcome::Found(path) => break (ExitReason::Success, Some(path)),
            StepOutcome::Exhausted => {
                warn!("search exhausted every reachable point without reaching a goal");
                break (ExitReason::PointsExhausted, None);
            }
            StepOutcome::OutOfMemory(e) => {
                error!("search stopped: {e}");
                break (ExitReason::OutOfMemory, None);
            }
        }
    };

    let _ = exit.set(exit_reason);
    let outcome = SearchOutcome {
        exit_reason,
        path,
        stats: core.stats(started.elapsed()),
    };
    debug!(
        "search finished: {exit_reason} after {} loops, {} points",
        outcome.stats.loops,
        outcome.stats.points_in_search()
    );
    notifier.finished(exit_reason, outcome.path.as_ref());
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
