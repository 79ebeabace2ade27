//! Worker control: stop, pause, resume, timeout and drop, observed only
//! through progress notifications and the engine's public state.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::{Duration, Instant};

use lock_tests::slow_field;
use neurite_harness::ChannelSink;
use neurite_kernel::volume::{VolumetricCostField, Voxel};
use neurite_search::{
    ExitReason, ProgressEvent, SearchEngine, SearchPolicy, SearchRequest, ThreadStatus,
};

const WAIT: Duration = Duration::from_secs(30);

fn engine(
    field: VolumetricCostField,
    goal: Option<Voxel>,
    policy: SearchPolicy,
) -> (SearchEngine, Receiver<ProgressEvent>) {
    let mut request = SearchRequest::new(field, Voxel::new(0, 0, 0)).with_policy(policy);
    if let Some(goal) = goal {
        request = request.with_goal(goal);
    }
    let mut engine = SearchEngine::new(request).unwrap();
    let (sink, rx) = ChannelSink::pair();
    engine.add_progress_sink(sink).unwrap();
    (engine, rx)
}

fn next_status(rx: &Receiver<ProgressEvent>) -> ThreadStatus {
    loop {
        match rx.recv_timeout(WAIT).expect("worker went silent") {
            ProgressEvent::ThreadStatus(status) => return status,
            ProgressEvent::PointsInSearch { .. } => {}
            ProgressEvent::Finished { exit_reason, .. } => {
                panic!("finished with {exit_reason} while waiting for a status")
            }
        }
    }
}

fn drain(rx: &Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
    rx.try_iter().collect()
}

fn statuses(events: &[ProgressEvent]) -> Vec<ThreadStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::ThreadStatus(s) => Some(*s),
            _ => None,
        })
        .collect()
}

#[test]
fn stop_cancels_a_running_exploration() {
    let (mut engine, rx) = engine(slow_field(64, 64, 16, 200), None, SearchPolicy::default());
    engine.start().unwrap();
    assert_eq!(next_status(&rx), ThreadStatus::Running);
    engine.request_stop();

    let finished = engine.join().unwrap();
    assert_eq!(finished.exit_reason(), ExitReason::Cancelled);
    assert!(finished.path().is_none());
    assert_eq!(engine.exit_reason(), Some(ExitReason::Cancelled));
    assert_eq!(engine.thread_status(), ThreadStatus::Stopping);
    assert!(finished.stats().points_in_search() < 64 * 64 * 16);

    let events = drain(&rx);
    assert_eq!(statuses(&events).last(), Some(&ThreadStatus::Stopping));
    assert_eq!(
        events.last(),
        Some(&ProgressEvent::Finished {
            success: false,
            exit_reason: ExitReason::Cancelled,
            path: None,
        })
    );
}

#[test]
fn start_paused_waits_for_resume_and_keeps_result() {
    let policy = SearchPolicy {
        start_paused: true,
        pause_poll_milliseconds: 10,
        ..SearchPolicy::default()
    };
    let field = slow_field(20, 20, 6, 20);
    let goal = Some(Voxel::new(19, 19, 5));
    let (mut engine, rx) = engine(field.clone(), goal, policy.clone());
    engine.start().unwrap();
    assert_eq!(next_status(&rx), ThreadStatus::Paused);

    std::thread::sleep(Duration::from_millis(100));
    assert!(!engine.is_finished());
    assert_eq!(engine.exit_reason(), None);
    assert_eq!(engine.thread_status(), ThreadStatus::Paused);
    // The poll timer re-reports the paused state.
    assert_eq!(next_status(&rx), ThreadStatus::Paused);

    assert_eq!(engine.request_pause_or_resume(), ThreadStatus::Running);
    let finished = engine.join().unwrap();
    assert_eq!(finished.exit_reason(), ExitReason::Success);
    assert!(statuses(&drain(&rx)).contains(&ThreadStatus::Running));

    let (blocking, _rx) = engine_for_blocking(field, goal, policy);
    let reference = blocking.run_blocking().unwrap();
    assert_eq!(
        finished.path().unwrap().digest(),
        reference.path().unwrap().digest()
    );
    assert_eq!(finished.stats().loops, reference.stats().loops);
}

fn engine_for_blocking(
    field: VolumetricCostField,
    goal: Option<Voxel>,
    policy: SearchPolicy,
) -> (SearchEngine, Receiver<ProgressEvent>) {
    engine(
        field,
        goal,
        SearchPolicy {
            start_paused: false,
            ..policy
        },
    )
}

#[test]
fn pausing_mid_run_does_not_change_the_result() {
    let field = slow_field(24, 24, 8, 50);
    let goal = Some(Voxel::new(23, 23, 7));
    let (mut engine, rx) = engine(field.clone(), goal, SearchPolicy::default());
    engine.start().unwrap();
    assert_eq!(next_status(&rx), ThreadStatus::Running);
    engine.request_pause_or_resume();
    std::thread::sleep(Duration::from_millis(50));
    engine.request_pause_or_resume();
    let finished = engine.join().unwrap();
    assert_eq!(finished.exit_reason(), ExitReason::Success);

    let (blocking, _rx) = engine_for_blocking(field, goal, SearchPolicy::default());
    let reference = blocking.run_blocking().unwrap();
    assert_eq!(
        finished.path().unwrap().digest(),
        reference.path().unwrap().digest()
    );
}

#[test]
fn timeout_ends_a_long_exploration() {
    let policy = SearchPolicy {
        timeout_seconds: 1,
        report_every_milliseconds: 100,
        ..SearchPolicy::default()
    };
    let (mut engine, rx) = engine(slow_field(128, 128, 64, 200), None, policy);
    let began = Instant::now();
    engine.start().unwrap();
    let finished = engine.join().unwrap();
    let took = began.elapsed();

    assert_eq!(finished.exit_reason(), ExitReason::TimedOut);
    assert!(finished.path().is_none());
    // The deadline is checked every 1000 loops, so the overshoot is at most
    // one batch of expansions.
    let elapsed = finished.stats().elapsed_millis;
    assert!((1000..1750).contains(&elapsed), "elapsed {elapsed} ms");
    assert!(took < Duration::from_secs(3), "took {took:?}");

    let events = drain(&rx);
    let reports = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::PointsInSearch { .. }))
        .count();
    assert!(reports >= 1, "no progress reports in {events:?}");
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::Finished {
            success: false,
            exit_reason: ExitReason::TimedOut,
            path: None,
        })
    ));
}

#[test]
fn dropping_a_running_engine_stops_its_worker() {
    let (mut engine, rx) = engine(slow_field(64, 64, 16, 200), None, SearchPolicy::default());
    engine.start().unwrap();
    assert_eq!(next_status(&rx), ThreadStatus::Running);
    drop(engine);

    let deadline = Instant::now() + WAIT;
    let finished = loop {
        let left = deadline.saturating_duration_since(Instant::now());
        let event = rx.recv_timeout(left).expect("no finished notification after drop");
        if let ProgressEvent::Finished { exit_reason, .. } = event {
            break exit_reason;
        }
    };
    assert_eq!(finished, ExitReason::Cancelled);
}

#[test]
fn sinks_are_shared_not_consumed() {
    let sink = Arc::new(neurite_search::RecordingSink::new());
    let goal = Some(Voxel::new(5, 5, 1));
    let (mut engine, rx) = engine(slow_field(6, 6, 2, 1), goal, SearchPolicy::default());
    engine.add_progress_sink(sink.clone()).unwrap();
    engine.start().unwrap();
    let finished = engine.join().unwrap();
    assert!(finished.outcome().success());
    let recorded = sink.events();
    assert_eq!(recorded, drain(&rx));
    assert!(matches!(recorded.last(), Some(ProgressEvent::Finished { success: true, .. })));
}
