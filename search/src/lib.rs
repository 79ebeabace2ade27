//! Neurite Search: bidirectional best-first path search over a voxel cost
//! field, run as a controllable background worker.
//!
//! This crate depends only on `neurite_kernel`; it does NOT depend on
//! `neurite_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! neurite_kernel  ←  neurite_search  ←  neurite_harness
//! (stack, cost)      (frontier, worker)  (config, runner, reports)
//! ```
//!
//! # Key types
//!
//! - [`SearchRequest`] / [`SearchCore`] -- set-up and single-step expansion
//! - [`SearchEngine`] -- worker thread with pause, stop and timeout
//! - [`ProgressSink`] -- status, progress and completion callbacks
//! - [`TracedPath`] -- the start-to-goal voxel sequence
//! - [`Heuristic`] / [`GoalPredicate`] -- pluggable estimate and goal test

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod contract;
pub mod engine;
pub mod error;
pub mod frontier;
pub mod heuristic;
pub mod node;
pub mod outcome;
pub mod path;
pub mod policy;
pub mod progress;
pub mod render;
pub mod search;

#[cfg(test)]
mod testing;

pub use contract::{GoalPredicate, PointGoal};
pub use engine::{FinishedSearch, SearchEngine};
pub use error::{AllocationError, SearchError};
pub use heuristic::{EuclideanHeuristic, Heuristic, ZeroHeuristic};
pub use node::{Direction, SearchNode, SearchStatus};
pub use outcome::{ExitReason, SearchOutcome, SearchStats};
pub use path::TracedPath;
pub use policy::SearchPolicy;
pub use progress::{ProgressEvent, ProgressSink, RecordingSink, ThreadStatus};
pub use render::{Phase, Plane, PlanePoint};
pub use search::{SearchCore, SearchRequest, StepOutcome};
