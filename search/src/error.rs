//! Typed search errors.
//!
//! `SearchError` covers set-up and lifecycle misuse. Once a search is running
//! every termination, including running out of memory, is reported as an
//! [`crate::outcome::ExitReason`] instead.

use neurite_kernel::volume::Voxel;
use neurite_kernel::FieldError;
use thiserror::Error;

/// Failure to build, start or join a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("invalid search policy: {detail}")]
    InvalidPolicy { detail: String },

    #[error("{role} voxel {voxel} lies outside the {width}x{height}x{depth} volume")]
    OutOfBounds {
        role: &'static str,
        voxel: Voxel,
        width: u32,
        height: u32,
        depth: u32,
    },

    #[error("bidirectional search needs a goal voxel")]
    BidirectionalWithoutGoal,

    #[error("seed status must be open or closed")]
    FreeSeed,

    #[error("search has already been started")]
    AlreadyStarted,

    #[error("search has not been started")]
    NotStarted,

    #[error("search worker panicked")]
    WorkerPanicked,

    #[error("could not spawn the search worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

/// Node storage could not grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out of memory while growing the {what}")]
pub struct AllocationError {
    pub what: &'static str,
}
