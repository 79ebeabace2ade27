//! Goal contract: when does a popped node end the search?

use neurite_kernel::volume::Voxel;

use crate::node::Direction;

/// Decides whether the node just taken from a frontier completes the path.
///
/// # Contract
///
/// - Called once per popped node, before it is closed, with the direction
///   that popped it.
/// - Must be cheap and deterministic; it runs on the worker thread.
pub trait GoalPredicate: Send + Sync {
    fn is_goal(&self, voxel: Voxel, direction: Direction) -> bool;
}

impl<F> GoalPredicate for F
where
    F: Fn(Voxel, Direction) -> bool + Send + Sync,
{
    fn is_goal(&self, voxel: Voxel, direction: Direction) -> bool {
        self(voxel, direction)
    }
}

/// The usual goal: the start-side frontier reaches the goal voxel, or the
/// goal-side frontier reaches the start voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointGoal {
    pub start: Voxel,
    pub goal: Voxel,
}

impl GoalPredicate for PointGoal {
    fn is_goal(&self, voxel: Voxel, direction: Direction) -> bool {
        match direction {
            Direction::FromStart => voxel == self.goal,
            Direction::FromGoal => voxel == self.start,
        }
    }
}
