//! Search nodes, statuses and the frontier ordering key.

use neurite_kernel::volume::Voxel;

/// Index of a node in its direction's frontier arena.
///
/// Node identity is this index, never the coordinates: the same voxel
/// reached from both ends is two distinct nodes in two arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Which end of the path a frontier grows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    FromStart,
    FromGoal,
}

impl Direction {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::FromStart => Self::FromGoal,
            Self::FromGoal => Self::FromStart,
        }
    }

    #[must_use]
    pub fn open_status(self) -> SearchStatus {
        match self {
            Self::FromStart => SearchStatus::OpenFromStart,
            Self::FromGoal => SearchStatus::OpenFromGoal,
        }
    }

    #[must_use]
    pub fn closed_status(self) -> SearchStatus {
        match self {
            Self::FromStart => SearchStatus::ClosedFromStart,
            Self::FromGoal => SearchStatus::ClosedFromGoal,
        }
    }
}

/// Where a node currently sits in the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStatus {
    /// Created but not yet in any list.
    Free,
    OpenFromStart,
    ClosedFromStart,
    OpenFromGoal,
    ClosedFromGoal,
}

impl SearchStatus {
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::OpenFromStart | Self::OpenFromGoal)
    }

    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, Self::ClosedFromStart | Self::ClosedFromGoal)
    }

    #[must_use]
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Free => None,
            Self::OpenFromStart | Self::ClosedFromStart => Some(Direction::FromStart),
            Self::OpenFromGoal | Self::ClosedFromGoal => Some(Direction::FromGoal),
        }
    }
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Free => "free",
            Self::OpenFromStart => "open from start",
            Self::ClosedFromStart => "closed from start",
            Self::OpenFromGoal => "open from goal",
            Self::ClosedFromGoal => "closed from goal",
        })
    }
}

/// One grid cell discovered by a search direction.
///
/// `g` is the best known cost from this direction's origin and `h` the
/// heuristic estimate towards the opposing objective. `f = g + h` is derived,
/// not stored. A node has at most one predecessor; only origins have none.
#[derive(Debug, Clone)]
pub struct SearchNode {
    pub voxel: Voxel,
    pub g: f32,
    pub h: f32,
    pub predecessor: Option<NodeId>,
    pub status: SearchStatus,
    /// Bumped whenever the node is re-queued; stale heap entries carry an
    /// older value and are skipped on pop.
    pub(crate) version: u32,
}

impl SearchNode {
    #[must_use]
    pub fn new(
        voxel: Voxel,
        g: f32,
        h: f32,
        predecessor: Option<NodeId>,
        status: SearchStatus,
    ) -> Self {
        Self {
            voxel,
            g,
            h,
            predecessor,
            status,
            version: 0,
        }
    }

    /// `g + h`, the frontier ordering value.
    #[must_use]
    pub fn f(&self) -> f32 {
        self.g + self.h
    }

    /// Re-parent onto a cheaper route: copy `g`, `h` and predecessor from
    /// `better`. Status and coordinates are left to the caller.
    pub fn set_from(&mut self, better: &SearchNode) {
        self.g = better.g;
        self.h = better.h;
        self.predecessor = better.predecessor;
    }
}

impl std::fmt::Display for SearchNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} h: {} g: {} f: {} [{}]",
            self.voxel,
            self.h,
            self.g,
            self.f(),
            self.status
        )
    }
}

/// The frontier ordering key: `(f, x, y, z)`.
///
/// Lower `f` first; exact ties fall back to coordinate order so that runs
/// over the same volume are reproducible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrontierKey {
    pub f: f32,
    pub voxel: Voxel,
}

impl Eq for FrontierKey {}

impl PartialOrd for FrontierKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.f
            .total_cmp(&other.f)
            .then(self.voxel.cmp(&other.voxel))
    }
}

impl From<&SearchNode> for FrontierKey {
    fn from(node: &SearchNode) -> Self {
        Self {
            f: node.f(),
            voxel: node.voxel,
        }
    }
}
