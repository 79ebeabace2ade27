//! The synchronous search core: seeding, one-expansion steps and the
//! bidirectional meeting rule.
//!
//! [`SearchCore`] knows nothing about threads. [`crate::engine::SearchEngine`]
//! drives it from a worker and layers pause, stop, timeout and progress on
//! top; tests and benchmarks can also drive it directly with
//! [`SearchCore::step`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use neurite_kernel::digest::{canonical_hash, ContentHash, HashDomain};
use neurite_kernel::volume::{VolumetricCostField, Voxel};

use crate::contract::{GoalPredicate, PointGoal};
use crate::error::{AllocationError, SearchError};
use crate::frontier::Frontier;
use crate::heuristic::{EuclideanHeuristic, Heuristic, ZeroHeuristic};
use crate::node::{Direction, NodeId, SearchNode, SearchStatus};
use crate::outcome::SearchStats;
use crate::path::{PathReconstructor, TracedPath};
use crate::policy::SearchPolicy;

/// Everything needed to set up one search.
///
/// With a goal voxel and no explicit predicate the goal test is
/// [`PointGoal`]. With neither, the search explores until every reachable
/// voxel is closed.
#[derive(Clone)]
pub struct SearchRequest {
    pub field: VolumetricCostField,
    pub start: Voxel,
    pub goal: Option<Voxel>,
    pub goal_predicate: Option<Arc<dyn GoalPredicate>>,
    pub heuristic: Option<Arc<dyn Heuristic>>,
    pub policy: SearchPolicy,
}

impl SearchRequest {
    #[must_use]
    pub fn new(field: VolumetricCostField, start: Voxel) -> Self {
        Self {
            field,
            start,
            goal: None,
            goal_predicate: None,
            heuristic: None,
            policy: SearchPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_goal(mut self, goal: Voxel) -> Self {
        self.goal = Some(goal);
        self
    }

    #[must_use]
    pub fn with_goal_predicate(mut self, predicate: Arc<dyn GoalPredicate>) -> Self {
        self.goal_predicate = Some(predicate);
        self
    }

    /// Override the default heuristic (Euclidean when a goal voxel is known,
    /// zero otherwise).
    #[must_use]
    pub fn with_heuristic(mut self, heuristic: Arc<dyn Heuristic>) -> Self {
        self.heuristic = Some(heuristic);
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SearchPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl std::fmt::Debug for SearchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRequest")
            .field("field", &self.field)
            .field("start", &self.start)
            .field("goal", &self.goal)
            .field("goal_predicate", &self.goal_predicate.is_some())
            .field("heuristic", &self.heuristic.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Result of a single [`SearchCore::step`].
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// One node was expanded; the search continues.
    Expanded,
    /// The goal test passed or the two frontiers met.
    Found(TracedPath),
    /// No open node remains in any direction.
    Exhausted,
    /// Node storage could not grow.
    OutOfMemory(AllocationError),
}

/// Search state over one cost field: one frontier per direction plus the
/// hooks that steer expansion.
pub struct SearchCore {
    field: VolumetricCostField,
    start: Voxel,
    goal: Option<Voxel>,
    goal_predicate: Option<Arc<dyn GoalPredicate>>,
    heuristic: Arc<dyn Heuristic>,
    policy: SearchPolicy,
    from_start: Frontier,
    from_goal: Option<Frontier>,
    loops: u64,
    open_high_water: usize,
}

impl std::fmt::Debug for SearchCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCore")
            .field("start", &self.start)
            .field("goal", &self.goal)
            .field("policy", &self.policy)
            .field("loops", &self.loops)
            .field("open", &self.open_len())
            .field("closed", &self.closed_len())
            .finish_non_exhaustive()
    }
}

impl SearchCore {
    /// Validate `request` and seed the origin node(s).
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidPolicy`] if the policy does not validate
    /// - [`SearchError::OutOfBounds`] if the start or goal is outside the field
    /// - [`SearchError::BidirectionalWithoutGoal`] for a bidirectional policy
    ///   with no goal voxel
    /// - [`SearchError::Allocation`] if the origins cannot be stored
    pub fn new(request: SearchRequest) -> Result<Self, SearchError> {
        let SearchRequest {
            field,
            start,
            goal,
            goal_predicate,
            heuristic,
            policy,
        } = request;
        policy.validate()?;
        check_bounds(&field, "start", start)?;
        if let Some(goal) = goal {
            check_bounds(&field, "goal", goal)?;
        }
        if policy.bidirectional && goal.is_none() {
            return Err(SearchError::BidirectionalWithoutGoal);
        }

        let goal_predicate = goal_predicate.or_else(|| {
            goal.map(|goal| Arc::new(PointGoal { start, goal }) as Arc<dyn GoalPredicate>)
        });
        let heuristic: Arc<dyn Heuristic> = heuristic.unwrap_or_else(|| match goal {
            Some(goal) => Arc::new(EuclideanHeuristic::new(
                start,
                goal,
                field.calibration().clone(),
                policy.minimum_cost_per_unit_distance,
            )) as Arc<dyn Heuristic>,
            None => Arc::new(ZeroHeuristic),
        });

        let (w, h, d) = (field.width(), field.height(), field.depth());
        let mut from_start = Frontier::new(Direction::FromStart, w, h, d);
        from_start.insert_open(start, 0.0, heuristic.estimate(start, Direction::FromStart), None)?;
        let from_goal = match goal {
            Some(goal) if policy.bidirectional => {
                let mut frontier = Frontier::new(Direction::FromGoal, w, h, d);
                frontier.insert_open(goal, 0.0, heuristic.estimate(goal, Direction::FromGoal), None)?;
                Some(frontier)
            }
            _ => None,
        };

        debug!(
            "search set up: start={start} goal={} bidirectional={} volume={w}x{h}x{d}",
            goal.map_or_else(|| "none".to_string(), |g| g.to_string()),
            from_goal.is_some(),
        );

        Ok(Self {
            field,
            start,
            goal,
            goal_predicate,
            heuristic,
            policy,
            from_start,
            from_goal,
            loops: 0,
            open_high_water: 1,
        })
    }

    /// Seed an extra node with `g` cost and no predecessor.
    ///
    /// Open seeds are queued for expansion; closed seeds only block
    /// re-expansion and can complete a meeting. A voxel the direction has
    /// already reached is ignored and `Ok(false)` is returned.
    ///
    /// # Errors
    ///
    /// - [`SearchError::FreeSeed`] if `status` is [`SearchStatus::Free`]
    /// - [`SearchError::OutOfBounds`] if `voxel` is outside the field
    /// - [`SearchError::BidirectionalWithoutGoal`] for a goal-side seed on a
    ///   unidirectional search
    /// - [`SearchError::Allocation`] if the node cannot be stored
    pub fn add_node(&mut self, voxel: Voxel, status: SearchStatus, g: f32) -> Result<bool, SearchError> {
        let direction = status.direction().ok_or(SearchError::FreeSeed)?;
        check_bounds(&self.field, "seed", voxel)?;
        let h = self.heuristic.estimate(voxel, direction);
        let frontier = match direction {
            Direction::FromStart => &mut self.from_start,
            Direction::FromGoal => self
                .from_goal
                .as_mut()
                .ok_or(SearchError::BidirectionalWithoutGoal)?,
        };
        if frontier.lookup(voxel).is_some() {
            return Ok(false);
        }
        frontier.insert(SearchNode::new(voxel, g, h, None, status))?;
        self.open_high_water = self.open_high_water.max(self.open_len());
        Ok(true)
    }

    /// Expand one node from the direction with the smaller open set.
    ///
    /// Ties go to the goal side. A direction whose open set is empty is
    /// never chosen while the other still has work.
    #[allow(clippy::cast_possible_truncation, clippy::too_many_lines)]
    pub fn step(&mut self) -> StepOutcome {
        let Some(direction) = self.next_direction() else {
            return StepOutcome::Exhausted;
        };
        let Self {
            field,
            goal_predicate,
            heuristic,
            policy,
            from_start,
            from_goal,
            loops,
            open_high_water,
            ..
        } = self;
        let (this, other): (&mut Frontier, Option<&Frontier>) = match (direction, from_goal.as_mut()) {
            (Direction::FromStart, goal_side) => (from_start, goal_side.map(|g| &*g)),
            (Direction::FromGoal, Some(goal_side)) => (goal_side, Some(&*from_start)),
            (Direction::FromGoal, None) => return StepOutcome::Exhausted,
        };

        let Some(p) = this.pop_best() else {
            return StepOutcome::Exhausted;
        };
        let current = this.node(p).clone();
        let reconstruct = PathReconstructor::new(field.calibration());

        if let Some(predicate) = goal_predicate {
            if predicate.is_goal(current.voxel, direction) {
                info!("reached goal at {} after {} loops", current.voxel, loops);
                let path = match direction {
                    Direction::FromStart => reconstruct.from_origin(this, p),
                    Direction::FromGoal => reconstruct.to_origin(this, p),
                };
                return StepOutcome::Found(path);
            }
        }

        this.close(p);

        let calibration = field.calibration();
        let floor = policy.minimum_cost_per_unit_distance;
        for dz in -1_i32..=1 {
            for dx in -1_i32..=1 {
                for dy in -1_i32..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let Some(n) = neighbor(field, current.voxel, dx, dy, dz) else {
                        continue;
                    };
                    let step = calibration.step_length(i64::from(dx), i64::from(dy), i64::from(dz));
                    let g = (f64::from(current.g) + step * field.cost_at(n).max(floor)) as f32;
                    let h = heuristic.estimate(n, direction);

                    let relaxed = match this.lookup(n) {
                        None => this.insert_open(n, g, h, Some(p)).map(|_| ()),
                        Some(existing) if this.node(existing).f() > g + h => {
                            let better = SearchNode::new(n, g, h, Some(p), SearchStatus::Free);
                            this.relax(existing, &better)
                        }
                        Some(_) => Ok(()),
                    };
                    if let Err(e) = relaxed {
                        return StepOutcome::OutOfMemory(e);
                    }

                    let Some(other) = other else { continue };
                    let Some(o) = other.lookup(n) else { continue };
                    if other.node(o).status.is_closed() {
                        info!("frontiers met at {} after {} loops", n, loops);
                        let path = match direction {
                            Direction::FromStart => reconstruct.meeting(this, p, other, o),
                            Direction::FromGoal => reconstruct.meeting(other, o, this, p),
                        };
                        return StepOutcome::Found(path);
                    }
                }
            }
        }

        *loops += 1;
        let open = this.open_len() + other.map_or(0, Frontier::open_len);
        *open_high_water = (*open_high_water).max(open);
        StepOutcome::Expanded
    }

    fn next_direction(&self) -> Option<Direction> {
        let s = self.from_start.open_len();
        let Some(goal_side) = &self.from_goal else {
            return (s > 0).then_some(Direction::FromStart);
        };
        match (s, goal_side.open_len()) {
            (0, 0) => None,
            (0, _) => Some(Direction::FromGoal),
            (_, 0) => Some(Direction::FromStart),
            (s, g) if g > s => Some(Direction::FromStart),
            _ => Some(Direction::FromGoal),
        }
    }

    /// Whether any direction still has open nodes.
    #[must_use]
    pub fn has_open(&self) -> bool {
        self.open_len() > 0
    }

    #[must_use]
    pub fn field(&self) -> &VolumetricCostField {
        &self.field
    }

    #[must_use]
    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    #[must_use]
    pub fn start(&self) -> Voxel {
        self.start
    }

    #[must_use]
    pub fn goal(&self) -> Option<Voxel> {
        self.goal
    }

    #[must_use]
    pub fn is_bidirectional(&self) -> bool {
        self.from_goal.is_some()
    }

    /// Completed expansions so far.
    #[must_use]
    pub fn loops(&self) -> u64 {
        self.loops
    }

    #[must_use]
    pub fn frontier(&self, direction: Direction) -> Option<&Frontier> {
        match direction {
            Direction::FromStart => Some(&self.from_start),
            Direction::FromGoal => self.from_goal.as_ref(),
        }
    }

    pub(crate) fn frontiers(&self) -> impl Iterator<Item = &Frontier> {
        std::iter::once(&self.from_start).chain(self.from_goal.as_ref())
    }

    /// Open nodes over both directions.
    #[must_use]
    pub fn open_len(&self) -> usize {
        self.frontiers().map(Frontier::open_len).sum()
    }

    /// Closed nodes over both directions.
    #[must_use]
    pub fn closed_len(&self) -> usize {
        self.frontiers().map(Frontier::closed_len).sum()
    }

    /// Open plus closed nodes over both directions.
    #[must_use]
    pub fn points_in_search(&self) -> usize {
        self.open_len() + self.closed_len()
    }

    /// Counters as of now, with `elapsed` supplied by the caller.
    #[must_use]
    pub fn stats(&self, elapsed: Duration) -> SearchStats {
        let goal_side = self.from_goal.as_ref();
        SearchStats {
            loops: self.loops,
            open_from_start: self.from_start.open_len(),
            closed_from_start: self.from_start.closed_len(),
            open_from_goal: goal_side.map_or(0, Frontier::open_len),
            closed_from_goal: goal_side.map_or(0, Frontier::closed_len),
            open_high_water: self.open_high_water,
            elapsed_millis: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Cap node storage in every direction.
    #[cfg(test)]
    pub(crate) fn limit_nodes(&mut self, budget: usize) {
        self.from_start.limit_nodes(budget);
        if let Some(goal_side) = &mut self.from_goal {
            goal_side.limit_nodes(budget);
        }
    }

    /// Digest over every node's voxel, status and `g` in creation order, per
    /// direction. Two runs over the same input agree on it exactly.
    #[must_use]
    pub fn frontier_digest(&self) -> ContentHash {
        let directions: Vec<serde_json::Value> = self
            .frontiers()
            .map(|frontier| {
                let nodes: Vec<serde_json::Value> = frontier
                    .nodes()
                    .iter()
                    .map(|n| {
                        serde_json::json!([
                            n.voxel.x,
                            n.voxel.y,
                            n.voxel.z,
                            n.status.to_string(),
                            n.g.to_bits(),
                            n.predecessor.map(NodeId::index),
                        ])
                    })
                    .collect();
                serde_json::json!({
                    "direction": format!("{:?}", frontier.direction()),
                    "nodes": nodes,
                })
            })
            .collect();
        let value = serde_json::Value::Array(directions);
        canonical_hash(HashDomain::FrontierSnapshot, value.to_string().as_bytes())
    }
}

fn check_bounds(
    field: &VolumetricCostField,
    role: &'static str,
    voxel: Voxel,
) -> Result<(), SearchError> {
    if field.contains_voxel(voxel) {
        return Ok(());
    }
    Err(SearchError::OutOfBounds {
        role,
        voxel,
        width: field.width(),
        height: field.height(),
        depth: field.depth(),
    })
}

fn neighbor(field: &VolumetricCostField, v: Voxel, dx: i32, dy: i32, dz: i32) -> Option<Voxel> {
    let n = Voxel::new(
        v.x.checked_add_signed(dx)?,
        v.y.checked_add_signed(dy)?,
        v.z.checked_add_signed(dz)?,
    );
    field.contains_voxel(n).then_some(n)
}
