//! One direction's share of the search: node arena, open queue and the
//! per-slice visited index.
//!
//! The open queue is a `BinaryHeap` with lazy deletion. Lowering a node's
//! `f` pushes a fresh entry and bumps the node's version; the superseded
//! entry stays in the heap and is discarded when it surfaces. Open and closed
//! sizes are tracked as counters, so they always reflect live nodes rather
//! than heap length.
//!
//! The visited index holds one lazily allocated `width * height` slot table
//! per z-slice. Slot value 0 means unvisited; any other value is the arena
//! index plus one.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use neurite_kernel::volume::Voxel;

use crate::error::AllocationError;
use crate::node::{Direction, FrontierKey, NodeId, SearchNode};

#[derive(Debug)]
struct FrontierEntry {
    key: Reverse<FrontierKey>,
    id: NodeId,
    version: u32,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Nodes discovered from one origin.
#[derive(Debug)]
pub struct Frontier {
    direction: Direction,
    width: u32,
    height: u32,
    nodes: Vec<SearchNode>,
    heap: BinaryHeap<FrontierEntry>,
    visited: Vec<Option<Box<[u32]>>>,
    open_count: usize,
    closed_count: usize,
    #[cfg(test)]
    node_budget: Option<usize>,
}

impl Frontier {
    /// An empty frontier over a `width x height x depth` grid.
    #[must_use]
    pub fn new(direction: Direction, width: u32, height: u32, depth: u32) -> Self {
        Self {
            direction,
            width,
            height,
            nodes: Vec::new(),
            heap: BinaryHeap::new(),
            visited: (0..depth).map(|_| None).collect(),
            open_count: 0,
            closed_count: 0,
            #[cfg(test)]
            node_budget: None,
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Nodes currently open.
    #[must_use]
    pub fn open_len(&self) -> usize {
        self.open_count
    }

    /// Nodes currently closed.
    #[must_use]
    pub fn closed_len(&self) -> usize {
        self.closed_count
    }

    /// Every node ever created in this direction.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    /// All nodes in creation order.
    #[must_use]
    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    /// The node occupying `voxel`, if this direction has reached it.
    #[must_use]
    pub fn lookup(&self, voxel: Voxel) -> Option<NodeId> {
        let slice = self.visited.get(voxel.z as usize)?.as_ref()?;
        match slice.get(self.slot(voxel))? {
            0 => None,
            &slot => Some(NodeId(slot - 1)),
        }
    }

    #[must_use]
    pub fn node_at(&self, voxel: Voxel) -> Option<&SearchNode> {
        self.lookup(voxel).map(|id| self.node(id))
    }

    /// Whether slice `z` has any visited voxel in this direction.
    #[must_use]
    pub fn slice_touched(&self, z: u32) -> bool {
        matches!(self.visited.get(z as usize), Some(Some(_)))
    }

    /// Add a new open node for `voxel`.
    ///
    /// The caller guarantees `voxel` is in bounds and not yet visited.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] when the arena, heap or slice index
    /// cannot grow.
    pub fn insert_open(
        &mut self,
        voxel: Voxel,
        g: f32,
        h: f32,
        predecessor: Option<NodeId>,
    ) -> Result<NodeId, AllocationError> {
        let node = SearchNode::new(voxel, g, h, predecessor, self.direction.open_status());
        self.insert(node)
    }

    /// Add `node` with its status taken as given (open or closed in this
    /// direction). Used for seeding.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] when storage cannot grow.
    pub fn insert(&mut self, node: SearchNode) -> Result<NodeId, AllocationError> {
        debug_assert_eq!(node.status.direction(), Some(self.direction));
        let z = node.voxel.z as usize;
        let slot = self.slot(node.voxel);
        self.ensure_slice(z)?;
        let raw = u32::try_from(self.nodes.len())
            .ok()
            .filter(|&i| i < u32::MAX)
            .ok_or(AllocationError { what: "node arena" })?;
        #[cfg(test)]
        if self.node_budget.is_some_and(|budget| self.nodes.len() >= budget) {
            return Err(AllocationError { what: "node arena" });
        }
        self.nodes
            .try_reserve(1)
            .map_err(|_| AllocationError { what: "node arena" })?;
        let id = NodeId(raw);
        let open = node.status.is_open();
        if open {
            self.heap
                .try_reserve(1)
                .map_err(|_| AllocationError { what: "open queue" })?;
            self.heap.push(FrontierEntry {
                key: Reverse(FrontierKey::from(&node)),
                id,
                version: node.version,
            });
            self.open_count += 1;
        } else {
            self.closed_count += 1;
        }
        if let Some(Some(table)) = self.visited.get_mut(z) {
            table[slot] = raw + 1;
        }
        self.nodes.push(node);
        Ok(id)
    }

    /// Remove and return the open node with the lowest `(f, x, y, z)`.
    ///
    /// The node keeps its open status until [`Frontier::close`]; it is
    /// no longer counted as open.
    pub fn pop_best(&mut self) -> Option<NodeId> {
        while let Some(entry) = self.heap.pop() {
            let node = &self.nodes[entry.id.index()];
            if node.version == entry.version && node.status.is_open() {
                self.open_count -= 1;
                return Some(entry.id);
            }
        }
        None
    }

    /// Mark a popped node closed.
    pub fn close(&mut self, id: NodeId) {
        self.nodes[id.index()].status = self.direction.closed_status();
        self.closed_count += 1;
    }

    /// Put `id` on a cheaper route and (re)queue it.
    ///
    /// A closed node moves back to open; an open node has its old heap entry
    /// superseded.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] when the heap cannot grow.
    pub fn relax(&mut self, id: NodeId, better: &SearchNode) -> Result<(), AllocationError> {
        self.heap
            .try_reserve(1)
            .map_err(|_| AllocationError { what: "open queue" })?;
        let open_status = self.direction.open_status();
        let node = &mut self.nodes[id.index()];
        node.set_from(better);
        node.version = node.version.wrapping_add(1);
        match node.status {
            s if s.is_closed() => {
                self.closed_count -= 1;
                self.open_count += 1;
            }
            s if s.is_open() => {}
            _ => self.open_count += 1,
        }
        node.status = open_status;
        self.heap.push(FrontierEntry {
            key: Reverse(FrontierKey::from(&*node)),
            id,
            version: node.version,
        });
        Ok(())
    }

    /// Voxels from `id` back to this direction's origin, `id` first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            frontier: self,
            next: Some(id),
            remaining: self.nodes.len(),
        }
    }

    /// Fail every insert once the arena holds `budget` nodes.
    #[cfg(test)]
    pub(crate) fn limit_nodes(&mut self, budget: usize) {
        self.node_budget = Some(budget);
    }

    fn slot(&self, voxel: Voxel) -> usize {
        voxel.y as usize * self.width as usize + voxel.x as usize
    }

    fn ensure_slice(&mut self, z: usize) -> Result<(), AllocationError> {
        if matches!(self.visited.get(z), Some(Some(_))) {
            return Ok(());
        }
        let len = self.width as usize * self.height as usize;
        let mut table: Vec<u32> = Vec::new();
        table
            .try_reserve_exact(len)
            .map_err(|_| AllocationError { what: "slice index" })?;
        table.resize(len, 0);
        if let Some(entry) = self.visited.get_mut(z) {
            *entry = Some(table.into_boxed_slice());
        }
        Ok(())
    }
}

/// Walks predecessor links towards the origin.
///
/// Bounded by the arena size so a corrupted chain cannot loop forever.
pub struct Ancestors<'a> {
    frontier: &'a Frontier,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = Voxel;

    fn next(&mut self) -> Option<Voxel> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.frontier.node(self.next?);
        self.remaining -= 1;
        self.next = node.predecessor;
        Some(node.voxel)
    }
}
