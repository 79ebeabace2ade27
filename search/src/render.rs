//! Read-only views of search progress for display: which voxels of one
//! plane are open or closed, and the node at a voxel under a cost threshold.

use neurite_kernel::volume::Voxel;

use crate::frontier::Frontier;
use crate::node::{SearchNode, SearchStatus};
use crate::search::SearchCore;

/// Orientation of a 2-D view through the volume.
///
/// `Xy` is indexed by z and reports `(x, y)`. `Xz` is indexed by y and
/// reports `(x, z)`. `Zy` is indexed by x and reports `(z, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Xy,
    Xz,
    Zy,
}

/// Which nodes a plane query selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Open,
    Closed,
}

impl Phase {
    fn matches(self, status: SearchStatus) -> bool {
        match self {
            Self::Open => status.is_open(),
            Self::Closed => status.is_closed(),
        }
    }
}

/// One selected node, in plane coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanePoint {
    pub u: u32,
    pub v: u32,
    pub status: SearchStatus,
    pub g: f32,
}

fn under(node: &SearchNode, threshold: Option<f32>) -> bool {
    match threshold {
        Some(t) => node.g <= t,
        None => true,
    }
}

impl SearchCore {
    /// The node at `voxel` whose `g` is within `threshold`, preferring the
    /// start side. `None` for the threshold accepts any `g`.
    #[must_use]
    pub fn any_node_under_threshold(&self, voxel: Voxel, threshold: Option<f32>) -> Option<&SearchNode> {
        self.frontiers()
            .filter_map(|f| f.node_at(voxel))
            .find(|n| under(n, threshold))
    }

    /// Nodes in one plane matching `phase` and `threshold`, start side first,
    /// each side in row-major plane order.
    ///
    /// An `index` outside the volume selects nothing.
    #[must_use]
    pub fn nodes_in_plane(
        &self,
        plane: Plane,
        index: u32,
        phase: Phase,
        threshold: Option<f32>,
    ) -> Vec<PlanePoint> {
        let field = self.field();
        let (w, h, d) = (field.width(), field.height(), field.depth());
        let (u_len, v_len, in_range) = match plane {
            Plane::Xy => (w, h, index < d),
            Plane::Xz => (w, d, index < h),
            Plane::Zy => (d, h, index < w),
        };
        if !in_range {
            return Vec::new();
        }
        let mut points = Vec::new();
        for frontier in self.frontiers() {
            if plane == Plane::Xy && !frontier.slice_touched(index) {
                continue;
            }
            for (u, v, node) in plane_nodes(frontier, plane, index, (u_len, v_len)) {
                if phase.matches(node.status) && under(node, threshold) {
                    points.push(PlanePoint {
                        u,
                        v,
                        status: node.status,
                        g: node.g,
                    });
                }
            }
        }
        points
    }
}

fn plane_nodes(
    frontier: &Frontier,
    plane: Plane,
    index: u32,
    (u_len, v_len): (u32, u32),
) -> impl Iterator<Item = (u32, u32, &SearchNode)> {
    (0..v_len)
        .flat_map(move |v| (0..u_len).map(move |u| (u, v)))
        .filter_map(move |(u, v)| {
            let voxel = match plane {
                Plane::Xy => Voxel::new(u, v, index),
                Plane::Xz => Voxel::new(u, index, v),
                Plane::Zy => Voxel::new(index, v, u),
            };
            frontier.node_at(voxel).map(|node| (u, v, node))
        })
}
