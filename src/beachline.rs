use std::cell::Cell;
use std::ops::{Index, IndexMut};

use crate::diagram::{EdgeIdx, SiteIdx};
use crate::geometry::{parabola_breakpoint, Point, EPSILON};
use crate::queue::CircleId;
use crate::rbtree::{NodeId, RbTree};

#[derive(Clone, Copy, Debug)]
struct BreakpointCache {
    directrix: f64,
    left_site: SiteIdx,
    x: f64,
}

/// An arc of the beachline.
#[derive(Debug)]
pub(crate) struct Beachsection {
    pub site: SiteIdx,
    /// The edge traced by the breakpoint at the left of this arc.
    pub edge: Option<EdgeIdx>,
    pub circle_event: Option<CircleId>,
    cache: Cell<Option<BreakpointCache>>,
}
impl Beachsection {
    fn new(site: SiteIdx) -> Self {
        Self {
            site,
            edge: None,
            circle_event: None,
            cache: Cell::new(None),
        }
    }
}

/// Where a new site falls in the beachline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The beachline has no arcs.
    Empty,
    /// Strictly inside the arc.
    Inside(NodeId),
    /// Exactly under the breakpoint between the two arcs.
    Between(NodeId, NodeId),
    /// At the right of the last arc.
    After(NodeId),
    /// At the left of the first arc.
    Before(NodeId),
}

/// The sequence of parabolic arcs, from left to right, that separates the region already swept
/// from the rest of the plane.
pub(crate) struct Beachline {
    tree: RbTree<Beachsection>,
}
impl Beachline {
    pub fn new() -> Self {
        Self {
            tree: RbTree::new(),
        }
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn prev(&self, arc: NodeId) -> Option<NodeId> {
        self.tree.prev(arc)
    }

    pub fn next(&self, arc: NodeId) -> Option<NodeId> {
        self.tree.next(arc)
    }

    /// Insert a new arc of `site` right after `after`, or as the first arc.
    pub fn insert(&mut self, after: Option<NodeId>, site: SiteIdx) -> NodeId {
        self.tree.insert_successor(after, Beachsection::new(site))
    }

    pub fn remove(&mut self, arc: NodeId) {
        self.tree.remove(arc);
    }

    /// The sites of the arcs, from left to right.
    pub fn sites(&self) -> impl Iterator<Item = SiteIdx> + '_ {
        self.tree.iter().map(|(_, arc)| arc.site)
    }

    /// x of the breakpoint between `arc` and its left neighbor.
    pub fn left_break_point(&self, arc: NodeId, directrix: f64, sites: &[Point]) -> f64 {
        let section = &self.tree[arc];
        let focus = sites[section.site as usize];
        if focus.y == directrix {
            return focus.x;
        }

        let Some(left) = self.tree.prev(arc) else {
            return f64::NEG_INFINITY;
        };
        let left_site = self.tree[left].site;

        if let Some(cache) = section.cache.get() {
            if cache.directrix == directrix && cache.left_site == left_site {
                return cache.x;
            }
        }

        let x = parabola_breakpoint(focus, sites[left_site as usize], directrix);
        section.cache.set(Some(BreakpointCache {
            directrix,
            left_site,
            x,
        }));
        x
    }

    /// x of the breakpoint between `arc` and its right neighbor.
    pub fn right_break_point(&self, arc: NodeId, directrix: f64, sites: &[Point]) -> f64 {
        if let Some(right) = self.tree.next(arc) {
            return self.left_break_point(right, directrix, sites);
        }
        let focus = sites[self.tree[arc].site as usize];
        if focus.y == directrix {
            focus.x
        } else {
            f64::INFINITY
        }
    }

    /// Find the arc above the point `(x, directrix)`.
    pub fn locate(&self, x: f64, directrix: f64, sites: &[Point]) -> Placement {
        let Some(mut node) = self.tree.root() else {
            return Placement::Empty;
        };

        loop {
            let dxl = self.left_break_point(node, directrix, sites) - x;
            if dxl > EPSILON {
                match self.tree.left(node) {
                    Some(left) => node = left,
                    None => return Placement::Before(node),
                }
                continue;
            }

            let dxr = x - self.right_break_point(node, directrix, sites);
            if dxr > EPSILON {
                match self.tree.right(node) {
                    Some(right) => node = right,
                    None => return Placement::After(node),
                }
                continue;
            }

            // an arc narrower than 2ε holds the point on both sides: the focus decides.
            let (near_left, near_right) = (dxl > -EPSILON, dxr > -EPSILON);
            let go_right = if near_left && near_right {
                x > sites[self.tree[node].site as usize].x
            } else {
                near_right
            };

            return if near_left && !go_right {
                match self.tree.prev(node) {
                    Some(prev) => Placement::Between(prev, node),
                    None => Placement::Before(node),
                }
            } else if go_right {
                match self.tree.next(node) {
                    Some(next) => Placement::Between(node, next),
                    None => Placement::After(node),
                }
            } else {
                Placement::Inside(node)
            };
        }
    }
}

impl Index<NodeId> for Beachline {
    type Output = Beachsection;

    fn index(&self, arc: NodeId) -> &Beachsection {
        &self.tree[arc]
    }
}
impl IndexMut<NodeId> for Beachline {
    fn index_mut(&mut self, arc: NodeId) -> &mut Beachsection {
        &mut self.tree[arc]
    }
}

impl std::fmt::Debug for Beachline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.sites()).finish()
    }
}
