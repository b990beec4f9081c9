use std::time::Duration;

use crate::geometry::Point;

/// Index of a site in the slice given to [`crate::Voronoi::compute`].
pub type SiteIdx = u32;
/// Index of an edge in [`Diagram::edges`].
pub type EdgeIdx = u32;

/// A segment of the diagram.
///
/// An edge lies on the bisector of `left_site` and `right_site`, or on the bounding box if
/// `right_site` is `None`. While the sweep runs, endpoints are filled as they are found. The edges
/// of a [`Diagram`] always have both.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub left_site: SiteIdx,
    pub right_site: Option<SiteIdx>,
    pub va: Option<Point>,
    pub vb: Option<Point>,
}
impl Edge {
    fn new(left_site: SiteIdx, right_site: Option<SiteIdx>) -> Self {
        Self {
            left_site,
            right_site,
            va: None,
            vb: None,
        }
    }

    /// An edge on the bounding box, seen from the cell of `site`.
    pub(crate) fn border(site: SiteIdx, va: Point, vb: Point) -> Self {
        Self {
            left_site: site,
            right_site: None,
            va: Some(va),
            vb: Some(vb),
        }
    }

    /// Both endpoints, if the edge is complete.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        Some((self.va?, self.vb?))
    }

    pub fn is_border(&self) -> bool {
        self.right_site.is_none()
    }
}

/// An edge as seen from one of its two cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Halfedge {
    pub site: SiteIdx,
    /// The site on the other side of the edge, `None` for a border edge.
    pub neighbor: Option<SiteIdx>,
    pub edge: EdgeIdx,
    /// Direction of the edge seen from the site, used to sort the halfedges of a cell.
    pub angle: f64,
    pub(crate) start: Point,
    pub(crate) end: Point,
}
impl Halfedge {
    pub(crate) fn new(edges: &[Edge], sites: &[Point], edge: EdgeIdx, site: SiteIdx) -> Self {
        let e = &edges[edge as usize];
        let neighbor = if e.left_site == site {
            e.right_site
        } else {
            Some(e.left_site)
        };

        let angle = match neighbor {
            Some(neighbor) => {
                let (l, r) = (sites[site as usize], sites[neighbor as usize]);
                (r.y - l.y).atan2(r.x - l.x)
            }
            None => {
                // border edges always have both endpoints.
                let va = e.va.unwrap_or(Point::NAN);
                let vb = e.vb.unwrap_or(Point::NAN);
                if e.left_site == site {
                    (vb.x - va.x).atan2(va.y - vb.y)
                } else {
                    (va.x - vb.x).atan2(vb.y - va.y)
                }
            }
        };

        Self {
            site,
            neighbor,
            edge,
            angle,
            start: Point::NAN,
            end: Point::NAN,
        }
    }

    pub fn startpoint(&self) -> Point {
        self.start
    }

    pub fn endpoint(&self) -> Point {
        self.end
    }

    /// The endpoints of the edge, oriented from the point of view of `site`.
    pub(crate) fn oriented(&self, edge: &Edge) -> (Option<Point>, Option<Point>) {
        if edge.left_site == self.site {
            (edge.va, edge.vb)
        } else {
            (edge.vb, edge.va)
        }
    }
}

/// The region of the plane closer to `site` than to any other site, clipped to the bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub site: SiteIdx,
    /// The boundary of the cell, counterclockwise, each halfedge starting where the previous one
    /// ends.
    pub halfedges: Vec<Halfedge>,
    pub(crate) close_me: bool,
}
impl Cell {
    pub(crate) fn new(site: SiteIdx) -> Self {
        Self {
            site,
            halfedges: Vec::new(),
            close_me: false,
        }
    }

    /// The corners of the cell, in the order of its halfedges.
    pub fn vertices(&self) -> impl Iterator<Item = Point> + '_ {
        self.halfedges.iter().map(|h| h.startpoint())
    }

    /// The sites of the adjacent cells. Border edges have no neighbor.
    pub fn neighbors(&self) -> impl Iterator<Item = SiteIdx> + '_ {
        self.halfedges.iter().filter_map(|h| h.neighbor)
    }

    pub fn area(&self) -> f64 {
        let twice = self
            .halfedges
            .iter()
            .map(|h| h.start.perp_dot(h.end))
            .sum::<f64>();
        twice.abs() / 2.0
    }

    /// Returns true if the point is inside the cell or on its boundary.
    pub fn contains(&self, p: Point) -> bool {
        !self.halfedges.is_empty()
            && self.halfedges.iter().all(|h| {
                let (p0, p1) = (h.start, h.end);
                (p.y - p0.y) * (p1.x - p0.x) - (p.x - p0.x) * (p1.y - p0.y) <= 0.0
            })
    }

    #[cfg(test)]
    pub(crate) fn is_convex(&self) -> bool {
        let n = self.halfedges.len();
        (0..n).all(|i| {
            let a = self.halfedges[i].start;
            let b = self.halfedges[i].end;
            let c = self.halfedges[(i + 1) % n].end;
            // counterclockwise with y down is clockwise with y up.
            (b - a).perp_dot(c - b) <= 1e-6
        })
    }
}

/// The Voronoi diagram of a set of sites, clipped to a bounding box.
#[derive(Clone, Debug)]
pub struct Diagram {
    /// One cell per distinct site, ordered by site.
    pub cells: Vec<Cell>,
    pub edges: Vec<Edge>,
    /// Every distinct endpoint of the edges.
    pub vertices: Vec<Point>,
    pub exec_time: Duration,
}
impl Diagram {
    /// Find the cell of a site. Duplicated sites, and sites whose cell lies outside the bounding
    /// box, have none.
    pub fn cell(&self, site: SiteIdx) -> Option<&Cell> {
        let i = self.cells.binary_search_by_key(&site, |c| c.site).ok()?;
        Some(&self.cells[i])
    }

    pub fn exec_time_ms(&self) -> f64 {
        self.exec_time.as_secs_f64() * 1000.0
    }
}

/// The edges and cells while the diagram is being built.
pub(crate) struct DiagramBuilder {
    pub edges: Vec<Edge>,
    /// Indexed by site. `None` for sites not reached yet, or duplicated.
    pub cells: Vec<Option<Cell>>,
}
impl DiagramBuilder {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            cells: Vec::new(),
        }
    }

    pub fn reset(&mut self, site_count: usize) {
        self.edges.clear();
        self.cells.clear();
        self.cells.resize_with(site_count, || None);
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.cells.clear();
    }

    pub fn add_cell(&mut self, site: SiteIdx) {
        self.cells[site as usize] = Some(Cell::new(site));
    }

    /// Create the edge between two sites, and a halfedge in each of their cells.
    pub fn create_edge(
        &mut self,
        sites: &[Point],
        left: SiteIdx,
        right: SiteIdx,
        va: Option<Point>,
        vb: Option<Point>,
    ) -> EdgeIdx {
        test_assert!(self.edges.len() < EdgeIdx::MAX as usize, "edge index overflow");
        let idx = self.edges.len() as EdgeIdx;
        self.edges.push(Edge::new(left, Some(right)));
        if let Some(va) = va {
            self.set_edge_startpoint(idx, left, right, va);
        }
        if let Some(vb) = vb {
            self.set_edge_endpoint(idx, left, right, vb);
        }

        for site in [left, right] {
            let halfedge = Halfedge::new(&self.edges, sites, idx, site);
            if let Some(cell) = &mut self.cells[site as usize] {
                cell.halfedges.push(halfedge);
            }
        }

        idx
    }

    /// Record a vertex of the edge traced between `left` and `right`, in that order.
    ///
    /// The first vertex of an edge goes to `va`, and fixes the orientation of the edge to the
    /// sites given at that moment. A later vertex goes to `vb` if the edge is seen in the
    /// opposite orientation, or to `va` otherwise.
    pub fn set_edge_startpoint(&mut self, edge: EdgeIdx, left: SiteIdx, right: SiteIdx, v: Point) {
        let edge = &mut self.edges[edge as usize];
        if edge.va.is_none() && edge.vb.is_none() {
            edge.va = Some(v);
            edge.left_site = left;
            edge.right_site = Some(right);
        } else if edge.left_site == right {
            edge.vb = Some(v);
        } else {
            edge.va = Some(v);
        }
    }

    pub fn set_edge_endpoint(&mut self, edge: EdgeIdx, left: SiteIdx, right: SiteIdx, v: Point) {
        self.set_edge_startpoint(edge, right, left, v);
    }
}
