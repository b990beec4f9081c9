//! Closing of the diagram: unbounded edges are connected to the bounding box, everything is
//! clipped to it, and cells cut by the box are closed by walking along its sides.

use std::collections::HashSet;

use crate::diagram::{Cell, DiagramBuilder, Edge, EdgeIdx, Halfedge, SiteIdx};
use crate::geometry::{equal, greater_than, less_than, Bisector, BoundingBox, Point};

/// Finish the diagram traced by the sweep. Returns its cells, edges and distinct vertices.
pub(crate) fn close(
    builder: &mut DiagramBuilder,
    sites: &[Point],
    bbox: &BoundingBox,
) -> (Vec<Cell>, Vec<Edge>, Vec<Point>) {
    clip_edges(builder, sites, bbox);

    // a cell with nothing left in the box either misses it or covers all of it, and only the
    // cell of the site nearest to the centre of the box can cover it.
    let center = Point::new(
        (bbox.left + bbox.right) / 2.0,
        (bbox.top + bbox.bottom) / 2.0,
    );
    let nearest = builder
        .cells
        .iter()
        .flatten()
        .map(|cell| cell.site)
        .min_by(|&a, &b| {
            let da = sites[a as usize].dist(center);
            let db = sites[b as usize].dist(center);
            da.total_cmp(&db)
        });

    for site in 0..builder.cells.len() {
        close_cell(builder, sites, bbox, site as SiteIdx, nearest);
    }

    compact(builder)
}

/// Connect every edge to the box, and clip it. Edges that end up outside the box, or reduced
/// to a point, lose both endpoints.
fn clip_edges(builder: &mut DiagramBuilder, sites: &[Point], bbox: &BoundingBox) {
    let DiagramBuilder { edges, cells } = builder;

    for edge in edges.iter_mut().rev() {
        let mut touched = edge.vb.is_none();
        let kept = connect_edge(edge, sites, bbox) && {
            match edge.endpoints().and_then(|(a, b)| clip_segment(a, b, bbox)) {
                Some((t0, t1)) => {
                    let (a, b) = (edge.va.unwrap_or(Point::NAN), edge.vb.unwrap_or(Point::NAN));
                    let d = b - a;
                    if t0 > 0.0 {
                        edge.va = Some(a + d * t0);
                    }
                    if t1 < 1.0 {
                        edge.vb = Some(a + d * t1);
                    }
                    touched |= t0 > 0.0 || t1 < 1.0;
                    true
                }
                None => false,
            }
        };

        if touched {
            for site in [Some(edge.left_site), edge.right_site].into_iter().flatten() {
                if let Some(cell) = &mut cells[site as usize] {
                    cell.close_me = true;
                }
            }
        }

        let degenerate = edge
            .endpoints()
            .map_or(true, |(a, b)| a.approx_eq(b));
        if !kept || degenerate {
            edge.va = None;
            edge.vb = None;
        }
    }
}

/// Give an endpoint on the box to an edge that only has its start, or no vertex at all.
///
/// Returns false if the edge can't be visible in the box.
fn connect_edge(edge: &mut Edge, sites: &[Point], bbox: &BoundingBox) -> bool {
    if edge.vb.is_some() {
        return true;
    }
    let Some(right_site) = edge.right_site else {
        return false;
    };

    let &BoundingBox {
        left: xl,
        right: xr,
        top: yt,
        bottom: yb,
    } = bbox;

    let l = sites[edge.left_site as usize];
    let r = sites[right_site as usize];
    let bisector = Bisector::new(l, r);
    let f = bisector.midpoint;

    let mut va = edge.va;
    let vb;

    match bisector.line {
        // vertical
        None => {
            if f.x < xl || f.x >= xr {
                return false;
            }
            if l.x > r.x {
                // downward
                match va {
                    Some(a) if a.y >= yb => return false,
                    Some(a) if a.y >= yt => {}
                    _ => va = Some(Point::new(f.x, yt)),
                }
                vb = Point::new(f.x, yb);
            } else {
                // upward
                match va {
                    Some(a) if a.y < yt => return false,
                    Some(a) if a.y <= yb => {}
                    _ => va = Some(Point::new(f.x, yb)),
                }
                vb = Point::new(f.x, yt);
            }
        }
        // closer to vertical than horizontal
        Some(line) if line.slope < -1.0 || line.slope > 1.0 => {
            if l.x > r.x {
                // downward
                match va {
                    Some(a) if a.y >= yb => return false,
                    Some(a) if a.y >= yt => {}
                    _ => va = Some(Point::new(line.x_at(yt), yt)),
                }
                vb = Point::new(line.x_at(yb), yb);
            } else {
                // upward
                match va {
                    Some(a) if a.y < yt => return false,
                    Some(a) if a.y <= yb => {}
                    _ => va = Some(Point::new(line.x_at(yb), yb)),
                }
                vb = Point::new(line.x_at(yt), yt);
            }
        }
        // closer to horizontal than vertical
        Some(line) => {
            if l.y < r.y {
                // rightward
                match va {
                    Some(a) if a.x >= xr => return false,
                    Some(a) if a.x >= xl => {}
                    _ => va = Some(Point::new(xl, line.y_at(xl))),
                }
                vb = Point::new(xr, line.y_at(xr));
            } else {
                // leftward
                match va {
                    Some(a) if a.x < xl => return false,
                    Some(a) if a.x <= xr => {}
                    _ => va = Some(Point::new(xr, line.y_at(xr))),
                }
                vb = Point::new(xl, line.y_at(xl));
            }
        }
    }

    edge.va = va;
    edge.vb = Some(vb);
    true
}

/// Liang-Barsky clipping of the segment `a`-`b`. Returns the parameters, in `[0, 1]`, of the
/// part inside the box, or `None` if the segment is outside.
pub(crate) fn clip_segment(a: Point, b: Point, bbox: &BoundingBox) -> Option<(f64, f64)> {
    let d = b - a;
    let mut t0 = 0.0;
    let mut t1 = 1.0;

    let sides = [
        (-d.x, a.x - bbox.left),
        (d.x, bbox.right - a.x),
        (-d.y, a.y - bbox.top),
        (d.y, bbox.bottom - a.y),
    ];

    for (p, q) in sides {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            // entering
            if r > t1 {
                return None;
            }
            if r > t0 {
                t0 = r;
            }
        } else {
            // leaving
            if r < t0 {
                return None;
            }
            if r < t1 {
                t1 = r;
            }
        }
    }

    Some((t0, t1))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Bottom,
    Right,
    Top,
}
impl Side {
    /// The side a counterclockwise walk along the box starting at `p` follows.
    fn starting_at(p: Point, bbox: &BoundingBox) -> Option<Side> {
        if equal(p.x, bbox.left) && less_than(p.y, bbox.bottom) {
            Some(Side::Left)
        } else if equal(p.y, bbox.bottom) && less_than(p.x, bbox.right) {
            Some(Side::Bottom)
        } else if equal(p.x, bbox.right) && greater_than(p.y, bbox.top) {
            Some(Side::Right)
        } else if equal(p.y, bbox.top) && greater_than(p.x, bbox.left) {
            Some(Side::Top)
        } else {
            None
        }
    }

    fn next(self) -> Side {
        match self {
            Side::Left => Side::Bottom,
            Side::Bottom => Side::Right,
            Side::Right => Side::Top,
            Side::Top => Side::Left,
        }
    }

    fn contains(self, p: Point, bbox: &BoundingBox) -> bool {
        match self {
            Side::Left => equal(p.x, bbox.left),
            Side::Bottom => equal(p.y, bbox.bottom),
            Side::Right => equal(p.x, bbox.right),
            Side::Top => equal(p.y, bbox.top),
        }
    }

    /// The corner where the side ends.
    fn end(self, bbox: &BoundingBox) -> Point {
        match self {
            Side::Left => Point::new(bbox.left, bbox.bottom),
            Side::Bottom => Point::new(bbox.right, bbox.bottom),
            Side::Right => Point::new(bbox.right, bbox.top),
            Side::Top => Point::new(bbox.left, bbox.top),
        }
    }
}

/// Prune the halfedges of a cell, sort them and close the gaps between them along the box.
fn close_cell(
    builder: &mut DiagramBuilder,
    sites: &[Point],
    bbox: &BoundingBox,
    site: SiteIdx,
    nearest: Option<SiteIdx>,
) {
    let DiagramBuilder { edges, cells } = builder;
    let Some(cell) = &mut cells[site as usize] else {
        return;
    };

    cell.halfedges
        .retain(|h| edges[h.edge as usize].endpoints().is_some());
    cell.halfedges.sort_by(|a, b| b.angle.total_cmp(&a.angle));

    if cell.halfedges.is_empty() {
        if nearest == Some(site) {
            debugln!("cell {} covers the whole box", site);
            fill_box(cell, edges, sites, bbox);
        } else {
            cells[site as usize] = None;
        }
        return;
    }

    if !cell.close_me {
        return;
    }

    let mut i = 0;
    while i < cell.halfedges.len() {
        let n = cell.halfedges.len();
        let (_, end) = cell.halfedges[i].oriented(&edges[cell.halfedges[i].edge as usize]);
        let next = &cell.halfedges[(i + 1) % n];
        let (start, _) = next.oriented(&edges[next.edge as usize]);
        let (Some(mut va), Some(vz)) = (end, start) else {
            i += 1;
            continue;
        };

        if !va.approx_eq(vz) {
            let Some(mut side) = Side::starting_at(va, bbox) else {
                log::warn!("cell {} has an open end at {:?}, away from the box", site, va);
                i += 1;
                close_straight(cell, edges, sites, i, va, vz);
                i += 1;
                continue;
            };

            let mut closed = false;
            for _ in 0..5 {
                let last = side.contains(vz, bbox);
                let vb = if last { vz } else { side.end(bbox) };

                let edge = edges.len() as EdgeIdx;
                edges.push(Edge::border(site, va, vb));
                i += 1;
                cell.halfedges
                    .insert(i, Halfedge::new(edges, sites, edge, site));

                if last {
                    closed = true;
                    break;
                }
                va = vb;
                side = side.next();
            }

            if !closed {
                log::warn!("could not close cell {} along the box", site);
                i += 1;
                close_straight(cell, edges, sites, i, va, vz);
            }
        }
        i += 1;
    }
    cell.close_me = false;
}

/// Close a gap of the cell with a single segment, inserting its halfedge at `at`.
fn close_straight(
    cell: &mut Cell,
    edges: &mut Vec<Edge>,
    sites: &[Point],
    at: usize,
    va: Point,
    vz: Point,
) {
    let edge = edges.len() as EdgeIdx;
    edges.push(Edge::border(cell.site, va, vz));
    cell.halfedges
        .insert(at, Halfedge::new(edges, sites, edge, cell.site));
}

/// Make the cell the whole box.
fn fill_box(cell: &mut Cell, edges: &mut Vec<Edge>, sites: &[Point], bbox: &BoundingBox) {
    let corners = [
        Point::new(bbox.left, bbox.top),
        Point::new(bbox.left, bbox.bottom),
        Point::new(bbox.right, bbox.bottom),
        Point::new(bbox.right, bbox.top),
    ];
    for i in 0..4 {
        let edge = edges.len() as EdgeIdx;
        edges.push(Edge::border(cell.site, corners[i], corners[(i + 1) % 4]));
        cell.halfedges
            .push(Halfedge::new(edges, sites, edge, cell.site));
    }
}

/// Drop removed edges, resolve the endpoints of the halfedges and collect the vertices.
fn compact(builder: &mut DiagramBuilder) -> (Vec<Cell>, Vec<Edge>, Vec<Point>) {
    let mut remap = vec![EdgeIdx::MAX; builder.edges.len()];
    let mut edges = Vec::new();
    for (i, edge) in builder.edges.drain(..).enumerate() {
        if edge.endpoints().is_some() {
            remap[i] = edges.len() as EdgeIdx;
            edges.push(edge);
        }
    }

    let mut cells = Vec::new();
    for mut cell in builder.cells.drain(..).flatten() {
        for h in &mut cell.halfedges {
            h.edge = remap[h.edge as usize];
            let (start, end) = h.oriented(&edges[h.edge as usize]);
            h.start = start.unwrap_or(Point::NAN);
            h.end = end.unwrap_or(Point::NAN);
        }
        cells.push(cell);
    }

    let mut seen = HashSet::new();
    let vertices = edges
        .iter()
        .filter_map(|e| e.endpoints())
        .flat_map(|(a, b)| [a, b])
        .filter(|&v| seen.insert(v))
        .collect();

    (cells, edges, vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 10.0, 0.0, 10.0).unwrap()
    }

    #[test]
    fn clip_segments() {
        let bbox = bbox();

        // inside
        assert_eq!(
            clip_segment(Point::new(1.0, 1.0), Point::new(9.0, 9.0), &bbox),
            Some((0.0, 1.0))
        );
        // crossing the box
        let (t0, t1) = clip_segment(Point::new(-10.0, 5.0), Point::new(20.0, 5.0), &bbox).unwrap();
        assert!((t0 - 1.0 / 3.0).abs() < 1e-12);
        assert!((t1 - 2.0 / 3.0).abs() < 1e-12);
        // outside
        assert_eq!(
            clip_segment(Point::new(-1.0, -1.0), Point::new(-1.0, 20.0), &bbox),
            None
        );
        assert_eq!(
            clip_segment(Point::new(11.0, 0.0), Point::new(20.0, 5.0), &bbox),
            None
        );
        // missing the corner
        assert_eq!(
            clip_segment(Point::new(-2.0, 1.0), Point::new(1.0, -2.0), &bbox),
            None
        );
    }

    #[test]
    fn connect_dangling_edges() {
        let bbox = bbox();
        let sites = [Point::new(2.0, 5.0), Point::new(8.0, 5.0)];

        // vertical bisector, downward from the top of the box
        let mut edge = Edge {
            left_site: 1,
            right_site: Some(0),
            va: None,
            vb: None,
        };
        assert!(connect_edge(&mut edge, &sites, &bbox));
        assert_eq!(edge.va, Some(Point::new(5.0, 0.0)));
        assert_eq!(edge.vb, Some(Point::new(5.0, 10.0)));

        // upward, from an existing vertex
        let mut edge = Edge {
            left_site: 0,
            right_site: Some(1),
            va: Some(Point::new(5.0, 4.0)),
            vb: None,
        };
        assert!(connect_edge(&mut edge, &sites, &bbox));
        assert_eq!(edge.va, Some(Point::new(5.0, 4.0)));
        assert_eq!(edge.vb, Some(Point::new(5.0, 0.0)));

        // the vertex is above the box, going up
        let mut edge = Edge {
            left_site: 0,
            right_site: Some(1),
            va: Some(Point::new(5.0, -4.0)),
            vb: None,
        };
        assert!(!connect_edge(&mut edge, &sites, &bbox));

        // horizontal bisector, rightward
        let sites = [Point::new(5.0, 2.0), Point::new(5.0, 8.0)];
        let mut edge = Edge {
            left_site: 0,
            right_site: Some(1),
            va: None,
            vb: None,
        };
        assert!(connect_edge(&mut edge, &sites, &bbox));
        assert_eq!(edge.va, Some(Point::new(0.0, 5.0)));
        assert_eq!(edge.vb, Some(Point::new(10.0, 5.0)));

        // bisector outside the box
        let sites = [Point::new(20.0, 2.0), Point::new(30.0, 2.0)];
        let mut edge = Edge {
            left_site: 0,
            right_site: Some(1),
            va: None,
            vb: None,
        };
        assert!(!connect_edge(&mut edge, &sites, &bbox));
    }

    #[test]
    fn walk_sides() {
        let bbox = bbox();
        assert_eq!(
            Side::starting_at(Point::new(0.0, 3.0), &bbox),
            Some(Side::Left)
        );
        // corners belong to the side leaving them
        assert_eq!(
            Side::starting_at(Point::new(0.0, 10.0), &bbox),
            Some(Side::Bottom)
        );
        assert_eq!(
            Side::starting_at(Point::new(10.0, 10.0), &bbox),
            Some(Side::Right)
        );
        assert_eq!(
            Side::starting_at(Point::new(10.0, 0.0), &bbox),
            Some(Side::Top)
        );
        assert_eq!(
            Side::starting_at(Point::new(0.0, 0.0), &bbox),
            Some(Side::Left)
        );
        assert_eq!(Side::starting_at(Point::new(5.0, 5.0), &bbox), None);
        assert_eq!(Side::Top.next(), Side::Left);
    }

    #[test]
    fn whole_box_cell() {
        let bbox = bbox();
        let sites = [Point::new(5.0, 5.0), Point::new(50.0, 5.0)];

        let mut builder = DiagramBuilder::new();
        builder.reset(2);
        builder.add_cell(0);
        builder.add_cell(1);

        let (cells, edges, vertices) = close(&mut builder, &sites, &bbox);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site, 0);
        assert_eq!(cells[0].area(), 100.0);
        assert!(cells[0].is_convex());
        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|e| e.is_border()));
        assert_eq!(vertices.len(), 4);
    }

    #[test]
    fn whole_box_cell_outside() {
        let bbox = bbox();
        // no site is inside the box, the one nearest to its centre owns all of it
        let sites = [Point::new(60.0, 2.0), Point::new(50.0, 2.0)];

        let mut builder = DiagramBuilder::new();
        builder.reset(2);
        builder.add_cell(0);
        builder.add_cell(1);

        let (cells, edges, _) = close(&mut builder, &sites, &bbox);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].site, 1);
        assert_eq!(cells[0].area(), 100.0);
        assert_eq!(edges.len(), 4);
    }

    #[test]
    fn open_end_away_from_box() {
        let bbox = bbox();
        let sites = [Point::new(5.0, 2.0), Point::new(5.0, 8.0)];

        let mut builder = DiagramBuilder::new();
        builder.reset(2);
        builder.add_cell(0);
        let e = builder.create_edge(&sites, 0, 1, None, None);
        builder.edges[e as usize].va = Some(Point::new(2.0, 5.0));
        builder.edges[e as usize].vb = Some(Point::new(8.0, 5.0));
        if let Some(cell) = &mut builder.cells[0] {
            cell.close_me = true;
        }

        // the gap from (8, 5) back to (2, 5) is not on the box, it is closed by a straight edge
        close_cell(&mut builder, &sites, &bbox, 0, Some(0));

        let cell = builder.cells[0].as_ref().unwrap();
        assert_eq!(cell.halfedges.len(), 2);
        let closing = &builder.edges[cell.halfedges[1].edge as usize];
        assert!(closing.is_border());
        assert_eq!(
            closing.endpoints(),
            Some((Point::new(8.0, 5.0), Point::new(2.0, 5.0)))
        );
    }
}
