use std::time::Instant;

use crate::beachline::{Beachline, Placement};
use crate::clip;
use crate::diagram::{Diagram, DiagramBuilder, Edge, SiteIdx};
use crate::error::{Result, VoronoiError};
use crate::geometry::{
    circumcenter, circumcircle, converges, equal, greater_or_equal, BoundingBox, Point, EPSILON,
};
use crate::queue::{CircleEvent, CircleId, CircleState, Event, EventQueue, SiteEvent};
use crate::rbtree::NodeId;

/// Computes Voronoi diagrams with Fortune's sweepline algorithm.
///
/// The sweep runs from the top of the bounding box to its bottom, with y growing downward. The
/// working buffers are kept between calls, so reusing the same `Voronoi` avoids reallocating
/// them.
pub struct Voronoi {
    sites: Vec<Point>,
    beachline: Beachline,
    queue: EventQueue,
    builder: DiagramBuilder,
}

impl Default for Voronoi {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of the sweep, given to the callback of [`Voronoi::compute_with_progress`].
pub struct SweepProgress<'a> {
    directrix: f64,
    voronoi: &'a Voronoi,
}
impl SweepProgress<'_> {
    /// The y coordinate of the sweepline.
    pub fn directrix(&self) -> f64 {
        self.directrix
    }

    /// The site of each arc of the beachline, from left to right.
    pub fn beachline(&self) -> impl Iterator<Item = SiteIdx> + '_ {
        self.voronoi.beachline.sites()
    }

    /// Number of site and circle events not processed yet.
    pub fn pending_events(&self) -> usize {
        self.voronoi.queue.pending_len()
    }

    /// The edges traced so far. Most of them are still missing one or both endpoints.
    pub fn edges(&self) -> &[Edge] {
        &self.voronoi.builder.edges
    }
}

impl Voronoi {
    pub fn new() -> Self {
        Self {
            sites: Vec::new(),
            beachline: Beachline::new(),
            queue: EventQueue::new(),
            builder: DiagramBuilder::new(),
        }
    }

    /// Compute the Voronoi diagram of `sites`, clipped to `bbox`.
    ///
    /// Cells are identified by the index of their site in `sites`. A site equal to an earlier one
    /// is ignored and gets no cell.
    pub fn compute(&mut self, sites: &[Point], bbox: BoundingBox) -> Result<Diagram> {
        self.compute_with_progress(sites, bbox, |_| {})
    }

    /// Same as [`Voronoi::compute`], but calls `on_progress` after each processed event.
    pub fn compute_with_progress<F>(
        &mut self,
        sites: &[Point],
        bbox: BoundingBox,
        mut on_progress: F,
    ) -> Result<Diagram>
    where
        F: FnMut(&SweepProgress<'_>),
    {
        let start = Instant::now();

        validate(sites, &bbox)?;
        self.reset(sites);

        let order = sweep_order(sites);

        log::debug!(
            "computing diagram of {} sites ({} distinct)",
            sites.len(),
            order.len()
        );

        self.queue.load_sites(order.iter().map(|&site| SiteEvent {
            site,
            point: sites[site as usize],
        }));

        while let Some(event) = self.queue.pop() {
            let directrix = match event {
                Event::Site(event) => {
                    debugln!("site event {} at {:?}", event.site, event.point);
                    self.builder.add_cell(event.site);
                    self.add_beachsection(event.site);
                    event.point.y
                }
                Event::Circle(id) if self.queue[id].is_pending() => {
                    let event = &self.queue[id];
                    debugln!("circle event of site {} at {:?}", event.site, event.center());
                    self.remove_beachsection(id);
                    self.queue[id].y
                }
                Event::Circle(_) => {
                    self.queue.sanitize(self.beachline.len());
                    continue;
                }
            };
            debugln!("beachline: {:?}", self.beachline);

            on_progress(&SweepProgress {
                directrix,
                voronoi: &*self,
            });
        }

        let (cells, edges, vertices) = clip::close(&mut self.builder, &self.sites, &bbox);
        self.clear();

        let diagram = Diagram {
            cells,
            edges,
            vertices,
            exec_time: start.elapsed(),
        };
        log::debug!(
            "diagram done: {} cells, {} edges, {} vertices in {:.3}ms",
            diagram.cells.len(),
            diagram.edges.len(),
            diagram.vertices.len(),
            diagram.exec_time_ms()
        );

        Ok(diagram)
    }

    fn reset(&mut self, sites: &[Point]) {
        self.sites.clear();
        self.sites.extend_from_slice(sites);
        self.beachline.clear();
        self.queue.clear();
        self.builder.reset(sites.len());
    }

    fn clear(&mut self) {
        self.sites.clear();
        self.beachline.clear();
        self.queue.clear();
        self.builder.clear();
    }

    fn add_beachsection(&mut self, site: SiteIdx) {
        let point = self.sites[site as usize];
        let directrix = point.y;

        match self.beachline.locate(point.x, directrix, &self.sites) {
            Placement::Empty => {
                self.beachline.insert(None, site);
            }
            Placement::Inside(arc) => self.split_beachsection(arc, site, directrix),
            Placement::Between(left, right) => {
                let left_site = self.beachline[left].site;
                let right_site = self.beachline[right].site;
                let vertex = circumcenter(
                    self.sites[left_site as usize],
                    point,
                    self.sites[right_site as usize],
                );
                let Some(vertex) = vertex else {
                    debug_assert!(false, "site {} is collinear with its arcs", site);
                    log::warn!("site {} is collinear with the arcs above it", site);
                    self.split_beachsection(right, site, directrix);
                    return;
                };

                self.detach_circle_event(left);
                self.detach_circle_event(right);

                // the breakpoint between the two arcs ends here, and two new ones start.
                if let Some(edge) = self.beachline[right].edge {
                    self.builder
                        .set_edge_startpoint(edge, left_site, right_site, vertex);
                }

                let new_arc = self.beachline.insert(Some(left), site);
                let left_edge =
                    self.builder
                        .create_edge(&self.sites, left_site, site, None, Some(vertex));
                let right_edge =
                    self.builder
                        .create_edge(&self.sites, site, right_site, None, Some(vertex));
                self.beachline[new_arc].edge = Some(left_edge);
                self.beachline[right].edge = Some(right_edge);

                self.attach_circle_event(left, directrix);
                self.attach_circle_event(right, directrix);
            }
            Placement::After(left) => {
                // only happens while every site seen so far has the same y, so no circle event.
                let left_site = self.beachline[left].site;
                let new_arc = self.beachline.insert(Some(left), site);
                let edge = self
                    .builder
                    .create_edge(&self.sites, left_site, site, None, None);
                self.beachline[new_arc].edge = Some(edge);
            }
            Placement::Before(right) => {
                let right_site = self.beachline[right].site;
                let before = self.beachline.prev(right);
                self.beachline.insert(before, site);
                let edge = self
                    .builder
                    .create_edge(&self.sites, site, right_site, None, None);
                self.beachline[right].edge = Some(edge);
            }
        }
    }

    /// Split `arc` in two, with the new arc of `site` in the middle.
    fn split_beachsection(&mut self, arc: NodeId, site: SiteIdx, directrix: f64) {
        let arc_site = self.beachline[arc].site;
        self.detach_circle_event(arc);

        let new_arc = self.beachline.insert(Some(arc), site);
        let right_arc = self.beachline.insert(Some(new_arc), arc_site);

        // both breakpoints trace the same edge, in opposite directions.
        let edge = self
            .builder
            .create_edge(&self.sites, arc_site, site, None, None);
        self.beachline[new_arc].edge = Some(edge);
        self.beachline[right_arc].edge = Some(edge);

        self.attach_circle_event(arc, directrix);
        self.attach_circle_event(right_arc, directrix);
    }

    /// Remove the arc of a circle event, together with any adjacent arc vanishing at the same
    /// vertex.
    fn remove_beachsection(&mut self, id: CircleId) {
        let event = &self.queue[id];
        let (arc, vertex, directrix) = (event.arc, event.center(), event.y);

        self.queue.fire(id);

        let mut prev = self.beachline.prev(arc);
        let mut next = self.beachline.next(arc);
        self.detach_beachsection(arc);

        let mut disappearing = vec![arc];

        loop {
            let Some(left) = prev else {
                debug_assert!(false, "vanishing arc without a left neighbor");
                log::warn!("circle event at {:?} without a left arc", vertex);
                return;
            };
            if !self.vanishes_at(left, vertex) {
                break;
            }
            prev = self.beachline.prev(left);
            disappearing.push(left);
            self.detach_beachsection(left);
        }
        disappearing.reverse();

        loop {
            let Some(right) = next else {
                debug_assert!(false, "vanishing arc without a right neighbor");
                log::warn!("circle event at {:?} without a right arc", vertex);
                return;
            };
            if !self.vanishes_at(right, vertex) {
                break;
            }
            next = self.beachline.next(right);
            disappearing.push(right);
            self.detach_beachsection(right);
        }

        // `prev` and `next` are the arcs that stay, at both sides of the vanished ones.
        let (Some(left), Some(right)) = (prev, next) else {
            return;
        };
        self.detach_circle_event(left);
        self.detach_circle_event(right);

        let mut l = left;
        for &r in disappearing.iter().chain(std::iter::once(&right)) {
            let (l_site, r_site) = (self.beachline[l].site, self.beachline[r].site);
            if let Some(edge) = self.beachline[r].edge {
                self.builder.set_edge_startpoint(edge, l_site, r_site, vertex);
            }
            l = r;
        }

        let left_site = self.beachline[left].site;
        let right_site = self.beachline[right].site;
        let edge = self
            .builder
            .create_edge(&self.sites, left_site, right_site, None, Some(vertex));
        self.beachline[right].edge = Some(edge);

        debugln!(
            "{} arcs vanished at {:?}, new edge {} between {} and {}",
            disappearing.len(),
            vertex,
            edge,
            left_site,
            right_site
        );

        self.attach_circle_event(left, directrix);
        self.attach_circle_event(right, directrix);
    }

    /// Returns true if the arc has a pending circle event centered at `vertex`.
    fn vanishes_at(&self, arc: NodeId, vertex: Point) -> bool {
        let Some(id) = self.beachline[arc].circle_event else {
            return false;
        };
        let event = &self.queue[id];
        event.state == CircleState::Pending
            && equal(event.x, vertex.x)
            && equal(event.y_center, vertex.y)
    }

    fn detach_beachsection(&mut self, arc: NodeId) {
        self.detach_circle_event(arc);
        self.beachline.remove(arc);
    }

    fn detach_circle_event(&mut self, arc: NodeId) {
        if let Some(id) = self.beachline[arc].circle_event.take() {
            self.queue.void(id);
        }
    }

    /// Queue the circle event of `arc`, if its neighbors make it shrink to a point below the
    /// sweepline.
    fn attach_circle_event(&mut self, arc: NodeId, directrix: f64) {
        let (Some(left), Some(right)) = (self.beachline.prev(arc), self.beachline.next(arc)) else {
            return;
        };

        let l = self.beachline[left].site;
        let c = self.beachline[arc].site;
        let r = self.beachline[right].site;
        if l == r || l == c || c == r {
            return;
        }

        let (lp, cp, rp) = (
            self.sites[l as usize],
            self.sites[c as usize],
            self.sites[r as usize],
        );
        if !converges(lp, cp, rp) {
            return;
        }

        let Some(circle) = circumcircle(cp, lp, rp) else {
            return;
        };

        let bottom = circle.bottom();
        if !greater_or_equal(bottom, directrix) {
            return;
        }

        let id = self.queue.push_circle(CircleEvent {
            arc,
            site: c,
            x: circle.center.x,
            y: bottom,
            y_center: circle.center.y,
            state: CircleState::Pending,
        });
        self.beachline[arc].circle_event = Some(id);
    }
}

/// Sort the sites in sweep order, dropping duplicates.
///
/// A site within [`EPSILON`] of a site kept before it, on both axes, is a duplicate. Exact
/// duplicates keep their first occurrence in input order, since the sort is stable.
fn sweep_order(sites: &[Point]) -> Vec<SiteIdx> {
    let mut order = (0..sites.len() as SiteIdx).collect::<Vec<_>>();
    order.sort_by(|&a, &b| sites[a as usize].cmp(&sites[b as usize]));

    let mut kept: Vec<SiteIdx> = Vec::with_capacity(order.len());
    for site in order {
        let p = sites[site as usize];
        let duplicate = kept
            .iter()
            .rev()
            .take_while(|&&k| sites[k as usize].y > p.y - EPSILON)
            .any(|&k| sites[k as usize].approx_eq(p));
        if duplicate {
            debugln!("site {} duplicates an earlier site at {:?}", site, p);
        } else {
            kept.push(site);
        }
    }
    kept
}

/// The largest number of sites a diagram can be computed for.
///
/// A diagram of `n` sites has less than `3n` edges traced by the sweep, as many border edges
/// and `6n` circle events, so every 32-bit index fits with this limit.
pub const MAX_SITES: usize = (u32::MAX / 8) as usize;

fn check_site_count(count: usize) -> Result<()> {
    if count > MAX_SITES {
        return Err(VoronoiError::TooManySites { count });
    }
    Ok(())
}

fn validate(sites: &[Point], bbox: &BoundingBox) -> Result<()> {
    bbox.validate()?;

    check_site_count(sites.len())?;

    if let Some((index, site)) = sites.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(VoronoiError::NonFiniteSite {
            index,
            x: site.x,
            y: site.y,
        });
    }

    Ok(())
}
