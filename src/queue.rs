use core::fmt;
use std::ops::Index;

use crate::diagram::SiteIdx;
use crate::geometry::Point;
use crate::rbtree::NodeId;

/// Index of a [`CircleEvent`] in the arena of an [`EventQueue`].
pub(crate) type CircleId = u32;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum CircleState {
    /// Still in the queue, and will remove its arc when popped.
    Pending,
    /// One of the arcs of its triplet changed. It stays in the queue until it is popped or purged.
    Voided,
    /// Popped and processed.
    Fired,
}

/// The moment an arc of the beachline shrinks to a point.
#[derive(Clone, Debug)]
pub(crate) struct CircleEvent {
    /// The arc that vanishes.
    pub arc: NodeId,
    pub site: SiteIdx,
    /// x of the circle center.
    pub x: f64,
    /// Bottom of the circle, where the sweep meets this event.
    pub y: f64,
    pub y_center: f64,
    pub state: CircleState,
}
impl CircleEvent {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y_center)
    }

    pub fn is_pending(&self) -> bool {
        self.state == CircleState::Pending
    }

    fn key(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SiteEvent {
    pub site: SiteIdx,
    pub point: Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Event {
    Site(SiteEvent),
    Circle(CircleId),
}

/// The two event queues of the sweep.
///
/// Site events are known upfront, so they are a stack sorted in reverse sweep order. Circle
/// events are kept in a vector sorted in reverse sweep order, with the events themselves living
/// in an arena, so an arc can void its event in O(1). Voided events are only removed when they
/// reach the tail, or when they outnumber the live ones too much.
pub(crate) struct EventQueue {
    sites: Vec<SiteEvent>,
    circles: Vec<CircleEvent>,
    order: Vec<CircleId>,
    /// Number of voided events still in `order`.
    voided: usize,
}
impl EventQueue {
    pub fn new() -> Self {
        Self {
            sites: Vec::new(),
            circles: Vec::new(),
            order: Vec::new(),
            voided: 0,
        }
    }

    pub fn clear(&mut self) {
        self.sites.clear();
        self.circles.clear();
        self.order.clear();
        self.voided = 0;
    }

    /// Load the site events. They must be given in sweep order.
    pub fn load_sites(&mut self, sites: impl DoubleEndedIterator<Item = SiteEvent>) {
        self.sites.clear();
        self.sites.extend(sites.rev());
        test_assert!(self.sites.windows(2).all(|w| w[0].point >= w[1].point));
    }

    pub fn push_circle(&mut self, event: CircleEvent) -> CircleId {
        test_assert!(self.circles.len() < CircleId::MAX as usize, "circle index overflow");
        let id = self.circles.len() as CircleId;
        let key = event.key();
        self.circles.push(event);

        let circles = &self.circles;
        let index = self
            .order
            .partition_point(|&other| circles[other as usize].key() >= key);
        self.order.insert(index, id);

        id
    }

    /// Mark a pending event as voided. Does nothing for voided or fired events.
    pub fn void(&mut self, id: CircleId) {
        let event = &mut self.circles[id as usize];
        if event.state == CircleState::Pending {
            event.state = CircleState::Voided;
            self.voided += 1;
        }
    }

    pub fn fire(&mut self, id: CircleId) {
        let event = &mut self.circles[id as usize];
        test_assert!(event.state == CircleState::Pending, "firing a dead event");
        event.state = CircleState::Fired;
    }

    /// Pop the next event in sweep order. A site event wins a tie with a circle event.
    ///
    /// Voided circle events are returned too; the caller is expected to skip them and call
    /// [`EventQueue::sanitize`].
    pub fn pop(&mut self) -> Option<Event> {
        let site = self.sites.last().map(|s| s.point);
        let circle = self.order.last().map(|&id| self.circles[id as usize].key());

        let take_site = match (site, circle) {
            (None, None) => return None,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some(site), Some(circle)) => site <= circle,
        };

        if take_site {
            self.sites.pop().map(Event::Site)
        } else {
            let id = self.order.pop()?;
            if self.circles[id as usize].state == CircleState::Voided {
                self.voided -= 1;
            }
            Some(Event::Circle(id))
        }
    }

    /// Drop voided events from the tail, and from the whole queue if they are more than twice
    /// the number of arcs in the beachline.
    pub fn sanitize(&mut self, beachline_len: usize) {
        while let Some(&id) = self.order.last() {
            if self.circles[id as usize].state != CircleState::Voided {
                break;
            }
            self.order.pop();
            self.voided -= 1;
        }

        if self.voided > 2 * beachline_len {
            debugln!(
                "purging {} voided circle events out of {}",
                self.voided,
                self.order.len()
            );
            let circles = &self.circles;
            self.order
                .retain(|&id| circles[id as usize].state != CircleState::Voided);
            self.voided = 0;
        }
    }

    /// Number of events still to be processed, ignoring voided ones.
    pub fn pending_len(&self) -> usize {
        self.sites.len() + self.order.len() - self.voided
    }

    /// Number of circle events in the queue, voided ones included.
    #[cfg(test)]
    pub fn circle_len(&self) -> usize {
        self.order.len()
    }
}

impl Index<CircleId> for EventQueue {
    type Output = CircleEvent;

    fn index(&self, id: CircleId) -> &CircleEvent {
        &self.circles[id as usize]
    }
}

impl fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let circles = self
            .order
            .iter()
            .map(|&id| &self.circles[id as usize])
            .filter(|e| e.is_pending())
            .map(|e| e.key())
            .collect::<Vec<_>>();
        f.debug_struct("EventQueue")
            .field("sites", &self.sites.iter().map(|s| s.site).collect::<Vec<_>>())
            .field("circles", &circles)
            .finish()
    }
}
