//! Voronoi diagrams of point sites, computed with Fortune's sweepline algorithm and clipped to a
//! bounding box.
//!
//! ```
//! use voronoi_fortune::{compute, BoundingBox, Point};
//!
//! let sites = [Point::new(300.0, 300.0), Point::new(100.0, 100.0), Point::new(200.0, 500.0)];
//! let bbox = BoundingBox::new(0.0, 800.0, 0.0, 600.0).unwrap();
//!
//! let diagram = compute(&sites, bbox).unwrap();
//! assert_eq!(diagram.cells.len(), 3);
//! ```

macro_rules! debugln {
    ($($arg:tt)*) => {
        ::log::trace!($($arg)*)
    };
}

macro_rules! test_assert {
    ($cond:expr) => {
        #[cfg(all(debug_assertions, not(coverage)))]
        {
            assert!($cond);
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        #[cfg(all(debug_assertions, not(coverage)))]
        {
            assert!($cond, $($arg)*);
        }
    };
}

mod beachline;
mod clip;
pub mod diagram;
pub mod error;
pub mod geometry;
mod queue;
pub mod rbtree;
mod sweep;


pub use diagram::{Cell, Diagram, Edge, EdgeIdx, Halfedge, SiteIdx};
pub use error::{Result, VoronoiError};
pub use geometry::{BoundingBox, Point};
pub use sweep::{SweepProgress, Voronoi, MAX_SITES};

/// Compute the Voronoi diagram of `sites`, clipped to `bbox`, with a fresh [`Voronoi`].
pub fn compute(sites: &[Point], bbox: BoundingBox) -> Result<Diagram> {
    Voronoi::new().compute(sites, bbox)
}
