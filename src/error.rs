use thiserror::Error;

/// Input rejected before the sweep starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoronoiError {
    #[error("site {index} has non-finite coordinates ({x}, {y})")]
    NonFiniteSite { index: usize, x: f64, y: f64 },
    #[error("bounding box has a non-finite bound")]
    NonFiniteBounds,
    #[error("bounding box is empty horizontally: left {left} must be less than right {right}")]
    EmptyWidth { left: f64, right: f64 },
    #[error("bounding box is empty vertically: top {top} must be less than bottom {bottom}")]
    EmptyHeight { top: f64, bottom: f64 },
    #[error("too many sites: {count}, at most {} are supported", crate::MAX_SITES)]
    TooManySites { count: usize },
}

pub type Result<T> = std::result::Result<T, VoronoiError>;
