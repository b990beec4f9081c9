use std::cmp::Ordering;

use crate::error::{Result, VoronoiError};

/// Tolerance used by every floating point comparison of the sweep and the closing pass.
pub const EPSILON: f64 = 1e-9;

/// `|a - b| < ε`
#[inline]
pub fn equal(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

/// `b - a > ε`
#[inline]
pub fn less_than(a: f64, b: f64) -> bool {
    b - a > EPSILON
}

/// `a - b > ε`
#[inline]
pub fn greater_than(a: f64, b: f64) -> bool {
    a - b > EPSILON
}

#[inline]
pub fn less_or_equal(a: f64, b: f64) -> bool {
    !greater_than(a, b)
}

#[inline]
pub fn greater_or_equal(a: f64, b: f64) -> bool {
    !less_than(a, b)
}

/// Three-way comparison consistent with [`equal`], [`less_than`] and [`greater_than`].
pub fn epsilon_cmp(a: f64, b: f64) -> Ordering {
    if less_than(a, b) {
        Ordering::Less
    } else if greater_than(a, b) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// A point in 2D space. It is ordered in sweep order: by y, then by x.
#[derive(PartialEq, Clone, Copy, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}
impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}
impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}
impl Point {
    /// A Point whose x and y are both NaN.
    pub const NAN: Self = Self::new(f64::NAN, f64::NAN);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check if both coordinates are NaN.
    pub fn is_nan(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn perp_dot(&self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dist(&self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Both coordinates are [`equal`].
    pub fn approx_eq(&self, other: Self) -> bool {
        equal(self.x, other.x) && equal(self.y, other.y)
    }
}
impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Point")
            .field(&self.x)
            .field(&self.y)
            .finish()
    }
}
impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // -0.0 + 0.0 is 0.0, so equal points hash the same.
        (self.x + 0.0).to_bits().hash(state);
        (self.y + 0.0).to_bits().hash(state);
    }
}
impl Eq for Point {}
impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        // Coordinates are validated to be finite before any sweep comparison.
        self.y
            .partial_cmp(&other.y)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.x.partial_cmp(&other.x).unwrap_or(Ordering::Equal))
    }
}

/// The rectangle the diagram is clipped to.
///
/// y grows downward: `top` is where the sweep starts and `bottom` where it ends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}
impl BoundingBox {
    pub fn new(left: f64, right: f64, top: f64, bottom: f64) -> Result<Self> {
        let bbox = Self {
            left,
            right,
            top,
            bottom,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> Result<()> {
        if ![self.left, self.right, self.top, self.bottom]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(VoronoiError::NonFiniteBounds);
        }
        if self.left >= self.right {
            return Err(VoronoiError::EmptyWidth {
                left: self.left,
                right: self.right,
            });
        }
        if self.top >= self.bottom {
            return Err(VoronoiError::EmptyHeight {
                top: self.top,
                bottom: self.bottom,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.top && p.y <= self.bottom
    }
}

/// A circle, as returned by [`circumcircle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
}
impl Circle {
    /// The point of the circle reached last by the sweep.
    pub fn bottom(&self) -> f64 {
        self.center.y + self.radius
    }
}

/// Finds the circle through the points `a`, `b`, and `c`.
///
/// The computation is done with `a` translated to the origin. Returns `None` if the points are
/// collinear.
pub fn circumcircle(a: Point, b: Point, c: Point) -> Option<Circle> {
    let b = b - a;
    let c = c - a;
    let d = 2.0 * b.perp_dot(c);

    if d == 0.0 {
        return None;
    }

    let hb = b.x * b.x + b.y * b.y;
    let hc = c.x * c.x + c.y * c.y;
    let x = (c.y * hb - b.y * hc) / d;
    let y = (b.x * hc - c.x * hb) / d;

    Some(Circle {
        center: Point::new(x + a.x, y + a.y),
        radius: (x * x + y * y).sqrt(),
    })
}

/// Finds the circumcenter of the triangle formed by the points `a`, `b`, and `c`.
pub fn circumcenter(a: Point, b: Point, c: Point) -> Option<Point> {
    circumcircle(a, b, c).map(|c| c.center)
}

/// Returns true if the arc of `center`, flanked by the arcs of `left` and `right`, shrinks as
/// the sweep advances, so it may vanish in a circle event.
pub fn converges(left: Point, center: Point, right: Point) -> bool {
    (left - center).perp_dot(right - center) < -1e-12
}

/// The line `y = slope * x + intercept`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub slope: f64,
    pub intercept: f64,
}
impl Line {
    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn x_at(&self, y: f64) -> f64 {
        (y - self.intercept) / self.slope
    }
}

/// The perpendicular bisector of two sites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bisector {
    pub midpoint: Point,
    /// `None` if the bisector is the vertical line `x = midpoint.x`.
    pub line: Option<Line>,
}
impl Bisector {
    pub fn new(p: Point, q: Point) -> Self {
        let midpoint = Point::new((p.x + q.x) / 2.0, (p.y + q.y) / 2.0);

        if p.y == q.y {
            return Self {
                midpoint,
                line: None,
            };
        }

        let slope = (p.x - q.x) / (q.y - p.y);
        Self {
            midpoint,
            line: Some(Line {
                slope,
                intercept: midpoint.y - slope * midpoint.x,
            }),
        }
    }
}

/// The x coordinate where the parabola of `left_focus` meets the parabola of `focus`, to its
/// right, with both parabolas sharing the horizontal `directrix`.
///
/// A focus on the directrix is a degenerate parabola (a vertical ray), in which case the
/// breakpoint is the x of that focus.
pub fn parabola_breakpoint(focus: Point, left_focus: Point, directrix: f64) -> f64 {
    let pby2 = focus.y - directrix;
    if pby2 == 0.0 {
        return focus.x;
    }

    let plby2 = left_focus.y - directrix;
    if plby2 == 0.0 {
        return left_focus.x;
    }

    if focus.y == left_focus.y {
        return (focus.x + left_focus.x) / 2.0;
    }

    let hl = left_focus.x - focus.x;
    let aby2 = 1.0 / pby2 - 1.0 / plby2;
    let b = hl / plby2;

    let disc = b * b
        - 2.0 * aby2 * (hl * hl / (-2.0 * plby2) - left_focus.y + plby2 / 2.0 + focus.y - pby2 / 2.0);

    (-b + disc.sqrt()) / aby2 + focus.x
}
