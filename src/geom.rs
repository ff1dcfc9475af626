//! Plain geometric value types shared by the index structures
//!
//! Coordinates are pixel coordinates in the map's maximum-zoom pixel space.
//! Equality on these types is approximate: two values closer than
//! [`EPSILON`] on every component compare equal, which is what the editors
//! rely on when matching geometry that went through a round of projection
//! arithmetic.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum admitted floating-point error for coordinate comparisons
pub const EPSILON: f64 = 1e-4;

/// An immutable 2D point in map pixel space
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance (avoids the sqrt on hot paths)
    #[inline]
    pub fn distance_sq(&self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    /// Translate by the given amounts
    #[inline]
    pub fn offset(self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.y - other.y).abs() < EPSILON
    }
}

/// An axis-aligned rectangle given as (left, top, width, height)
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Region {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Region {
    #[inline]
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build a region from two opposite corners
    #[inline]
    pub fn from_corners(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self::new(left, top, right - left, bottom - top)
    }

    /// Build a region centered at `center` with the given half-extents
    #[inline]
    pub fn from_center(center: Point, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            half_width * 2.0,
            half_height * 2.0,
        )
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    /// Point containment: edges are closed on all four sides
    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        self.left <= point.x
            && self.top <= point.y
            && self.right() >= point.x
            && self.bottom() >= point.y
    }

    /// Whole-rectangle containment
    #[inline]
    pub fn contains_region(&self, other: &Region) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Rectangle overlap test, strict on both sides: regions that only
    /// share an edge do not intersect
    #[inline]
    pub fn intersects(&self, other: &Region) -> bool {
        other.left < self.right()
            && self.left < other.right()
            && other.top < self.bottom()
            && self.top < other.bottom()
    }

    /// Translate the region
    #[inline]
    pub fn offset(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.top += dy;
    }

    /// Grow the region by the given amounts on every side
    pub fn inflate(&mut self, amount_x: f64, amount_y: f64) {
        self.left -= amount_x;
        self.top -= amount_y;
        self.width += 2.0 * amount_x;
        self.height += 2.0 * amount_y;
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        (self.left - other.left).abs() < EPSILON
            && (self.top - other.top).abs() < EPSILON
            && (self.width - other.width).abs() < EPSILON
            && (self.height - other.height).abs() < EPSILON
    }
}
