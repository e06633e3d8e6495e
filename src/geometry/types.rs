//! Core geometric types shared by the shape generator, the transform
//! pipeline and the placement model.
//!
//! Coordinates follow the screen convention: x grows to the right, y grows
//! downwards, and positive angles turn clockwise.

use std::ops::{Add, Mul, Neg, Sub};

/// A 2D point (or vector) in millimetres or pixels, depending on the frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin (0, 0)
    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Vector length
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Rotate around the origin by `degrees` (clockwise positive)
    pub fn rotated(&self, degrees: f64) -> Point {
        let (sin, cos) = sin_cos_degrees(degrees);
        Point {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Rotate around `center` by `degrees` (clockwise positive)
    pub fn rotated_around(&self, center: Point, degrees: f64) -> Point {
        center + (*self - center).rotated(degrees)
    }

    /// Unit vector pointing in `degrees`
    pub fn from_angle(degrees: f64) -> Point {
        let (sin, cos) = sin_cos_degrees(degrees);
        Point::new(cos, sin)
    }

    /// True when both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Shortest distance to the line segment from `a` to `b`
    pub fn distance_to_segment(&self, a: Point, b: Point) -> f64 {
        let ab = b - a;
        let len_sq = ab.x * ab.x + ab.y * ab.y;
        if len_sq == 0.0 {
            return self.distance(a);
        }
        let t = (((self.x - a.x) * ab.x + (self.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
        self.distance(a + ab * t)
    }

    /// Component-wise comparison with an absolute tolerance
    pub fn approx_eq(&self, other: Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// An axis-aligned bounding box stored as its extreme coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a zero-sized box at the origin
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Degenerate box covering a single point
    pub fn from_point(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// Smallest box containing all points, or `None` for an empty iterator
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |b, p| b.expand_to_include(p)))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point of the bounding box
    pub fn center(&self) -> Point {
        Point {
            x: (self.min_x + self.max_x) / 2.0,
            y: (self.min_y + self.max_y) / 2.0,
        }
    }

    /// Check if this bounding box contains a point (edges inclusive)
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Like [`Bounds::contains`] but lets points sit up to `epsilon` outside
    pub fn contains_approx(&self, point: Point, epsilon: f64) -> bool {
        self.inflate(epsilon).contains(point)
    }

    /// Check if this bounding box intersects another
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Compute the union of two bounding boxes (smallest box containing both)
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Expand this bounding box to include a point
    pub fn expand_to_include(&self, point: Point) -> Bounds {
        Bounds::new(
            self.min_x.min(point.x),
            self.min_y.min(point.y),
            self.max_x.max(point.x),
            self.max_y.max(point.y),
        )
    }

    /// Grow the box by `margin` on every side
    pub fn inflate(&self, margin: f64) -> Bounds {
        Bounds::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::zero()
    }
}

/// Normalize an angle in degrees into `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let n = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if n >= 360.0 {
        0.0
    } else {
        n
    }
}

/// Normalize an angle in degrees into `(-180, 180]`
pub fn signed_degrees(degrees: f64) -> f64 {
    let n = normalize_degrees(degrees);
    if n > 180.0 {
        n - 360.0
    } else {
        n
    }
}

/// Smallest absolute difference between two directions, in `[0, 180]`
pub fn angular_difference(a: f64, b: f64) -> f64 {
    signed_degrees(a - b).abs()
}

/// Sine and cosine of an angle in degrees.
///
/// Multiples of 90° return exact values so that axis-aligned placements do
/// not pick up `1e-16` residue from `sin(π)`.
pub fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    let n = normalize_degrees(degrees);
    if n == 0.0 {
        (0.0, 1.0)
    } else if n == 90.0 {
        (1.0, 0.0)
    } else if n == 180.0 {
        (0.0, -1.0)
    } else if n == 270.0 {
        (-1.0, 0.0)
    } else {
        n.to_radians().sin_cos()
    }
}
