//! Planar point type used for every geometric computation in the crate.
//!
//! A [`Point`] is a plain `(x, y)` pair of `f64` coordinates. It supports the
//! affine combinations needed by barycentric sampling and interpolation
//! (addition, subtraction, scaling) plus squared and Euclidean distance.
//!
//! Points carry no identity: two points with equal coordinates compare equal.
//! Mesh vertices, which *do* have identity, live in the triangulation arena
//! and are addressed by [`VertexKey`](crate::core::vertex::VertexKey).

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// A point (or displacement vector) in the plane.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::geometry::point::Point;
///
/// let a = Point::new(1.0, 2.0);
/// let b = Point::new(4.0, 6.0);
/// assert_eq!(a.distance(b), 5.0);
/// assert_eq!(a + b, Point::new(5.0, 8.0));
/// assert_eq!((b - a) * 2.0, Point::new(6.0, 8.0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// The origin `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Creates a point from its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `true` if both coordinates are finite (neither NaN nor infinite).
    #[inline]
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Squared length of the point viewed as a vector from the origin.
    #[inline]
    #[must_use]
    pub fn norm_squared(self) -> f64 {
        self.x.mul_add(self.x, self.y * self.y)
    }

    /// 2D cross product (z component of the 3D cross product).
    #[inline]
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x.mul_add(other.y, -(self.y * other.x))
    }

    /// Strict lexicographic order: by `x`, then by `y`.
    ///
    /// Uses [`f64::total_cmp`], so the relation is a total order over all
    /// bit patterns (antisymmetric, transitive, and total), unlike a plain
    /// "`a.y < b.y || a.x < b.x`" comparison.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use plasma_mesh::geometry::point::Point;
    /// use std::cmp::Ordering;
    ///
    /// let a = Point::new(0.0, 5.0);
    /// let b = Point::new(1.0, 0.0);
    /// assert_eq!(a.lexicographic_cmp(&b), Ordering::Less);
    /// assert_eq!(b.lexicographic_cmp(&a), Ordering::Greater);
    /// ```
    #[must_use]
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
    }

    /// Bit-level key for exact coordinate lookup.
    ///
    /// `-0.0` is folded onto `0.0` so that the two zero representations map
    /// to the same key.
    #[must_use]
    pub(crate) fn bit_key(self) -> (u64, u64) {
        fn normalized(v: f64) -> u64 {
            if v == 0.0 { 0 } else { v.to_bits() }
        }
        (normalized(self.x), normalized(self.y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    #[inline]
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point {
    #[inline]
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    #[inline]
    fn mul(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;

    #[inline]
    fn mul(self, p: Point) -> Point {
        p * self
    }
}

impl Div<f64> for Point {
    type Output = Self;

    #[inline]
    fn div(self, k: f64) -> Self {
        Self::new(self.x / k, self.y / k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn affine_operations() {
        let a = Point::new(1.0, -2.0);
        let b = Point::new(3.0, 4.0);

        assert_eq!(a + b, Point::new(4.0, 2.0));
        assert_eq!(b - a, Point::new(2.0, 6.0));
        assert_eq!(a * 3.0, Point::new(3.0, -6.0));
        assert_eq!(0.5 * b, Point::new(1.5, 2.0));
        assert_eq!(b / 2.0, Point::new(1.5, 2.0));
        assert_eq!(-a, Point::new(-1.0, 2.0));
    }

    #[test]
    fn distances() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_relative_eq!(a.distance_squared(b), 25.0);
        assert_relative_eq!(a.distance(b), 5.0);
        assert_relative_eq!(b.distance(a), 5.0);
        assert_relative_eq!(b.norm_squared(), 25.0);
    }

    #[test]
    fn lexicographic_order_is_strict_and_antisymmetric() {
        // These two points break a naive "y first, then x" predicate:
        // each one would compare as less than the other.
        let a = Point::new(0.0, 5.0);
        let b = Point::new(1.0, 0.0);

        assert_eq!(a.lexicographic_cmp(&b), Ordering::Less);
        assert_eq!(b.lexicographic_cmp(&a), Ordering::Greater);
        assert_eq!(a.lexicographic_cmp(&a), Ordering::Equal);

        let c = Point::new(0.0, 6.0);
        assert_eq!(a.lexicographic_cmp(&c), Ordering::Less);
        assert_eq!(c.lexicographic_cmp(&a), Ordering::Greater);
    }

    #[test]
    fn bit_key_folds_signed_zero() {
        assert_eq!(Point::new(0.0, -0.0).bit_key(), Point::new(-0.0, 0.0).bit_key());
        assert_ne!(Point::new(1.0, 0.0).bit_key(), Point::new(0.0, 1.0).bit_key());
    }

    #[test]
    fn finiteness() {
        assert!(Point::new(1.0, 2.0).is_finite());
        assert!(!Point::new(f64::NAN, 2.0).is_finite());
        assert!(!Point::new(1.0, f64::INFINITY).is_finite());
    }
}
