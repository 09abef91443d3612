//! Geometric predicates for planar triangles.
//!
//! This module contains the orientation test, the signed-area formula, and the
//! circumcircle construction used by the triangulation engine. All predicates
//! work on plain `f64` coordinates; inputs are assumed to be in general
//! position (no four cocircular points, no three collinear points), and
//! collinear triples are reported as [`GeometryError::DegenerateTriangle`].

use serde::{Deserialize, Serialize};

use crate::geometry::point::Point;

/// Errors raised by triangle-level geometric constructions.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// The three points are collinear (zero circumcircle denominator).
    #[error("Degenerate triangle: points {points:?} are collinear or coincident")]
    DegenerateTriangle {
        /// The offending points, in the order they were supplied.
        points: [Point; 3],
    },

    /// The circumcircle could not be represented with finite coordinates.
    #[error("Circumcircle of {points:?} is not finite (nearly collinear input)")]
    NonFiniteCircumcircle {
        /// The offending points, in the order they were supplied.
        points: [Point; 3],
    },
}

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point is outside the circumcircle
    OUTSIDE,
    /// The point lies exactly on the circumcircle
    BOUNDARY,
    /// The point is strictly inside the circumcircle
    INSIDE,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Represents the orientation of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise turn (signed area < 0)
    NEGATIVE,
    /// Collinear points (signed area == 0)
    DEGENERATE,
    /// Counter-clockwise turn (signed area > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Twice the signed area of the triangle `(a, b, c)`.
///
/// Positive when the points turn counter-clockwise, negative when clockwise,
/// zero when collinear.
///
/// ```text
/// (b.x - a.x)(c.y - a.y) - (c.x - a.x)(b.y - a.y)
/// ```
#[inline]
#[must_use]
pub fn orientation_determinant(a: Point, b: Point, c: Point) -> f64 {
    (b - a).cross(c - a)
}

/// Signed area of the triangle `(a, b, c)`.
///
/// # Example
///
/// ```
/// use plasma_mesh::geometry::point::Point;
/// use plasma_mesh::geometry::predicates::signed_area;
///
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(10.0, 0.0);
/// let c = Point::new(0.0, 10.0);
/// assert_eq!(signed_area(a, b, c), 50.0);
/// assert_eq!(signed_area(a, c, b), -50.0);
/// ```
#[inline]
#[must_use]
pub fn signed_area(a: Point, b: Point, c: Point) -> f64 {
    0.5 * orientation_determinant(a, b, c)
}

/// Classify the turn `a → b → c`.
///
/// # Example
///
/// ```
/// use plasma_mesh::geometry::point::Point;
/// use plasma_mesh::geometry::predicates::{orientation, Orientation};
///
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(1.0, 0.0);
/// assert_eq!(orientation(a, b, Point::new(0.0, 1.0)), Orientation::POSITIVE);
/// assert_eq!(orientation(a, b, Point::new(0.0, -1.0)), Orientation::NEGATIVE);
/// assert_eq!(orientation(a, b, Point::new(2.0, 0.0)), Orientation::DEGENERATE);
/// ```
#[must_use]
pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let det = orientation_determinant(a, b, c);
    if det > 0.0 {
        Orientation::POSITIVE
    } else if det < 0.0 {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}

/// The circle through the three vertices of a triangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Circumcircle {
    /// Center of the circle.
    pub center: Point,
    /// Squared radius of the circle.
    pub radius_squared: f64,
}

impl Circumcircle {
    /// Radius of the circle.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius_squared.sqrt()
    }

    /// Returns `true` if `point` lies strictly inside the circle.
    ///
    /// Points exactly on the circle are *not* contained; inputs are assumed
    /// to be in general position.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.center.distance_squared(point) < self.radius_squared
    }

    /// Classify `point` relative to the circle.
    #[must_use]
    pub fn classify(&self, point: Point) -> InCircle {
        let d2 = self.center.distance_squared(point);
        if d2 < self.radius_squared {
            InCircle::INSIDE
        } else if d2 > self.radius_squared {
            InCircle::OUTSIDE
        } else {
            InCircle::BOUNDARY
        }
    }
}

/// Compute the circumcircle of the triangle `(a, b, c)`.
///
/// Uses the standard 2D determinant formula, evaluated in coordinates
/// relative to `a` to limit cancellation when the triangle is far from the
/// origin:
///
/// ```text
/// b' = b - a,  c' = c - a
/// d  = 2 (b'.x c'.y - b'.y c'.x)
/// u  = ((c'.y |b'|² - b'.y |c'|²) / d, (b'.x |c'|² - c'.x |b'|²) / d)
/// center = a + u,  r² = |u|²
/// ```
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateTriangle`] when the denominator `d` is
/// zero (collinear or coincident points), and
/// [`GeometryError::NonFiniteCircumcircle`] when the result overflows.
///
/// # Example
///
/// ```
/// use plasma_mesh::geometry::point::Point;
/// use plasma_mesh::geometry::predicates::circumcircle;
///
/// let circle = circumcircle(
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(0.0, 10.0),
/// )
/// .unwrap();
/// assert_eq!(circle.center, Point::new(5.0, 5.0));
/// assert_eq!(circle.radius_squared, 50.0);
/// ```
pub fn circumcircle(a: Point, b: Point, c: Point) -> Result<Circumcircle, GeometryError> {
    let points = [a, b, c];
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(GeometryError::NonFiniteCircumcircle { points });
    }

    let ab = b - a;
    let ac = c - a;
    let denominator = 2.0 * ab.cross(ac);
    if denominator == 0.0 {
        return Err(GeometryError::DegenerateTriangle { points });
    }

    let ab_sq = ab.norm_squared();
    let ac_sq = ac.norm_squared();
    let offset = Point::new(
        ac.y.mul_add(ab_sq, -(ab.y * ac_sq)) / denominator,
        ab.x.mul_add(ac_sq, -(ac.x * ab_sq)) / denominator,
    );

    let center = a + offset;
    let radius_squared = offset.norm_squared();
    if !center.is_finite() || !radius_squared.is_finite() {
        return Err(GeometryError::NonFiniteCircumcircle { points });
    }

    Ok(Circumcircle {
        center,
        radius_squared,
    })
}
