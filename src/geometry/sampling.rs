//! Uniform random sampling inside triangles.
//!
//! Uses the square-root parameterisation from Osada et al., "Shape
//! Distributions" (ACM TOG 2002, §4.2):
//!
//! ```text
//! P = (1 − √r₁)·A + √r₁·(1 − r₂)·B + √r₁·r₂·C,   r₁, r₂ ~ U[0, 1)
//! ```
//!
//! which is uniform over the triangle for any non-degenerate `A, B, C`.

use rand::Rng;

use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation};

/// Number of draws [`sample_triangle_interior`] attempts before giving up.
///
/// A draw only lands on the closed boundary when `r₁ == 0` or rounding
/// collapses it onto an edge, so this is never reached for triangles that
/// are not razor-thin.
pub const MAX_INTERIOR_SAMPLE_ATTEMPTS: usize = 64;

/// Draw one point from the closed triangle `(a, b, c)` using the
/// square-root barycentric formula.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::geometry::point::Point;
/// use plasma_mesh::geometry::sampling::sample_triangle;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let p = sample_triangle(
///     Point::new(0.0, 0.0),
///     Point::new(10.0, 0.0),
///     Point::new(0.0, 10.0),
///     &mut rng,
/// );
/// assert!(p.x >= 0.0 && p.y >= 0.0 && p.x + p.y <= 10.0);
/// ```
pub fn sample_triangle<R: Rng + ?Sized>(a: Point, b: Point, c: Point, rng: &mut R) -> Point {
    let r1: f64 = rng.random();
    let r2: f64 = rng.random();
    let root_r1 = r1.sqrt();
    a * (1.0 - root_r1) + b * (root_r1 * (1.0 - r2)) + c * (root_r1 * r2)
}

/// Returns `true` if `p` lies strictly inside the counter-clockwise triangle
/// `(a, b, c)`.
#[must_use]
pub fn strictly_inside_ccw(a: Point, b: Point, c: Point, p: Point) -> bool {
    orientation(a, b, p) == Orientation::POSITIVE
        && orientation(b, c, p) == Orientation::POSITIVE
        && orientation(c, a, p) == Orientation::POSITIVE
}

/// Draw a point from the open interior of the counter-clockwise triangle
/// `(a, b, c)`.
///
/// Draws that land on the boundary are rejected and redrawn, which keeps the
/// distribution uniform. Returns `None` if no interior point was found after
/// [`MAX_INTERIOR_SAMPLE_ATTEMPTS`] draws.
pub fn sample_triangle_interior<R: Rng + ?Sized>(
    a: Point,
    b: Point,
    c: Point,
    rng: &mut R,
) -> Option<Point> {
    (0..MAX_INTERIOR_SAMPLE_ATTEMPTS)
        .map(|_| sample_triangle(a, b, c, rng))
        .find(|&p| strictly_inside_ccw(a, b, c, p))
}
