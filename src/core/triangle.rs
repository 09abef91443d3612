//! Triangles of the mesh.
//!
//! A [`Triangle`] holds three vertex keys in counter-clockwise order together
//! with cached geometry: the vertex positions, the (positive) area, and the
//! circumcircle. Vertex positions never change once inserted, so the cache
//! stays valid for the triangle's lifetime.
//!
//! Construction here is purely geometric. Registering the triangle in its
//! vertices' incidence sets is done by the triangulation engine in the same
//! step that stores the triangle (see
//! [`DelaunayTriangulation`](crate::core::triangulation::DelaunayTriangulation)),
//! so the two can never be observed out of sync.

use rand::Rng;
use slotmap::new_key_type;

use crate::core::edge::{Edge, EdgeEndpoint, EdgeTolerance};
use crate::core::vertex::VertexKey;
use crate::geometry::point::Point;
use crate::geometry::predicates::{
    Circumcircle, GeometryError, circumcircle, orientation_determinant,
};
use crate::geometry::sampling::{sample_triangle_interior, strictly_inside_ccw};

new_key_type! {
    /// Key type for accessing triangles in the triangulation's triangle arena.
    ///
    /// Keys of removed triangles are never reused for a different triangle
    /// while the old key could still be observed (slotmap versioning).
    pub struct TriangleKey;
}

/// A counter-clockwise triangle with cached area and circumcircle.
#[derive(Clone, Debug)]
pub struct Triangle {
    vertices: [VertexKey; 3],
    points: [Point; 3],
    area: f64,
    circumcircle: Circumcircle,
    /// Creation order within the owning triangulation; unique per triangle.
    sequence: u64,
}

impl Triangle {
    /// Builds a triangle from three vertices, reordering them to
    /// counter-clockwise winding if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::DegenerateTriangle`] if the points are
    /// collinear (or coincident), and [`GeometryError::NonFiniteCircumcircle`]
    /// if the circumcircle cannot be represented.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use plasma_mesh::core::triangle::Triangle;
    /// use plasma_mesh::core::vertex::VertexKey;
    /// use plasma_mesh::geometry::point::Point;
    /// use slotmap::SlotMap;
    ///
    /// let mut keys: SlotMap<VertexKey, ()> = SlotMap::with_key();
    /// let (a, b, c) = (keys.insert(()), keys.insert(()), keys.insert(()));
    ///
    /// // Clockwise input is reordered to counter-clockwise.
    /// let points = [Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 0.0)];
    /// let triangle = Triangle::new([a, b, c], points, 0).unwrap();
    /// assert_eq!(triangle.vertices(), [a, c, b]);
    /// assert_eq!(triangle.area(), 50.0);
    /// ```
    pub fn new(
        vertices: [VertexKey; 3],
        points: [Point; 3],
        sequence: u64,
    ) -> Result<Self, GeometryError> {
        let [a, b, c] = points;
        let det = orientation_determinant(a, b, c);
        let (vertices, points) = if det > 0.0 {
            (vertices, points)
        } else if det < 0.0 {
            ([vertices[0], vertices[2], vertices[1]], [a, c, b])
        } else {
            return Err(GeometryError::DegenerateTriangle { points });
        };

        let circle = circumcircle(points[0], points[1], points[2])?;

        Ok(Self {
            vertices,
            points,
            area: 0.5 * det.abs(),
            circumcircle: circle,
            sequence,
        })
    }

    /// Vertex keys in counter-clockwise order.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> [VertexKey; 3] {
        self.vertices
    }

    /// Vertex positions in counter-clockwise order.
    #[inline]
    #[must_use]
    pub const fn points(&self) -> [Point; 3] {
        self.points
    }

    /// Positive area.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> f64 {
        self.area
    }

    /// Circumcircle of the triangle.
    #[inline]
    #[must_use]
    pub const fn circumcircle(&self) -> &Circumcircle {
        &self.circumcircle
    }

    /// Center of the circumcircle.
    #[inline]
    #[must_use]
    pub const fn circumcenter(&self) -> Point {
        self.circumcircle.center
    }

    /// Squared radius of the circumcircle.
    #[inline]
    #[must_use]
    pub const fn radius_squared(&self) -> f64 {
        self.circumcircle.radius_squared
    }

    /// Creation sequence number, unique within the owning triangulation.
    #[inline]
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns `true` if `point` lies strictly inside the circumcircle.
    ///
    /// Points exactly on the circle are excluded.
    #[inline]
    #[must_use]
    pub fn circumcircle_contains(&self, point: Point) -> bool {
        self.circumcircle.contains(point)
    }

    /// Returns `true` if `point` lies strictly inside the triangle.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        let [a, b, c] = self.points;
        strictly_inside_ccw(a, b, c, point)
    }

    /// Centroid of the triangle.
    #[must_use]
    pub fn centroid(&self) -> Point {
        let [a, b, c] = self.points;
        (a + b + c) / 3.0
    }

    /// Returns `true` if `key` is one of the three vertices.
    #[inline]
    #[must_use]
    pub fn has_vertex(&self, key: VertexKey) -> bool {
        self.vertices.contains(&key)
    }

    /// Number of vertices this triangle shares with `other`.
    #[must_use]
    pub fn shared_vertex_count(&self, other: &Self) -> usize {
        self.vertices
            .iter()
            .filter(|&&key| other.has_vertex(key))
            .count()
    }

    /// Returns `true` if the two triangles share exactly one edge.
    #[inline]
    #[must_use]
    pub fn shares_edge_with(&self, other: &Self) -> bool {
        self.shared_vertex_count(other) == 2
    }

    /// The three edges, each directed along the counter-clockwise boundary
    /// (`v0 → v1`, `v1 → v2`, `v2 → v0`).
    #[must_use]
    pub fn edges(&self, tolerance: EdgeTolerance) -> [Edge; 3] {
        let endpoint = |i: usize| EdgeEndpoint::new(self.vertices[i], self.points[i]);
        [
            Edge::new(endpoint(0), endpoint(1), tolerance),
            Edge::new(endpoint(1), endpoint(2), tolerance),
            Edge::new(endpoint(2), endpoint(0), tolerance),
        ]
    }

    /// Draws a uniformly distributed point from the open interior.
    ///
    /// Returns `None` only for triangles so thin that repeated draws keep
    /// landing on the boundary.
    pub fn sample_interior_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Point> {
        let [a, b, c] = self.points;
        sample_triangle_interior(a, b, c, rng)
    }
}
