//! Mesh vertices.
//!
//! A [`Vertex`] is a point in the plane plus an opaque scalar payload
//! (`value`). Vertices are owned by the triangulation's vertex arena and
//! addressed by [`VertexKey`]; triangles refer to them by key and never own
//! them.
//!
//! Each vertex keeps a back-index of the triangles that reference it. The
//! index is maintained exclusively by the triangulation engine, in the same
//! step that creates or removes a triangle, so it always equals the set of
//! active triangles incident to the vertex.
//!
//! Vertices have identity, not structural equality: two vertices at the same
//! position are still different vertices. Compare keys, not vertices.

use slotmap::new_key_type;

use crate::core::collections::IncidentTriangleSet;
use crate::core::triangle::TriangleKey;
use crate::geometry::point::Point;

new_key_type! {
    /// Key type for accessing vertices in the triangulation's vertex arena.
    ///
    /// Keys are stable for the lifetime of the triangulation: vertices are
    /// never removed once inserted.
    pub struct VertexKey;
}

/// A mesh vertex: immutable position, mutable scalar payload.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::prelude::*;
///
/// let mut dt = DelaunayTriangulation::new(BoundingBox::from_size(10.0, 10.0).unwrap()).unwrap();
/// let outcome = dt.insert_point(Point::new(5.0, 5.0)).unwrap();
/// let key = outcome.vertex_key();
///
/// dt.set_vertex_value(key, 0.75).unwrap();
/// let vertex = dt.vertex(key).unwrap();
/// assert_eq!(vertex.point(), Point::new(5.0, 5.0));
/// assert_eq!(vertex.value(), 0.75);
/// assert_eq!(vertex.degree(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct Vertex {
    point: Point,
    /// Opaque scalar payload; geometry never reads it.
    value: f64,
    /// Active triangles that reference this vertex.
    incident_triangles: IncidentTriangleSet,
}

impl Vertex {
    /// Creates an isolated vertex with the given payload.
    pub(crate) fn new(point: Point, value: f64) -> Self {
        Self {
            point,
            value,
            incident_triangles: IncidentTriangleSet::default(),
        }
    }

    /// Position of the vertex.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// Horizontal coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.point.x
    }

    /// Vertical coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.point.y
    }

    /// Scalar payload.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Replaces the scalar payload.
    #[inline]
    pub const fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Keys of the active triangles incident to this vertex.
    #[must_use]
    pub const fn incident_triangles(&self) -> &IncidentTriangleSet {
        &self.incident_triangles
    }

    /// Number of active triangles incident to this vertex.
    #[inline]
    #[must_use]
    pub fn degree(&self) -> usize {
        self.incident_triangles.len()
    }

    /// Returns `true` if no active triangle references this vertex.
    #[inline]
    #[must_use]
    pub fn is_isolated(&self) -> bool {
        self.incident_triangles.is_empty()
    }

    pub(crate) fn attach(&mut self, triangle: TriangleKey) -> bool {
        self.incident_triangles.insert(triangle)
    }

    pub(crate) fn detach(&mut self, triangle: TriangleKey) -> bool {
        self.incident_triangles.remove(&triangle)
    }
}
