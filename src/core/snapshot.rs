//! Read-only, serializable export of a mesh.
//!
//! A [`MeshSnapshot`] flattens the arenas into index-based lists: vertex
//! positions and values, and counter-clockwise index triples per triangle.
//! This is the hand-off format for rasterizers and vector writers.

use serde::{Deserialize, Serialize};

use crate::core::collections::{FastHashMap, fast_hash_map_with_capacity};
use crate::core::triangulation::DelaunayTriangulation;
use crate::core::vertex::VertexKey;
use crate::geometry::bounds::BoundingBox;
use crate::geometry::point::Point;

/// One exported vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotVertex {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Scalar payload.
    pub value: f64,
}

impl SnapshotVertex {
    /// Position of the vertex.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Flattened mesh: vertices plus counter-clockwise index triples.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::prelude::*;
///
/// let mut dt = DelaunayTriangulation::new(BoundingBox::from_size(4.0, 2.0).unwrap()).unwrap();
/// dt.insert_point(Point::new(1.0, 1.0)).unwrap();
///
/// let snapshot = dt.snapshot();
/// assert_eq!(snapshot.vertices.len(), 5);
/// assert_eq!(snapshot.triangles.len(), 4);
/// assert_eq!(snapshot.total_area(), 8.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// The bounding rectangle.
    pub bounds: BoundingBox,
    /// Mesh vertices.
    pub vertices: Vec<SnapshotVertex>,
    /// Indices into `vertices`, counter-clockwise.
    pub triangles: Vec<[usize; 3]>,
}

impl MeshSnapshot {
    /// Captures the active vertices and triangles of `dt`.
    ///
    /// Triangles are listed in creation order, so a seeded run always yields
    /// the same snapshot.
    #[must_use]
    pub fn capture(dt: &DelaunayTriangulation) -> Self {
        let mut index: FastHashMap<VertexKey, usize> =
            fast_hash_map_with_capacity(dt.number_of_vertices());
        let mut vertices = Vec::with_capacity(dt.number_of_vertices());

        let mut ordered: Vec<_> = dt.triangles().map(|(_, t)| t).collect();
        ordered.sort_unstable_by_key(|t| t.sequence());

        let mut triangles = Vec::with_capacity(ordered.len());
        for triangle in ordered {
            let mut triple = [0; 3];
            for (slot, key) in triple.iter_mut().zip(triangle.vertices()) {
                *slot = *index.entry(key).or_insert_with(|| {
                    let value = dt.vertex(key).map_or(0.0, |v| v.value());
                    let point = dt.vertex(key).map_or(Point::ORIGIN, |v| v.point());
                    vertices.push(SnapshotVertex {
                        x: point.x,
                        y: point.y,
                        value,
                    });
                    vertices.len() - 1
                });
            }
            triangles.push(triple);
        }

        Self {
            bounds: *dt.bounds(),
            vertices,
            triangles,
        }
    }

    /// Positions of one triangle's corners, or `None` for an out-of-range index.
    #[must_use]
    pub fn triangle_points(&self, triangle: usize) -> Option<[Point; 3]> {
        let [a, b, c] = *self.triangles.get(triangle)?;
        Some([
            self.vertices.get(a)?.point(),
            self.vertices.get(b)?.point(),
            self.vertices.get(c)?.point(),
        ])
    }

    /// Sum of the triangle areas.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        (0..self.triangles.len())
            .filter_map(|i| self.triangle_points(i))
            .map(|[a, b, c]| 0.5 * (b - a).cross(c - a))
            .sum()
    }
}

impl DelaunayTriangulation {
    /// Exports the mesh as a [`MeshSnapshot`].
    #[must_use]
    pub fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_indices_are_counter_clockwise() {
        let mut dt =
            DelaunayTriangulation::new(BoundingBox::from_size(10.0, 10.0).unwrap()).unwrap();
        dt.insert_point(Point::new(3.0, 6.0)).unwrap();
        dt.insert_point(Point::new(7.0, 2.0)).unwrap();

        let snapshot = dt.snapshot();
        assert_eq!(snapshot.triangles.len(), dt.number_of_triangles());
        assert_eq!(snapshot.vertices.len(), dt.number_of_vertices());
        for i in 0..snapshot.triangles.len() {
            let [a, b, c] = snapshot.triangle_points(i).unwrap();
            assert!((b - a).cross(c - a) > 0.0);
        }
        assert!((snapshot.total_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_carries_values() {
        let mut dt =
            DelaunayTriangulation::new(BoundingBox::from_size(10.0, 10.0).unwrap()).unwrap();
        dt.insert_point_with_value(Point::new(5.0, 5.0), 0.9).unwrap();

        let snapshot = dt.snapshot();
        let center = snapshot
            .vertices
            .iter()
            .find(|v| v.point() == Point::new(5.0, 5.0))
            .unwrap();
        assert_eq!(center.value, 0.9);
        assert!(snapshot.triangle_points(99).is_none());
    }
}
