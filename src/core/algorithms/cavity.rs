//! Cavity detection and boundary extraction for Bowyer–Watson insertion.
//!
//! Inserting a point `p` into a Delaunay mesh removes every triangle whose
//! circumcircle strictly contains `p` (the *cavity*) and re-triangulates the
//! hole by connecting `p` to each edge of the cavity boundary (the *star*).
//!
//! Both insertion paths share [`find_cavity`]:
//! - without a hint, every active triangle is tested (batch insertion has no
//!   known containing triangle to start from);
//! - with a hint triangle that contains `p`, the cavity is flood-filled
//!   through edge-neighbors, visiting only triangles whose circumcircle
//!   contains `p`. The conflict region of a point is edge-connected in a
//!   Delaunay mesh, so both strategies find the same set.
//!
//! # References
//!
//! - A. Bowyer, "Computing Dirichlet tessellations", The Computer Journal, 1981.
//! - D. F. Watson, "Computing the n-dimensional Delaunay tessellation with
//!   application to Voronoi polytopes", The Computer Journal, 1981.

use crate::core::collections::{
    BoundaryEdgeBuffer, CavityBuffer, FastHashMap, FastHashSet, fast_hash_set_with_capacity,
};
use crate::core::edge::Edge;
use crate::core::triangle::TriangleKey;
use crate::core::triangulation::DelaunayTriangulation;
use crate::core::vertex::VertexKey;
use crate::geometry::point::Point;

/// Error during cavity detection or boundary extraction.
///
/// Every variant signals a broken mesh invariant or a violated general
/// position assumption; none of them is recoverable by retrying the same
/// insertion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CavityError {
    /// No active triangle's circumcircle contains the point.
    #[error("Empty cavity: no circumcircle contains {point}")]
    EmptyCavity {
        /// The point being inserted.
        point: Point,
    },

    /// The hint triangle does not exist.
    #[error("Invalid cavity hint: triangle {key:?} is not active")]
    InvalidHint {
        /// The invalid triangle key.
        key: TriangleKey,
    },

    /// The hint triangle's circumcircle does not contain the point.
    #[error("Cavity hint {key:?} does not contain {point} in its circumcircle")]
    HintNotInConflict {
        /// The hint triangle key.
        key: TriangleKey,
        /// The point being inserted.
        point: Point,
    },

    /// The boundary edge count does not match the cavity size.
    ///
    /// A cavity of `k` triangles with no interior vertex is a triangulated
    /// polygon with exactly `k + 2` boundary edges.
    #[error(
        "Malformed cavity boundary: {boundary_edges} boundary edges for {cavity_triangles} cavity triangles (expected {})",
        cavity_triangles + 2
    )]
    MalformedBoundary {
        /// Number of boundary edges found.
        boundary_edges: usize,
        /// Number of triangles in the cavity.
        cavity_triangles: usize,
    },

    /// The boundary edges do not form a single closed loop.
    #[error("Cavity boundary is not a closed loop at vertex {vertex:?}")]
    BoundaryNotClosed {
        /// A vertex whose in/out boundary degree is not 1/1.
        vertex: VertexKey,
    },

    /// The point cannot see a boundary edge from inside the cavity.
    #[error("Cavity is not star-shaped from {point}: boundary edge {edge:?} faces away")]
    NotStarShaped {
        /// The point being inserted.
        point: Point,
        /// The offending boundary edge, as directed in its cavity triangle.
        edge: (VertexKey, VertexKey),
    },
}

/// Find all active triangles whose circumcircle strictly contains `point`.
///
/// With `hint == None` every active triangle is tested. With
/// `hint == Some(start)` the search flood-fills from `start` through
/// edge-neighbors and only expands triangles that are themselves in conflict.
///
/// The returned keys are ordered by triangle creation sequence, so the result
/// does not depend on the traversal strategy.
///
/// # Errors
///
/// - [`CavityError::InvalidHint`] if `start` is not an active triangle.
/// - [`CavityError::HintNotInConflict`] if `start`'s circumcircle does not
///   contain `point`.
/// - [`CavityError::EmptyCavity`] if no circumcircle contains `point`.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::algorithms::cavity::{extract_cavity_boundary, find_cavity};
/// use plasma_mesh::prelude::*;
///
/// let dt = DelaunayTriangulation::new(BoundingBox::from_size(10.0, 10.0).unwrap()).unwrap();
/// let p = Point::new(5.0, 5.0);
///
/// let scanned = find_cavity(&dt, p, None).unwrap();
/// let (start, _) = dt.largest().unwrap();
/// let flooded = find_cavity(&dt, p, Some(start)).unwrap();
/// assert_eq!(scanned, flooded);
///
/// // Both seed triangles are in conflict; their shared diagonal cancels out.
/// let boundary = extract_cavity_boundary(&dt, &scanned).unwrap();
/// assert_eq!(boundary.len(), 4);
/// ```
pub fn find_cavity(
    dt: &DelaunayTriangulation,
    point: Point,
    hint: Option<TriangleKey>,
) -> Result<CavityBuffer, CavityError> {
    let mut cavity = match hint {
        None => dt
            .triangles()
            .filter(|(_, triangle)| triangle.circumcircle_contains(point))
            .map(|(key, _)| key)
            .collect::<CavityBuffer>(),
        Some(start) => flood_fill_cavity(dt, point, start)?,
    };

    if cavity.is_empty() {
        return Err(CavityError::EmptyCavity { point });
    }

    cavity.sort_unstable_by_key(|&key| dt.triangle(key).map(|t| t.sequence()));
    Ok(cavity)
}

/// Depth-first flood fill over edge-neighbors, starting at `start`.
fn flood_fill_cavity(
    dt: &DelaunayTriangulation,
    point: Point,
    start: TriangleKey,
) -> Result<CavityBuffer, CavityError> {
    let start_triangle = dt
        .triangle(start)
        .ok_or(CavityError::InvalidHint { key: start })?;
    if !start_triangle.circumcircle_contains(point) {
        return Err(CavityError::HintNotInConflict { key: start, point });
    }

    let mut cavity = CavityBuffer::new();
    let mut stack = CavityBuffer::new();
    let mut visited: FastHashSet<TriangleKey> = fast_hash_set_with_capacity(32);
    stack.push(start);
    visited.insert(start);

    while let Some(key) = stack.pop() {
        let Some(triangle) = dt.triangle(key) else {
            continue;
        };
        if !triangle.circumcircle_contains(point) {
            continue;
        }
        cavity.push(key);

        for neighbor in dt.neighbors_sharing_edge(key).unwrap_or_default() {
            if visited.insert(neighbor) {
                stack.push(neighbor);
            }
        }
    }

    Ok(cavity)
}

/// Edges belonging to exactly one triangle of `triangles`.
///
/// Each triangle's three edges are toggled in a working set: an edge shared
/// by two of the triangles is inserted and then removed again, so only edges
/// belonging to exactly one triangle survive. Surviving edges keep the
/// counter-clockwise direction they have in their triangle, which means the
/// region lies to their left.
///
/// No shape check is made; see [`extract_cavity_boundary`]. The result is
/// sorted by the canonical [`Edge`] order.
#[must_use]
pub fn toggle_cavity_edges(
    dt: &DelaunayTriangulation,
    triangles: &[TriangleKey],
) -> BoundaryEdgeBuffer {
    let tolerance = dt.edge_tolerance();
    let mut open_edges: FastHashSet<Edge> = fast_hash_set_with_capacity(triangles.len() * 3);

    for triangle in triangles.iter().filter_map(|&key| dt.triangle(key)) {
        for edge in triangle.edges(tolerance) {
            if !open_edges.remove(&edge) {
                open_edges.insert(edge);
            }
        }
    }

    let mut boundary: BoundaryEdgeBuffer = open_edges.into_iter().collect();
    boundary.sort_unstable();
    boundary
}

/// Extract the boundary edges of a cavity.
///
/// The edges come from [`toggle_cavity_edges`]. A Bowyer–Watson cavity is a
/// topological disk, which is checked before the boundary is returned.
///
/// # Errors
///
/// - [`CavityError::MalformedBoundary`] unless there are exactly
///   `cavity.len() + 2` boundary edges.
/// - [`CavityError::BoundaryNotClosed`] unless every boundary vertex has
///   exactly one incoming and one outgoing boundary edge.
pub fn extract_cavity_boundary(
    dt: &DelaunayTriangulation,
    cavity: &[TriangleKey],
) -> Result<BoundaryEdgeBuffer, CavityError> {
    let boundary = toggle_cavity_edges(dt, cavity);

    if boundary.is_empty() || boundary.len() != cavity.len() + 2 {
        return Err(CavityError::MalformedBoundary {
            boundary_edges: boundary.len(),
            cavity_triangles: cavity.len(),
        });
    }

    let mut degrees: FastHashMap<VertexKey, (u32, u32)> = FastHashMap::default();
    for edge in &boundary {
        let (from, to) = edge.directed();
        degrees.entry(from).or_default().1 += 1;
        degrees.entry(to).or_default().0 += 1;
    }
    if let Some((&vertex, _)) = degrees.iter().find(|(_, degree)| **degree != (1, 1)) {
        return Err(CavityError::BoundaryNotClosed { vertex });
    }

    Ok(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bounds::BoundingBox;

    fn square(size: f64) -> DelaunayTriangulation {
        DelaunayTriangulation::new(BoundingBox::from_size(size, size).unwrap()).unwrap()
    }

    #[test]
    fn scan_and_flood_fill_agree() {
        let mut dt = square(10.0);
        for p in [
            Point::new(2.0, 3.0),
            Point::new(7.0, 1.5),
            Point::new(4.5, 8.0),
            Point::new(8.5, 6.5),
            Point::new(1.2, 9.1),
        ] {
            dt.insert_point(p).unwrap();
        }

        let query = Point::new(5.5, 4.25);
        let scanned = find_cavity(&dt, query, None).unwrap();
        let containing = dt
            .triangles()
            .find(|(_, t)| t.contains_point(query))
            .map(|(key, _)| key)
            .unwrap();
        let flooded = find_cavity(&dt, query, Some(containing)).unwrap();

        assert_eq!(scanned, flooded);
        assert!(scanned.contains(&containing));
    }

    #[test]
    fn hint_must_be_in_conflict() {
        let mut dt = square(10.0);
        dt.insert_point(Point::new(5.0, 5.0)).unwrap();

        let query = Point::new(5.0, 1.0);
        let far = dt
            .triangles()
            .find(|(_, t)| !t.circumcircle_contains(query))
            .map(|(key, _)| key)
            .unwrap();

        assert!(matches!(
            find_cavity(&dt, query, Some(far)),
            Err(CavityError::HintNotInConflict { .. })
        ));
    }

    #[test]
    fn point_outside_every_circumcircle_yields_empty_cavity() {
        let dt = square(10.0);
        assert!(matches!(
            find_cavity(&dt, Point::new(100.0, 100.0), None),
            Err(CavityError::EmptyCavity { .. })
        ));
    }

    #[test]
    fn single_triangle_boundary_is_its_three_edges() {
        let mut dt = square(10.0);
        dt.insert_point(Point::new(5.0, 5.0)).unwrap();
        let (key, triangle) = dt.triangles().next().unwrap();
        let expected: FastHashSet<Edge> = triangle
            .edges(dt.edge_tolerance())
            .into_iter()
            .collect();

        let boundary = extract_cavity_boundary(&dt, &[key]).unwrap();
        assert_eq!(boundary.len(), 3);
        assert!(boundary.iter().all(|edge| expected.contains(edge)));
    }

    #[test]
    fn shared_edges_cancel_out() {
        let mut dt = square(10.0);
        dt.insert_point(Point::new(5.0, 5.0)).unwrap();
        let center = dt
            .vertices()
            .find(|(_, v)| v.point() == Point::new(5.0, 5.0))
            .map(|(key, _)| key)
            .unwrap();

        // All four star triangles: only the outer square survives toggling.
        let all: Vec<_> = dt.triangles().map(|(key, _)| key).collect();
        let edges = toggle_cavity_edges(&dt, &all);
        assert_eq!(edges.len(), 4);
        assert!(edges.iter().all(|edge| !edge.has_vertex(center)));

        // The star is not a disk cavity: it has an interior vertex.
        assert!(matches!(
            extract_cavity_boundary(&dt, &all),
            Err(CavityError::MalformedBoundary {
                boundary_edges: 4,
                cavity_triangles: 4
            })
        ));
    }

    #[test]
    fn adjacent_pair_boundary_is_a_quadrilateral() {
        let mut dt = square(10.0);
        dt.insert_point(Point::new(5.0, 5.0)).unwrap();
        let (first, triangle) = dt.triangles().next().unwrap();
        let second = dt
            .triangles()
            .find(|(_, t)| t.shares_edge_with(triangle))
            .map(|(key, _)| key)
            .unwrap();
        let shared: Vec<_> = triangle
            .vertices()
            .into_iter()
            .filter(|&v| dt.triangle(second).unwrap().has_vertex(v))
            .collect();

        let boundary = extract_cavity_boundary(&dt, &[first, second]).unwrap();
        assert_eq!(boundary.len(), 4);
        assert!(
            boundary
                .iter()
                .all(|edge| !(edge.has_vertex(shared[0]) && edge.has_vertex(shared[1])))
        );
    }

    #[test]
    fn tiny_domain_boundary_keeps_distinct_vertices() {
        let mut dt = square(1e-4);
        dt.insert_point(Point::new(5e-5, 3e-5)).unwrap();
        let query = Point::new(2.5e-5, 6e-5);

        let cavity = find_cavity(&dt, query, None).unwrap();
        let boundary = extract_cavity_boundary(&dt, &cavity).unwrap();
        assert_eq!(boundary.len(), cavity.len() + 2);
    }

    #[test]
    fn non_disk_cavity_is_rejected() {
        let mut dt = square(10.0);
        dt.insert_point(Point::new(5.0, 5.0)).unwrap();
        let center = dt
            .vertices()
            .find(|(_, v)| v.point() == Point::new(5.0, 5.0))
            .map(|(key, _)| key)
            .unwrap();

        // Two opposite star triangles only touch at the center vertex.
        let mut opposite = Vec::new();
        for (key, t) in dt.triangles() {
            if opposite
                .iter()
                .all(|&k| dt.triangle(k).unwrap().shared_vertex_count(t) == 1)
            {
                opposite.push(key);
            }
        }
        assert_eq!(opposite.len(), 2);
        assert!(dt.vertex(center).is_some());

        let result = extract_cavity_boundary(&dt, &opposite);
        assert!(matches!(
            result,
            Err(CavityError::MalformedBoundary { .. } | CavityError::BoundaryNotClosed { .. })
        ));
    }
}
