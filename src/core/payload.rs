//! Stock payload helpers for refinement consumers.
//!
//! The engine never reads vertex values. These helpers cover the common
//! cases: deriving a new vertex's value from its parent triangle, and
//! rescaling the final values to `[0, 1]` before shading.

use crate::core::algorithms::refinement::{PayloadAssigner, SubdivisionContext};
use crate::core::triangulation::DelaunayTriangulation;
use crate::geometry::point::Point;

/// Blends three vertex values with weights proportional to each vertex's
/// distance from `point`.
///
/// Farther vertices get the larger weight. If `point` coincides with all
/// three vertices (total distance zero) the plain mean is returned.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::payload::interpolate_by_distance;
/// use plasma_mesh::geometry::point::Point;
///
/// let points = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)];
/// // Equidistant from the last two vertices, on top of the first.
/// let value = interpolate_by_distance(Point::new(0.0, 0.0), points, [1.0, 0.0, 2.0]);
/// assert_eq!(value, 1.0);
/// ```
#[must_use]
pub fn interpolate_by_distance(point: Point, points: [Point; 3], values: [f64; 3]) -> f64 {
    let distances = points.map(|p| p.distance(point));
    let total: f64 = distances.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return values.iter().sum::<f64>() / 3.0;
    }
    distances
        .iter()
        .zip(values)
        .map(|(d, v)| v * (d / total))
        .sum()
}

/// Rescales all vertex values linearly onto `[0, 1]`.
///
/// Returns the `(min, max)` range before rescaling, or `None` for a mesh
/// without vertices. A zero range leaves the values unchanged.
pub fn normalize_values(dt: &mut DelaunayTriangulation) -> Option<(f64, f64)> {
    let (min, max) = dt
        .vertices()
        .map(|(_, v)| v.value())
        .fold(None, |range: Option<(f64, f64)>, value| {
            Some(range.map_or((value, value), |(lo, hi)| (lo.min(value), hi.max(value))))
        })?;

    let span = max - min;
    if span > 0.0 && span.is_finite() {
        dt.map_vertex_values(|_, v| (v.value() - min) / span);
    }
    tracing::debug!(min, max, "normalized vertex values");
    Some((min, max))
}

/// Assigns the same value to every vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConstantPayload(pub f64);

impl PayloadAssigner for ConstantPayload {
    fn seed_value(&mut self, _point: Point) -> f64 {
        self.0
    }

    fn subdivision_value(&mut self, _context: &SubdivisionContext) -> f64 {
        self.0
    }
}

/// Seeds every vertex with a fixed value and interpolates new vertices from
/// their parent with [`interpolate_by_distance`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceInterpolation {
    /// Value given to every vertex present after seeding.
    pub seed: f64,
}

impl Default for DistanceInterpolation {
    fn default() -> Self {
        Self { seed: 0.5 }
    }
}

impl PayloadAssigner for DistanceInterpolation {
    fn seed_value(&mut self, _point: Point) -> f64 {
        self.seed
    }

    fn subdivision_value(&mut self, context: &SubdivisionContext) -> f64 {
        interpolate_by_distance(context.point, context.parent_points, context.parent_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bounds::BoundingBox;
    use approx::assert_relative_eq;

    #[test]
    fn interpolation_weights_by_distance() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(0.0, 4.0),
        ];
        // Distances 0, 3, 4 from the first vertex.
        let value = interpolate_by_distance(points[0], points, [10.0, 7.0, 14.0]);
        assert_relative_eq!(value, 11.0, epsilon = 1e-12);
    }

    #[test]
    fn interpolation_of_constant_values_is_constant() {
        let points = [
            Point::new(1.0, 1.0),
            Point::new(9.0, 2.0),
            Point::new(4.0, 8.0),
        ];
        let value = interpolate_by_distance(Point::new(4.0, 3.0), points, [0.25; 3]);
        assert_relative_eq!(value, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn collapsed_triangle_falls_back_to_mean() {
        let p = Point::new(2.0, 2.0);
        assert_relative_eq!(interpolate_by_distance(p, [p; 3], [1.0, 2.0, 6.0]), 3.0);
    }

    #[test]
    fn normalization_maps_range_onto_unit_interval() {
        let mut dt =
            DelaunayTriangulation::new(BoundingBox::from_size(10.0, 10.0).unwrap()).unwrap();
        dt.insert_point_with_value(Point::new(5.0, 5.0), 4.0).unwrap();
        dt.insert_point_with_value(Point::new(2.0, 7.0), -2.0).unwrap();

        assert_eq!(normalize_values(&mut dt), Some((-2.0, 4.0)));

        let mut values: Vec<f64> = dt.vertices().map(|(_, v)| v.value()).collect();
        values.sort_by(f64::total_cmp);
        assert_relative_eq!(values[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(*values.last().unwrap(), 1.0, epsilon = 1e-12);
        assert!(values.iter().any(|&v| (v - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn normalization_of_flat_values_is_identity() {
        let mut dt =
            DelaunayTriangulation::new(BoundingBox::from_size(10.0, 10.0).unwrap()).unwrap();
        dt.map_vertex_values(|_, _| 0.7);
        assert_eq!(normalize_values(&mut dt), Some((0.7, 0.7)));
        assert!(dt.vertices().all(|(_, v)| v.value() == 0.7));
    }

    #[test]
    fn stock_assigners() {
        let context = SubdivisionContext {
            point: Point::new(1.0, 1.0),
            parent_points: [
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(0.0, 4.0),
            ],
            parent_values: [0.2, 0.2, 0.2],
            parent_area: 8.0,
            base_area: 8.0,
            iteration: 0,
        };

        let mut constant = ConstantPayload(0.3);
        assert_eq!(constant.seed_value(Point::ORIGIN), 0.3);
        assert_eq!(constant.subdivision_value(&context), 0.3);

        let mut interpolation = DistanceInterpolation::default();
        assert_eq!(interpolation.seed_value(Point::ORIGIN), 0.5);
        assert_relative_eq!(interpolation.subdivision_value(&context), 0.2, epsilon = 1e-12);
    }
}
