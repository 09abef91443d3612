//! Axis-aligned bounding rectangle of a mesh.

use serde::{Deserialize, Serialize};

use crate::geometry::point::Point;

/// Error returned when a bounding box cannot be constructed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("Invalid bounding box {min} - {max}: extents must be finite and strictly positive")]
pub struct BoundingBoxError {
    /// Requested lower-left corner.
    pub min: Point,
    /// Requested upper-right corner.
    pub max: Point,
}

/// Closed axis-aligned rectangle `[min.x, max.x] × [min.y, max.y]`.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::geometry::bounds::BoundingBox;
/// use plasma_mesh::geometry::point::Point;
///
/// let bounds = BoundingBox::from_size(512.0, 256.0).unwrap();
/// assert_eq!(bounds.area(), 131_072.0);
/// assert!(bounds.contains_strictly(Point::new(10.0, 10.0)));
/// assert!(!bounds.contains_strictly(Point::new(0.0, 10.0)));
/// assert!(bounds.contains(Point::new(0.0, 10.0)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    min: Point,
    max: Point,
}

impl BoundingBox {
    /// Creates a bounding box from two opposite corners.
    ///
    /// # Errors
    ///
    /// Returns [`BoundingBoxError`] if any coordinate is non-finite or the
    /// rectangle has zero or negative width or height.
    pub fn new(min: Point, max: Point) -> Result<Self, BoundingBoxError> {
        if !min.is_finite() || !max.is_finite() || max.x <= min.x || max.y <= min.y {
            return Err(BoundingBoxError { min, max });
        }
        Ok(Self { min, max })
    }

    /// Creates the rectangle `[0, width] × [0, height]`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundingBoxError`] if `width` or `height` is not a finite
    /// positive number.
    pub fn from_size(width: f64, height: f64) -> Result<Self, BoundingBoxError> {
        Self::new(Point::ORIGIN, Point::new(width, height))
    }

    /// Lower-left corner.
    #[inline]
    #[must_use]
    pub const fn min(&self) -> Point {
        self.min
    }

    /// Upper-right corner.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> Point {
        self.max
    }

    /// Horizontal extent.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Area of the rectangle.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// The four corners in the order `(min.x, min.y)`, `(min.x, max.y)`,
    /// `(max.x, max.y)`, `(max.x, min.y)`.
    #[must_use]
    pub const fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Point::new(self.min.x, self.max.y),
            self.max,
            Point::new(self.max.x, self.min.y),
        ]
    }

    /// Returns `true` if `point` lies in the closed rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Returns `true` if `point` lies in the open interior of the rectangle.
    #[must_use]
    pub fn contains_strictly(&self, point: Point) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_non_finite_boxes() {
        assert!(BoundingBox::from_size(0.0, 10.0).is_err());
        assert!(BoundingBox::from_size(10.0, -1.0).is_err());
        assert!(BoundingBox::from_size(f64::NAN, 10.0).is_err());
        assert!(BoundingBox::from_size(f64::INFINITY, 10.0).is_err());
    }

    #[test]
    fn corners_and_extent() {
        let bounds = BoundingBox::new(Point::new(-1.0, 2.0), Point::new(3.0, 5.0)).unwrap();
        assert_eq!(bounds.width(), 4.0);
        assert_eq!(bounds.height(), 3.0);
        assert_eq!(bounds.area(), 12.0);
        assert_eq!(
            bounds.corners(),
            [
                Point::new(-1.0, 2.0),
                Point::new(-1.0, 5.0),
                Point::new(3.0, 5.0),
                Point::new(3.0, 2.0),
            ]
        );
    }

    #[test]
    fn containment_distinguishes_border() {
        let bounds = BoundingBox::from_size(10.0, 10.0).unwrap();
        let border = Point::new(10.0, 3.0);
        assert!(bounds.contains(border));
        assert!(!bounds.contains_strictly(border));
        assert!(!bounds.contains(Point::new(10.5, 3.0)));
        assert!(!bounds.contains(Point::new(f64::NAN, 3.0)));
    }
}
