//! Canonical undirected edges for cavity-boundary bookkeeping.
//!
//! Edges are not stored in the mesh; they are built transiently while the
//! boundary of an insertion cavity is extracted. An [`Edge`] identifies an
//! undirected vertex pair such that `Edge::new(a, b) == Edge::new(b, a)`.
//!
//! ## Identity and tolerance
//!
//! Two edges are equal exactly when they join the same pair of vertex keys.
//! Distinct vertices are never merged, however close they are.
//!
//! Hashing and endpoint ordering use one quantization of the endpoint
//! coordinates: each coordinate `c` maps to the integer cell `round(c / ε)`,
//! with `ε` an [`EdgeTolerance`]. Sub-`ε` jitter therefore never changes an
//! edge's hash or canonical orientation. Within one triangulation a key
//! always carries the same position, so equal edges always hash equally.
//!
//! The engine scales the configured tolerance by the larger side of its
//! bounding rectangle ([`EdgeTolerance::scaled_to`]), so the same setting
//! works for pixel-sized and unit-sized domains. The default relative `ε` is
//! [`DEFAULT_EDGE_EPSILON`].
//!
//! Endpoints are ordered by the strict lexicographic order of their cells
//! (x first, then y), then by raw coordinates, then by key, which is a valid
//! total order.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::core::vertex::VertexKey;
use crate::geometry::bounds::BoundingBox;
use crate::geometry::point::Point;

/// Default edge quantization tolerance, relative to the larger side of the
/// bounding rectangle.
pub const DEFAULT_EDGE_EPSILON: f64 = 5e-4;

/// Error returned for an unusable edge tolerance.
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
#[error("Edge tolerance must be finite and strictly positive, got {epsilon}")]
pub struct EdgeToleranceError {
    /// The rejected tolerance.
    pub epsilon: f64,
}

/// Coordinate quantization step used for edge hashing and ordering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct EdgeTolerance(f64);

impl EdgeTolerance {
    /// Creates a tolerance.
    ///
    /// # Errors
    ///
    /// Returns [`EdgeToleranceError`] unless `epsilon` is finite and positive.
    pub fn new(epsilon: f64) -> Result<Self, EdgeToleranceError> {
        if epsilon.is_finite() && epsilon > 0.0 {
            Ok(Self(epsilon))
        } else {
            Err(EdgeToleranceError { epsilon })
        }
    }

    /// The quantization step.
    #[inline]
    #[must_use]
    pub const fn epsilon(self) -> f64 {
        self.0
    }

    /// Converts a relative tolerance into an absolute one for `bounds`.
    ///
    /// The result is `ε · max(width, height)`. If that product is not a
    /// usable tolerance (overflow), `self` is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use plasma_mesh::core::edge::EdgeTolerance;
    /// use plasma_mesh::geometry::bounds::BoundingBox;
    ///
    /// let relative = EdgeTolerance::new(1e-3).unwrap();
    /// let bounds = BoundingBox::from_size(200.0, 50.0).unwrap();
    /// assert_eq!(relative.scaled_to(&bounds).epsilon(), 0.2);
    /// ```
    #[must_use]
    pub fn scaled_to(self, bounds: &BoundingBox) -> Self {
        Self::new(self.0 * bounds.width().max(bounds.height())).unwrap_or(self)
    }

    /// Maps a point onto its integer quantization cell.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "saturating conversion is acceptable for cells beyond i64 range"
    )]
    pub fn quantize(self, point: Point) -> (i64, i64) {
        (
            (point.x / self.0).round() as i64,
            (point.y / self.0).round() as i64,
        )
    }
}

impl Default for EdgeTolerance {
    fn default() -> Self {
        Self(DEFAULT_EDGE_EPSILON)
    }
}

impl TryFrom<f64> for EdgeTolerance {
    type Error = EdgeToleranceError;

    fn try_from(epsilon: f64) -> Result<Self, Self::Error> {
        Self::new(epsilon)
    }
}

impl From<EdgeTolerance> for f64 {
    fn from(tolerance: EdgeTolerance) -> Self {
        tolerance.0
    }
}

/// One edge endpoint: arena key plus position.
#[derive(Clone, Copy, Debug)]
pub struct EdgeEndpoint {
    /// Key of the vertex in the triangulation arena.
    pub key: VertexKey,
    /// Position of the vertex.
    pub point: Point,
}

impl EdgeEndpoint {
    /// Pairs a vertex key with its position.
    #[inline]
    #[must_use]
    pub const fn new(key: VertexKey, point: Point) -> Self {
        Self { key, point }
    }
}

/// Canonical identifier for an undirected edge.
///
/// Equality is vertex identity: the canonical pair of endpoint keys. The
/// edge also remembers the direction it was constructed with
/// ([`Edge::directed`]); the direction does not take part in equality.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::edge::{Edge, EdgeEndpoint, EdgeTolerance};
/// use plasma_mesh::core::vertex::VertexKey;
/// use plasma_mesh::geometry::point::Point;
/// use slotmap::SlotMap;
///
/// let mut keys: SlotMap<VertexKey, ()> = SlotMap::with_key();
/// let a = EdgeEndpoint::new(keys.insert(()), Point::new(3.0, 0.0));
/// let b = EdgeEndpoint::new(keys.insert(()), Point::new(1.0, 9.0));
///
/// let tolerance = EdgeTolerance::default();
/// let ab = Edge::new(a, b, tolerance);
/// let ba = Edge::new(b, a, tolerance);
/// assert_eq!(ab, ba);
/// assert_eq!(ab.endpoints(), ba.endpoints());
/// assert_eq!(ab.directed(), (a.key, b.key));
/// assert_eq!(ba.directed(), (b.key, a.key));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    v0: EdgeEndpoint,
    v1: EdgeEndpoint,
    cell0: (i64, i64),
    cell1: (i64, i64),
    reversed: bool,
}

impl Edge {
    /// Creates the canonical edge between `a` and `b`.
    ///
    /// Endpoints are reordered so that `v0` precedes `v1` in the strict
    /// lexicographic order of their quantization cells. If both endpoints fall
    /// in the same cell the raw coordinates, then the arena keys, break the tie.
    #[must_use]
    pub fn new(a: EdgeEndpoint, b: EdgeEndpoint, tolerance: EdgeTolerance) -> Self {
        let cell_a = tolerance.quantize(a.point);
        let cell_b = tolerance.quantize(b.point);

        let order = cell_a
            .cmp(&cell_b)
            .then_with(|| a.point.lexicographic_cmp(&b.point))
            .then_with(|| a.key.cmp(&b.key));

        if order == Ordering::Greater {
            Self {
                v0: b,
                v1: a,
                cell0: cell_b,
                cell1: cell_a,
                reversed: true,
            }
        } else {
            Self {
                v0: a,
                v1: b,
                cell0: cell_a,
                cell1: cell_b,
                reversed: false,
            }
        }
    }

    /// First (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v0(&self) -> EdgeEndpoint {
        self.v0
    }

    /// Second (canonical) endpoint.
    #[inline]
    #[must_use]
    pub const fn v1(&self) -> EdgeEndpoint {
        self.v1
    }

    /// Canonical endpoint keys.
    #[inline]
    #[must_use]
    pub const fn endpoints(&self) -> (VertexKey, VertexKey) {
        (self.v0.key, self.v1.key)
    }

    /// Endpoint keys in the order the edge was constructed with.
    #[inline]
    #[must_use]
    pub const fn directed(&self) -> (VertexKey, VertexKey) {
        if self.reversed {
            (self.v1.key, self.v0.key)
        } else {
            (self.v0.key, self.v1.key)
        }
    }

    /// Endpoint positions in the order the edge was constructed with.
    #[inline]
    #[must_use]
    pub const fn directed_points(&self) -> (Point, Point) {
        if self.reversed {
            (self.v1.point, self.v0.point)
        } else {
            (self.v0.point, self.v1.point)
        }
    }

    /// Returns `true` if `key` is one of the endpoints.
    #[inline]
    #[must_use]
    pub fn has_vertex(&self, key: VertexKey) -> bool {
        self.v0.key == key || self.v1.key == key
    }

    /// Length of the edge.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.v0.point.distance(self.v1.point)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.endpoints() == other.endpoints()
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cell0.hash(state);
        self.cell1.hash(state);
    }
}

impl PartialOrd for Edge {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Edge {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.cell0, self.cell1)
            .cmp(&(other.cell0, other.cell1))
            .then_with(|| self.endpoints().cmp(&other.endpoints()))
    }
}
