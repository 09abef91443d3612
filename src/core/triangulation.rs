//! The incremental Delaunay triangulation engine.
//!
//! [`DelaunayTriangulation`] owns two arenas (vertices and triangles) and an
//! area-ordered index over the active triangles. It starts from two seed
//! triangles spanning a [`BoundingBox`] and grows by Bowyer–Watson insertion:
//! every insertion removes the triangles whose circumcircle contains the new
//! point and fans new triangles from the point to the cavity boundary.
//!
//! # Atomicity
//!
//! Insertion is staged. All star triangles are constructed (and every
//! geometric check is performed) before any existing triangle is touched. If
//! staging fails, the only mutation made so far (adding the new vertex to the
//! arena) is rolled back, so a failed insertion leaves the mesh exactly as it
//! was. Once staging succeeds, the cavity is removed and the star committed
//! without any further fallible step.
//!
//! # Invariants
//!
//! After every public operation:
//!
//! 1. every active triangle is non-degenerate and counter-clockwise;
//! 2. each vertex's incident set equals the active triangles referencing it;
//! 3. the active triangles tile the bounding rectangle;
//! 4. no circumcircle strictly contains an active vertex;
//! 5. the area index holds exactly the active triangles.
//!
//! [`DelaunayTriangulation::validate`] checks all of them.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::core::algorithms::cavity::{CavityError, extract_cavity_boundary, find_cavity};
use crate::core::collections::{
    EdgeNeighborBuffer, FastHashMap, StarBuffer, fast_hash_map_with_capacity,
};
use crate::core::edge::{Edge, EdgeTolerance};
use crate::core::triangle::{Triangle, TriangleKey};
use crate::core::vertex::{Vertex, VertexKey};
use crate::geometry::bounds::BoundingBox;
use crate::geometry::point::Point;
use crate::geometry::predicates::{GeometryError, Orientation, orientation};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Relative tolerance for the area-conservation check.
pub const AREA_CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Relative slack used by [`DelaunayTriangulation::validate_delaunay`].
///
/// A vertex only counts as a violation if it lies inside the circumcircle by
/// more than this fraction of the squared radius. Cocircular configurations
/// (e.g. the four corners of the bounding rectangle) otherwise flip on the
/// last bit of the circumcircle computation.
pub const DELAUNAY_VALIDATION_TOLERANCE: f64 = 1e-10;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Rejected caller input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    /// A coordinate is NaN or infinite.
    #[error("Point {point} has a non-finite coordinate")]
    NonFinitePoint {
        /// The rejected point.
        point: Point,
    },

    /// The point is not in the open interior of the bounding rectangle.
    #[error("Point {point} is not strictly inside the bounding rectangle {min} - {max}")]
    OutsideBounds {
        /// The rejected point.
        point: Point,
        /// Lower-left corner of the rectangle.
        min: Point,
        /// Upper-right corner of the rectangle.
        max: Point,
    },

    /// The triangle key does not name an active triangle.
    #[error("Triangle {key:?} is not active in this triangulation")]
    UnknownTriangle {
        /// The stale or foreign key.
        key: TriangleKey,
    },

    /// The vertex key does not name a vertex of this triangulation.
    #[error("Vertex {key:?} does not exist in this triangulation")]
    UnknownVertex {
        /// The stale or foreign key.
        key: VertexKey,
    },
}

/// Errors from triangulation operations.
///
/// Every error aborts the operation in progress and leaves the mesh as it was
/// before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationError {
    /// Collinear or coincident points during triangle construction.
    ///
    /// Deterministic: repeating the call with the same input fails again.
    /// Callers may perturb the offending point and retry.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(#[from] GeometryError),

    /// The caller supplied a point or key the engine cannot accept.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A mesh invariant did not hold during insertion.
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] CavityError),

    /// The options could not be assembled.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem.
        message: String,
    },
}

impl TriangulationError {
    /// Returns `true` for [`TriangulationError::DegenerateGeometry`].
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateGeometry(_))
    }

    /// Returns `true` if the same request could succeed with a perturbed point.
    ///
    /// Only degenerate geometry qualifies; invalid input and invariant
    /// violations fail regardless of small perturbations.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        self.is_degenerate()
    }
}

impl From<TriangulationOptionsBuilderError> for TriangulationError {
    fn from(err: TriangulationOptionsBuilderError) -> Self {
        Self::InvalidConfiguration {
            message: err.to_string(),
        }
    }
}

/// A violated mesh invariant found by validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationValidationError {
    /// A triangle is degenerate or not counter-clockwise.
    #[error("Triangle {key:?} is degenerate or clockwise (cached area {area})")]
    DegenerateTriangle {
        /// The offending triangle.
        key: TriangleKey,
        /// Its cached area.
        area: f64,
    },

    /// A triangle references a vertex that does not exist.
    #[error("Triangle {triangle:?} references missing vertex {vertex:?}")]
    MissingVertex {
        /// The referencing triangle.
        triangle: TriangleKey,
        /// The missing vertex key.
        vertex: VertexKey,
    },

    /// A vertex's incident set disagrees with the active triangles.
    #[error(
        "Vertex {vertex:?} lists {found} incident triangles but {expected} active triangles reference it"
    )]
    IncidenceMismatch {
        /// The offending vertex.
        vertex: VertexKey,
        /// Number of active triangles referencing the vertex.
        expected: usize,
        /// Size of the vertex's incident set.
        found: usize,
    },

    /// More than two triangles share an edge.
    #[error("Edge {edge:?} is shared by {count} triangles")]
    NonManifoldEdge {
        /// The edge, as a sorted key pair.
        edge: (VertexKey, VertexKey),
        /// Number of triangles sharing it.
        count: usize,
    },

    /// An edge with a single triangle does not lie on the bounding rectangle.
    #[error("Edge {edge:?} has only one triangle but is not on the rectangle border")]
    OpenInteriorEdge {
        /// The edge, as a sorted key pair.
        edge: (VertexKey, VertexKey),
    },

    /// The triangle areas do not sum to the rectangle area.
    #[error("Total triangle area {actual} differs from bounding area {expected}")]
    AreaNotConserved {
        /// Area of the bounding rectangle.
        expected: f64,
        /// Sum of all active triangle areas.
        actual: f64,
    },

    /// An active vertex lies strictly inside a circumcircle.
    #[error("Vertex {vertex:?} lies inside the circumcircle of triangle {triangle:?}")]
    DelaunayViolation {
        /// The triangle whose circumcircle is violated.
        triangle: TriangleKey,
        /// The offending vertex.
        vertex: VertexKey,
    },

    /// The area index and the triangle arena disagree.
    #[error("Area index inconsistent: {message}")]
    AreaIndexMismatch {
        /// Description of the disagreement.
        message: String,
    },
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Engine options.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::edge::EdgeTolerance;
/// use plasma_mesh::core::triangulation::TriangulationOptionsBuilder;
///
/// let options = TriangulationOptionsBuilder::default()
///     .edge_tolerance(EdgeTolerance::new(1e-6).unwrap())
///     .seed(42)
///     .build()
///     .unwrap();
/// assert_eq!(options.seed, Some(42));
/// ```
#[derive(Builder, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangulationOptions {
    /// Edge hashing tolerance, relative to the larger side of the rectangle.
    #[builder(default)]
    pub edge_tolerance: EdgeTolerance,

    /// Seed for the subdivision sampler; `None` seeds from system entropy.
    #[builder(setter(strip_option), default)]
    pub seed: Option<u64>,
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of a successful [`DelaunayTriangulation::insert_point`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertionOutcome {
    /// A new vertex was added and the mesh re-triangulated around it.
    Inserted {
        /// Key of the new vertex.
        vertex_key: VertexKey,
        /// Number of triangles removed.
        removed: usize,
        /// Keys of the triangles created.
        created: StarBuffer,
    },
    /// The point coincides exactly with an existing vertex; nothing changed.
    Coincident {
        /// Key of the existing vertex.
        vertex_key: VertexKey,
    },
}

impl InsertionOutcome {
    /// Key of the inserted (or already existing) vertex.
    #[must_use]
    pub const fn vertex_key(&self) -> VertexKey {
        match self {
            Self::Inserted { vertex_key, .. } | Self::Coincident { vertex_key } => *vertex_key,
        }
    }

    /// Returns `true` if the mesh was modified.
    #[must_use]
    pub const fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }
}

/// Result of [`DelaunayTriangulation::subdivide_triangle`].
#[derive(Clone, Debug)]
pub struct Subdivision {
    /// Key of the new vertex.
    pub vertex_key: VertexKey,
    /// Position of the new vertex.
    pub point: Point,
    /// The subdivided triangle, as it was before removal.
    pub parent: Triangle,
    /// Number of triangles removed (including the parent).
    pub removed: usize,
    /// Keys of the triangles created.
    pub created: StarBuffer,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Priority of a triangle in the area index: area first, creation order second.
type AreaRank = (OrderedFloat<f64>, u64);

/// Incremental 2D Delaunay triangulation of a rectangle.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::prelude::*;
///
/// let bounds = BoundingBox::from_size(10.0, 10.0).unwrap();
/// let mut dt = DelaunayTriangulation::new(bounds).unwrap();
/// assert_eq!(dt.number_of_triangles(), 2);
///
/// dt.insert_point(Point::new(5.0, 5.0)).unwrap();
/// assert_eq!(dt.number_of_triangles(), 4);
/// for (_, triangle) in dt.triangles() {
///     assert_eq!(triangle.area(), 25.0);
/// }
/// assert!(dt.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct DelaunayTriangulation {
    bounds: BoundingBox,
    options: TriangulationOptions,
    /// `options.edge_tolerance` scaled to `bounds`.
    edge_tolerance: EdgeTolerance,
    vertices: SlotMap<VertexKey, Vertex>,
    triangles: SlotMap<TriangleKey, Triangle>,
    by_area: BTreeMap<AreaRank, TriangleKey>,
    /// Exact-coordinate lookup used to detect coincident insertions.
    vertex_lookup: FastHashMap<(u64, u64), VertexKey>,
    next_sequence: u64,
    rng: StdRng,
}

impl DelaunayTriangulation {
    /// Creates the two-triangle seed mesh of `bounds` with default options.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::DegenerateGeometry`] if the rectangle is
    /// too large for its circumcircles to be represented.
    pub fn new(bounds: BoundingBox) -> Result<Self, TriangulationError> {
        Self::with_options(bounds, TriangulationOptions::default())
    }

    /// Creates the two-triangle seed mesh of `bounds`.
    ///
    /// The four corners become vertices with value `0.0`; the rectangle is
    /// split along the diagonal from `min` to `max`.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::DegenerateGeometry`] if the rectangle is
    /// too large for its circumcircles to be represented.
    pub fn with_options(
        bounds: BoundingBox,
        options: TriangulationOptions,
    ) -> Result<Self, TriangulationError> {
        let rng = options
            .seed
            .map_or_else(|| StdRng::from_rng(&mut rand::rng()), StdRng::seed_from_u64);

        let mut dt = Self {
            bounds,
            edge_tolerance: options.edge_tolerance.scaled_to(&bounds),
            options,
            vertices: SlotMap::with_capacity_and_key(64),
            triangles: SlotMap::with_capacity_and_key(128),
            by_area: BTreeMap::new(),
            vertex_lookup: fast_hash_map_with_capacity(64),
            next_sequence: 0,
            rng,
        };

        let corners = bounds.corners();
        let keys = corners.map(|corner| dt.add_vertex(corner, 0.0));

        let first = Triangle::new(
            [keys[0], keys[1], keys[2]],
            [corners[0], corners[1], corners[2]],
            0,
        )?;
        let second = Triangle::new(
            [keys[0], keys[2], keys[3]],
            [corners[0], corners[2], corners[3]],
            1,
        )?;
        dt.next_sequence = 2;
        dt.attach_triangle(first);
        dt.attach_triangle(second);

        tracing::debug!(
            width = bounds.width(),
            height = bounds.height(),
            seed = ?dt.options.seed,
            "seeded triangulation with 2 triangles"
        );
        Ok(dt)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The bounding rectangle.
    #[must_use]
    pub const fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// The options this triangulation was built with.
    #[must_use]
    pub const fn options(&self) -> &TriangulationOptions {
        &self.options
    }

    /// Absolute edge tolerance used during boundary extraction.
    #[must_use]
    pub const fn edge_tolerance(&self) -> EdgeTolerance {
        self.edge_tolerance
    }

    /// Number of active triangles.
    #[must_use]
    pub fn number_of_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices referenced by at least one active triangle.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.values().filter(|v| !v.is_isolated()).count()
    }

    /// Iterates over the active triangles.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleKey, &Triangle)> {
        self.triangles.iter()
    }

    /// Looks up an active triangle.
    #[must_use]
    pub fn triangle(&self, key: TriangleKey) -> Option<&Triangle> {
        self.triangles.get(key)
    }

    /// Iterates over the distinct vertices of the active triangles.
    ///
    /// Each vertex appears once no matter how many triangles share it.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> {
        self.vertices.iter().filter(|(_, v)| !v.is_isolated())
    }

    /// Looks up a vertex.
    #[must_use]
    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    /// Replaces the scalar payload of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::UnknownVertex`] for a foreign key.
    pub fn set_vertex_value(
        &mut self,
        key: VertexKey,
        value: f64,
    ) -> Result<(), TriangulationError> {
        self.vertices
            .get_mut(key)
            .ok_or(InvalidInputError::UnknownVertex { key })?
            .set_value(value);
        Ok(())
    }

    /// Replaces every vertex's payload with `f(vertex)`.
    pub fn map_vertex_values<F>(&mut self, mut f: F)
    where
        F: FnMut(VertexKey, &Vertex) -> f64,
    {
        for (key, vertex) in &mut self.vertices {
            let value = f(key, vertex);
            vertex.set_value(value);
        }
    }

    /// The three vertices of a triangle, in counter-clockwise order.
    #[must_use]
    pub fn triangle_vertices(&self, key: TriangleKey) -> Option<[&Vertex; 3]> {
        let [a, b, c] = self.triangles.get(key)?.vertices();
        Some([
            self.vertices.get(a)?,
            self.vertices.get(b)?,
            self.vertices.get(c)?,
        ])
    }

    /// Mean payload of a triangle's three vertices.
    #[must_use]
    pub fn mean_value(&self, key: TriangleKey) -> Option<f64> {
        let [a, b, c] = self.triangle_vertices(key)?;
        Some((a.value() + b.value() + c.value()) / 3.0)
    }

    /// Sum of all active triangle areas.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.triangles.values().map(Triangle::area).sum()
    }

    /// The active triangle with the largest area.
    ///
    /// Exact ties go to the most recently created triangle.
    #[must_use]
    pub fn largest(&self) -> Option<(TriangleKey, &Triangle)> {
        let (_, &key) = self.by_area.last_key_value()?;
        self.triangles.get(key).map(|triangle| (key, triangle))
    }

    /// Number of active triangles with area strictly greater than `area`.
    #[must_use]
    pub fn count_larger_than(&self, area: f64) -> usize {
        self.by_area
            .range((Excluded((OrderedFloat(area), u64::MAX)), Unbounded))
            .count()
    }

    /// Active triangles sharing exactly one edge with `key`.
    ///
    /// Found through the incident sets of `key`'s vertices. Returns `None`
    /// if `key` is not active.
    #[must_use]
    pub fn neighbors_sharing_edge(&self, key: TriangleKey) -> Option<EdgeNeighborBuffer> {
        let triangle = self.triangles.get(key)?;
        let mut neighbors = EdgeNeighborBuffer::new();

        for vertex_key in triangle.vertices() {
            let Some(vertex) = self.vertices.get(vertex_key) else {
                continue;
            };
            for &candidate in vertex.incident_triangles() {
                if candidate == key || neighbors.contains(&candidate) {
                    continue;
                }
                if self
                    .triangles
                    .get(candidate)
                    .is_some_and(|other| triangle.shares_edge_with(other))
                {
                    neighbors.push(candidate);
                }
            }
        }

        neighbors.sort_unstable_by_key(|&k| self.triangles.get(k).map(Triangle::sequence));
        Some(neighbors)
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Inserts a point with payload `0.0`, scanning every triangle for the
    /// cavity.
    ///
    /// # Errors
    ///
    /// - [`TriangulationError::InvalidInput`] if the point is non-finite or
    ///   not strictly inside the bounding rectangle.
    /// - [`TriangulationError::DegenerateGeometry`] if a star triangle would
    ///   be degenerate.
    /// - [`TriangulationError::InvariantViolation`] if the cavity is malformed.
    ///
    /// A point identical to an existing vertex (including the rectangle
    /// corners) returns [`InsertionOutcome::Coincident`].
    pub fn insert_point(&mut self, point: Point) -> Result<InsertionOutcome, TriangulationError> {
        self.insert_with_hint(point, 0.0, None)
    }

    /// Inserts a point carrying `value`.
    ///
    /// # Errors
    ///
    /// Same as [`insert_point`](Self::insert_point).
    pub fn insert_point_with_value(
        &mut self,
        point: Point,
        value: f64,
    ) -> Result<InsertionOutcome, TriangulationError> {
        self.insert_with_hint(point, value, None)
    }

    /// Inserts points in order, stopping at the first failure.
    ///
    /// Each point sees the mesh produced by the previous ones. Points inserted
    /// before a failure stay in the mesh.
    ///
    /// # Errors
    ///
    /// The first error from [`insert_point`](Self::insert_point).
    pub fn insert_points<I>(
        &mut self,
        points: I,
    ) -> Result<Vec<InsertionOutcome>, TriangulationError>
    where
        I: IntoIterator<Item = Point>,
    {
        points
            .into_iter()
            .map(|point| self.insert_point(point))
            .collect()
    }

    /// Splits a triangle by inserting a uniformly sampled interior point.
    ///
    /// The cavity is flood-filled from `key`, which always contains the new
    /// point. The new vertex gets payload `0.0`; assign its real value with
    /// [`set_vertex_value`](Self::set_vertex_value).
    ///
    /// # Errors
    ///
    /// - [`InvalidInputError::UnknownTriangle`] if `key` is not active.
    /// - [`TriangulationError::DegenerateGeometry`] if no interior point could
    ///   be sampled or a star triangle would be degenerate.
    /// - [`TriangulationError::InvariantViolation`] if the cavity is malformed.
    pub fn subdivide_triangle(
        &mut self,
        key: TriangleKey,
    ) -> Result<Subdivision, TriangulationError> {
        let parent = self
            .triangles
            .get(key)
            .cloned()
            .ok_or(InvalidInputError::UnknownTriangle { key })?;

        let point = parent
            .sample_interior_point(&mut self.rng)
            .ok_or(GeometryError::DegenerateTriangle {
                points: parent.points(),
            })?;

        match self.insert_with_hint(point, 0.0, Some(key))? {
            InsertionOutcome::Inserted {
                vertex_key,
                removed,
                created,
            } => Ok(Subdivision {
                vertex_key,
                point,
                parent,
                removed,
                created,
            }),
            // An interior point of an active triangle cannot coincide with a vertex.
            InsertionOutcome::Coincident { .. } => Err(CavityError::EmptyCavity { point }.into()),
        }
    }

    fn insert_with_hint(
        &mut self,
        point: Point,
        value: f64,
        hint: Option<TriangleKey>,
    ) -> Result<InsertionOutcome, TriangulationError> {
        if !point.is_finite() {
            return Err(InvalidInputError::NonFinitePoint { point }.into());
        }
        if let Some(&vertex_key) = self.vertex_lookup.get(&point.bit_key()) {
            tracing::trace!(%point, "coincident point ignored");
            return Ok(InsertionOutcome::Coincident { vertex_key });
        }
        if !self.bounds.contains_strictly(point) {
            return Err(InvalidInputError::OutsideBounds {
                point,
                min: self.bounds.min(),
                max: self.bounds.max(),
            }
            .into());
        }

        let cavity = find_cavity(self, point, hint)?;
        let boundary = extract_cavity_boundary(self, &cavity)?;

        let (vertex_key, star) = self.stage_star(point, value, &boundary)?;

        // Commit.
        for &key in &cavity {
            self.detach_triangle(key);
        }
        let mut created = StarBuffer::with_capacity(star.len());
        for triangle in star {
            created.push(self.attach_triangle(triangle));
        }
        self.next_sequence += created.len() as u64;
        self.vertex_lookup.insert(point.bit_key(), vertex_key);

        tracing::trace!(
            %point,
            guided = hint.is_some(),
            removed = cavity.len(),
            created = created.len(),
            "inserted vertex"
        );

        debug_assert_eq!(
            self.by_area.len(),
            self.triangles.len(),
            "area index out of sync after insertion"
        );

        Ok(InsertionOutcome::Inserted {
            vertex_key,
            removed: cavity.len(),
            created,
        })
    }

    /// Builds the star of `point` over `boundary` without touching any
    /// existing triangle.
    ///
    /// The new vertex is added to the arena first so the staged triangles can
    /// reference it; on failure it is removed again.
    fn stage_star(
        &mut self,
        point: Point,
        value: f64,
        boundary: &[Edge],
    ) -> Result<(VertexKey, Vec<Triangle>), TriangulationError> {
        let vertex_key = self.vertices.insert(Vertex::new(point, value));
        let mut star = Vec::with_capacity(boundary.len());
        for (offset, edge) in (0_u64..).zip(boundary) {
            let (a, b) = edge.directed();
            let (pa, pb) = edge.directed_points();
            let staged = match orientation(pa, pb, point) {
                Orientation::POSITIVE => {
                    Triangle::new([vertex_key, a, b], [point, pa, pb], self.next_sequence + offset)
                        .map_err(TriangulationError::from)
                }
                Orientation::DEGENERATE => Err(GeometryError::DegenerateTriangle {
                    points: [point, pa, pb],
                }
                .into()),
                Orientation::NEGATIVE => Err(CavityError::NotStarShaped {
                    point,
                    edge: (a, b),
                }
                .into()),
            };
            match staged {
                Ok(triangle) => star.push(triangle),
                Err(err) => {
                    self.vertices.remove(vertex_key);
                    tracing::debug!(%point, error = %err, "insertion rolled back");
                    return Err(err);
                }
            }
        }
        Ok((vertex_key, star))
    }

    // -------------------------------------------------------------------------
    // Arena bookkeeping
    // -------------------------------------------------------------------------

    fn add_vertex(&mut self, point: Point, value: f64) -> VertexKey {
        let key = self.vertices.insert(Vertex::new(point, value));
        self.vertex_lookup.insert(point.bit_key(), key);
        key
    }

    /// Stores a triangle, registering it with its vertices and the area index.
    fn attach_triangle(&mut self, triangle: Triangle) -> TriangleKey {
        let rank = (OrderedFloat(triangle.area()), triangle.sequence());
        let vertices = triangle.vertices();
        let key = self.triangles.insert(triangle);
        for vertex_key in vertices {
            if let Some(vertex) = self.vertices.get_mut(vertex_key) {
                vertex.attach(key);
            }
        }
        self.by_area.insert(rank, key);
        key
    }

    /// Removes a triangle from the arena, its vertices, and the area index.
    fn detach_triangle(&mut self, key: TriangleKey) -> Option<Triangle> {
        let triangle = self.triangles.remove(key)?;
        for vertex_key in triangle.vertices() {
            if let Some(vertex) = self.vertices.get_mut(vertex_key) {
                vertex.detach(key);
            }
        }
        self.by_area
            .remove(&(OrderedFloat(triangle.area()), triangle.sequence()));
        Some(triangle)
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Checks the structural invariants: non-degenerate triangles, incidence
    /// sets, tiling of the rectangle, and the area index.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn is_valid(&self) -> Result<(), TriangulationValidationError> {
        self.validate_triangles()?;
        self.validate_incidence()?;
        self.validate_tiling()?;
        self.validate_area_index()
    }

    /// Checks every invariant, including the Delaunay property.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn validate(&self) -> Result<(), TriangulationValidationError> {
        self.is_valid()?;
        self.validate_delaunay()
    }

    /// Checks that no active vertex lies strictly inside any circumcircle.
    ///
    /// Quadratic in mesh size; intended for tests and diagnostics.
    ///
    /// # Errors
    ///
    /// [`TriangulationValidationError::DelaunayViolation`] for the first
    /// offending pair.
    pub fn validate_delaunay(&self) -> Result<(), TriangulationValidationError> {
        for (triangle_key, triangle) in &self.triangles {
            let circle = triangle.circumcircle();
            let slack = DELAUNAY_VALIDATION_TOLERANCE * circle.radius_squared;
            for (vertex_key, vertex) in self.vertices() {
                if triangle.has_vertex(vertex_key) {
                    continue;
                }
                let d2 = vertex.point().distance_squared(circle.center);
                if circle.radius_squared - d2 > slack {
                    tracing::debug!(
                        ?triangle_key,
                        ?vertex_key,
                        point = %vertex.point(),
                        "Delaunay violation"
                    );
                    return Err(TriangulationValidationError::DelaunayViolation {
                        triangle: triangle_key,
                        vertex: vertex_key,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_triangles(&self) -> Result<(), TriangulationValidationError> {
        for (key, triangle) in &self.triangles {
            let [a, b, c] = triangle.points();
            if triangle.area() <= 0.0 || orientation(a, b, c) != Orientation::POSITIVE {
                return Err(TriangulationValidationError::DegenerateTriangle {
                    key,
                    area: triangle.area(),
                });
            }
            for (vertex, expected) in triangle.vertices().into_iter().zip(triangle.points()) {
                match self.vertices.get(vertex) {
                    Some(v) if v.point() == expected => {}
                    _ => {
                        return Err(TriangulationValidationError::MissingVertex {
                            triangle: key,
                            vertex,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_incidence(&self) -> Result<(), TriangulationValidationError> {
        let mut referencing: FastHashMap<VertexKey, Vec<TriangleKey>> = FastHashMap::default();
        for (key, triangle) in &self.triangles {
            for vertex in triangle.vertices() {
                referencing.entry(vertex).or_default().push(key);
            }
        }

        for (vertex_key, vertex) in &self.vertices {
            let referenced = referencing.get(&vertex_key).map_or(&[][..], Vec::as_slice);
            let incident = vertex.incident_triangles();
            if referenced.len() != incident.len()
                || referenced.iter().any(|key| !incident.contains(key))
            {
                return Err(TriangulationValidationError::IncidenceMismatch {
                    vertex: vertex_key,
                    expected: referenced.len(),
                    found: incident.len(),
                });
            }
        }
        Ok(())
    }

    fn validate_tiling(&self) -> Result<(), TriangulationValidationError> {
        let mut edge_counts: FastHashMap<(VertexKey, VertexKey), usize> =
            fast_hash_map_with_capacity(self.triangles.len() * 2);
        for triangle in self.triangles.values() {
            let [a, b, c] = triangle.vertices();
            for (u, v) in [(a, b), (b, c), (c, a)] {
                *edge_counts.entry((u.min(v), u.max(v))).or_default() += 1;
            }
        }

        for (&edge, &count) in &edge_counts {
            if count > 2 {
                return Err(TriangulationValidationError::NonManifoldEdge { edge, count });
            }
            if count == 1 && !self.is_border_edge(edge) {
                return Err(TriangulationValidationError::OpenInteriorEdge { edge });
            }
        }

        let expected = self.bounds.area();
        let actual = self.total_area();
        if (actual - expected).abs() > AREA_CONSERVATION_TOLERANCE * expected {
            return Err(TriangulationValidationError::AreaNotConserved { expected, actual });
        }
        Ok(())
    }

    fn is_border_edge(&self, (u, v): (VertexKey, VertexKey)) -> bool {
        let (Some(a), Some(b)) = (self.vertices.get(u), self.vertices.get(v)) else {
            return false;
        };
        let (a, b) = (a.point(), b.point());
        let (min, max) = (self.bounds.min(), self.bounds.max());
        (a.x == min.x && b.x == min.x)
            || (a.x == max.x && b.x == max.x)
            || (a.y == min.y && b.y == min.y)
            || (a.y == max.y && b.y == max.y)
    }

    fn validate_area_index(&self) -> Result<(), TriangulationValidationError> {
        if self.by_area.len() != self.triangles.len() {
            return Err(TriangulationValidationError::AreaIndexMismatch {
                message: format!(
                    "{} indexed entries for {} active triangles",
                    self.by_area.len(),
                    self.triangles.len()
                ),
            });
        }
        for (&(area, sequence), &key) in &self.by_area {
            match self.triangles.get(key) {
                Some(t) if t.area() == area.into_inner() && t.sequence() == sequence => {}
                Some(_) => {
                    return Err(TriangulationValidationError::AreaIndexMismatch {
                        message: format!("entry for {key:?} has a stale rank"),
                    });
                }
                None => {
                    return Err(TriangulationValidationError::AreaIndexMismatch {
                        message: format!("entry for removed triangle {key:?}"),
                    });
                }
            }
        }
        Ok(())
    }
}
