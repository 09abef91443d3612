//! Adaptive refinement: repeatedly split the largest triangle.
//!
//! The driver is a small state machine over a [`DelaunayTriangulation`]:
//!
//! ```text
//! Seeding ──seed()──▶ Refining ──largest area ≤ cutoff──▶ Done
//! ```
//!
//! - **Seeding**: initial sample points are inserted in order, then every
//!   mesh vertex receives [`PayloadAssigner::seed_value`].
//! - **Refining**: while the largest triangle exceeds the cutoff, it is
//!   subdivided at a uniformly sampled interior point and the new vertex
//!   receives [`PayloadAssigner::subdivision_value`].
//! - **Done**: every triangle is at or below the cutoff, or the run aborted.
//!
//! Any engine error aborts the run. Each engine operation is atomic, so the
//! mesh left behind is the valid mesh from before the failing step.

use serde::{Deserialize, Serialize};

use crate::core::triangulation::{
    DelaunayTriangulation, TriangulationError, TriangulationOptions,
};
use crate::core::vertex::Vertex;
use crate::geometry::bounds::BoundingBox;
use crate::geometry::point::Point;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default cutoff as a fraction of the bounding rectangle's area.
pub const DEFAULT_CUTOFF_FRACTION: f64 = 0.0005;

/// Default iteration cap for the refinement loop.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000_000;

/// Default number of created triangles between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10_000;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors that abort a refinement run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RefinementError {
    /// The refinement options are unusable.
    #[error("Invalid refinement configuration: {message}")]
    InvalidConfiguration {
        /// Description of the problem.
        message: String,
    },

    /// An engine operation failed.
    #[error("Refinement aborted during {phase} at iteration {iteration}: {source}")]
    Triangulation {
        /// Phase in which the failure happened.
        phase: RefinementPhase,
        /// Number of completed subdivisions at the time.
        iteration: usize,
        /// The engine error.
        #[source]
        source: TriangulationError,
    },

    /// The loop hit its iteration cap before reaching the cutoff.
    #[error(
        "Refinement exceeded {cap} iterations; largest area {largest_area} still above cutoff {cutoff}"
    )]
    IterationCapExceeded {
        /// The configured cap.
        cap: usize,
        /// Largest triangle area when the cap was hit.
        largest_area: f64,
        /// The area cutoff.
        cutoff: f64,
    },

    /// An operation was requested in the wrong phase.
    #[error("Operation requires phase {expected}, driver is in {found}")]
    UnexpectedPhase {
        /// Phase the operation requires.
        expected: RefinementPhase,
        /// Current phase.
        found: RefinementPhase,
    },
}

impl From<RefinementOptionsBuilderError> for RefinementError {
    fn from(err: RefinementOptionsBuilderError) -> Self {
        Self::InvalidConfiguration {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Phase of a refinement run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefinementPhase {
    /// Initial sample points are being inserted.
    Seeding,
    /// Largest triangles are being subdivided.
    Refining,
    /// The run finished or aborted.
    Done,
}

impl std::fmt::Display for RefinementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Seeding => "seeding",
            Self::Refining => "refining",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Area threshold below which triangles are no longer subdivided.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaCutoff {
    /// An absolute area.
    Absolute(f64),
    /// A fraction of the bounding rectangle's area.
    FractionOfBounds(f64),
}

impl Default for AreaCutoff {
    fn default() -> Self {
        Self::FractionOfBounds(DEFAULT_CUTOFF_FRACTION)
    }
}

impl AreaCutoff {
    /// The raw configured number.
    #[must_use]
    pub const fn raw(self) -> f64 {
        match self {
            Self::Absolute(value) | Self::FractionOfBounds(value) => value,
        }
    }

    /// Resolves the cutoff to an absolute area for `bounds`.
    ///
    /// # Errors
    ///
    /// Returns [`RefinementError::InvalidConfiguration`] unless the resolved
    /// area is finite and strictly positive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use plasma_mesh::core::algorithms::refinement::AreaCutoff;
    /// use plasma_mesh::geometry::bounds::BoundingBox;
    ///
    /// let bounds = BoundingBox::from_size(10.0, 10.0).unwrap();
    /// assert_eq!(AreaCutoff::FractionOfBounds(0.1).resolve(&bounds).unwrap(), 10.0);
    /// assert_eq!(AreaCutoff::Absolute(2.5).resolve(&bounds).unwrap(), 2.5);
    /// assert!(AreaCutoff::Absolute(0.0).resolve(&bounds).is_err());
    /// ```
    pub fn resolve(self, bounds: &BoundingBox) -> Result<f64, RefinementError> {
        let area = match self {
            Self::Absolute(area) => area,
            Self::FractionOfBounds(fraction) => fraction * bounds.area(),
        };
        if area.is_finite() && area > 0.0 {
            Ok(area)
        } else {
            Err(RefinementError::InvalidConfiguration {
                message: format!("area cutoff {self:?} resolves to {area}"),
            })
        }
    }
}

/// Refinement driver options.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::algorithms::refinement::{AreaCutoff, RefinementOptionsBuilder};
///
/// let options = RefinementOptionsBuilder::default()
///     .cutoff(AreaCutoff::Absolute(4.0))
///     .max_iterations(1_000_usize)
///     .build()
///     .unwrap();
/// assert_eq!(options.progress_interval, 10_000);
///
/// assert!(RefinementOptionsBuilder::default()
///     .cutoff(AreaCutoff::FractionOfBounds(-1.0))
///     .build()
///     .is_err());
/// ```
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct RefinementOptions {
    /// Stop once the largest triangle is at or below this area.
    #[builder(default)]
    pub cutoff: AreaCutoff,

    /// Maximum number of subdivisions before the run is aborted.
    #[builder(setter(into), default = "DEFAULT_MAX_ITERATIONS")]
    pub max_iterations: usize,

    /// Created triangles between progress reports; `0` disables them.
    #[builder(setter(into), default = "DEFAULT_PROGRESS_INTERVAL")]
    pub progress_interval: usize,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            cutoff: AreaCutoff::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl RefinementOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(cutoff) = self.cutoff {
            let value = cutoff.raw();
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("cutoff must be finite and positive, got {value}"));
            }
        }
        if self.max_iterations == Some(0) {
            return Err("max_iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// PAYLOAD ASSIGNMENT
// =============================================================================

/// Everything known about a subdivision when the new vertex's value is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubdivisionContext {
    /// Position of the new vertex.
    pub point: Point,
    /// Parent triangle's vertex positions, counter-clockwise.
    pub parent_points: [Point; 3],
    /// Parent triangle's vertex values, matching `parent_points`.
    pub parent_values: [f64; 3],
    /// Area of the parent triangle.
    pub parent_area: f64,
    /// Mean triangle area right after seeding.
    pub base_area: f64,
    /// Zero-based index of this subdivision.
    pub iteration: usize,
}

impl SubdivisionContext {
    /// `parent_area / base_area`: `1.0` for a seed-sized parent, shrinking
    /// as refinement proceeds.
    #[must_use]
    pub fn relative_area(&self) -> f64 {
        if self.base_area > 0.0 {
            self.parent_area / self.base_area
        } else {
            1.0
        }
    }
}

/// Chooses scalar values for vertices created by the driver.
///
/// Closures `FnMut(&SubdivisionContext) -> f64` implement this trait with a
/// seed value of `0.0`.
pub trait PayloadAssigner {
    /// Value for a vertex present after seeding.
    fn seed_value(&mut self, point: Point) -> f64 {
        let _ = point;
        0.0
    }

    /// Value for a vertex created by subdivision.
    fn subdivision_value(&mut self, context: &SubdivisionContext) -> f64;
}

impl<F> PayloadAssigner for F
where
    F: FnMut(&SubdivisionContext) -> f64,
{
    fn subdivision_value(&mut self, context: &SubdivisionContext) -> f64 {
        self(context)
    }
}

// =============================================================================
// REPORT
// =============================================================================

/// Summary of a refinement run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RefinementReport {
    /// Seed points that created a new vertex.
    pub seed_points: usize,
    /// Seed points that coincided with an existing vertex.
    pub coincident_seed_points: usize,
    /// Triangles right after seeding.
    pub seed_triangles: usize,
    /// Mean triangle area right after seeding.
    pub base_area: f64,
    /// Resolved area cutoff.
    pub cutoff: f64,
    /// Completed subdivisions.
    pub iterations: usize,
    /// Triangles created by subdivisions.
    pub triangles_created: usize,
    /// Active triangles at the end.
    pub final_triangles: usize,
    /// Mesh vertices at the end.
    pub final_vertices: usize,
    /// Largest remaining triangle area.
    pub largest_area: f64,
}

// =============================================================================
// DRIVER
// =============================================================================

/// Refinement state machine over an owned triangulation.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::prelude::*;
///
/// let bounds = BoundingBox::from_size(100.0, 100.0).unwrap();
/// let options = TriangulationOptionsBuilder::default().seed(3).build().unwrap();
/// let dt = DelaunayTriangulation::with_options(bounds, options).unwrap();
///
/// let refinement = RefinementOptionsBuilder::default()
///     .cutoff(AreaCutoff::FractionOfBounds(0.01))
///     .build()
///     .unwrap();
/// let assigner = |ctx: &SubdivisionContext| ctx.parent_values[0];
/// let mut refiner = Refiner::new(dt, assigner, refinement).unwrap();
///
/// refiner.seed([Point::new(30.0, 40.0), Point::new(70.0, 60.0)]).unwrap();
/// let report = refiner.run().unwrap();
///
/// assert_eq!(refiner.phase(), RefinementPhase::Done);
/// assert!(report.largest_area <= 100.0);
/// assert!(refiner.triangulation().triangles().all(|(_, t)| t.area() <= 100.0));
/// ```
#[derive(Debug)]
pub struct Refiner<P> {
    triangulation: DelaunayTriangulation,
    assigner: P,
    options: RefinementOptions,
    phase: RefinementPhase,
    report: RefinementReport,
    next_progress: usize,
}

impl<P: PayloadAssigner> Refiner<P> {
    /// Wraps a triangulation for refinement, starting in
    /// [`RefinementPhase::Seeding`].
    ///
    /// # Errors
    ///
    /// Returns [`RefinementError::InvalidConfiguration`] if the cutoff does
    /// not resolve to a positive area or the iteration cap is zero.
    pub fn new(
        triangulation: DelaunayTriangulation,
        assigner: P,
        options: RefinementOptions,
    ) -> Result<Self, RefinementError> {
        let cutoff = options.cutoff.resolve(triangulation.bounds())?;
        if options.max_iterations == 0 {
            return Err(RefinementError::InvalidConfiguration {
                message: "max_iterations must be at least 1".to_string(),
            });
        }
        let next_progress = options.progress_interval;
        Ok(Self {
            triangulation,
            assigner,
            options,
            phase: RefinementPhase::Seeding,
            report: RefinementReport {
                cutoff,
                ..RefinementReport::default()
            },
            next_progress,
        })
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> RefinementPhase {
        self.phase
    }

    /// The triangulation being refined.
    #[must_use]
    pub const fn triangulation(&self) -> &DelaunayTriangulation {
        &self.triangulation
    }

    /// Statistics so far.
    #[must_use]
    pub const fn report(&self) -> &RefinementReport {
        &self.report
    }

    /// Resolved area cutoff.
    #[must_use]
    pub const fn cutoff(&self) -> f64 {
        self.report.cutoff
    }

    /// Releases the triangulation.
    #[must_use]
    pub fn into_triangulation(self) -> DelaunayTriangulation {
        self.triangulation
    }

    /// Inserts the seed points in order, assigns seed values, and moves to
    /// [`RefinementPhase::Refining`].
    ///
    /// # Errors
    ///
    /// - [`RefinementError::UnexpectedPhase`] unless the driver is seeding.
    /// - [`RefinementError::Triangulation`] if an insertion fails; the run
    ///   moves to [`RefinementPhase::Done`].
    pub fn seed<I>(&mut self, points: I) -> Result<(), RefinementError>
    where
        I: IntoIterator<Item = Point>,
    {
        self.expect_phase(RefinementPhase::Seeding)?;

        for point in points {
            match self.triangulation.insert_point(point) {
                Ok(outcome) if outcome.is_inserted() => self.report.seed_points += 1,
                Ok(_) => self.report.coincident_seed_points += 1,
                Err(source) => return Err(self.abort(source)),
            }
        }

        let assigner = &mut self.assigner;
        self.triangulation
            .map_vertex_values(|_, vertex| assigner.seed_value(vertex.point()));

        let triangles = self.triangulation.number_of_triangles();
        self.report.seed_triangles = triangles;
        #[expect(clippy::cast_precision_loss, reason = "triangle counts fit in f64 mantissa")]
        let base_area = self.triangulation.total_area() / triangles as f64;
        self.report.base_area = base_area;
        self.phase = RefinementPhase::Refining;

        tracing::info!(
            seed_points = self.report.seed_points,
            coincident = self.report.coincident_seed_points,
            triangles,
            base_area,
            cutoff = self.report.cutoff,
            "seeding complete"
        );
        Ok(())
    }

    /// Performs one refinement step.
    ///
    /// Returns `Ok(true)` after subdividing a triangle and `Ok(false)` once
    /// the largest triangle is at or below the cutoff (the driver is then
    /// [`RefinementPhase::Done`]).
    ///
    /// # Errors
    ///
    /// - [`RefinementError::UnexpectedPhase`] unless the driver is refining.
    /// - [`RefinementError::IterationCapExceeded`] when the cap is reached.
    /// - [`RefinementError::Triangulation`] if the subdivision fails.
    pub fn step(&mut self) -> Result<bool, RefinementError> {
        self.expect_phase(RefinementPhase::Refining)?;

        let Some((key, largest)) = self.triangulation.largest() else {
            self.finish();
            return Ok(false);
        };
        let largest_area = largest.area();
        if largest_area <= self.report.cutoff {
            self.finish();
            return Ok(false);
        }
        if self.report.iterations >= self.options.max_iterations {
            self.phase = RefinementPhase::Done;
            tracing::warn!(
                cap = self.options.max_iterations,
                largest_area,
                "refinement iteration cap reached"
            );
            return Err(RefinementError::IterationCapExceeded {
                cap: self.options.max_iterations,
                largest_area,
                cutoff: self.report.cutoff,
            });
        }

        let subdivision = match self.triangulation.subdivide_triangle(key) {
            Ok(subdivision) => subdivision,
            Err(source) => return Err(self.abort(source)),
        };

        let parent = &subdivision.parent;
        let parent_values = parent
            .vertices()
            .map(|k| self.triangulation.vertex(k).map_or(0.0, Vertex::value));
        let context = SubdivisionContext {
            point: subdivision.point,
            parent_points: parent.points(),
            parent_values,
            parent_area: parent.area(),
            base_area: self.report.base_area,
            iteration: self.report.iterations,
        };
        let value = self.assigner.subdivision_value(&context);
        if let Err(source) = self
            .triangulation
            .set_vertex_value(subdivision.vertex_key, value)
        {
            return Err(self.abort(source));
        }

        self.report.iterations += 1;
        self.report.triangles_created += subdivision.created.len();
        self.log_progress();
        Ok(true)
    }

    /// Runs [`step`](Self::step) until the cutoff is reached.
    ///
    /// # Errors
    ///
    /// The first error from [`step`](Self::step).
    pub fn run(&mut self) -> Result<RefinementReport, RefinementError> {
        while self.step()? {}
        Ok(self.report.clone())
    }

    fn expect_phase(&self, expected: RefinementPhase) -> Result<(), RefinementError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RefinementError::UnexpectedPhase {
                expected,
                found: self.phase,
            })
        }
    }

    fn log_progress(&mut self) {
        if self.options.progress_interval == 0
            || self.report.triangles_created < self.next_progress
        {
            return;
        }
        while self.next_progress <= self.report.triangles_created {
            self.next_progress += self.options.progress_interval;
        }
        tracing::info!(
            iterations = self.report.iterations,
            triangles = self.triangulation.number_of_triangles(),
            above_cutoff = self.triangulation.count_larger_than(self.report.cutoff),
            "refinement progress"
        );
    }

    fn finish(&mut self) {
        self.phase = RefinementPhase::Done;
        self.report.final_triangles = self.triangulation.number_of_triangles();
        self.report.final_vertices = self.triangulation.number_of_vertices();
        self.report.largest_area = self
            .triangulation
            .largest()
            .map_or(0.0, |(_, triangle)| triangle.area());
        tracing::info!(
            iterations = self.report.iterations,
            triangles = self.report.final_triangles,
            vertices = self.report.final_vertices,
            largest_area = self.report.largest_area,
            "refinement complete"
        );
    }

    fn abort(&mut self, source: TriangulationError) -> RefinementError {
        let phase = self.phase;
        self.phase = RefinementPhase::Done;
        tracing::warn!(
            %phase,
            iteration = self.report.iterations,
            error = %source,
            "refinement aborted"
        );
        RefinementError::Triangulation {
            phase,
            iteration: self.report.iterations,
            source,
        }
    }
}

/// Builds a triangulation of `bounds`, seeds it with `points`, and refines it
/// to the cutoff.
///
/// # Errors
///
/// Any [`RefinementError`]; engine construction failures are reported as
/// [`RefinementError::Triangulation`] in the seeding phase.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::prelude::*;
///
/// let bounds = BoundingBox::from_size(10.0, 10.0).unwrap();
/// let (dt, report) = refine(
///     bounds,
///     [Point::new(2.5, 7.5)],
///     |_: &SubdivisionContext| 0.5,
///     TriangulationOptionsBuilder::default().seed(1).build().unwrap(),
///     RefinementOptionsBuilder::default()
///         .cutoff(AreaCutoff::FractionOfBounds(0.1))
///         .build()
///         .unwrap(),
/// )
/// .unwrap();
/// assert_eq!(report.final_triangles, dt.number_of_triangles());
/// ```
pub fn refine<I, P>(
    bounds: BoundingBox,
    points: I,
    assigner: P,
    triangulation_options: TriangulationOptions,
    options: RefinementOptions,
) -> Result<(DelaunayTriangulation, RefinementReport), RefinementError>
where
    I: IntoIterator<Item = Point>,
    P: PayloadAssigner,
{
    let triangulation =
        DelaunayTriangulation::with_options(bounds, triangulation_options).map_err(|source| {
            RefinementError::Triangulation {
                phase: RefinementPhase::Seeding,
                iteration: 0,
                source,
            }
        })?;
    let mut refiner = Refiner::new(triangulation, assigner, options)?;
    refiner.seed(points)?;
    let report = refiner.run()?;
    Ok((refiner.into_triangulation(), report))
}
