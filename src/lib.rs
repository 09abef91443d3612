//! # `plasma_mesh`
//!
//! Incremental 2D Delaunay triangulation of a rectangle, with an adaptive
//! refinement driver that keeps splitting the largest triangle until every
//! triangle is below an area cutoff. Each vertex carries an opaque scalar
//! value, which makes the mesh a ready-made substrate for procedural
//! "plasma"-style shading.
//!
//! # Features
//!
//! - Bowyer–Watson insertion over slotmap arenas, with the cavity found either
//!   by a full scan or by flood fill from a known containing triangle
//! - Atomic insertion: a failed insertion leaves the mesh unchanged
//! - O(log n) access to the largest triangle, with deterministic tie-breaking
//! - Seeded, reproducible subdivision sampling
//! - Invariant validation (Delaunay property, incidence, tiling, area index)
//! - Serialization of options and mesh snapshots with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use plasma_mesh::prelude::*;
//!
//! let bounds = BoundingBox::from_size(10.0, 10.0).unwrap();
//! let mut dt = DelaunayTriangulation::new(bounds).unwrap();
//! assert_eq!(dt.number_of_triangles(), 2);
//!
//! dt.insert_point(Point::new(5.0, 5.0)).unwrap();
//! assert_eq!(dt.number_of_triangles(), 4);
//! assert!(dt.validate().is_ok());
//! ```
//!
//! # Refinement
//!
//! ```rust
//! use plasma_mesh::prelude::*;
//!
//! let bounds = BoundingBox::from_size(64.0, 64.0).unwrap();
//! let (dt, report) = refine(
//!     bounds,
//!     [Point::new(20.0, 20.0), Point::new(40.0, 44.0)],
//!     DistanceInterpolation::default(),
//!     TriangulationOptionsBuilder::default().seed(7).build().unwrap(),
//!     RefinementOptionsBuilder::default()
//!         .cutoff(AreaCutoff::FractionOfBounds(0.01))
//!         .build()
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! assert!(dt.triangles().all(|(_, t)| t.area() <= report.cutoff));
//! ```
//!
//! # Preconditions
//!
//! The engine does not deduplicate. Points must lie strictly inside the
//! rectangle and must not be near-duplicates of existing vertices or
//! collinear with an existing edge; violations surface as
//! [`TriangulationError`](core::triangulation::TriangulationError).

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh data structures and algorithms.
///
/// It includes the [`DelaunayTriangulation`](core::triangulation::DelaunayTriangulation)
/// engine, its [`Vertex`](core::vertex::Vertex) and
/// [`Triangle`](core::triangle::Triangle) components, and the refinement driver.
pub mod core {
    /// Insertion and refinement algorithms
    pub mod algorithms {
        /// Cavity detection and boundary extraction
        pub mod cavity;
        /// Largest-triangle refinement driver
        pub mod refinement;
    }
    pub mod collections;
    pub mod edge;
    pub mod payload;
    pub mod snapshot;
    pub mod triangle;
    pub mod triangulation;
    pub mod vertex;

    pub use edge::*;
    pub use triangle::*;
    pub use triangulation::*;
    pub use vertex::*;
}

/// Geometric primitives and predicates.
pub mod geometry {
    pub mod bounds;
    pub mod point;
    pub mod predicates;
    pub mod sampling;

    pub use bounds::*;
    pub use point::*;
    pub use predicates::*;
}

/// A prelude module that re-exports commonly used types.
pub mod prelude {
    pub use crate::core::{
        algorithms::{cavity::CavityError, refinement::*},
        edge::*,
        payload::*,
        snapshot::*,
        triangle::*,
        triangulation::*,
        vertex::*,
    };

    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::geometry::{bounds::*, point::*, predicates::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            algorithms::refinement::RefinementOptions, edge::Edge, snapshot::MeshSnapshot,
            triangle::Triangle, triangulation::DelaunayTriangulation, vertex::Vertex,
        },
        geometry::{bounds::BoundingBox, point::Point},
        is_normal,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point>());
        assert!(is_normal::<BoundingBox>());
        assert!(is_normal::<Vertex>());
        assert!(is_normal::<Edge>());
        assert!(is_normal::<Triangle>());
        assert!(is_normal::<DelaunayTriangulation>());
        assert!(is_normal::<RefinementOptions>());
        assert!(is_normal::<MeshSnapshot>());
    }

    #[test]
    fn test_prelude_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let set_with_cap = fast_hash_set_with_capacity::<u64>(50);
        assert!(set_with_cap.capacity() >= 50);
        let map_with_cap = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map_with_cap.capacity() >= 100);

        let dt = DelaunayTriangulation::new(BoundingBox::from_size(2.0, 2.0).unwrap()).unwrap();
        assert_eq!(
            orientation(Point::ORIGIN, Point::new(1.0, 0.0), Point::new(0.0, 1.0)),
            Orientation::POSITIVE
        );
        assert_eq!(dt.snapshot().triangles.len(), 2);
        assert_eq!(RefinementPhase::Seeding.to_string(), "seeding");
    }
}
