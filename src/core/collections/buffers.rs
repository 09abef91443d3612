use crate::core::edge::Edge;
use crate::core::triangle::TriangleKey;

use super::{FastHashSet, SmallBuffer};

// =============================================================================
// ALGORITHM-SPECIFIC BUFFER TYPES
// =============================================================================

/// Inline capacity for cavity-sized buffers.
///
/// Cavities in a well-shaped planar Delaunay mesh average about four
/// triangles; 16 leaves headroom before spilling to the heap.
pub const CAVITY_BUFFER_SIZE: usize = 16;

/// Triangles whose circumcircle contains the point being inserted.
///
/// # Optimization Rationale
///
/// - **Stack Allocation**: Up to 16 triangles
/// - **Use Case**: `find_cavity()` return type, removal during insertion
pub type CavityBuffer = SmallBuffer<TriangleKey, CAVITY_BUFFER_SIZE>;

/// Boundary edges of a cavity (one per new star triangle).
pub type BoundaryEdgeBuffer = SmallBuffer<Edge, CAVITY_BUFFER_SIZE>;

/// Keys of triangles created by one insertion.
pub type StarBuffer = SmallBuffer<TriangleKey, CAVITY_BUFFER_SIZE>;

/// Triangles that share an edge with a given triangle (at most three).
pub type EdgeNeighborBuffer = SmallBuffer<TriangleKey, 4>;

/// Set of triangles incident to a vertex.
///
/// Stored on every vertex as the back-index used by edge-neighbor lookups.
pub type IncidentTriangleSet = FastHashSet<TriangleKey>;
