//! Hash and small-vector aliases shared by the triangulation engine.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet, FxHasher};
use smallvec::SmallVec;

/// Optimized `HashMap` type for performance-critical operations.
/// Uses `FastHasher` (`rustc_hash::FxHasher`) for faster hashing in non-cryptographic contexts.
///
/// # Security Warning
///
/// ⚠️ **Not DoS-resistant**: Do not use with attacker-controlled keys.
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Optimized `HashSet` type for membership tests on keys and edges.
///
/// Iteration order depends only on the inserted values, so two runs that
/// insert the same keys in the same order iterate identically.
pub type FastHashSet<T> = FxHashSet<T>;

/// Fast non-cryptographic hasher alias for internal collections.
pub type FastHasher = FxHasher;

/// Build hasher that instantiates [`FastHasher`].
pub type FastBuildHasher = FxBuildHasher;

/// Small-optimized Vec that uses stack allocation for small collections.
///
/// # Size Guidelines
///
/// - **N=4**: Edge-neighbors of a triangle (at most 3)
/// - **N=8**: Typical vertex degrees
/// - **N=16**: Cavity and star buffers
///
/// # Examples
///
/// ```rust
/// use plasma_mesh::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
/// for i in 0..5 {
///     buffer.push(i);
/// }
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Creates a [`FastHashMap`] with at least `capacity` slots preallocated.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with at least `capacity` slots preallocated.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}
