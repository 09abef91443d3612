//! Collection types tuned for the triangulation engine.
//!
//! Hashing uses `rustc_hash` (`FxHasher`), which is fast and deterministic
//! across runs; small temporary buffers use `smallvec`.

mod aliases;
mod buffers;

pub use aliases::*;
pub use buffers::*;
