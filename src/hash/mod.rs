//! Open-addressing hash table.
//!
//! Used by the benchmark harness as the unordered baseline next to the two
//! trees.

mod linear_probe;

pub use linear_probe::{Iter, LinearProbingMap, MIN_CAPACITY};
