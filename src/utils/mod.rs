//! Shared utilities for layer implementations
//!
//! This module provides row/column reductions, softmax and cross-entropy,
//! argmax, diagnostic summaries, and a small seeded random number generator.

pub mod numeric;
pub mod rng;
pub mod summary;

pub use numeric::{
    argmax, argmax_v, cross_entropy_error, max_rows, nearly_equal, normalize_each_row, softmax,
    softmax_vec, sum, sum_cols, sum_rows,
};
pub use rng::SimpleRng;
pub use summary::{dump, summary};
