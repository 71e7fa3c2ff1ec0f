//! Error types for layer and tensor operations
//!
//! Every failure in this crate is a programming or configuration error that is
//! surfaced to the caller immediately. Nothing here is retried.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Errors raised by matrix, tensor and layer operations.
#[derive(Error, Debug)]
pub enum NnError {
    /// Operand or buffer shapes do not agree.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Operation that detected the mismatch
        context: &'static str,
        /// Expected shape description
        expected: String,
        /// Actual shape description
        actual: String,
    },

    /// Hyperparameters that cannot produce a valid layer or output geometry.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A view window that does not fit inside its parent matrix.
    #[error(
        "window at ({row}, {col}) of size {rows}x{cols} exceeds parent of size {parent_rows}x{parent_cols}"
    )]
    OutOfBounds {
        /// Row offset of the window
        row: usize,
        /// Column offset of the window
        col: usize,
        /// Window height
        rows: usize,
        /// Window width
        cols: usize,
        /// Parent height
        parent_rows: usize,
        /// Parent width
        parent_cols: usize,
    },

    /// Reduction over a zero-length vector.
    #[error("empty vector has no maximum")]
    EmptyVector,

    /// `backward` called on a layer that has not run `forward` yet.
    #[error("{layer}: backward called before forward")]
    NoForwardCache {
        /// Layer name
        layer: &'static str,
    },

    /// Config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for the expected structure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NnError {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        NnError::ShapeMismatch {
            context,
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }
}
