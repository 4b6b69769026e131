//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type used by the
//! covariance helpers (score outer products, eigen pseudo-inverses and
//! sandwich assembly). An alias `InferenceResult<T>` standardizes the
//! return type across inference code.

/// Unified error type for inference routines.
///
/// Covers shape problems in the matrices handed to the covariance helpers
/// and numerical degeneracies detected before or after the eigen
/// decomposition.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Shape ----
    /// Matrix expected to be square.
    NotSquare { rows: usize, cols: usize },

    /// Two operands with incompatible dimensions.
    DimensionMismatch { expected: usize, actual: usize },

    /// No rows to average over.
    EmptyScores,

    // ---- Numerical ----
    /// Non-finite entry at `(row, col)`.
    NonFinite { row: usize, col: usize, value: f64 },

    /// Every eigenvalue is at or below the truncation threshold.
    Singular { max_eigenvalue: f64 },
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shape ----
            InferenceError::NotSquare { rows, cols } => {
                write!(f, "Inference Error: matrix must be square, got {rows}x{cols}")
            }
            InferenceError::DimensionMismatch { expected, actual } => {
                write!(f, "Inference Error: dimension mismatch (expected {expected}, got {actual})")
            }
            InferenceError::EmptyScores => {
                write!(f, "Inference Error: score matrix has no rows")
            }

            // ---- Numerical ----
            InferenceError::NonFinite { row, col, value } => {
                write!(f, "Inference Error: non-finite entry {value} at ({row}, {col})")
            }
            InferenceError::Singular { max_eigenvalue } => write!(
                f,
                "Inference Error: matrix has no eigenvalue above the truncation threshold (max = {max_eigenvalue})"
            ),
        }
    }
}
