//! Sparse-matrix error type.
//!
//! Downstream crates define their own error enums and absorb `MatrixError`
//! through a `#[from]` variant, so matrix failures keep their context while
//! travelling up the stack.

use thiserror::Error;

/// Errors produced by [`SparseMatrix`](crate::SparseMatrix) operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("linear index {index} out of range (max {max})")]
    OutOfRange { index: u64, max: u64 },

    #[error("cell {index} already occupied")]
    Duplicate { index: u32 },

    #[error("cell {index} not found")]
    NotFound { index: u32 },

    #[error("dimensions {lhs_rows}x{lhs_cols} and {rhs_rows}x{rhs_cols} do not match")]
    DimensionMismatch {
        lhs_rows: u32,
        lhs_cols: u32,
        rhs_rows: u32,
        rhs_cols: u32,
    },

    #[error("operation requires a square matrix (got {rows}x{cols})")]
    NotSquare { rows: u32, cols: u32 },
}

/// Shorthand result type for matrix operations.
pub type MatrixResult<T> = Result<T, MatrixError>;
