//! Errors for the matrix-algebra primitives.
//!
//! This module defines [`LinalgError`], the error type returned by the
//! vectorization operators, the covariance decompositions and the
//! eigenvalue helpers in [`crate::linalg`]. Shape checks are O(1) and are
//! always performed; positive-definiteness is never validated up front, but
//! a decomposition that produces a non-positive eigenvalue or fails to
//! converge is reported here instead of leaking NaNs to the caller.
//!
//! ## Conventions
//! - **Indices are 0-based** (regimes, rows, columns).
//! - Variants carry the offending sizes/values so that callers can build
//!   diagnostics without re-deriving them.

/// Result alias for matrix-algebra operations that may produce [`LinalgError`].
pub type LinalgResult<T> = Result<T, LinalgError>;

#[derive(Debug, Clone, PartialEq)]
pub enum LinalgError {
    // ---- Shapes ----
    /// Matrix must be square.
    NotSquare { rows: usize, cols: usize },

    /// Two operands disagree on a dimension.
    DimensionMismatch { expected: usize, found: usize, what: &'static str },

    /// Vector length is not a multiple of the requested row count.
    IndivisibleLength { len: usize, rows: usize },

    /// Pruned vector length does not match the number of retained mask entries.
    PrunedLengthMismatch { expected: usize, found: usize },

    /// Half-vectorized length is not `d(d+1)/2`.
    HalfVecLengthMismatch { d: usize, found: usize },

    // ---- Decompositions ----
    /// Eigen solver did not converge within the iteration budget.
    EigenNotConverged { dim: usize },

    /// Matrix could not be inverted or factorized.
    SingularMatrix { what: &'static str },

    /// Symmetric matrix has an eigenvalue that is not strictly positive.
    NotPositiveDefinite { index: usize, value: f64 },

    /// Covariance family cannot be written as `W diag(λ_m) W'` with a shared W.
    NotSimultaneouslyDiagonalizable { regime: usize, residual: f64 },

    // ---- Permutations ----
    /// `perm` is not a permutation of `0..m`.
    InvalidPermutation { m: usize, reason: &'static str },
}

impl std::error::Error for LinalgError {}

impl std::fmt::Display for LinalgError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Shapes ----
            LinalgError::NotSquare { rows, cols } => {
                write!(f, "Matrix must be square, found {rows}x{cols}")
            }
            LinalgError::DimensionMismatch { expected, found, what } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, found {found}")
            }
            LinalgError::IndivisibleLength { len, rows } => {
                write!(f, "Vector of length {len} cannot be reshaped into {rows} rows")
            }
            LinalgError::PrunedLengthMismatch { expected, found } => {
                write!(
                    f,
                    "Pruned vector length mismatch: mask retains {expected} entries, found {found}"
                )
            }
            LinalgError::HalfVecLengthMismatch { d, found } => {
                write!(
                    f,
                    "Half-vectorized length mismatch: d = {d} requires {}, found {found}",
                    d * (d + 1) / 2
                )
            }

            // ---- Decompositions ----
            LinalgError::EigenNotConverged { dim } => {
                write!(f, "Eigen decomposition of a {dim}x{dim} matrix did not converge")
            }
            LinalgError::SingularMatrix { what } => {
                write!(f, "Singular matrix: {what}")
            }
            LinalgError::NotPositiveDefinite { index, value } => {
                write!(f, "Matrix is not positive definite: eigenvalue {index} is {value}")
            }
            LinalgError::NotSimultaneouslyDiagonalizable { regime, residual } => {
                write!(
                    f,
                    "Covariance matrix of regime {regime} is not diagonalized by the shared W \
                     (off-diagonal residual {residual})"
                )
            }

            // ---- Permutations ----
            LinalgError::InvalidPermutation { m, reason } => {
                write!(f, "Invalid permutation of {m} regimes: {reason}")
            }
        }
    }
}
