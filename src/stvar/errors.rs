//! Errors for STVAR configuration, parameter reform and diagnostics.
//!
//! This module defines [`StvarError`], the error type of the model layer,
//! and its result alias [`StvarResult`]. It keeps the three fatal error
//! kinds of the core distinct from each other:
//!
//! - **configuration mismatch** ([`StvarError::ParamLengthMismatch`]): the
//!   parameter vector does not have the length implied by the
//!   configuration; never truncated or padded,
//! - **unsupported combination** ([`StvarError::Unsupported`]): an operation
//!   that is not defined under the configured identification,
//! - **numerical failure** ([`StvarError::Linalg`] with a numerical
//!   payload, [`StvarError::InvalidThetaInput`]): surfaced so that an
//!   optimizer can penalize or reject the candidate.
//!
//! Near-degenerate regimes are *not* errors; they are reported through
//! `diagnostics::DegeneracyReport`.
//!
//! ## Conventions
//! - **Indices are 0-based** (parameter positions, regimes).
//! - Lower-level errors (`LinalgError`, `CombinatoricsError`) convert via
//!   `From`, so `?` works across layers.
//! - With the `python-bindings` feature, every variant maps to `ValueError`.
use crate::{combinatorics::errors::CombinatoricsError, linalg::errors::LinalgError};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for model-layer operations that may produce [`StvarError`].
pub type StvarResult<T> = Result<T, StvarError>;

#[derive(Debug, Clone, PartialEq)]
pub enum StvarError {
    // ---- Configuration ----
    /// Model configuration failed validation at construction.
    InvalidConfig { field: &'static str, reason: &'static str },

    /// Unknown name for a weight function, distribution or identification.
    UnknownVariant { kind: &'static str, name: String },

    /// Parameter vector length disagrees with the configuration.
    ParamLengthMismatch { expected: usize, actual: usize },

    /// Structural matrices do not match the configuration they are paired with.
    StructureMismatch { what: &'static str, expected: usize, found: usize },

    /// Operation not defined under the configured identification.
    Unsupported { operation: &'static str, identification: &'static str },

    /// Invalid argument to a diagnostic routine.
    InvalidArgument { name: &'static str, reason: &'static str },

    // ---- Numerical ----
    /// Parameter vector entries must be finite.
    InvalidThetaInput { index: usize, value: f64 },

    /// Wrapper for matrix-algebra failures.
    Linalg(LinalgError),

    /// Wrapper for combinatorial input errors.
    Combinatorics(CombinatoricsError),

    // ---- Likelihood evaluation ----
    /// External likelihood evaluator returned a non-finite value.
    NonFiniteLogLik { value: f64 },

    /// External likelihood evaluator failed.
    Evaluator(String),
}

impl StvarError {
    /// `true` for failures caused by the numerical content of a candidate
    /// (non-finite entries, singular or non-positive-definite matrices,
    /// eigen solver breakdown) rather than by the configuration or API
    /// misuse. Optimizers typically penalize these candidates.
    pub fn is_numerical(&self) -> bool {
        match self {
            StvarError::InvalidThetaInput { .. } | StvarError::NonFiniteLogLik { .. } => true,
            StvarError::Linalg(inner) => matches!(
                inner,
                LinalgError::EigenNotConverged { .. }
                    | LinalgError::SingularMatrix { .. }
                    | LinalgError::NotPositiveDefinite { .. }
                    | LinalgError::NotSimultaneouslyDiagonalizable { .. }
            ),
            _ => false,
        }
    }
}

impl std::error::Error for StvarError {}

impl std::fmt::Display for StvarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            StvarError::InvalidConfig { field, reason } => {
                write!(f, "Invalid STVAR configuration ({field}): {reason}")
            }
            StvarError::UnknownVariant { kind, name } => {
                write!(f, "Unknown {kind} '{name}'")
            }
            StvarError::ParamLengthMismatch { expected, actual } => {
                write!(
                    f,
                    "Parameter vector length mismatch: configuration implies {expected}, \
                     found {actual}"
                )
            }
            StvarError::StructureMismatch { what, expected, found } => {
                write!(
                    f,
                    "Structural matrices mismatch for {what}: expected {expected}, found {found}"
                )
            }
            StvarError::Unsupported { operation, identification } => {
                write!(f, "{operation} is not implemented for identification '{identification}'")
            }
            StvarError::InvalidArgument { name, reason } => {
                write!(f, "Invalid argument '{name}': {reason}")
            }

            // ---- Numerical ----
            StvarError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid parameter at index {index}: {value}, must be finite")
            }
            StvarError::Linalg(inner) => write!(f, "{inner}"),
            StvarError::Combinatorics(inner) => write!(f, "{inner}"),

            // ---- Likelihood evaluation ----
            StvarError::NonFiniteLogLik { value } => {
                write!(f, "Non-finite log-likelihood value: {value}")
            }
            StvarError::Evaluator(msg) => write!(f, "Likelihood evaluator failed: {msg}"),
        }
    }
}

impl From<LinalgError> for StvarError {
    fn from(err: LinalgError) -> Self {
        StvarError::Linalg(err)
    }
}

impl From<CombinatoricsError> for StvarError {
    fn from(err: CombinatoricsError) -> Self {
        StvarError::Combinatorics(err)
    }
}

impl From<anyhow::Error> for StvarError {
    fn from(err: anyhow::Error) -> Self {
        StvarError::Evaluator(err.to_string())
    }
}

#[cfg(feature = "python-bindings")]
impl From<StvarError> for PyErr {
    fn from(err: StvarError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
