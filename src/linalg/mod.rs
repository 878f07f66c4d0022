//! linalg — matrix-algebra primitives shared by the reform engine and the
//! stability diagnostics.
//!
//! Purpose
//! -------
//! Collect the small, allocation-light matrix operators that the STVAR
//! parameter layout is written in terms of: vectorization (full, pruned and
//! half), covariance decompositions for identification, matrix powers and
//! the special selector/shift matrices, and the canonical ordering of
//! structural impact matrices.
//!
//! Key behaviors
//! -------------
//! - [`vec_matrix`]/[`unvec_matrix`], [`pruned_vec`]/[`unpruned_vec`] and
//!   [`vech`]/[`unvech`] map between matrices and the flat blocks of the
//!   optimizer-facing parameter vector.
//! - [`simultaneous_diagonalize`], [`decompose_covariances`] and
//!   [`redecompose`] implement `Ω₁ = W W'`, `Ω_m = W diag(λ_m) W'` and its
//!   change of base regime.
//! - [`matrix_power`], [`companion_selector`] and [`subdiagonal_shift`]
//!   provide the building blocks of companion-form computations and
//!   residual autocorrelation statistics.
//! - [`order_by_sign_and_magnitude`] canonicalizes impact matrices under
//!   sign and column-order indeterminacy.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shape mismatches are always reported as [`LinalgError`]; positive
//!   definiteness is the caller's contract, but a factorization that
//!   uncovers a non-positive eigenvalue fails instead of returning NaNs.
//! - Every operator is a pure function of its inputs: no global state, no
//!   caches, no logging. All functions are safe to call concurrently.
//!
//! Conventions
//! -----------
//! - Column-major (`vec`) ordering everywhere; 0-based regime indices.
//! - Structural matrices are `ndarray` arrays; `nalgebra` is used only
//!   internally for factorizations through [`to_dmatrix`]/[`from_dmatrix`].
//!
//! Testing notes
//! -------------
//! - Unit tests in each submodule cover exact round trips, reconstruction
//!   of covariance pairs for d = 2..4, permutation round trips, idempotent
//!   canonical ordering and matrix powers against explicit products.

pub mod decomposition;
pub mod errors;
pub mod special;
pub mod tolerances;
pub mod vectorize;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::decomposition::{
    CovarianceDecomposition, decompose_covariances, diagonalize_covariances, redecompose,
    simultaneous_diagonalize, sorted_symmetric_eigen, symmetric_sqrt,
};
pub use self::errors::{LinalgError, LinalgResult};
pub use self::special::{
    companion_selector, from_dmatrix, matrix_power, order_by_sign_and_magnitude,
    subdiagonal_shift, to_dmatrix,
};
pub use self::tolerances::{
    DEFAULT_DEGENERACY_TOL, DIAGONALIZATION_TOL, EIGEN_EPS, EIGEN_MAX_ITER, POSDEF_TOL,
    STATIONARITY_TOL,
};
pub use self::vectorize::{pruned_vec, unpruned_vec, unvec_matrix, unvech, vec_matrix, vech};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_stvar::linalg::prelude::*;
//
// to import the main matrix-algebra surface in a single line.

pub mod prelude {
    pub use super::{
        CovarianceDecomposition, LinalgError, LinalgResult, matrix_power,
        order_by_sign_and_magnitude, pruned_vec, redecompose, simultaneous_diagonalize,
        unpruned_vec, unvec_matrix, unvech, vec_matrix, vech,
    };
}
