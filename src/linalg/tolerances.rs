//! Numerical tolerances shared by the decompositions and diagnostics.
//!
//! Centralizes the small constants used by eigen solvers, stationarity
//! checks and positive-definiteness checks so every module agrees on the
//! same guards.

/// Convergence threshold passed to nalgebra's iterative eigen solvers.
pub const EIGEN_EPS: f64 = f64::EPSILON;

/// Iteration budget for the Schur and symmetric eigen solvers.
///
/// Companion matrices are at most a few dozen rows wide; hitting this cap
/// means the input is pathological (NaN/inf entries) rather than merely
/// ill-conditioned.
pub const EIGEN_MAX_ITER: usize = 10_000;

/// Default margin below one for the largest companion eigenvalue modulus.
pub const STATIONARITY_TOL: f64 = 1e-3;

/// Default lower bound for the smallest covariance eigenvalue.
pub const POSDEF_TOL: f64 = 1e-8;

/// Default tolerance of the near-degeneracy advisory.
pub const DEFAULT_DEGENERACY_TOL: f64 = 0.002;

/// Maximum off-diagonal residual accepted when checking that a shared `W`
/// diagonalizes more than two covariance matrices.
pub const DIAGONALIZATION_TOL: f64 = 1e-6;
