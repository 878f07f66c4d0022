//! diagnostics — stability and identification diagnostics for STVAR regimes.
//!
//! Purpose
//! -------
//! Inspect reformed structural matrices: companion-form eigenvalue moduli
//! (local stationarity of each regime), covariance eigenvalues, an advisory
//! report of near-degenerate regimes, and a bracket of the joint spectral
//! radius for regime-switching stability.
//!
//! Key behaviors
//! -------------
//! - [`companion_matrices`], [`regime_eigen_moduli`] and
//!   [`covariance_eigenvalues`] return dense tables (`dp × M`, `d × M`).
//! - [`warn_on_near_degenerate`] returns a structured
//!   [`DegeneracyReport`] instead of printing; presentation is up to the
//!   caller.
//! - [`jsr_bounds`] / [`regime_jsr_bounds`] enumerate all regime products
//!   of a given length.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every function is pure and recomputes from its inputs.
//! - Solver breakdown is an error; degeneracy is not.
//!
//! Conventions
//! -----------
//! - Table columns are regimes (0-based), rows are sorted in decreasing
//!   order.
//!
//! Testing notes
//! -------------
//! - Unit tests cover block layout, complex eigenvalue pairs, the
//!   0.9995-modulus flag at tol 0.002, and destabilizing regime switching.

pub mod companion;
pub mod degeneracy;
pub mod jsr;

pub use self::companion::{
    companion_matrices, companion_matrices_for, companion_matrix, covariance_eigenvalues,
    eigen_moduli, regime_eigen_moduli, spectral_radius, structural_covariance_eigenvalues,
    structural_eigen_moduli,
};
pub use self::degeneracy::{
    DegeneracyFlag, DegeneracyKind, DegeneracyReport, degeneracy_report, warn_on_near_degenerate,
};
pub use self::jsr::{JsrBounds, MAX_JSR_PRODUCTS, jsr_bounds, regime_jsr_bounds};

pub mod prelude {
    pub use super::{
        DegeneracyReport, JsrBounds, covariance_eigenvalues, jsr_bounds, regime_eigen_moduli,
        warn_on_near_degenerate,
    };
}
