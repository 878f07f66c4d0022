//! Companion-form matrices and eigenvalue diagnostics per regime.
//!
//! Purpose
//! -------
//! Build each regime's companion ("boldA") matrix
//!
//! ```text
//! ⎡ A_{m,1}  A_{m,2}  …  A_{m,p} ⎤
//! ⎢ I_d      0        …  0       ⎥
//! ⎢ 0        I_d      …  0       ⎥
//! ⎣ 0        …        I_d  0     ⎦
//! ```
//!
//! and report the moduli of its eigenvalues, together with the eigenvalues
//! of the regime covariance matrices.
//!
//! Key behaviors
//! -------------
//! - [`companion_matrix`] / [`companion_matrices`]: from AR lag arrays.
//! - [`eigen_moduli`]: moduli of the (generally complex) eigenvalues through
//!   a real Schur decomposition, sorted in decreasing order.
//! - [`regime_eigen_moduli`]: `dp × M` table from `(config, θ)`.
//! - [`covariance_eigenvalues`]: `d × M` table; reduced form only.
//!
//! Invariants & assumptions
//! ------------------------
//! - Solver breakdown surfaces as `LinalgError::EigenNotConverged`, never
//!   as NaN moduli.
//! - Nothing is cached; each call recomputes from θ.
use crate::{
    linalg::{
        decomposition::sorted_symmetric_eigen,
        errors::{LinalgError, LinalgResult},
        special::to_dmatrix,
        tolerances::{EIGEN_EPS, EIGEN_MAX_ITER},
    },
    stvar::{
        config::{Identification, StvarConfig},
        errors::{StvarError, StvarResult},
        reform::reform_parameters,
        structural::StructuralMatrices,
    },
};
use nalgebra::Schur;
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis, s};

/// Companion matrix of one regime from its `(p, d, d)` lag array.
pub fn companion_matrix(ar: ArrayView3<f64>) -> Array2<f64> {
    let (p, d, _) = ar.dim();
    let dp = d * p;
    let mut out = Array2::<f64>::zeros((dp, dp));
    for (i, lag) in ar.axis_iter(Axis(0)).enumerate() {
        out.slice_mut(s![..d, i * d..(i + 1) * d]).assign(&lag);
    }
    for k in d..dp {
        out[[k, k - d]] = 1.0;
    }
    out
}

/// companion_matrices — companion matrix of every regime.
///
/// Parameters
/// ----------
/// - `p`, `m`, `d`: `usize`
///   AR order, number of regimes and dimension.
/// - `ar`: `&[Array3<f64>]`
///   One `(p, d, d)` lag array per regime.
///
/// Returns
/// -------
/// `StvarResult<Vec<Array2<f64>>>`
///   `m` matrices of shape `dp × dp`.
///
/// Errors
/// ------
/// - `StvarError::StructureMismatch` when `ar` has the wrong number of
///   regimes or a lag array has the wrong shape.
pub fn companion_matrices(
    p: usize, m: usize, d: usize, ar: &[Array3<f64>],
) -> StvarResult<Vec<Array2<f64>>> {
    if ar.len() != m {
        return Err(StvarError::StructureMismatch {
            what: "AR regimes",
            expected: m,
            found: ar.len(),
        });
    }
    ar.iter()
        .map(|lags| {
            if lags.dim() != (p, d, d) {
                return Err(StvarError::StructureMismatch {
                    what: "AR lag array",
                    expected: p * d * d,
                    found: lags.len(),
                });
            }
            Ok(companion_matrix(lags.view()))
        })
        .collect()
}

/// Companion matrices of the model described by `(config, θ)`.
pub fn companion_matrices_for(
    config: &StvarConfig, theta: ArrayView1<f64>,
) -> StvarResult<Vec<Array2<f64>>> {
    let sm = reform_parameters(config, theta)?;
    companion_matrices(sm.p, sm.m, sm.d, &sm.ar)
}

/// Moduli of the eigenvalues of a square matrix, in decreasing order.
///
/// Errors
/// ------
/// - `LinalgError::NotSquare` for rectangular input.
/// - `LinalgError::EigenNotConverged` when the Schur iteration gives up or
///   yields non-finite eigenvalues.
pub fn eigen_moduli(a: ArrayView2<f64>) -> LinalgResult<Array1<f64>> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    let schur = Schur::try_new(to_dmatrix(a), EIGEN_EPS, EIGEN_MAX_ITER)
        .ok_or(LinalgError::EigenNotConverged { dim: rows })?;
    let mut moduli: Vec<f64> = schur.complex_eigenvalues().iter().map(|z| z.norm()).collect();
    if moduli.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::EigenNotConverged { dim: rows });
    }
    moduli.sort_by(|l, r| r.total_cmp(l));
    Ok(Array1::from(moduli))
}

/// Spectral radius `max |eig(A)|`; zero for an empty matrix.
pub fn spectral_radius(a: ArrayView2<f64>) -> LinalgResult<f64> {
    Ok(eigen_moduli(a)?.get(0).copied().unwrap_or(0.0))
}

/// `dp × M` table of companion eigenvalue moduli of already reformed matrices.
pub fn structural_eigen_moduli(sm: &StructuralMatrices) -> StvarResult<Array2<f64>> {
    let companions = companion_matrices(sm.p, sm.m, sm.d, &sm.ar)?;
    let mut out = Array2::<f64>::zeros((sm.d * sm.p, sm.m));
    for (regime, companion) in companions.iter().enumerate() {
        out.column_mut(regime).assign(&eigen_moduli(companion.view())?);
    }
    Ok(out)
}

/// regime_eigen_moduli — companion eigenvalue moduli for every regime.
///
/// Parameters
/// ----------
/// - `config`: `&StvarConfig`
/// - `theta`: `ArrayView1<f64>`
///   Constrained parameter vector.
///
/// Returns
/// -------
/// `StvarResult<Array2<f64>>`
///   `dp × M`; column `m` holds the moduli of regime `m` in decreasing
///   order, so row 0 is the spectral radius of each regime.
///
/// Errors
/// ------
/// - Reform errors (length mismatch, non-finite θ).
/// - `LinalgError::EigenNotConverged` from the eigen solver.
pub fn regime_eigen_moduli(
    config: &StvarConfig, theta: ArrayView1<f64>,
) -> StvarResult<Array2<f64>> {
    let sm = reform_parameters(config, theta)?;
    structural_eigen_moduli(&sm)
}

/// `d × M` table of covariance eigenvalues of already reformed matrices.
pub fn structural_covariance_eigenvalues(sm: &StructuralMatrices) -> StvarResult<Array2<f64>> {
    if sm.identification != Identification::ReducedForm {
        return Err(StvarError::Unsupported {
            operation: "covariance eigenvalues",
            identification: sm.identification.as_str(),
        });
    }
    omega_eigenvalue_table(sm)
}

/// `d × M` eigenvalues of `sm.omegas` whatever the identification.
pub(crate) fn omega_eigenvalue_table(sm: &StructuralMatrices) -> StvarResult<Array2<f64>> {
    if sm.omegas.len() != sm.m {
        return Err(StvarError::StructureMismatch {
            what: "covariance matrices",
            expected: sm.m,
            found: sm.omegas.len(),
        });
    }
    let mut out = Array2::<f64>::zeros((sm.d, sm.m));
    for (regime, omega) in sm.omegas.iter().enumerate() {
        if omega.dim() != (sm.d, sm.d) {
            return Err(StvarError::StructureMismatch {
                what: "covariance matrix",
                expected: sm.d,
                found: omega.nrows(),
            });
        }
        let (values, _) = sorted_symmetric_eigen(omega.view())?;
        out.column_mut(regime).assign(&values);
    }
    Ok(out)
}

/// covariance_eigenvalues — eigenvalues of every regime covariance matrix.
///
/// Returns
/// -------
/// `StvarResult<Array2<f64>>`
///   `d × M`, each column in decreasing order.
///
/// Errors
/// ------
/// - `StvarError::Unsupported` unless the identification is reduced form;
///   this is checked before θ is read.
/// - Reform errors and `LinalgError::EigenNotConverged`.
pub fn covariance_eigenvalues(
    config: &StvarConfig, theta: ArrayView1<f64>,
) -> StvarResult<Array2<f64>> {
    if config.identification() != Identification::ReducedForm {
        return Err(StvarError::Unsupported {
            operation: "covariance eigenvalues",
            identification: config.identification().as_str(),
        });
    }
    let sm = reform_parameters(config, theta)?;
    structural_covariance_eigenvalues(&sm)
}
