//! Covariance decompositions for structural identification.
//!
//! Purpose
//! -------
//! Provide the symmetric square root of a covariance matrix and the
//! simultaneous diagonalization `Ω₁ = W W'`, `Ω_m = W diag(λ_m) W'` that
//! underlies identification by heteroskedasticity, together with the
//! re-expression of that decomposition relative to a different base regime.
//!
//! Key behaviors
//! -------------
//! - [`symmetric_sqrt`]: `V diag(√ν) V'` from a symmetric eigendecomposition.
//! - [`simultaneous_diagonalize`]: Muirhead's construction through
//!   `Ω₁^{-1/2} Ω₂ Ω₁^{-1/2}`.
//! - [`decompose_covariances`]: checked M-regime variant; exact for M ≤ 2,
//!   verified against a residual tolerance for M > 2.
//! - [`redecompose`]: change the base regime of an existing `(W, λ)` pair.
//!
//! Invariants & assumptions
//! ------------------------
//! - Inputs are expected to be symmetric positive definite; this is not
//!   validated up front. A non-positive eigenvalue discovered during the
//!   factorization is reported as `LinalgError::NotPositiveDefinite`
//!   instead of producing NaNs.
//! - `lambdas` is always stored as a `d × (M−1)` matrix whose column
//!   `m − 1` belongs to regime `m` (regime 0 is the base with λ ≡ 1).
//!
//! Conventions
//! -----------
//! - Eigenvalues are sorted in decreasing order and eigenvector columns
//!   follow the same order, so results are deterministic across calls.
//! - Regimes and permutations are 0-based.
use crate::linalg::{
    errors::{LinalgError, LinalgResult},
    special::to_dmatrix,
    tolerances::{EIGEN_EPS, EIGEN_MAX_ITER},
};
use nalgebra::SymmetricEigen;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Shared-basis decomposition of a family of covariance matrices.
///
/// `w` is `d × d`; `lambdas` is `d × (M−1)` with column `m − 1` holding the
/// diagonal of regime `m` relative to the base regime 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceDecomposition {
    pub w: Array2<f64>,
    pub lambdas: Array2<f64>,
}

impl CovarianceDecomposition {
    /// Number of regimes described by the decomposition.
    pub fn regimes(&self) -> usize {
        self.lambdas.ncols() + 1
    }

    /// Rebuild `Ω_m = W diag(λ_m) W'` for a 0-based regime `m`.
    pub fn omega(&self, m: usize) -> Array2<f64> {
        if m == 0 {
            return self.w.dot(&self.w.t());
        }
        let scaled = &self.w * &self.lambdas.column(m - 1);
        scaled.dot(&self.w.t())
    }

    /// Structural impact matrix `B_m = W diag(√λ_m)` for a 0-based regime `m`.
    pub fn impact(&self, m: usize) -> Array2<f64> {
        if m == 0 {
            return self.w.clone();
        }
        &self.w * &self.lambdas.column(m - 1).mapv(f64::sqrt)
    }
}

/// Symmetric eigendecomposition with eigenvalues in decreasing order.
///
/// Returns `(values, vectors)` where column `k` of `vectors` belongs to
/// `values[k]`.
///
/// Errors
/// ------
/// - `LinalgError::NotSquare` for rectangular input.
/// - `LinalgError::EigenNotConverged` when the solver gives up or returns
///   non-finite eigenvalues.
pub fn sorted_symmetric_eigen(a: ArrayView2<f64>) -> LinalgResult<(Array1<f64>, Array2<f64>)> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    let eig = SymmetricEigen::try_new(to_dmatrix(a), EIGEN_EPS, EIGEN_MAX_ITER)
        .ok_or(LinalgError::EigenNotConverged { dim: rows })?;
    if eig.eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(LinalgError::EigenNotConverged { dim: rows });
    }
    let mut order: Vec<usize> = (0..rows).collect();
    order.sort_by(|&l, &r| eig.eigenvalues[r].total_cmp(&eig.eigenvalues[l]));
    let values: Array1<f64> = order.iter().map(|&k| eig.eigenvalues[k]).collect();
    let vectors = Array2::from_shape_fn((rows, rows), |(i, j)| eig.eigenvectors[(i, order[j])]);
    Ok((values, vectors))
}

/// Symmetric positive-definite square root `Ω^{1/2} = V diag(√ν) V'`.
///
/// Errors
/// ------
/// - Everything [`sorted_symmetric_eigen`] may return.
/// - `LinalgError::NotPositiveDefinite` when an eigenvalue is `≤ 0`.
pub fn symmetric_sqrt(omega: ArrayView2<f64>) -> LinalgResult<Array2<f64>> {
    let (values, vectors) = positive_eigen(omega)?;
    Ok(spectral_function(&values, &vectors, f64::sqrt))
}

/// simultaneous_diagonalize — shared basis for a pair of covariance matrices.
///
/// Purpose
/// -------
/// Find `W` and `λ` such that `W W' = Ω₁` and `W diag(λ) W' = Ω₂`
/// (Muirhead, 1982, Theorem A9.9).
///
/// Parameters
/// ----------
/// - `omega1`: `ArrayView2<f64>`
///   Positive definite `d × d` covariance of the base regime.
/// - `omega2`: `ArrayView2<f64>`
///   Positive definite `d × d` covariance of the second regime.
///
/// Returns
/// -------
/// `LinalgResult<CovarianceDecomposition>`
///   `w` and a `d × 1` matrix of λ in decreasing order.
///
/// Errors
/// ------
/// - `LinalgError::DimensionMismatch` when the matrices differ in size.
/// - `LinalgError::NotPositiveDefinite` when `Ω₁` is not positive definite.
/// - `LinalgError::EigenNotConverged` from either eigen step.
///
/// Notes
/// -----
/// - Steps: `S = Ω₁^{1/2}`, `C = S⁻¹ Ω₂ S⁻¹` (symmetrized), `C = H Λ H'`,
///   `W = S H`. `S⁻¹` is built from the same eigendecomposition as `S`, so
///   no general matrix inversion is needed.
/// - Positive definiteness of `Ω₂` is not checked: a non-PD `Ω₂` simply
///   yields non-positive λ entries.
pub fn simultaneous_diagonalize(
    omega1: ArrayView2<f64>, omega2: ArrayView2<f64>,
) -> LinalgResult<CovarianceDecomposition> {
    if omega1.dim() != omega2.dim() {
        return Err(LinalgError::DimensionMismatch {
            expected: omega1.nrows(),
            found: omega2.nrows(),
            what: "covariance pair",
        });
    }
    let (values, vectors) = positive_eigen(omega1)?;
    let sqrt1 = spectral_function(&values, &vectors, f64::sqrt);
    let inv_sqrt1 = spectral_function(&values, &vectors, |v| 1.0 / v.sqrt());
    let c = inv_sqrt1.dot(&omega2).dot(&inv_sqrt1);
    let c = (&c + &c.t()) * 0.5;
    let (lambdas, h) = sorted_symmetric_eigen(c.view())?;
    Ok(CovarianceDecomposition { w: sqrt1.dot(&h), lambdas: lambdas.insert_axis(Axis(1)) })
}

/// One-call form accepting an optional second matrix.
///
/// With `None`, returns `W = Ω₁^{1/2}` and an empty `d × 0` λ matrix; with
/// `Some(Ω₂)` it is [`simultaneous_diagonalize`].
pub fn diagonalize_covariances(
    omega1: ArrayView2<f64>, omega2: Option<ArrayView2<f64>>,
) -> LinalgResult<CovarianceDecomposition> {
    match omega2 {
        Some(o2) => simultaneous_diagonalize(omega1, o2),
        None => {
            let w = symmetric_sqrt(omega1)?;
            let d = w.nrows();
            Ok(CovarianceDecomposition { w, lambdas: Array2::zeros((d, 0)) })
        }
    }
}

/// decompose_covariances — checked decomposition of an M-regime family.
///
/// Purpose
/// -------
/// Build `(W, λ)` from `Ω₁, …, Ω_M`. For `M ≤ 2` the decomposition always
/// exists and is exact. For `M > 2` it generally does not exist: `W` is
/// taken from the first pair, `λ_m = diag(W⁻¹ Ω_m W⁻ᵀ)` for the remaining
/// regimes, and the largest off-diagonal entry of `W⁻¹ Ω_m W⁻ᵀ` is compared
/// against `tol · max(1, max|λ_m|)`.
///
/// Errors
/// ------
/// - `LinalgError::DimensionMismatch` for an empty slice or ragged shapes.
/// - `LinalgError::SingularMatrix` if `W` cannot be inverted.
/// - `LinalgError::NotSimultaneouslyDiagonalizable` when the residual check
///   fails for some regime. `DIAGONALIZATION_TOL` is the customary `tol`.
/// - Any error of [`simultaneous_diagonalize`].
pub fn decompose_covariances(
    omegas: &[Array2<f64>], tol: f64,
) -> LinalgResult<CovarianceDecomposition> {
    match omegas {
        [] => Err(LinalgError::DimensionMismatch {
            expected: 1,
            found: 0,
            what: "number of covariance matrices",
        }),
        [only] => diagonalize_covariances(only.view(), None),
        [first, second] => simultaneous_diagonalize(first.view(), second.view()),
        [first, second, rest @ ..] => {
            let pair = simultaneous_diagonalize(first.view(), second.view())?;
            let d = pair.w.nrows();
            let w_inv = to_dmatrix(pair.w.view())
                .try_inverse()
                .ok_or(LinalgError::SingularMatrix { what: "shared basis W" })?;
            let w_inv = crate::linalg::special::from_dmatrix(&w_inv);
            let mut lambdas = Array2::<f64>::zeros((d, omegas.len() - 1));
            lambdas.column_mut(0).assign(&pair.lambdas.column(0));
            for (k, omega) in rest.iter().enumerate() {
                let regime = k + 2;
                if omega.dim() != (d, d) {
                    return Err(LinalgError::DimensionMismatch {
                        expected: d,
                        found: omega.nrows(),
                        what: "covariance matrix",
                    });
                }
                let inner = w_inv.dot(omega).dot(&w_inv.t());
                let diag = inner.diag().to_owned();
                let scale = diag.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
                let residual = inner
                    .indexed_iter()
                    .filter(|((i, j), _)| i != j)
                    .fold(0.0_f64, |acc, (_, v)| acc.max(v.abs()));
                if residual > tol * scale {
                    return Err(LinalgError::NotSimultaneouslyDiagonalizable { regime, residual });
                }
                lambdas.column_mut(regime - 1).assign(&diag);
            }
            Ok(CovarianceDecomposition { w: pair.w, lambdas })
        }
    }
}

/// redecompose — express `(W, λ)` relative to another base regime.
///
/// Purpose
/// -------
/// Reorder the regimes of a simultaneous diagonalization so that new regime
/// `i` is old regime `perm[i]`. When the base regime changes, the
/// decomposition is rebuilt as `W̃ = W diag(√λ_{perm[0]})` and
/// `λ̃_i = λ_{perm[i]} / λ_{perm[0]}` elementwise (with `λ_0 ≡ 1`).
///
/// Parameters
/// ----------
/// - `m`: `usize`
///   Number of regimes.
/// - `d`: `usize`
///   Dimension of the series.
/// - `w`: `ArrayView2<f64>`
///   `d × d` shared basis.
/// - `lambdas`: `ArrayView2<f64>`
///   `d × (m−1)` relative eigenvalues.
/// - `perm`: `&[usize]`
///   0-based permutation of `0..m`.
///
/// Returns
/// -------
/// `LinalgResult<CovarianceDecomposition>`
///   - unchanged copy when `perm` is the identity,
///   - column-permuted λ when `perm[0] == 0`,
///   - rescaled `W` and re-based λ otherwise.
///
/// Errors
/// ------
/// - `LinalgError::InvalidPermutation` when `perm` is not a permutation of
///   `0..m`.
/// - `LinalgError::DimensionMismatch` when `w` or `lambdas` do not match
///   `(m, d)`.
///
/// Notes
/// -----
/// - λ entries of the new base regime are assumed strictly positive; this
///   holds for any decomposition of positive definite matrices.
/// - Applying `perm` and then its inverse permutation recovers the input up
///   to rounding.
pub fn redecompose(
    m: usize, d: usize, w: ArrayView2<f64>, lambdas: ArrayView2<f64>, perm: &[usize],
) -> LinalgResult<CovarianceDecomposition> {
    validate_permutation(m, perm)?;
    if w.dim() != (d, d) {
        return Err(LinalgError::DimensionMismatch { expected: d, found: w.nrows(), what: "W" });
    }
    if lambdas.dim() != (d, m.saturating_sub(1)) {
        return Err(LinalgError::DimensionMismatch {
            expected: m.saturating_sub(1),
            found: lambdas.ncols(),
            what: "lambda columns",
        });
    }
    if perm.iter().enumerate().all(|(i, &p)| i == p) {
        return Ok(CovarianceDecomposition { w: w.to_owned(), lambdas: lambdas.to_owned() });
    }

    let mut new_lambdas = Array2::<f64>::zeros((d, m - 1));
    if perm[0] == 0 {
        for i in 1..m {
            new_lambdas.column_mut(i - 1).assign(&lambdas.column(perm[i] - 1));
        }
        return Ok(CovarianceDecomposition { w: w.to_owned(), lambdas: new_lambdas });
    }

    let base = lambdas.column(perm[0] - 1);
    let new_w = &w * &base.mapv(f64::sqrt);
    for i in 1..m {
        let relative = relative_lambda(lambdas, perm[i], base);
        new_lambdas.column_mut(i - 1).assign(&relative);
    }
    Ok(CovarianceDecomposition { w: new_w, lambdas: new_lambdas })
}

// ---- Helpers ----

fn relative_lambda(lambdas: ArrayView2<f64>, regime: usize, base: ArrayView1<f64>) -> Array1<f64> {
    if regime == 0 { base.mapv(|b| 1.0 / b) } else { &lambdas.column(regime - 1) / &base }
}

fn validate_permutation(m: usize, perm: &[usize]) -> LinalgResult<()> {
    if perm.len() != m {
        return Err(LinalgError::InvalidPermutation { m, reason: "length must equal m" });
    }
    let mut seen = vec![false; m];
    for &p in perm {
        if p >= m {
            return Err(LinalgError::InvalidPermutation { m, reason: "entry out of range" });
        }
        if seen[p] {
            return Err(LinalgError::InvalidPermutation { m, reason: "repeated entry" });
        }
        seen[p] = true;
    }
    Ok(())
}

fn positive_eigen(omega: ArrayView2<f64>) -> LinalgResult<(Array1<f64>, Array2<f64>)> {
    let (values, vectors) = sorted_symmetric_eigen(omega)?;
    if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| **v <= 0.0) {
        return Err(LinalgError::NotPositiveDefinite { index, value });
    }
    Ok((values, vectors))
}

/// `V diag(f(ν)) V'` for a symmetric eigendecomposition.
fn spectral_function<F: Fn(f64) -> f64>(
    values: &Array1<f64>, vectors: &Array2<f64>, f: F,
) -> Array2<f64> {
    let scaled = vectors * &values.mapv(f);
    scaled.dot(&vectors.t())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::tolerances::DIAGONALIZATION_TOL;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Reconstruction of Ω₁ and Ω₂ from the simultaneous diagonalization
    //   for d = 2, 3, 4.
    // - Identity, base-preserving and base-changing permutations in
    //   `redecompose`, including the inverse-permutation round trip.
    // - The residual check of `decompose_covariances` for M > 2.
    // - Loud failure on non-positive-definite input.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-8;

    fn assert_matrices_close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
        assert_eq!(a.shape(), b.shape(), "shape mismatch: {:?} vs {:?}", a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, *y, epsilon = tol, max_relative = tol);
        }
    }

    /// Deterministic SPD matrix `G G' + d·I` from a seeded pattern.
    fn spd(d: usize, seed: f64) -> Array2<f64> {
        let g = Array2::from_shape_fn((d, d), |(i, j)| {
            ((i * d + j) as f64 * 0.7 + seed).sin() + if i == j { 0.5 } else { 0.0 }
        });
        g.dot(&g.t()) + Array2::<f64>::eye(d) * (d as f64 * 0.1)
    }

    #[test]
    // Purpose
    // -------
    // The simultaneous diagonalization reproduces both covariance matrices.
    //
    // Given
    // -----
    // - Pairs of deterministic SPD matrices for d = 2, 3, 4.
    //
    // Expect
    // ------
    // - W W' ≈ Ω₁ and W diag(λ) W' ≈ Ω₂ to 1e-8.
    // - λ sorted decreasingly.
    fn simultaneous_diagonalize_reconstructs_both_covariances() {
        for d in 2..=4 {
            let omega1 = spd(d, 0.3);
            let omega2 = spd(d, 1.9);

            let dec = simultaneous_diagonalize(omega1.view(), omega2.view()).unwrap();

            assert_matrices_close(&dec.omega(0), &omega1, TOL);
            assert_matrices_close(&dec.omega(1), &omega2, TOL);
            let lambdas = dec.lambdas.column(0);
            assert!(lambdas.windows(2).into_iter().all(|w| w[0] >= w[1]));
        }
    }

    #[test]
    // Purpose
    // -------
    // With a single matrix the decomposition is the symmetric square root.
    //
    // Given
    // -----
    // - Ω = [[4, 1], [1, 3]].
    //
    // Expect
    // ------
    // - W is symmetric, W·W ≈ Ω, and λ has zero columns.
    fn single_matrix_returns_symmetric_square_root() {
        let omega = array![[4.0, 1.0], [1.0, 3.0]];

        let dec = diagonalize_covariances(omega.view(), None).unwrap();

        assert_eq!(dec.lambdas.dim(), (2, 0));
        assert_relative_eq!(dec.w[[0, 1]], dec.w[[1, 0]], epsilon = 1e-12);
        assert_matrices_close(&dec.w.dot(&dec.w), &omega, TOL);
    }

    #[test]
    // Purpose
    // -------
    // Non-positive-definite input fails loudly instead of producing NaNs.
    //
    // Given
    // -----
    // - An indefinite symmetric matrix with eigenvalues 3 and −1.
    //
    // Expect
    // ------
    // - `NotPositiveDefinite` from `symmetric_sqrt`.
    fn symmetric_sqrt_rejects_indefinite_matrix() {
        let omega = array![[1.0, 2.0], [2.0, 1.0]];

        let err = symmetric_sqrt(omega.view()).unwrap_err();

        assert!(matches!(err, LinalgError::NotPositiveDefinite { index: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // The identity permutation leaves the decomposition untouched and a
    // base-preserving permutation only reorders λ columns.
    //
    // Given
    // -----
    // - M = 3, d = 2 with hand-written W and λ.
    //
    // Expect
    // ------
    // - perm = [0, 1, 2] returns an exact copy.
    // - perm = [0, 2, 1] swaps the λ columns and keeps W.
    fn redecompose_identity_and_base_preserving_permutations() {
        let w = array![[1.0, 0.2], [-0.4, 0.8]];
        let lambdas = array![[2.0, 0.5], [0.3, 1.5]];

        let same = redecompose(3, 2, w.view(), lambdas.view(), &[0, 1, 2]).unwrap();
        let swapped = redecompose(3, 2, w.view(), lambdas.view(), &[0, 2, 1]).unwrap();

        assert_eq!(same.w, w);
        assert_eq!(same.lambdas, lambdas);
        assert_eq!(swapped.w, w);
        assert_eq!(swapped.lambdas, array![[0.5, 2.0], [1.5, 0.3]]);
    }

    #[test]
    // Purpose
    // -------
    // Changing the base regime preserves the covariance family and the
    // inverse permutation restores the original decomposition.
    //
    // Given
    // -----
    // - M = 3, d = 2, perm = [1, 2, 0] whose inverse is [2, 0, 1].
    //
    // Expect
    // ------
    // - New regime i reproduces old Ω_{perm[i]}.
    // - Applying the inverse permutation recovers (W, λ) to 1e-10.
    fn redecompose_round_trips_through_inverse_permutation() {
        let w = array![[1.0, 0.2], [-0.4, 0.8]];
        let lambdas = array![[2.0, 0.5], [0.3, 1.5]];
        let original = CovarianceDecomposition { w: w.clone(), lambdas: lambdas.clone() };
        let perm = [1, 2, 0];
        let inverse = [2, 0, 1];

        let moved = redecompose(3, 2, w.view(), lambdas.view(), &perm).unwrap();
        let back =
            redecompose(3, 2, moved.w.view(), moved.lambdas.view(), &inverse).unwrap();

        for (i, &old) in perm.iter().enumerate() {
            assert_matrices_close(&moved.omega(i), &original.omega(old), 1e-10);
        }
        assert_matrices_close(&back.w, &w, 1e-10);
        assert_matrices_close(&back.lambdas, &lambdas, 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Permutation validation.
    //
    // Given
    // -----
    // - Wrong length, out-of-range and repeated entries.
    //
    // Expect
    // ------
    // - `InvalidPermutation` for each.
    fn redecompose_rejects_invalid_permutations() {
        let w = Array2::<f64>::eye(2);
        let lambdas = array![[2.0], [0.5]];

        for perm in [&[0usize][..], &[0, 2][..], &[1, 1][..]] {
            let err = redecompose(2, 2, w.view(), lambdas.view(), perm).unwrap_err();
            assert!(matches!(err, LinalgError::InvalidPermutation { m: 2, .. }));
        }
    }

    #[test]
    // Purpose
    // -------
    // For M > 2 the checked decomposition accepts a family built from a
    // shared W and rejects a generic one.
    //
    // Given
    // -----
    // - Ω_m = W diag(λ_m) W' for three regimes.
    // - A third regime replaced by an unrelated SPD matrix.
    //
    // Expect
    // ------
    // - The first family decomposes and reproduces Ω₃.
    // - The second fails with `NotSimultaneouslyDiagonalizable { regime: 2 }`.
    fn decompose_covariances_checks_more_than_two_regimes() {
        let truth = CovarianceDecomposition {
            w: array![[1.0, 0.3], [0.2, 0.9]],
            lambdas: array![[3.0, 0.4], [0.5, 2.0]],
        };
        let family = vec![truth.omega(0), truth.omega(1), truth.omega(2)];
        let broken = vec![truth.omega(0), truth.omega(1), spd(2, 5.0)];

        let dec = decompose_covariances(&family, DIAGONALIZATION_TOL).unwrap();
        let err = decompose_covariances(&broken, DIAGONALIZATION_TOL).unwrap_err();

        assert_matrices_close(&dec.omega(2), &family[2], 1e-8);
        assert!(matches!(err, LinalgError::NotSimultaneouslyDiagonalizable { regime: 2, .. }));
    }
}
