//! Structural matrices of an STVAR model, expanded from a parameter vector.
//!
//! [`StructuralMatrices`] is the ephemeral, per-call result of the reform:
//! intercepts (and means when mean-parametrized), AR coefficients per
//! regime and lag, regime covariance matrices, and the identification
//! objects (shared basis `(W, λ)` or impact matrices `B_m`). It is never
//! cached across calls; diagnostics and the likelihood evaluator borrow it.
use crate::{
    linalg::{
        decomposition::{CovarianceDecomposition, sorted_symmetric_eigen},
        errors::LinalgError,
        special::{from_dmatrix, to_dmatrix},
    },
    stvar::{
        config::Identification,
        errors::{StvarError, StvarResult},
    },
};
use nalgebra::{Cholesky, DVector};
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis, s};

/// Structural matrices of an STVAR(p, M, d) model.
///
/// Shapes
/// ------
/// - `intercepts`: `d × M`, column `m` is `φ_m`.
/// - `means`: `d × M`, present only under the mean parametrization.
/// - `ar`: one `(p, d, d)` array per regime; `ar[m].index_axis(Axis(0), i)`
///   is `A_{m,i+1}`.
/// - `omegas`: one `d × d` covariance matrix per regime.
/// - `impact`: `B_m` per regime under non-Gaussianity identification.
/// - `decomposition`: `(W, λ)` under heteroskedasticity identification.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralMatrices {
    pub p: usize,
    pub m: usize,
    pub d: usize,
    pub identification: Identification,
    pub intercepts: Array2<f64>,
    pub means: Option<Array2<f64>>,
    pub ar: Vec<Array3<f64>>,
    pub omegas: Vec<Array2<f64>>,
    pub impact: Option<Vec<Array2<f64>>>,
    pub decomposition: Option<CovarianceDecomposition>,
    pub weight_params: Array1<f64>,
    pub dist_params: Array1<f64>,
}

impl StructuralMatrices {
    /// AR matrix `A_{m,i+1}` for 0-based regime `m` and lag index `i`.
    pub fn ar_matrix(&self, m: usize, i: usize) -> ArrayView2<'_, f64> {
        self.ar[m].index_axis(Axis(0), i)
    }

    /// `Σ_i A_{m,i}` for a 0-based regime.
    pub fn ar_sum(&self, m: usize) -> Array2<f64> {
        self.ar[m].sum_axis(Axis(0))
    }

    /// Regime means `μ_m = (I − Σ_i A_{m,i})⁻¹ φ_m` as a `d × M` matrix.
    ///
    /// Under the mean parametrization the stored means are returned as is.
    ///
    /// Errors
    /// ------
    /// - `LinalgError::SingularMatrix` when `I − Σ_i A_{m,i}` is singular
    ///   (a unit root in regime `m`).
    pub fn regime_means(&self) -> StvarResult<Array2<f64>> {
        if let Some(means) = &self.means {
            return Ok(means.clone());
        }
        let mut means = Array2::<f64>::zeros((self.d, self.m));
        for regime in 0..self.m {
            let lhs = Array2::<f64>::eye(self.d) - self.ar_sum(regime);
            let rhs =
                DVector::from_iterator(self.d, self.intercepts.column(regime).iter().copied());
            let mu = to_dmatrix(lhs.view())
                .lu()
                .solve(&rhs)
                .ok_or(LinalgError::SingularMatrix { what: "I - sum of AR matrices" })?;
            for (k, v) in mu.iter().enumerate() {
                means[[k, regime]] = *v;
            }
        }
        Ok(means)
    }

    /// Structural impact matrices `B_m`, one per regime.
    ///
    /// - Recursive: lower Cholesky factor of `Ω_m`.
    /// - Heteroskedasticity: `W diag(√λ_m)`.
    /// - Non-Gaussianity: the estimated `B_m`.
    ///
    /// Errors
    /// ------
    /// - `StvarError::Unsupported` under reduced form.
    /// - `LinalgError::NotPositiveDefinite` when a Cholesky factor or a
    ///   `√λ` does not exist.
    pub fn impact_matrices(&self) -> StvarResult<Vec<Array2<f64>>> {
        match self.identification {
            Identification::ReducedForm => Err(StvarError::Unsupported {
                operation: "impact matrices",
                identification: self.identification.as_str(),
            }),
            Identification::Recursive => self
                .omegas
                .iter()
                .enumerate()
                .map(|(regime, omega)| cholesky_lower(omega.view(), regime))
                .collect(),
            Identification::Heteroskedasticity => {
                let decomposition = self.decomposition.as_ref().ok_or(
                    StvarError::StructureMismatch { what: "decomposition", expected: 1, found: 0 },
                )?;
                for ((_, col), lambda) in decomposition.lambdas.indexed_iter() {
                    if *lambda <= 0.0 {
                        return Err(LinalgError::NotPositiveDefinite {
                            index: col + 1,
                            value: *lambda,
                        }
                        .into());
                    }
                }
                Ok((0..self.m).map(|regime| decomposition.impact(regime)).collect())
            }
            Identification::NonGaussianity => self.impact.clone().ok_or(
                StvarError::StructureMismatch {
                    what: "impact matrices",
                    expected: self.m,
                    found: 0,
                },
            ),
        }
    }

    /// Stack regime `m`'s AR matrices as `[A_{m,1} : … : A_{m,p}]` (d × dp).
    pub fn stacked_ar(&self, m: usize) -> Array2<f64> {
        let mut out = Array2::<f64>::zeros((self.d, self.d * self.p));
        for i in 0..self.p {
            out.slice_mut(s![.., i * self.d..(i + 1) * self.d]).assign(&self.ar_matrix(m, i));
        }
        out
    }
}

fn cholesky_lower(omega: ArrayView2<f64>, regime: usize) -> StvarResult<Array2<f64>> {
    match Cholesky::new(to_dmatrix(omega)) {
        Some(chol) => Ok(from_dmatrix(&chol.l())),
        None => {
            let (values, _) = sorted_symmetric_eigen(omega)?;
            let smallest = values.iter().copied().fold(f64::INFINITY, f64::min);
            Err(LinalgError::NotPositiveDefinite { index: regime, value: smallest }.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Regime means from intercepts and the unit-root failure.
    // - Impact matrices for each identification.
    //
    // They intentionally DO NOT cover:
    // - Construction from a parameter vector; see `stvar::reform`.
    // -------------------------------------------------------------------------

    fn two_regime_var1(identification: Identification) -> StructuralMatrices {
        let ar = vec![
            array![[[0.5, 0.1], [0.0, 0.3]]],
            array![[[0.2, 0.0], [0.1, 0.4]]],
        ];
        StructuralMatrices {
            p: 1,
            m: 2,
            d: 2,
            identification,
            intercepts: array![[1.0, 0.8], [0.7, -0.6]],
            means: None,
            ar,
            omegas: vec![array![[1.0, 0.3], [0.3, 2.0]], array![[0.5, -0.1], [-0.1, 0.4]]],
            impact: None,
            decomposition: None,
            weight_params: Array1::zeros(1),
            dist_params: Array1::zeros(0),
        }
    }

    #[test]
    // Purpose
    // -------
    // Regime means solve `(I − A_m) μ_m = φ_m`.
    //
    // Given
    // -----
    // - Two stable VAR(1) regimes with known intercepts.
    //
    // Expect
    // ------
    // - `(I − A_m) μ_m` reproduces `φ_m` for both regimes.
    fn regime_means_solve_the_stationary_mean_equation() {
        let sm = two_regime_var1(Identification::ReducedForm);

        let means = sm.regime_means().unwrap();

        for regime in 0..2 {
            let lhs = Array2::<f64>::eye(2) - sm.ar_sum(regime);
            let phi = lhs.dot(&means.column(regime));
            for (x, y) in phi.iter().zip(sm.intercepts.column(regime).iter()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // A unit root makes the mean equation singular.
    //
    // Given
    // -----
    // - Regime 0 with A = I.
    //
    // Expect
    // ------
    // - `LinalgError::SingularMatrix`.
    fn regime_means_fail_on_unit_root() {
        let mut sm = two_regime_var1(Identification::ReducedForm);
        sm.ar[0] = array![[[1.0, 0.0], [0.0, 1.0]]];

        let err = sm.regime_means().unwrap_err();

        assert!(matches!(err, StvarError::Linalg(LinalgError::SingularMatrix { .. })));
        assert!(err.is_numerical());
    }

    #[test]
    // Purpose
    // -------
    // Impact matrices follow the identification scheme.
    //
    // Given
    // -----
    // - The same covariances under reduced form, recursive and
    //   heteroskedasticity identification.
    //
    // Expect
    // ------
    // - Reduced form is unsupported.
    // - Recursive factors are lower triangular with `B B' = Ω`.
    // - A negative λ is reported as not positive definite.
    fn impact_matrices_follow_identification() {
        let reduced = two_regime_var1(Identification::ReducedForm);
        let recursive = two_regime_var1(Identification::Recursive);
        let mut hetero = two_regime_var1(Identification::Heteroskedasticity);
        hetero.decomposition = Some(CovarianceDecomposition {
            w: array![[1.0, 0.2], [0.0, 1.0]],
            lambdas: array![[0.5], [-0.1]],
        });

        assert!(matches!(reduced.impact_matrices(), Err(StvarError::Unsupported { .. })));
        let factors = recursive.impact_matrices().unwrap();
        for (b, omega) in factors.iter().zip(recursive.omegas.iter()) {
            assert_eq!(b[[0, 1]], 0.0);
            let rebuilt = b.dot(&b.t());
            for (x, y) in rebuilt.iter().zip(omega.iter()) {
                assert_relative_eq!(*x, *y, epsilon = 1e-12);
            }
        }
        assert!(matches!(
            hetero.impact_matrices(),
            Err(StvarError::Linalg(LinalgError::NotPositiveDefinite { index: 1, .. }))
        ));
    }

    #[test]
    // Purpose
    // -------
    // `stacked_ar` places lag blocks side by side.
    //
    // Given
    // -----
    // - d = 1, p = 2 with A_1 = 0.4, A_2 = −0.2.
    //
    // Expect
    // ------
    // - [0.4, −0.2].
    fn stacked_ar_places_lags_side_by_side() {
        let mut sm = two_regime_var1(Identification::ReducedForm);
        sm.p = 2;
        sm.d = 1;
        sm.ar = vec![array![[[0.4]], [[-0.2]]]];

        assert_eq!(sm.stacked_ar(0), array![[0.4, -0.2]]);
    }
}
