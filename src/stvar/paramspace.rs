//! Parameter-space check for candidate structural matrices.
//!
//! Purpose
//! -------
//! Decide whether a reformed candidate lies in the admissible parameter
//! space before the likelihood is evaluated. Violations are values, not
//! errors: the optimizer penalizes them, while genuine failures (solver
//! breakdown, mismatched structure) still come back as `StvarError`.
//!
//! Checks, in evaluation order (cheap first):
//! 1. weight parameters,
//! 2. distribution parameters,
//! 3. strictly positive λ under heteroskedasticity identification,
//! 4. sign constraints of the B template,
//! 5. positive definiteness of every `Ω_m`,
//! 6. stationarity of every regime (companion spectral radius).
use crate::{
    diagnostics::companion::{companion_matrix, spectral_radius},
    linalg::{
        decomposition::sorted_symmetric_eigen,
        tolerances::{POSDEF_TOL, STATIONARITY_TOL},
    },
    stvar::{
        config::{BEntry, CondDist, Identification, StvarConfig, WeightFunction},
        errors::StvarResult,
        structural::StructuralMatrices,
    },
};
use ndarray::ArrayView2;

/// Tolerances of the parameter-space check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpaceTolerances {
    /// A regime is non-stationary when its spectral radius is `≥ 1 − stat_tol`.
    pub stat_tol: f64,
    /// A covariance matrix is rejected when its smallest eigenvalue is `≤ posdef_tol`.
    pub posdef_tol: f64,
}

impl Default for ParamSpaceTolerances {
    fn default() -> Self {
        ParamSpaceTolerances { stat_tol: STATIONARITY_TOL, posdef_tol: POSDEF_TOL }
    }
}

/// First reason a candidate lies outside the parameter space.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSpaceViolation {
    // ---- Weights and distribution ----
    WeightParams { reason: &'static str },
    DistParams { index: usize, value: f64, reason: &'static str },

    // ---- Identification ----
    NonPositiveLambda { regime: usize, index: usize, value: f64 },
    BSign { regime: usize, row: usize, col: usize, value: f64 },

    // ---- Covariance and dynamics ----
    CovarianceNotPositiveDefinite { regime: usize, min_eigenvalue: f64 },
    NonStationary { regime: usize, spectral_radius: f64 },
}

impl std::fmt::Display for ParamSpaceViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamSpaceViolation::WeightParams { reason } => {
                write!(f, "Invalid weight parameters: {reason}")
            }
            ParamSpaceViolation::DistParams { index, value, reason } => {
                write!(f, "Invalid distribution parameter {index} = {value}: {reason}")
            }
            ParamSpaceViolation::NonPositiveLambda { regime, index, value } => {
                write!(f, "lambda[{index}] of regime {regime} is {value}, must be > 0")
            }
            ParamSpaceViolation::BSign { regime, row, col, value } => {
                write!(
                    f,
                    "B[{row}, {col}] of regime {regime} is {value}, violates its sign constraint"
                )
            }
            ParamSpaceViolation::CovarianceNotPositiveDefinite { regime, min_eigenvalue } => {
                write!(
                    f,
                    "Covariance matrix of regime {regime} is not positive definite \
                     (smallest eigenvalue {min_eigenvalue})"
                )
            }
            ParamSpaceViolation::NonStationary { regime, spectral_radius } => {
                write!(f, "Regime {regime} is not stationary (spectral radius {spectral_radius})")
            }
        }
    }
}

/// check_parameter_space — first violation of the admissible parameter space.
///
/// Parameters
/// ----------
/// - `config`: `&StvarConfig`
/// - `sm`: `&StructuralMatrices`
///   Reformed candidate, normally from `reform_parameters(config, θ)`.
/// - `tol`: `&ParamSpaceTolerances`
///
/// Returns
/// -------
/// `StvarResult<Option<ParamSpaceViolation>>`
///   `Ok(None)` for an admissible candidate, `Ok(Some(v))` for the first
///   violation in the order listed in the module documentation.
///
/// Errors
/// ------
/// - `LinalgError::EigenNotConverged` (wrapped) from the eigen solvers.
///
/// Notes
/// -----
/// - Relative-density weights need `α_m > 0` and `Σ α_m < 1`;
///   logistic/exponential need a positive scale `γ` (second parameter);
///   thresholds must be strictly increasing. Multinomial-logit and
///   exogenous weights are unrestricted.
/// - Student degrees of freedom must exceed 2, skewness parameters of the
///   skewed t lie in (−1, 1).
pub fn check_parameter_space(
    config: &StvarConfig, sm: &StructuralMatrices, tol: &ParamSpaceTolerances,
) -> StvarResult<Option<ParamSpaceViolation>> {
    if let Some(v) = check_weights(config.weight_function(), sm.weight_params.as_slice()) {
        return Ok(Some(v));
    }
    if let Some(v) = check_dist(config.cond_dist(), config.d(), sm.dist_params.as_slice()) {
        return Ok(Some(v));
    }

    if let Some(decomposition) = &sm.decomposition {
        for ((index, col), value) in decomposition.lambdas.indexed_iter() {
            if *value <= 0.0 {
                return Ok(Some(ParamSpaceViolation::NonPositiveLambda {
                    regime: col + 1,
                    index,
                    value: *value,
                }));
            }
        }
    }

    if let Some(bc) = config.b_constraints() {
        let template = bc.template();
        match config.identification() {
            Identification::Heteroskedasticity => {
                if let Some(decomposition) = &sm.decomposition {
                    if let Some(v) = check_signs(template, decomposition.w.view(), 0) {
                        return Ok(Some(v));
                    }
                }
            }
            Identification::NonGaussianity => {
                for (regime, b) in sm.impact.iter().flatten().enumerate() {
                    if let Some(v) = check_signs(template, b.view(), regime) {
                        return Ok(Some(v));
                    }
                }
            }
            _ => {}
        }
    }

    for (regime, omega) in sm.omegas.iter().enumerate() {
        let (values, _) = sorted_symmetric_eigen(omega.view())?;
        let min_eigenvalue = values.iter().copied().fold(f64::INFINITY, f64::min);
        if min_eigenvalue <= tol.posdef_tol {
            return Ok(Some(ParamSpaceViolation::CovarianceNotPositiveDefinite {
                regime,
                min_eigenvalue,
            }));
        }
    }

    for (regime, lags) in sm.ar.iter().enumerate() {
        let radius = spectral_radius(companion_matrix(lags.view()).view())?;
        if radius >= 1.0 - tol.stat_tol {
            return Ok(Some(ParamSpaceViolation::NonStationary { regime, spectral_radius: radius }));
        }
    }

    Ok(None)
}

fn check_weights(
    weight_function: WeightFunction, params: Option<&[f64]>,
) -> Option<ParamSpaceViolation> {
    let params = params.unwrap_or(&[]);
    let reason = match weight_function {
        WeightFunction::RelativeDens => {
            if params.iter().any(|a| *a <= 0.0) {
                Some("relative_dens weights must be positive")
            } else if params.iter().sum::<f64>() >= 1.0 {
                Some("relative_dens weights must sum to less than one")
            } else {
                None
            }
        }
        WeightFunction::Logistic | WeightFunction::Exponential => {
            match params.get(1) {
                Some(gamma) if *gamma <= 0.0 => Some("scale parameter must be positive"),
                _ => None,
            }
        }
        WeightFunction::Threshold => {
            if params.windows(2).any(|w| w[0] >= w[1]) {
                Some("thresholds must be strictly increasing")
            } else {
                None
            }
        }
        WeightFunction::Mlogit { .. } | WeightFunction::Exogenous => None,
    };
    reason.map(|reason| ParamSpaceViolation::WeightParams { reason })
}

fn check_dist(
    cond_dist: CondDist, d: usize, params: Option<&[f64]>,
) -> Option<ParamSpaceViolation> {
    const DF_REASON: &str = "degrees of freedom must exceed 2";
    let params = params.unwrap_or(&[]);
    let n_df = match cond_dist {
        CondDist::Gaussian => 0,
        CondDist::Student => 1,
        CondDist::IndStudent | CondDist::IndSkewedT => d,
    }
    .min(params.len());
    if let Some((index, value)) = params[..n_df].iter().enumerate().find(|(_, v)| **v <= 2.0) {
        return Some(ParamSpaceViolation::DistParams { index, value: *value, reason: DF_REASON });
    }
    if cond_dist == CondDist::IndSkewedT {
        if let Some((k, value)) = params[n_df..].iter().enumerate().find(|(_, v)| v.abs() >= 1.0) {
            return Some(ParamSpaceViolation::DistParams {
                index: n_df + k,
                value: *value,
                reason: "skewness parameters must lie in (-1, 1)",
            });
        }
    }
    None
}

fn check_signs(
    template: ArrayView2<BEntry>, b: ArrayView2<f64>, regime: usize,
) -> Option<ParamSpaceViolation> {
    template.indexed_iter().find_map(|((row, col), entry)| {
        let value = b[[row, col]];
        let violated = match entry {
            BEntry::Positive => value <= 0.0,
            BEntry::Negative => value >= 0.0,
            BEntry::Free | BEntry::Zero => false,
        };
        violated.then_some(ParamSpaceViolation::BSign { regime, row, col, value })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stvar::reform::reform_parameters;
    use ndarray::{Array1, array};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - An admissible candidate passes.
    // - Each violation kind is reported for a minimal offending candidate.
    //
    // They intentionally DO NOT cover:
    // - Penalization of violations; see `optimization::objective`.
    // -------------------------------------------------------------------------

    fn admissible_theta() -> Array1<f64> {
        array![
            0.1, 0.2, -0.1, 0.0, // φ
            0.5, 0.1, 0.0, 0.3, // A_1
            0.2, 0.0, 0.1, 0.4, // A_2
            1.0, 0.2, 1.5, // vech Ω_1
            0.8, -0.1, 0.6, // vech Ω_2
            0.6, // α
        ]
    }

    #[test]
    // Purpose
    // -------
    // A stable, positive definite candidate is admissible.
    //
    // Given
    // -----
    // - p = 1, M = 2, d = 2 reduced form with stable A_m and PD Ω_m.
    //
    // Expect
    // ------
    // - `Ok(None)`.
    fn admissible_candidate_passes() {
        let config = StvarConfig::builder(1, 2, 2).build().unwrap();
        let sm = reform_parameters(&config, admissible_theta().view()).unwrap();

        let violation =
            check_parameter_space(&config, &sm, &ParamSpaceTolerances::default()).unwrap();

        assert_eq!(violation, None);
    }

    #[test]
    // Purpose
    // -------
    // Each reduced-form violation is reported with its regime.
    //
    // Given
    // -----
    // - The admissible θ perturbed to: α = 1.2; Ω_2 with a negative
    //   eigenvalue; A_2 with a unit root.
    //
    // Expect
    // ------
    // - WeightParams, CovarianceNotPositiveDefinite(regime 1),
    //   NonStationary(regime 1).
    fn reduced_form_violations_are_reported() {
        let config = StvarConfig::builder(1, 2, 2).build().unwrap();
        let tol = ParamSpaceTolerances::default();
        let check = |theta: Array1<f64>| {
            let sm = reform_parameters(&config, theta.view()).unwrap();
            check_parameter_space(&config, &sm, &tol).unwrap()
        };

        let mut weights = admissible_theta();
        weights[18] = 1.2;
        let mut cov = admissible_theta();
        cov[16] = 2.0;
        let mut unit_root = admissible_theta();
        unit_root[8] = 1.0;
        unit_root[11] = 0.0;

        assert!(matches!(check(weights), Some(ParamSpaceViolation::WeightParams { .. })));
        assert!(matches!(
            check(cov),
            Some(ParamSpaceViolation::CovarianceNotPositiveDefinite { regime: 1, .. })
        ));
        assert!(matches!(
            check(unit_root),
            Some(ParamSpaceViolation::NonStationary { regime: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Identification-specific violations: λ, B signs, degrees of freedom.
    //
    // Given
    // -----
    // - Heteroskedasticity with λ_2 = (0.5, −0.5).
    // - Non-Gaussianity (ind_Student) with B_1[0, 0] constrained positive
    //   but negative, and another candidate with ν_1 = 1.5.
    //
    // Expect
    // ------
    // - NonPositiveLambda(regime 1, index 1), BSign(regime 0, 0, 0),
    //   DistParams(index 0).
    fn identification_violations_are_reported() {
        let tol = ParamSpaceTolerances::default();
        let hetero = StvarConfig::builder(1, 2, 2)
            .identification(Identification::Heteroskedasticity)
            .build()
            .unwrap();
        let mut theta = Array1::<f64>::zeros(hetero.n_params());
        theta.slice_mut(ndarray::s![12..16]).assign(&array![1.0, 0.0, 0.0, 1.0]);
        theta.slice_mut(ndarray::s![16..18]).assign(&array![0.5, -0.5]);
        theta[18] = 0.5;
        let sm = reform_parameters(&hetero, theta.view()).unwrap();

        assert_eq!(
            check_parameter_space(&hetero, &sm, &tol).unwrap(),
            Some(ParamSpaceViolation::NonPositiveLambda { regime: 1, index: 1, value: -0.5 })
        );

        let template = array![[BEntry::Positive, BEntry::Zero], [BEntry::Free, BEntry::Free]];
        let ng = StvarConfig::builder(1, 2, 2)
            .cond_dist(CondDist::IndStudent)
            .identification(Identification::NonGaussianity)
            .b_constraints(template)
            .build()
            .unwrap();
        let mut theta = Array1::<f64>::zeros(ng.n_params());
        // B_1 = [[−1, 0], [0, 1]], B_2 = [[1, 0], [0, 1]] (pruned: 3 entries each)
        theta.slice_mut(ndarray::s![12..18]).assign(&array![-1.0, 0.0, 1.0, 1.0, 0.0, 1.0]);
        theta[18] = 0.5;
        theta.slice_mut(ndarray::s![19..21]).assign(&array![5.0, 5.0]);
        let sm = reform_parameters(&ng, theta.view()).unwrap();

        assert!(matches!(
            check_parameter_space(&ng, &sm, &tol).unwrap(),
            Some(ParamSpaceViolation::BSign { regime: 0, row: 0, col: 0, .. })
        ));

        theta[12] = 1.0;
        theta[19] = 1.5;
        let sm = reform_parameters(&ng, theta.view()).unwrap();

        assert!(matches!(
            check_parameter_space(&ng, &sm, &tol).unwrap(),
            Some(ParamSpaceViolation::DistParams { index: 0, .. })
        ));
    }
}
