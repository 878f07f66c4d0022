//! Integration tests for the STVAR estimation core.
//!
//! Purpose
//! -------
//! - Validate the end-to-end flow an optimizer driver runs for every
//!   candidate: constrained θ → structural matrices → parameter-space check
//!   → diagnostics → penalized cost.
//! - Exercise the structural-identification tooling on reformed matrices:
//!   simultaneous diagonalization, change of base regime and canonical
//!   ordering of impact matrices.
//!
//! Coverage
//! --------
//! - `stvar`: configuration with constraints, reform and its inverse,
//!   parameter-space check.
//! - `diagnostics`: eigenvalue tables, degeneracy report, JSR bracket.
//! - `linalg`: `simultaneous_diagonalize`, `redecompose`,
//!   `order_by_sign_and_magnitude` on model output.
//! - `combinatorics`: multiset table consistent with its closed-form count.
//! - `optimization`: `PenalizedObjective` through `argmin`'s `CostFunction`.
//!
//! Exclusions
//! ----------
//! - Python bindings; they are thin wrappers over the functions used here.
//! - Optimizer convergence; the driver is external.
use approx::assert_relative_eq;
use argmin::core::CostFunction;
use ndarray::{Array1, Array2, array};
use rust_stvar::{
    combinatorics::{enumerate_multisets, multiset_count},
    diagnostics::{
        covariance_eigenvalues, regime_eigen_moduli, regime_jsr_bounds, warn_on_near_degenerate,
    },
    linalg::{
        DEFAULT_DEGENERACY_TOL, order_by_sign_and_magnitude, redecompose, simultaneous_diagonalize,
    },
    optimization::{PenalizedObjective, StructuralLogLikelihood},
    stvar::{
        BEntry, CondDist, Identification, ParamSpaceTolerances, StructuralMatrices, StvarConfig,
        WeightFunction, check_parameter_space, reform_parameters, to_constrained_theta,
    },
};

/// Gaussian VAR(1) log-likelihood of a fixed sample, using regime 0 only.
///
/// Purpose
/// -------
/// Stand in for the external likelihood evaluator with something that
/// depends on the intercepts, AR matrices and covariance of the candidate.
struct Regime0Gaussian;

impl StructuralLogLikelihood for Regime0Gaussian {
    type Data = Array2<f64>;

    fn log_likelihood(&self, sm: &StructuralMatrices, data: &Array2<f64>) -> anyhow::Result<f64> {
        let omega = &sm.omegas[0];
        let det = omega[[0, 0]] * omega[[1, 1]] - omega[[0, 1]] * omega[[1, 0]];
        anyhow::ensure!(det > 0.0, "covariance is singular");
        let inv = array![[omega[[1, 1]], -omega[[0, 1]]], [-omega[[1, 0]], omega[[0, 0]]]] / det;
        let a = sm.ar_matrix(0, 0);
        let mut ll = 0.0;
        for t in 1..data.nrows() {
            let prediction = &sm.intercepts.column(0) + &a.dot(&data.row(t - 1));
            let e = &data.row(t) - &prediction;
            ll -= 0.5 * (det.ln() + e.dot(&inv.dot(&e)));
        }
        Ok(ll)
    }
}

fn sample() -> Array2<f64> {
    Array2::from_shape_fn((40, 2), |(t, i)| ((t * (i + 2)) as f64 * 0.37).sin())
}

/// Reduced-form STVAR(1, 2, 2) with logistic weights.
fn reduced_form() -> (StvarConfig, Array1<f64>) {
    let config = StvarConfig::new(
        1,
        2,
        2,
        WeightFunction::Logistic,
        CondDist::Gaussian,
        Identification::ReducedForm,
    )
    .unwrap();
    let theta = array![
        0.1, -0.2, 0.3, 0.0, // φ_1, φ_2
        0.5, 0.1, 0.0, 0.3, // vec A_1
        0.2, -0.1, 0.1, 0.4, // vec A_2
        1.0, 0.2, 0.8, // vech Ω_1
        0.5, -0.1, 0.7, // vech Ω_2
        0.0, 2.0, // c, γ
    ];
    (config, theta)
}

#[test]
// Purpose
// -------
// One optimizer step: reform, check, diagnose and score a candidate.
//
// Given
// -----
// - The reduced-form STVAR(1, 2, 2) above and a fixed sample.
//
// Expect
// ------
// - Admissible candidate, clean degeneracy report, 2×2 tables.
// - Cost equals −ℓ computed directly; θ round trips.
fn optimizer_step_on_reduced_form_candidate() {
    let (config, theta) = reduced_form();
    let data = sample();

    let sm = reform_parameters(&config, theta.view()).unwrap();
    let violation = check_parameter_space(&config, &sm, &ParamSpaceTolerances::default()).unwrap();
    let moduli = regime_eigen_moduli(&config, theta.view()).unwrap();
    let cov = covariance_eigenvalues(&config, theta.view()).unwrap();
    let report = warn_on_near_degenerate(&config, theta.view(), DEFAULT_DEGENERACY_TOL).unwrap();
    let objective = PenalizedObjective::new(&config, &Regime0Gaussian, &data);
    let cost = objective.cost(&theta).unwrap();

    assert_eq!(violation, None);
    assert_eq!(moduli.dim(), (2, 2));
    assert_eq!(cov.dim(), (2, 2));
    assert!(moduli.iter().all(|m| *m < 1.0));
    assert!(cov.iter().all(|v| *v > 0.0));
    assert!(report.is_clean());
    let direct = Regime0Gaussian.log_likelihood(&sm, &data).unwrap();
    assert_relative_eq!(cost, -direct, epsilon = 1e-12);
    let back = to_constrained_theta(&config, &sm).unwrap();
    for (x, y) in back.iter().zip(theta.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
}

#[test]
// Purpose
// -------
// A near-unit-root candidate is flagged by the advisory report but only
// penalized once it crosses the stationarity tolerance.
//
// Given
// -----
// - The reduced-form model with A_2 = diag(0.9985, 0.4) and then
//   diag(1.01, 0.4).
//
// Expect
// ------
// - First: admissible, regime 1 flagged near unit root.
// - Second: cost equals the penalty.
fn near_unit_root_is_advisory_then_penalized() {
    let (config, mut theta) = reduced_form();
    let data = sample();
    theta[8] = 0.9985;
    theta[9] = 0.0;
    theta[10] = 0.0;

    let sm = reform_parameters(&config, theta.view()).unwrap();
    let tolerances = ParamSpaceTolerances { stat_tol: 1e-4, ..ParamSpaceTolerances::default() };
    let objective = PenalizedObjective::new(&config, &Regime0Gaussian, &data)
        .with_tolerances(tolerances)
        .with_penalty(1e8);
    let report = warn_on_near_degenerate(&config, theta.view(), DEFAULT_DEGENERACY_TOL).unwrap();

    assert_eq!(check_parameter_space(&config, &sm, &tolerances).unwrap(), None);
    assert_eq!(report.flagged_regimes(), vec![1]);
    assert!(objective.cost(&theta).unwrap() < 1e8);

    theta[8] = 1.01;
    assert_eq!(objective.cost(&theta).unwrap(), 1e8);
}

#[test]
// Purpose
// -------
// Heteroskedasticity identification: the reformed (W, λ) agree with a
// fresh simultaneous diagonalization up to column sign/order, and a change
// of base regime round trips.
//
// Given
// -----
// - STVAR(1, 2, 2) identified by heteroskedasticity with
//   W = [[1.0, 0.4], [0.3, 0.9]] and λ = (2.0, 0.5).
//
// Expect
// ------
// - simultaneous_diagonalize(Ω_1, Ω_2) reproduces Ω_1, Ω_2.
// - Canonically ordered impact matrices of both decompositions agree.
// - redecompose with [1, 0] twice returns the original (W, λ).
fn heteroskedastic_identification_tooling() {
    let config = StvarConfig::new(
        1,
        2,
        2,
        WeightFunction::RelativeDens,
        CondDist::Gaussian,
        Identification::Heteroskedasticity,
    )
    .unwrap();
    let theta = array![
        0.0, 0.0, 0.0, 0.0, // φ
        0.3, 0.0, 0.0, 0.3, // A_1
        0.2, 0.0, 0.0, 0.2, // A_2
        1.0, 0.3, 0.4, 0.9, // vec W
        2.0, 0.5, // λ_2
        0.5, // α
    ];

    let sm = reform_parameters(&config, theta.view()).unwrap();
    let stored = sm.decomposition.clone().unwrap();
    let fresh = simultaneous_diagonalize(sm.omegas[0].view(), sm.omegas[1].view()).unwrap();

    for regime in 0..2 {
        let rebuilt = fresh.omega(regime);
        for (x, y) in rebuilt.iter().zip(sm.omegas[regime].iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-10);
        }
    }
    // Columns are unique up to sign and order because λ_2 has distinct entries.
    let stored_b = order_by_sign_and_magnitude(stored.impact(1).view()).unwrap();
    let fresh_b = order_by_sign_and_magnitude(fresh.impact(1).view()).unwrap();
    for (x, y) in stored_b.iter().zip(fresh_b.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-8);
    }

    let swapped = redecompose(2, 2, stored.w.view(), stored.lambdas.view(), &[1, 0]).unwrap();
    let back = redecompose(2, 2, swapped.w.view(), swapped.lambdas.view(), &[1, 0]).unwrap();
    for (x, y) in back.w.iter().zip(stored.w.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
    for (x, y) in back.lambdas.iter().zip(stored.lambdas.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
    for regime in 0..2 {
        let rebuilt = swapped.omega(1 - regime);
        for (x, y) in rebuilt.iter().zip(sm.omegas[regime].iter()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-10);
        }
    }
}

#[test]
// Purpose
// -------
// Non-Gaussian identification with a B template and shared AR matrices.
//
// Given
// -----
// - STVAR(1, 2, 2), ind_Student shocks, AR matrices shared across regimes,
//   B template [[+, 0], [free, +]].
//
// Expect
// ------
// - n_params = 4 + 4 + 6 + 1 + 2 = 17; shared AR, exact zeros in B_m.
// - Admissible; θ round trips; JSR bracket of identical regimes equals the
//   single-regime spectral radius bracket.
fn non_gaussian_identification_with_constraints() {
    let mut c = Array2::<f64>::zeros((8, 4));
    for i in 0..4 {
        c[[i, i]] = 1.0;
        c[[i + 4, i]] = 1.0;
    }
    let config = StvarConfig::builder(1, 2, 2)
        .cond_dist(CondDist::IndStudent)
        .identification(Identification::NonGaussianity)
        .ar_constraints(c)
        .b_constraints(array![[BEntry::Positive, BEntry::Zero], [BEntry::Free, BEntry::Positive]])
        .build()
        .unwrap();
    let theta = array![
        0.1, 0.2, 0.3, 0.4, // φ
        0.6, 0.0, 0.0, 0.6, // ψ (shared A)
        1.0, 0.2, 0.8, // B_1 pruned
        0.5, -0.3, 1.2, // B_2 pruned
        0.4, // α
        5.0, 7.0, // ν_1, ν_2
    ];

    assert_eq!(config.n_params(), 17);
    let sm = reform_parameters(&config, theta.view()).unwrap();
    let jsr = regime_jsr_bounds(&config, theta.view(), 3).unwrap();

    assert_eq!(sm.ar[0], sm.ar[1]);
    for b in sm.impact.as_ref().unwrap() {
        assert_eq!(b[[0, 1]], 0.0);
    }
    let tolerances = ParamSpaceTolerances::default();
    assert_eq!(check_parameter_space(&config, &sm, &tolerances).unwrap(), None);
    let back = to_constrained_theta(&config, &sm).unwrap();
    for (x, y) in back.iter().zip(theta.iter()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-12);
    }
    assert_relative_eq!(jsr.lower, 0.6, epsilon = 1e-10);
    assert_relative_eq!(jsr.upper, 0.6, epsilon = 1e-10);
    assert!(covariance_eigenvalues(&config, theta.view()).is_err());
}

#[test]
// Purpose
// -------
// The multiset table agrees with its closed-form size across a grid.
//
// Given
// -----
// - n ∈ 1..=4, d ∈ 0..=4.
//
// Expect
// ------
// - Row count C(n+d−1, d), first row all ones, last row all n.
fn multiset_table_matches_closed_form() {
    for n in 1..=4_i64 {
        for d in 0..=4_i64 {
            let table = enumerate_multisets(n, d).unwrap();
            let expected = multiset_count(n as u64, d as u64).round() as usize;
            assert_eq!(table.nrows(), expected);
            if d > 0 {
                assert!(table.row(0).iter().all(|v| *v == 1));
                assert!(table.row(expected - 1).iter().all(|v| *v == n as usize));
            }
        }
    }
}
