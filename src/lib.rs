//! rust_stvar — reparametrization, stability diagnostics and likelihood-core
//! utilities for structural smooth-transition VAR models, with Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and as the PyO3 bridge that
//! exposes the STVAR estimation core to Python via the `_rust_stvar`
//! extension module. The core maps an optimizer's constrained parameter
//! vector to structural matrices, diagnoses regime stability and
//! identification, and enumerates the multisets used for joint spectral
//! radius work.
//!
//! Key behaviors
//! -------------
//! - Re-export the core Rust modules (`linalg`, `stvar`, `diagnostics`,
//!   `combinatorics`, `optimization`) as the public crate surface.
//! - Define the `STVARCore` `#[pyclass]`, the `multisets` and
//!   `simultaneous_diagonalization` functions and the `#[pymodule]`
//!   initializer when the `python-bindings` feature is on.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work is implemented in the inner Rust modules; this file
//!   performs only FFI glue, input conversion and error mapping.
//! - Every public function is pure and safe to call concurrently from
//!   independent optimizer evaluations; there is no global state.
//!
//! Conventions
//! -----------
//! - Regimes, lags and parameter positions are 0-based in Rust; the
//!   advisory text of the degeneracy report uses 1-based regime numbers.
//! - Errors from core Rust code are rich enums internally and become
//!   `ValueError` at the PyO3 boundary.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code depends on the inner modules (or their `prelude`s)
//!   and can ignore the PyO3 items guarded by `python-bindings`.
//! - An optimizer driver wraps a likelihood evaluator in
//!   [`optimization::PenalizedObjective`] and hands it to `argmin`.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules and by
//!   `tests/integration_stvar_pipeline.rs`.

pub mod combinatorics;
pub mod diagnostics;
pub mod linalg;
pub mod optimization;
pub mod stvar;
pub mod utils;

#[cfg(feature = "python-bindings")]
use ndarray::Array1;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    combinatorics::enumerate_multisets,
    linalg::{decomposition::decompose_covariances, tolerances::DIAGONALIZATION_TOL},
    diagnostics::{
        covariance_eigenvalues, degeneracy_report, regime_eigen_moduli, structural_eigen_moduli,
    },
    linalg::tolerances::DEFAULT_DEGENERACY_TOL,
    stvar::{
        config::StvarConfig,
        errors::StvarError,
        paramspace::{ParamSpaceTolerances, check_parameter_space},
        reform::{expand_constrained, reform_parameters},
    },
    utils::{build_config, extract_f64_matrix, extract_theta},
};

/// STVARCore — Python-facing wrapper around a validated [`StvarConfig`].
///
/// Purpose
/// -------
/// Hold one frozen model configuration and expose the per-candidate
/// operations of the core (reform, eigenvalue tables, degeneracy report,
/// parameter-space check) as methods taking a parameter vector.
///
/// Parameters
/// ----------
/// Constructed from Python via
/// `STVARCore(p, M, d, weight_function="relative_dens", cond_dist="Gaussian",
/// identification="reduced_form", parametrization="intercept",
/// n_covariates=None, AR_constraints=None, mean_constraints=None,
/// B_constraints=None)`.
///
/// Invariants
/// ----------
/// - `inner` is always a validated configuration; methods never re-validate.
///
/// Notes
/// -----
/// - Native Rust code should use [`StvarConfig`] and the free functions of
///   [`stvar`] and [`diagnostics`] directly.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "rust_stvar", frozen)]
pub struct STVARCore {
    inner: StvarConfig,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl STVARCore {
    #[new]
    #[pyo3(
        signature = (
            p,
            m,
            d,
            weight_function = None,
            cond_dist = None,
            identification = None,
            parametrization = None,
            n_covariates = None,
            ar_constraints = None,
            mean_constraints = None,
            b_constraints = None,
        ),
        text_signature = "(p, M, d, /, weight_function='relative_dens', cond_dist='Gaussian', \
                          identification='reduced_form', parametrization='intercept', \
                          n_covariates=None, AR_constraints=None, mean_constraints=None, \
                          B_constraints=None)"
    )]
    pub fn new<'py>(
        p: usize, m: usize, d: usize, weight_function: Option<&str>, cond_dist: Option<&str>,
        identification: Option<&str>, parametrization: Option<&str>, n_covariates: Option<usize>,
        ar_constraints: Option<&Bound<'py, PyAny>>, mean_constraints: Option<Vec<Vec<usize>>>,
        b_constraints: Option<&Bound<'py, PyAny>>,
    ) -> PyResult<Self> {
        let inner = build_config(
            p,
            m,
            d,
            weight_function,
            cond_dist,
            identification,
            parametrization,
            n_covariates,
            ar_constraints,
            mean_constraints,
            b_constraints,
        )?;
        Ok(STVARCore { inner })
    }

    /// Required length of the parameter vector.
    #[getter]
    pub fn n_params(&self) -> usize {
        self.inner.n_params()
    }

    /// Full (unconstrained-representation) parameter vector.
    pub fn expand<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let theta: Array1<f64> = extract_theta(py, theta)?;
        let full = expand_constrained(&self.inner, theta.view())?;
        Ok(full.into_pyarray(py))
    }

    /// Structural matrices as a dict of numpy arrays.
    pub fn reform<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, pyo3::types::PyDict>> {
        let theta = extract_theta(py, theta)?;
        let sm = reform_parameters(&self.inner, theta.view())?;
        let out = pyo3::types::PyDict::new(py);
        out.set_item("intercepts", sm.intercepts.clone().into_pyarray(py))?;
        if let Some(means) = &sm.means {
            out.set_item("means", means.clone().into_pyarray(py))?;
        }
        let ar: Vec<_> = sm.ar.iter().map(|a| a.clone().into_pyarray(py)).collect();
        out.set_item("ar", ar)?;
        let omegas: Vec<_> = sm.omegas.iter().map(|o| o.clone().into_pyarray(py)).collect();
        out.set_item("omegas", omegas)?;
        if sm.identification != crate::stvar::config::Identification::ReducedForm {
            let impact: Vec<_> =
                sm.impact_matrices()?.into_iter().map(|b| b.into_pyarray(py)).collect();
            out.set_item("impact", impact)?;
        }
        out.set_item("weight_params", sm.weight_params.clone().into_pyarray(py))?;
        out.set_item("dist_params", sm.dist_params.clone().into_pyarray(py))?;
        Ok(out)
    }

    /// `dp × M` companion eigenvalue moduli.
    pub fn eigen_moduli<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let theta = extract_theta(py, theta)?;
        Ok(regime_eigen_moduli(&self.inner, theta.view())?.into_pyarray(py))
    }

    /// `d × M` covariance eigenvalues; reduced form only.
    pub fn covariance_eigenvalues<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let theta = extract_theta(py, theta)?;
        Ok(covariance_eigenvalues(&self.inner, theta.view())?.into_pyarray(py))
    }

    /// `(flagged_regimes, advisory)`; regimes are 0-based, the advisory
    /// text is `None` for a clean report.
    #[pyo3(signature = (theta, tol = DEFAULT_DEGENERACY_TOL))]
    pub fn degeneracy_report<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>, tol: f64,
    ) -> PyResult<(Vec<usize>, Option<String>)> {
        let theta = extract_theta(py, theta)?;
        let sm = reform_parameters(&self.inner, theta.view())?;
        let report = degeneracy_report(&sm, tol)?;
        Ok((report.flagged_regimes(), report.advisory()))
    }

    /// First parameter-space violation as text, or `None`.
    pub fn check_parameter_space<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>,
    ) -> PyResult<Option<String>> {
        let theta = extract_theta(py, theta)?;
        let sm = reform_parameters(&self.inner, theta.view())?;
        let violation = check_parameter_space(&self.inner, &sm, &ParamSpaceTolerances::default())?;
        Ok(violation.map(|v| v.to_string()))
    }

    /// Largest companion eigenvalue modulus of each regime.
    pub fn spectral_radii<'py>(
        &self, py: Python<'py>, theta: &Bound<'py, PyAny>,
    ) -> PyResult<Vec<f64>> {
        let theta = extract_theta(py, theta)?;
        let sm = reform_parameters(&self.inner, theta.view())?;
        let moduli = structural_eigen_moduli(&sm)?;
        Ok(moduli.row(0).to_vec())
    }
}

/// All d-element multisets of `{1, …, n}` as an `N × d` array.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(text_signature = "(n, d, /)")]
pub fn multisets<'py>(py: Python<'py>, n: i64, d: i64) -> PyResult<Bound<'py, PyArray2<usize>>> {
    let table = enumerate_multisets(n, d).map_err(StvarError::from)?;
    Ok(table.into_pyarray(py))
}

/// Shared-basis decomposition `(W, lambdas)` of a list of covariance
/// matrices; more than two matrices are checked against `tol`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (omegas, tol = DIAGONALIZATION_TOL), text_signature = "(omegas, tol=1e-6, /)")]
pub fn simultaneous_diagonalization<'py>(
    py: Python<'py>, omegas: Vec<Bound<'py, PyAny>>, tol: f64,
) -> PyResult<(Bound<'py, PyArray2<f64>>, Bound<'py, PyArray2<f64>>)> {
    let omegas = omegas
        .iter()
        .map(|raw| extract_f64_matrix(raw, "omegas"))
        .collect::<PyResult<Vec<_>>>()?;
    let decomposition = decompose_covariances(&omegas, tol).map_err(StvarError::from)?;
    Ok((decomposition.w.into_pyarray(py), decomposition.lambdas.into_pyarray(py)))
}

/// Define the `_rust_stvar` Python module.
///
/// Notes
/// -----
/// - Invoked by Python when importing the compiled extension; it is not
///   called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_stvar<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_class::<STVARCore>()?;
    m.add_function(wrap_pyfunction!(multisets, m)?)?;
    m.add_function(wrap_pyfunction!(simultaneous_diagonalization, m)?)?;
    Ok(())
}
