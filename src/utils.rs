//! Conversion helpers for the Python bindings.
//!
//! Everything here is FFI glue behind the `python-bindings` feature: turning
//! Python array-likes into `ndarray` values and Python-friendly option names
//! into a validated [`StvarConfig`].
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::stvar::{
    config::{BConstraints, CondDist, Identification, Parametrization, StvarConfig, WeightFunction},
    errors::StvarError,
};

#[cfg(feature = "python-bindings")]
use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

#[cfg(feature = "python-bindings")]
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(
            "expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64",
        )
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 1-D array-like into an owned parameter vector.
#[cfg(feature = "python-bindings")]
pub fn extract_theta<'py>(py: Python<'py>, raw: &Bound<'py, PyAny>) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err("theta must be a 1-D contiguous float64 array or sequence")
    })?;
    Ok(Array1::from(slice.to_vec()))
}

/// Copy a 2-D array-like (numpy array or nested sequence) into an owned matrix.
#[cfg(feature = "python-bindings")]
pub fn extract_f64_matrix<'py>(raw: &Bound<'py, PyAny>, name: &str) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    let rows: Vec<Vec<f64>> = raw.extract().map_err(|_| {
        pyo3::exceptions::PyTypeError::new_err(format!(
            "{name} must be a 2-D numpy.ndarray or a sequence of float64 rows"
        ))
    })?;
    let ncols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(PyValueError::new_err(format!("{name} rows must have equal length")));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let n = flat.len();
    Array2::from_shape_vec((n.checked_div(ncols).unwrap_or(0), ncols), flat)
        .map_err(|e| PyValueError::new_err(format!("{name}: {e}")))
}

/// Build a validated configuration from Python option names.
///
/// `weight_function = "mlogit"` takes its covariate count from
/// `n_covariates`; constraint arguments follow the numeric conventions of
/// the core (`B_constraints`: NaN free, 0 zero, sign otherwise; mean groups
/// are 0-based regime lists).
#[cfg(feature = "python-bindings")]
pub fn build_config<'py>(
    p: usize, m: usize, d: usize, weight_function: Option<&str>, cond_dist: Option<&str>,
    identification: Option<&str>, parametrization: Option<&str>, n_covariates: Option<usize>,
    ar_constraints: Option<&Bound<'py, PyAny>>, mean_constraints: Option<Vec<Vec<usize>>>,
    b_constraints: Option<&Bound<'py, PyAny>>,
) -> PyResult<StvarConfig> {
    let weight_function = match weight_function.unwrap_or("relative_dens") {
        name if name.eq_ignore_ascii_case("mlogit") => {
            let n_covariates = n_covariates.ok_or_else(|| {
                PyValueError::new_err("n_covariates must be provided when weight_function='mlogit'")
            })?;
            WeightFunction::Mlogit { n_covariates }
        }
        name => name.parse::<WeightFunction>()?,
    };
    let cond_dist: CondDist = cond_dist.unwrap_or("Gaussian").parse()?;
    let identification: Identification = identification.unwrap_or("reduced_form").parse()?;
    let parametrization: Parametrization = parametrization.unwrap_or("intercept").parse()?;

    let mut builder = StvarConfig::builder(p, m, d)
        .weight_function(weight_function)
        .cond_dist(cond_dist)
        .identification(identification)
        .parametrization(parametrization);
    if let Some(raw) = ar_constraints {
        builder = builder.ar_constraints(extract_f64_matrix(raw, "AR_constraints")?);
    }
    if let Some(groups) = mean_constraints {
        builder = builder.mean_constraints(groups);
    }
    if let Some(raw) = b_constraints {
        let signs = extract_f64_matrix(raw, "B_constraints")?;
        let template = BConstraints::from_signs(signs.view())?;
        builder = builder.b_constraints(template.template().to_owned());
    }
    builder.build().map_err(|e: StvarError| e.into())
}
