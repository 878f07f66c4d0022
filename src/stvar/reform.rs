//! Constrained-parameter reform: θ ↔ full parameter vector ↔ structural matrices.
//!
//! Purpose
//! -------
//! Translate the compact, constrained parameter vector θ that the optimizer
//! sees into the structural matrices of the model, and back. The forward
//! direction runs on every likelihood evaluation.
//!
//! Key behaviors
//! -------------
//! - [`expand_constrained`]: θ → full vector. Applies the AR constraints
//!   (`vec A = C ψ`), copies each group mean to every regime of its group,
//!   and scatters pruned `W`/`B_m` vectors through the B template.
//! - [`StructuralMatrices::from_full`]: full vector → structural matrices.
//! - [`reform_parameters`]: both steps in one call.
//! - [`to_constrained_theta`]: structural matrices → θ, the inverse of
//!   [`reform_parameters`] for matrices that satisfy the constraints.
//!
//! Invariants & assumptions
//! ------------------------
//! - Lengths are checked exactly against the configuration; nothing is
//!   truncated or padded.
//! - Every θ entry must be finite; the first non-finite entry is reported
//!   as `StvarError::InvalidThetaInput`.
//! - The reform does not enforce sign constraints or stationarity; that is
//!   the job of `stvar::paramspace`.
//!
//! Conventions
//! -----------
//! - Block layout as documented in `stvar::config`.
//! - `λ_2 … λ_M` are stored regime after regime, each a `d`-vector.
//!
//! Testing notes
//! -------------
//! - Round trips θ → matrices → θ for every identification, with and
//!   without constraints; exact length errors; hand-checked placement of
//!   intercepts, AR lags and covariance entries.
use crate::{
    linalg::{
        decomposition::CovarianceDecomposition,
        vectorize::{pruned_vec, unpruned_vec, unvec_matrix, unvech, vec_matrix, vech},
    },
    stvar::{
        config::{Identification, Parametrization, StvarConfig},
        errors::{StvarError, StvarResult},
        structural::StructuralMatrices,
    },
};
use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, concatenate, s};

/// expand_constrained — constrained θ to the full parameter vector.
///
/// Parameters
/// ----------
/// - `config`: `&StvarConfig`
///   Validated model configuration.
/// - `theta`: `ArrayView1<f64>`
///   Constrained parameter vector of length `config.n_params()`.
///
/// Returns
/// -------
/// `StvarResult<Array1<f64>>`
///   Full vector of length `config.layout().n_full_params()`.
///
/// Errors
/// ------
/// - `StvarError::ParamLengthMismatch` on a wrong θ length.
/// - `StvarError::InvalidThetaInput` on the first non-finite entry.
pub fn expand_constrained(
    config: &StvarConfig, theta: ArrayView1<f64>,
) -> StvarResult<Array1<f64>> {
    check_theta(config, theta)?;
    let (m, d) = (config.m(), config.d());
    let layout = config.layout();
    let mut cursor = Cursor::new(theta);

    let mean_block = cursor.take(layout.mean);
    let means = match config.mean_constraints() {
        Some(mc) => {
            let mut full = Array1::<f64>::zeros(layout.full_mean);
            for regime in 0..m {
                let g = mc.group_of(regime);
                full.slice_mut(s![regime * d..(regime + 1) * d])
                    .assign(&mean_block.slice(s![g * d..(g + 1) * d]));
            }
            full
        }
        None => mean_block.to_owned(),
    };

    let ar_block = cursor.take(layout.ar);
    let ar = match config.ar_constraints() {
        Some(ac) => ac.matrix().dot(&ar_block),
        None => ar_block.to_owned(),
    };

    let cov_block = cursor.take(layout.cov);
    let cov = match (config.identification(), config.b_constraints()) {
        (Identification::Heteroskedasticity, Some(bc)) => {
            let n_w = bc.n_free();
            let w = unpruned_vec(cov_block.slice(s![..n_w]), d, bc.mask().view())?;
            concatenate![Axis(0), vec_matrix(w.view()), cov_block.slice(s![n_w..])]
        }
        (Identification::NonGaussianity, Some(bc)) => {
            let n_b = bc.n_free();
            let mask = bc.mask();
            let mut full = Array1::<f64>::zeros(layout.full_cov);
            for regime in 0..m {
                let pruned = cov_block.slice(s![regime * n_b..(regime + 1) * n_b]);
                let b = unpruned_vec(pruned, d, mask.view())?;
                full.slice_mut(s![regime * d * d..(regime + 1) * d * d])
                    .assign(&vec_matrix(b.view()));
            }
            full
        }
        _ => cov_block.to_owned(),
    };

    let rest = cursor.take(layout.weight + layout.dist);
    Ok(concatenate![Axis(0), means, ar, cov, rest])
}

impl StructuralMatrices {
    /// from_full — structural matrices from the full parameter vector.
    ///
    /// Parameters
    /// ----------
    /// - `config`: `&StvarConfig`
    /// - `full`: `ArrayView1<f64>`
    ///   Full vector of length `config.layout().n_full_params()`.
    ///
    /// Returns
    /// -------
    /// `StvarResult<StructuralMatrices>`
    ///   Intercepts are derived from the means (`φ_m = (I − Σ A_{m,i}) μ_m`)
    ///   under the mean parametrization. Covariances are `vech`-decoded,
    ///   rebuilt as `W diag(λ_m) W'`, or as `B_m B_m'` by identification.
    ///
    /// Errors
    /// ------
    /// - `StvarError::ParamLengthMismatch` on a wrong length.
    pub fn from_full(config: &StvarConfig, full: ArrayView1<f64>) -> StvarResult<Self> {
        let layout = config.layout();
        if full.len() != layout.n_full_params() {
            return Err(StvarError::ParamLengthMismatch {
                expected: layout.n_full_params(),
                actual: full.len(),
            });
        }
        let (p, m, d) = (config.p(), config.m(), config.d());
        let mut cursor = Cursor::new(full);

        let mean_block = unvec_matrix(d, cursor.take(layout.full_mean))?;

        let ar_block = cursor.take(layout.full_ar);
        let mut ar = Vec::with_capacity(m);
        for regime in 0..m {
            let width = p * d * d;
            let stacked =
                unvec_matrix(d, ar_block.slice(s![regime * width..(regime + 1) * width]))?;
            let mut lags = Array3::<f64>::zeros((p, d, d));
            for i in 0..p {
                lags.index_axis_mut(Axis(0), i).assign(&stacked.slice(s![.., i * d..(i + 1) * d]));
            }
            ar.push(lags);
        }

        let (intercepts, means) = match config.parametrization() {
            Parametrization::Intercept => (mean_block, None),
            Parametrization::Mean => {
                let mut intercepts = Array2::<f64>::zeros((d, m));
                for (regime, lags) in ar.iter().enumerate() {
                    let lhs = Array2::<f64>::eye(d) - lags.sum_axis(Axis(0));
                    intercepts.column_mut(regime).assign(&lhs.dot(&mean_block.column(regime)));
                }
                (intercepts, Some(mean_block))
            }
        };

        let cov_block = cursor.take(layout.full_cov);
        let identification = config.identification();
        let (omegas, impact, decomposition) = match identification {
            Identification::ReducedForm | Identification::Recursive => {
                let width = d * (d + 1) / 2;
                let omegas = (0..m)
                    .map(|regime| {
                        unvech(d, cov_block.slice(s![regime * width..(regime + 1) * width]))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (omegas, None, None)
            }
            Identification::Heteroskedasticity => {
                let w = unvec_matrix(d, cov_block.slice(s![..d * d]))?;
                let lambdas = unvec_matrix(d, cov_block.slice(s![d * d..]))?;
                let decomposition = CovarianceDecomposition { w, lambdas };
                let omegas = (0..m).map(|regime| decomposition.omega(regime)).collect();
                (omegas, None, Some(decomposition))
            }
            Identification::NonGaussianity => {
                let impact = (0..m)
                    .map(|regime| {
                        unvec_matrix(d, cov_block.slice(s![regime * d * d..(regime + 1) * d * d]))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let omegas = impact.iter().map(|b| b.dot(&b.t())).collect();
                (omegas, Some(impact), None)
            }
        };

        let weight_params = cursor.take(layout.weight).to_owned();
        let dist_params = cursor.take(layout.dist).to_owned();

        Ok(StructuralMatrices {
            p,
            m,
            d,
            identification,
            intercepts,
            means,
            ar,
            omegas,
            impact,
            decomposition,
            weight_params,
            dist_params,
        })
    }
}

/// reform_parameters — constrained θ to structural matrices.
///
/// Pure and deterministic: the same `(config, theta)` always gives the same
/// matrices. Safe to call concurrently with a shared `&StvarConfig`.
///
/// Errors
/// ------
/// - Everything [`expand_constrained`] and
///   [`StructuralMatrices::from_full`] may return.
pub fn reform_parameters(
    config: &StvarConfig, theta: ArrayView1<f64>,
) -> StvarResult<StructuralMatrices> {
    let full = expand_constrained(config, theta)?;
    StructuralMatrices::from_full(config, full.view())
}

/// to_constrained_theta — structural matrices back to θ.
///
/// Purpose
/// -------
/// Invert [`reform_parameters`]. AR coefficients go through the
/// precomputed pseudo-inverse `(C'C)⁻¹ C'`, group means are read from the
/// first regime of each group, and `W`/`B_m` are pruned through the B
/// template.
///
/// Returns
/// -------
/// `StvarResult<Array1<f64>>`
///   θ of length `config.n_params()`. For matrices produced by
///   [`reform_parameters`] this recovers the input up to rounding; for
///   matrices that violate the constraints it returns the least-squares
///   AR projection and ignores entries fixed at zero.
///
/// Errors
/// ------
/// - `StvarError::StructureMismatch` when `sm` does not match the
///   configuration (dimensions, identification objects, missing means).
pub fn to_constrained_theta(
    config: &StvarConfig, sm: &StructuralMatrices,
) -> StvarResult<Array1<f64>> {
    check_structure(config, sm)?;
    let m = config.m();

    let mean_source = match config.parametrization() {
        Parametrization::Intercept => &sm.intercepts,
        Parametrization::Mean => sm
            .means
            .as_ref()
            .ok_or(StvarError::StructureMismatch { what: "means", expected: m, found: 0 })?,
    };
    let mean: Array1<f64> = match config.mean_constraints() {
        Some(mc) => mc
            .groups()
            .iter()
            .flat_map(|members| mean_source.column(members[0]).to_vec())
            .collect(),
        None => vec_matrix(mean_source.view()),
    };

    let full_ar: Array1<f64> =
        (0..m).flat_map(|regime| vec_matrix(sm.stacked_ar(regime).view()).to_vec()).collect();
    let ar = match config.ar_constraints() {
        Some(ac) => ac.pseudo_inverse().dot(&full_ar),
        None => full_ar,
    };

    let mask = config.b_constraints().map(|bc| bc.mask());
    let flatten = |b: &Array2<f64>| -> StvarResult<Array1<f64>> {
        match &mask {
            Some(mask) => Ok(pruned_vec(b.view(), mask.view())?),
            None => Ok(vec_matrix(b.view())),
        }
    };
    let cov: Array1<f64> = match config.identification() {
        Identification::ReducedForm | Identification::Recursive => {
            let mut out = Vec::with_capacity(config.layout().cov);
            for omega in &sm.omegas {
                out.extend(vech(omega.view())?.iter().copied());
            }
            Array1::from(out)
        }
        Identification::Heteroskedasticity => {
            let decomposition = sm.decomposition.as_ref().ok_or(StvarError::StructureMismatch {
                what: "decomposition",
                expected: 1,
                found: 0,
            })?;
            concatenate![
                Axis(0),
                flatten(&decomposition.w)?,
                vec_matrix(decomposition.lambdas.view())
            ]
        }
        Identification::NonGaussianity => {
            let impact = sm.impact.as_ref().ok_or(StvarError::StructureMismatch {
                what: "impact matrices",
                expected: m,
                found: 0,
            })?;
            let mut out = Vec::with_capacity(config.layout().cov);
            for b in impact {
                out.extend(flatten(b)?.iter().copied());
            }
            Array1::from(out)
        }
    };

    Ok(concatenate![Axis(0), mean, ar, cov, sm.weight_params, sm.dist_params])
}

// ---- Helpers ----

struct Cursor<'a> {
    data: ArrayView1<'a, f64>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: ArrayView1<'a, f64>) -> Self {
        Cursor { data, pos: 0 }
    }

    /// Next `len` entries. Callers check the total length up front.
    fn take(&mut self, len: usize) -> ArrayView1<'a, f64> {
        let start = self.pos;
        self.pos += len;
        self.data.clone().slice_move(s![start..self.pos])
    }
}

fn check_theta(config: &StvarConfig, theta: ArrayView1<f64>) -> StvarResult<()> {
    let expected = config.n_params();
    if theta.len() != expected {
        return Err(StvarError::ParamLengthMismatch { expected, actual: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(StvarError::InvalidThetaInput { index, value });
    }
    Ok(())
}

fn check_structure(config: &StvarConfig, sm: &StructuralMatrices) -> StvarResult<()> {
    let (p, m, d) = (config.p(), config.m(), config.d());
    let layout = config.layout();
    let counts = [
        ("p", p, sm.p),
        ("M", m, sm.m),
        ("d", d, sm.d),
        ("AR regimes", m, sm.ar.len()),
        ("covariance matrices", m, sm.omegas.len()),
        ("weight parameters", layout.weight, sm.weight_params.len()),
        ("distribution parameters", layout.dist, sm.dist_params.len()),
    ];
    for (what, expected, found) in counts {
        if expected != found {
            return Err(StvarError::StructureMismatch { what, expected, found });
        }
    }
    check_shape("intercepts", (d, m), sm.intercepts.dim())?;
    match (&sm.means, config.parametrization()) {
        (Some(means), _) => check_shape("means", (d, m), means.dim())?,
        (None, Parametrization::Mean) => {
            return Err(StvarError::StructureMismatch { what: "means", expected: m, found: 0 });
        }
        (None, Parametrization::Intercept) => {}
    }
    for lags in &sm.ar {
        if lags.dim() != (p, d, d) {
            return Err(StvarError::StructureMismatch {
                what: "AR lag array",
                expected: p * d * d,
                found: lags.len(),
            });
        }
    }
    for omega in &sm.omegas {
        check_shape("covariance matrix", (d, d), omega.dim())?;
    }
    match config.identification() {
        Identification::ReducedForm | Identification::Recursive => {}
        Identification::Heteroskedasticity => {
            let decomposition = sm.decomposition.as_ref().ok_or(StvarError::StructureMismatch {
                what: "decomposition",
                expected: 1,
                found: 0,
            })?;
            check_shape("W", (d, d), decomposition.w.dim())?;
            check_shape("lambdas", (d, m.saturating_sub(1)), decomposition.lambdas.dim())?;
        }
        Identification::NonGaussianity => {
            let impact = sm.impact.as_ref().map_or(&[][..], Vec::as_slice);
            if impact.len() != m {
                return Err(StvarError::StructureMismatch {
                    what: "impact matrices",
                    expected: m,
                    found: impact.len(),
                });
            }
            for b in impact {
                check_shape("impact matrix", (d, d), b.dim())?;
            }
        }
    }
    Ok(())
}

/// Compare a matrix shape, reporting the first axis that differs.
fn check_shape(
    what: &'static str, expected: (usize, usize), found: (usize, usize),
) -> StvarResult<()> {
    if expected.0 != found.0 {
        return Err(StvarError::StructureMismatch { what, expected: expected.0, found: found.0 });
    }
    if expected.1 != found.1 {
        return Err(StvarError::StructureMismatch { what, expected: expected.1, found: found.1 });
    }
    Ok(())
}
