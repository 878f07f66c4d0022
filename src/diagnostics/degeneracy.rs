//! Near-degeneracy report: near unit roots and near-singular covariances.
//!
//! Purpose
//! -------
//! Flag regimes whose largest companion eigenvalue modulus exceeds
//! `1 − tol` or whose smallest covariance eigenvalue falls below `tol`.
//! Such estimates are legitimate but usually indicate an inferior local
//! optimum, so the report is advisory and never an error.
//!
//! Key behaviors
//! -------------
//! - [`warn_on_near_degenerate`] returns a [`DegeneracyReport`] with one
//!   [`DegeneracyFlag`] per finding; callers decide how to surface it.
//! - [`DegeneracyReport::advisory`] renders the human-readable text, with
//!   1-based regime numbers.
//! - With the `obs_slog` feature, [`DegeneracyReport::log`] emits one
//!   structured warning per flag.
//!
//! Invariants & assumptions
//! ------------------------
//! - The covariance check reads the reformed `Ω_m` directly, so it applies
//!   under every identification (unlike the public `covariance_eigenvalues`
//!   table, which is reduced-form only).
//! - Structured fields (`DegeneracyFlag::regime`) are 0-based.
use crate::{
    diagnostics::companion::{omega_eigenvalue_table, structural_eigen_moduli},
    stvar::{
        config::StvarConfig,
        errors::{StvarError, StvarResult},
        reform::reform_parameters,
        structural::StructuralMatrices,
    },
};
use ndarray::ArrayView1;

#[cfg(feature = "obs_slog")]
use slog::{Logger, warn};

/// What was found to be nearly degenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegeneracyKind {
    /// Largest companion eigenvalue modulus above `1 − tol`.
    NearUnitRoot,
    /// Smallest covariance eigenvalue below `tol`.
    NearSingularCovariance,
}

impl DegeneracyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegeneracyKind::NearUnitRoot => "near_unit_root",
            DegeneracyKind::NearSingularCovariance => "near_singular_covariance",
        }
    }
}

/// One flagged regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegeneracyFlag {
    /// 0-based regime index.
    pub regime: usize,
    pub kind: DegeneracyKind,
    /// The offending modulus or eigenvalue.
    pub value: f64,
}

/// Result of [`warn_on_near_degenerate`].
#[derive(Debug, Clone, PartialEq)]
pub struct DegeneracyReport {
    pub tol: f64,
    pub flags: Vec<DegeneracyFlag>,
}

impl DegeneracyReport {
    /// `true` when no regime was flagged.
    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }

    /// Sorted, de-duplicated 0-based indices of the flagged regimes.
    pub fn flagged_regimes(&self) -> Vec<usize> {
        let mut regimes: Vec<usize> = self.flags.iter().map(|f| f.regime).collect();
        regimes.sort_unstable();
        regimes.dedup();
        regimes
    }

    /// Human-readable advisory text, or `None` for a clean report.
    pub fn advisory(&self) -> Option<String> {
        if self.is_clean() {
            return None;
        }
        let regimes = |kind: DegeneracyKind| -> Vec<String> {
            let mut found: Vec<usize> =
                self.flags.iter().filter(|f| f.kind == kind).map(|f| f.regime + 1).collect();
            found.dedup();
            found.iter().map(usize::to_string).collect()
        };
        let mut lines = Vec::new();
        let unit_root = regimes(DegeneracyKind::NearUnitRoot);
        if !unit_root.is_empty() {
            lines.push(format!(
                "Regime(s) {} have a companion eigenvalue modulus larger than {} (near unit root).",
                unit_root.join(", "),
                1.0 - self.tol
            ));
        }
        let singular = regimes(DegeneracyKind::NearSingularCovariance);
        if !singular.is_empty() {
            lines.push(format!(
                "Regime(s) {} have a covariance eigenvalue smaller than {} (near singular).",
                singular.join(", "),
                self.tol
            ));
        }
        lines.push(
            "Consider examining estimates from alternative local optima; this estimate may be \
             an inferior solution."
                .to_string(),
        );
        Some(lines.join("\n"))
    }

    /// Emit one warning record per flag.
    #[cfg(feature = "obs_slog")]
    pub fn log(&self, logger: &Logger) {
        for flag in &self.flags {
            warn!(logger, "near-degenerate regime";
                "regime" => flag.regime,
                "kind" => flag.kind.as_str(),
                "value" => flag.value,
                "tol" => self.tol,
            );
        }
    }
}

/// Degeneracy report of already reformed matrices.
///
/// Errors
/// ------
/// - `StvarError::InvalidArgument` unless `0 < tol < 1`.
/// - Eigen solver failures.
pub fn degeneracy_report(sm: &StructuralMatrices, tol: f64) -> StvarResult<DegeneracyReport> {
    if !(tol > 0.0 && tol < 1.0) {
        return Err(StvarError::InvalidArgument { name: "tol", reason: "must lie in (0, 1)" });
    }
    let mut flags = Vec::new();

    let moduli = structural_eigen_moduli(sm)?;
    for (regime, column) in moduli.columns().into_iter().enumerate() {
        let largest = column.iter().copied().fold(0.0_f64, f64::max);
        if largest > 1.0 - tol {
            flags.push(DegeneracyFlag {
                regime,
                kind: DegeneracyKind::NearUnitRoot,
                value: largest,
            });
        }
    }

    let eigenvalues = omega_eigenvalue_table(sm)?;
    for (regime, column) in eigenvalues.columns().into_iter().enumerate() {
        let smallest = column.iter().copied().fold(f64::INFINITY, f64::min);
        if smallest < tol {
            flags.push(DegeneracyFlag {
                regime,
                kind: DegeneracyKind::NearSingularCovariance,
                value: smallest,
            });
        }
    }

    Ok(DegeneracyReport { tol, flags })
}

/// warn_on_near_degenerate — advisory check for near unit roots and
/// near-singular covariance matrices.
///
/// Parameters
/// ----------
/// - `config`: `&StvarConfig`
/// - `theta`: `ArrayView1<f64>`
///   Constrained parameter vector.
/// - `tol`: `f64`
///   Threshold; `DEFAULT_DEGENERACY_TOL` (0.002) is the customary choice.
///
/// Returns
/// -------
/// `StvarResult<DegeneracyReport>`
///   Flags ordered as: unit-root findings by regime, then covariance
///   findings by regime.
///
/// Errors
/// ------
/// - Reform errors, `StvarError::InvalidArgument` for `tol` outside
///   (0, 1), eigen solver failures. Degeneracy itself is never an error.
pub fn warn_on_near_degenerate(
    config: &StvarConfig, theta: ArrayView1<f64>, tol: f64,
) -> StvarResult<DegeneracyReport> {
    let sm = reform_parameters(config, theta)?;
    degeneracy_report(&sm, tol)
}
