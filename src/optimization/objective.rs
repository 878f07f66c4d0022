//! Penalized negative log-likelihood exposed as an `argmin` cost function.
//!
//! We convert a *maximization* of the model log-likelihood `ℓ(θ)` into a
//! *minimization* by defining the cost `c(θ) = −ℓ(θ)`. Each evaluation runs
//! reform → parameter-space check → likelihood:
//!
//! - candidates outside the parameter space, and candidates whose reform
//!   fails numerically (non-finite entries, singular or non-positive
//!   definite matrices), cost a fixed `penalty`;
//! - configuration errors (wrong θ length, unsupported operations) and
//!   evaluator failures propagate as errors;
//! - a non-finite `ℓ(θ)` is an error, never silently penalized.
use crate::stvar::{
    config::StvarConfig,
    errors::{StvarError, StvarResult},
    paramspace::{ParamSpaceTolerances, check_parameter_space},
    reform::reform_parameters,
    structural::StructuralMatrices,
};
use argmin::core::{CostFunction, Error};
use ndarray::{Array1, ArrayView1};

/// Cost assigned to inadmissible candidates unless overridden.
pub const DEFAULT_PENALTY: f64 = 1e10;

/// External likelihood evaluator of an STVAR model.
///
/// Implementors score reformed structural matrices against their data; the
/// core never looks inside `Data`.
///
/// Required:
/// - `log_likelihood(&StructuralMatrices, &Data) -> anyhow::Result<f64>`:
///   evaluate `ℓ` at an admissible candidate.
pub trait StructuralLogLikelihood {
    type Data;

    fn log_likelihood(&self, sm: &StructuralMatrices, data: &Self::Data) -> anyhow::Result<f64>;
}

/// Bridges a [`StructuralLogLikelihood`] to `argmin`'s `CostFunction`.
#[derive(Debug, Clone)]
pub struct PenalizedObjective<'a, F: StructuralLogLikelihood> {
    pub config: &'a StvarConfig,
    pub f: &'a F,
    pub data: &'a F::Data,
    pub penalty: f64,
    pub tolerances: ParamSpaceTolerances,
}

impl<'a, F: StructuralLogLikelihood> PenalizedObjective<'a, F> {
    /// Construct with [`DEFAULT_PENALTY`] and default tolerances.
    pub fn new(config: &'a StvarConfig, f: &'a F, data: &'a F::Data) -> Self {
        Self {
            config,
            f,
            data,
            penalty: DEFAULT_PENALTY,
            tolerances: ParamSpaceTolerances::default(),
        }
    }

    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn with_tolerances(mut self, tolerances: ParamSpaceTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Evaluate the cost `c(θ) = −ℓ(θ)`, or the penalty.
    ///
    /// Errors
    /// ------
    /// - `StvarError::ParamLengthMismatch` and other configuration errors.
    /// - `StvarError::Evaluator` when the likelihood evaluator fails.
    /// - `StvarError::NonFiniteLogLik` when it returns a non-finite value.
    pub fn evaluate(&self, theta: ArrayView1<f64>) -> StvarResult<f64> {
        let sm = match reform_parameters(self.config, theta) {
            Ok(sm) => sm,
            Err(e) if e.is_numerical() => return Ok(self.penalty),
            Err(e) => return Err(e),
        };
        match check_parameter_space(self.config, &sm, &self.tolerances) {
            Ok(None) => {}
            Ok(Some(_)) => return Ok(self.penalty),
            Err(e) if e.is_numerical() => return Ok(self.penalty),
            Err(e) => return Err(e),
        }
        let value = self.f.log_likelihood(&sm, self.data)?;
        if !value.is_finite() {
            return Err(StvarError::NonFiniteLogLik { value });
        }
        Ok(-value)
    }
}

impl<'a, F: StructuralLogLikelihood> CostFunction for PenalizedObjective<'a, F> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(theta.view())?)
    }
}
