//! STVAR model configuration: variants, constraints and parameter layout.
//!
//! Purpose
//! -------
//! Describe an STVAR(p, M, d) specification once, validate it once, and
//! derive from it the exact layout of the optimizer-facing parameter
//! vector. Everything downstream (reform, diagnostics, objective) takes a
//! `&StvarConfig` and never re-validates the configuration.
//!
//! Key behaviors
//! -------------
//! - Tagged variants [`WeightFunction`], [`CondDist`], [`Identification`]
//!   and [`Parametrization`] replace string dispatch; each parses from its
//!   conventional name via `FromStr`.
//! - Optional linear constraints: [`ArConstraints`] (`vec A = C ψ`),
//!   [`MeanConstraints`] (regime groups sharing a mean) and
//!   [`BConstraints`] (zero/sign template of the impact matrix).
//! - [`ParamLayout`] records the length of every block of both the
//!   constrained vector θ and its full expansion.
//!
//! Invariants & assumptions
//! ------------------------
//! - `p, m, d ≥ 1`.
//! - Logistic and exponential weights are two-regime models.
//! - Independent (Student / skewed t) shocks are identified by
//!   non-Gaussianity; Gaussian and Student shocks never are.
//! - Heteroskedasticity identification needs at least two regimes.
//! - Mean constraints only under the mean parametrization, and they
//!   partition `0..m`.
//! - AR constraint matrices have `m·p·d²` rows and full column rank; their
//!   left pseudo-inverse is computed here, once.
//! - B templates are `d × d`, have no all-zero column, and are only used
//!   with heteroskedasticity or non-Gaussianity identification.
//!
//! Conventions
//! -----------
//! - Full parameter vector:
//!   `[φ or μ (M·d) | vec A_1 … vec A_M (M·p·d²) | covariance block |
//!   weight params | distribution params]`, where `A_m = [A_{m,1} : … :
//!   A_{m,p}]` and the covariance block is `vech Ω_1 … vech Ω_M`,
//!   `vec W, λ_2 … λ_M`, or `vec B_1 … vec B_M` by identification.
//! - Constrained parameter vector: the mean block has one `d`-vector per
//!   group, the AR block is ψ, and every `vec W`/`vec B_m` is pruned to
//!   the non-`Zero` template entries.
use crate::{
    linalg::special::{from_dmatrix, to_dmatrix},
    stvar::errors::{StvarError, StvarResult},
};
use ndarray::{Array2, ArrayView2};
use std::str::FromStr;

/// Transition weight function of the smooth-transition mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFunction {
    /// Weights proportional to regime-wise stationary densities (α_1..α_{M−1}).
    RelativeDens,
    /// Logistic transition in one switching variable (location c, scale γ).
    Logistic,
    /// Multinomial logit with an intercept and `n_covariates` slopes per
    /// non-baseline regime.
    Mlogit { n_covariates: usize },
    /// Exponential transition (location c, scale γ).
    Exponential,
    /// Discrete threshold weights with `M − 1` increasing thresholds.
    Threshold,
    /// Exogenous weights; no parameters.
    Exogenous,
}

impl WeightFunction {
    /// Number of weight parameters for `m` regimes.
    pub fn n_params(&self, m: usize) -> usize {
        match self {
            WeightFunction::RelativeDens | WeightFunction::Threshold => m - 1,
            WeightFunction::Logistic | WeightFunction::Exponential => 2,
            WeightFunction::Mlogit { n_covariates } => (m - 1) * (1 + n_covariates),
            WeightFunction::Exogenous => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightFunction::RelativeDens => "relative_dens",
            WeightFunction::Logistic => "logistic",
            WeightFunction::Mlogit { .. } => "mlogit",
            WeightFunction::Exponential => "exponential",
            WeightFunction::Threshold => "threshold",
            WeightFunction::Exogenous => "exogenous",
        }
    }
}

impl FromStr for WeightFunction {
    type Err = StvarError;

    /// Parse a weight function name (case-insensitive).
    ///
    /// `"mlogit"` is rejected because the number of covariates is part of
    /// the variant; build `WeightFunction::Mlogit { .. }` directly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relative_dens" => Ok(WeightFunction::RelativeDens),
            "logistic" => Ok(WeightFunction::Logistic),
            "exponential" => Ok(WeightFunction::Exponential),
            "threshold" => Ok(WeightFunction::Threshold),
            "exogenous" => Ok(WeightFunction::Exogenous),
            _ => Err(StvarError::UnknownVariant { kind: "weight function", name: s.to_string() }),
        }
    }
}

/// Conditional distribution of the shocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondDist {
    Gaussian,
    /// Multivariate Student's t with one degrees-of-freedom parameter.
    Student,
    /// Independent Student's t shocks, one ν per shock.
    IndStudent,
    /// Independent skewed t shocks, one (ν, λ) pair per shock.
    IndSkewedT,
}

impl CondDist {
    /// Number of distribution parameters for dimension `d`.
    pub fn n_params(&self, d: usize) -> usize {
        match self {
            CondDist::Gaussian => 0,
            CondDist::Student => 1,
            CondDist::IndStudent => d,
            CondDist::IndSkewedT => 2 * d,
        }
    }

    /// `true` for the independent-shock families.
    pub fn is_independent(&self) -> bool {
        matches!(self, CondDist::IndStudent | CondDist::IndSkewedT)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CondDist::Gaussian => "Gaussian",
            CondDist::Student => "Student",
            CondDist::IndStudent => "ind_Student",
            CondDist::IndSkewedT => "ind_skewed_t",
        }
    }
}

impl FromStr for CondDist {
    type Err = StvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaussian" => Ok(CondDist::Gaussian),
            "student" => Ok(CondDist::Student),
            "ind_student" => Ok(CondDist::IndStudent),
            "ind_skewed_t" => Ok(CondDist::IndSkewedT),
            _ => Err(StvarError::UnknownVariant {
                kind: "conditional distribution",
                name: s.to_string(),
            }),
        }
    }
}

/// Identification scheme of the structural shocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identification {
    /// Reduced form: covariance matrices `Ω_m` only.
    ReducedForm,
    /// Recursive: `B_m` is the lower Cholesky factor of `Ω_m`.
    Recursive,
    /// By conditional heteroskedasticity: `Ω_1 = W W'`, `Ω_m = W Λ_m W'`.
    Heteroskedasticity,
    /// By non-Gaussianity: `Ω_m = B_m B_m'`.
    NonGaussianity,
}

impl Identification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Identification::ReducedForm => "reduced_form",
            Identification::Recursive => "recursive",
            Identification::Heteroskedasticity => "heteroskedasticity",
            Identification::NonGaussianity => "non-Gaussianity",
        }
    }
}

impl FromStr for Identification {
    type Err = StvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reduced_form" => Ok(Identification::ReducedForm),
            "recursive" => Ok(Identification::Recursive),
            "heteroskedasticity" => Ok(Identification::Heteroskedasticity),
            "non-gaussianity" | "non_gaussianity" => Ok(Identification::NonGaussianity),
            _ => Err(StvarError::UnknownVariant { kind: "identification", name: s.to_string() }),
        }
    }
}

/// Whether the first block holds intercepts `φ_m` or regime means `μ_m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parametrization {
    #[default]
    Intercept,
    Mean,
}

impl FromStr for Parametrization {
    type Err = StvarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intercept" => Ok(Parametrization::Intercept),
            "mean" => Ok(Parametrization::Mean),
            _ => Err(StvarError::UnknownVariant { kind: "parametrization", name: s.to_string() }),
        }
    }
}

/// Linear constraints `vec(A_1, …, A_M) = C ψ` on the stacked AR coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct ArConstraints {
    c: Array2<f64>,
    pinv: Array2<f64>,
}

impl ArConstraints {
    /// Wrap a constraint matrix `C` and precompute `(C'C)⁻¹ C'`.
    ///
    /// Errors
    /// ------
    /// - `StvarError::InvalidConfig` when `C` has no columns, more columns
    ///   than rows, or is rank deficient.
    pub fn new(c: Array2<f64>) -> StvarResult<Self> {
        if c.ncols() == 0 || c.ncols() > c.nrows() {
            return Err(StvarError::InvalidConfig {
                field: "AR_constraints",
                reason: "constraint matrix must have between 1 and nrows columns",
            });
        }
        let ctc = to_dmatrix(c.t().dot(&c).view());
        let ctc_inv = ctc.try_inverse().ok_or(StvarError::InvalidConfig {
            field: "AR_constraints",
            reason: "constraint matrix must have full column rank",
        })?;
        let pinv = from_dmatrix(&ctc_inv).dot(&c.t());
        Ok(ArConstraints { c, pinv })
    }

    /// The constraint matrix `C`.
    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.c.view()
    }

    /// Left pseudo-inverse `(C'C)⁻¹ C'`.
    pub fn pseudo_inverse(&self) -> ArrayView2<'_, f64> {
        self.pinv.view()
    }

    /// Number of free AR parameters `q`.
    pub fn n_free(&self) -> usize {
        self.c.ncols()
    }
}

/// Partition of the regimes into groups that share one mean vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeanConstraints {
    groups: Vec<Vec<usize>>,
    group_of: Vec<usize>,
}

impl MeanConstraints {
    /// Validate that `groups` is a partition of `0..m`.
    pub fn new(groups: Vec<Vec<usize>>, m: usize) -> StvarResult<Self> {
        const FIELD: &str = "mean_constraints";
        let mut group_of = vec![usize::MAX; m];
        for (g, members) in groups.iter().enumerate() {
            if members.is_empty() {
                return Err(StvarError::InvalidConfig { field: FIELD, reason: "empty group" });
            }
            for &regime in members {
                if regime >= m {
                    return Err(StvarError::InvalidConfig {
                        field: FIELD,
                        reason: "regime index out of range",
                    });
                }
                if group_of[regime] != usize::MAX {
                    return Err(StvarError::InvalidConfig {
                        field: FIELD,
                        reason: "regime appears in more than one group",
                    });
                }
                group_of[regime] = g;
            }
        }
        if group_of.iter().any(|&g| g == usize::MAX) {
            return Err(StvarError::InvalidConfig {
                field: FIELD,
                reason: "every regime must belong to a group",
            });
        }
        Ok(MeanConstraints { groups, group_of })
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn n_groups(&self) -> usize {
        self.groups.len()
    }

    /// Group index of a 0-based regime.
    pub fn group_of(&self, regime: usize) -> usize {
        self.group_of[regime]
    }
}

/// One entry of a B-constraint template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BEntry {
    Free,
    Zero,
    Positive,
    Negative,
}

/// Zero/sign template of the structural impact matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct BConstraints {
    template: Array2<BEntry>,
}

impl BConstraints {
    /// Validate a square template without all-zero columns.
    pub fn new(template: Array2<BEntry>) -> StvarResult<Self> {
        const FIELD: &str = "B_constraints";
        if template.nrows() != template.ncols() {
            return Err(StvarError::InvalidConfig { field: FIELD, reason: "must be square" });
        }
        if template.columns().into_iter().any(|col| col.iter().all(|e| *e == BEntry::Zero)) {
            return Err(StvarError::InvalidConfig {
                field: FIELD,
                reason: "a column with only zero constraints makes B singular",
            });
        }
        Ok(BConstraints { template })
    }

    /// Build a template from the numeric convention: NaN = free, 0 = zero,
    /// positive = positive sign, negative = negative sign.
    pub fn from_signs(signs: ArrayView2<f64>) -> StvarResult<Self> {
        let template = signs.mapv(|s| {
            if s.is_nan() {
                BEntry::Free
            } else if s == 0.0 {
                BEntry::Zero
            } else if s > 0.0 {
                BEntry::Positive
            } else {
                BEntry::Negative
            }
        });
        BConstraints::new(template)
    }

    pub fn template(&self) -> ArrayView2<'_, BEntry> {
        self.template.view()
    }

    /// Retention mask for pruned vectorization (`true` where not `Zero`).
    pub fn mask(&self) -> Array2<bool> {
        self.template.mapv(|e| e != BEntry::Zero)
    }

    /// Number of entries that are estimated.
    pub fn n_free(&self) -> usize {
        self.template.iter().filter(|e| **e != BEntry::Zero).count()
    }

    pub fn dim(&self) -> usize {
        self.template.nrows()
    }
}

/// Block lengths of the constrained and full parameter vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamLayout {
    /// Constrained mean/intercept block.
    pub mean: usize,
    /// Constrained AR block.
    pub ar: usize,
    /// Constrained covariance block.
    pub cov: usize,
    pub weight: usize,
    pub dist: usize,
    /// Full (unconstrained-representation) mean/intercept block.
    pub full_mean: usize,
    pub full_ar: usize,
    pub full_cov: usize,
}

impl ParamLayout {
    /// Length of the constrained, optimizer-facing vector θ.
    pub fn n_params(&self) -> usize {
        self.mean + self.ar + self.cov + self.weight + self.dist
    }

    /// Length of the full expansion of θ.
    pub fn n_full_params(&self) -> usize {
        self.full_mean + self.full_ar + self.full_cov + self.weight + self.dist
    }
}

/// Validated STVAR(p, M, d) configuration.
///
/// Build with [`StvarConfig::builder`]; all invariants in the module docs
/// hold for every constructed value. The type is immutable, `Send` and
/// `Sync`, and is meant to be shared by reference across evaluations.
#[derive(Debug, Clone, PartialEq)]
pub struct StvarConfig {
    p: usize,
    m: usize,
    d: usize,
    weight_function: WeightFunction,
    cond_dist: CondDist,
    identification: Identification,
    parametrization: Parametrization,
    ar_constraints: Option<ArConstraints>,
    mean_constraints: Option<MeanConstraints>,
    b_constraints: Option<BConstraints>,
    layout: ParamLayout,
}

impl StvarConfig {
    /// Start a builder with the Gaussian reduced-form relative-density
    /// defaults.
    pub fn builder(p: usize, m: usize, d: usize) -> StvarConfigBuilder {
        StvarConfigBuilder {
            p,
            m,
            d,
            weight_function: WeightFunction::RelativeDens,
            cond_dist: CondDist::Gaussian,
            identification: Identification::ReducedForm,
            parametrization: Parametrization::Intercept,
            ar_constraints: None,
            mean_constraints: None,
            b_constraints: None,
        }
    }

    /// Unconstrained configuration in one call.
    pub fn new(
        p: usize, m: usize, d: usize, weight_function: WeightFunction, cond_dist: CondDist,
        identification: Identification,
    ) -> StvarResult<Self> {
        StvarConfig::builder(p, m, d)
            .weight_function(weight_function)
            .cond_dist(cond_dist)
            .identification(identification)
            .build()
    }

    pub fn p(&self) -> usize {
        self.p
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn weight_function(&self) -> WeightFunction {
        self.weight_function
    }

    pub fn cond_dist(&self) -> CondDist {
        self.cond_dist
    }

    pub fn identification(&self) -> Identification {
        self.identification
    }

    pub fn parametrization(&self) -> Parametrization {
        self.parametrization
    }

    pub fn ar_constraints(&self) -> Option<&ArConstraints> {
        self.ar_constraints.as_ref()
    }

    pub fn mean_constraints(&self) -> Option<&MeanConstraints> {
        self.mean_constraints.as_ref()
    }

    pub fn b_constraints(&self) -> Option<&BConstraints> {
        self.b_constraints.as_ref()
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    /// Number of free parameters, i.e. the required length of θ.
    pub fn n_params(&self) -> usize {
        self.layout.n_params()
    }
}

/// Builder for [`StvarConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct StvarConfigBuilder {
    p: usize,
    m: usize,
    d: usize,
    weight_function: WeightFunction,
    cond_dist: CondDist,
    identification: Identification,
    parametrization: Parametrization,
    ar_constraints: Option<Array2<f64>>,
    mean_constraints: Option<Vec<Vec<usize>>>,
    b_constraints: Option<Array2<BEntry>>,
}

impl StvarConfigBuilder {
    pub fn weight_function(mut self, weight_function: WeightFunction) -> Self {
        self.weight_function = weight_function;
        self
    }

    pub fn cond_dist(mut self, cond_dist: CondDist) -> Self {
        self.cond_dist = cond_dist;
        self
    }

    pub fn identification(mut self, identification: Identification) -> Self {
        self.identification = identification;
        self
    }

    pub fn parametrization(mut self, parametrization: Parametrization) -> Self {
        self.parametrization = parametrization;
        self
    }

    /// Constraint matrix `C` of shape `(M·p·d²) × q`.
    pub fn ar_constraints(mut self, c: Array2<f64>) -> Self {
        self.ar_constraints = Some(c);
        self
    }

    /// Groups of 0-based regimes sharing a mean.
    pub fn mean_constraints(mut self, groups: Vec<Vec<usize>>) -> Self {
        self.mean_constraints = Some(groups);
        self
    }

    pub fn b_constraints(mut self, template: Array2<BEntry>) -> Self {
        self.b_constraints = Some(template);
        self
    }

    /// Validate the specification and derive the parameter layout.
    ///
    /// Errors
    /// ------
    /// - `StvarError::InvalidConfig` naming the offending field for every
    ///   violated invariant listed in the module documentation.
    pub fn build(self) -> StvarResult<StvarConfig> {
        let StvarConfigBuilder {
            p,
            m,
            d,
            weight_function,
            cond_dist,
            identification,
            parametrization,
            ar_constraints,
            mean_constraints,
            b_constraints,
        } = self;

        if p == 0 {
            return invalid("p", "autoregressive order must be at least 1");
        }
        if m == 0 {
            return invalid("M", "number of regimes must be at least 1");
        }
        if d == 0 {
            return invalid("d", "dimension must be at least 1");
        }
        if matches!(weight_function, WeightFunction::Logistic | WeightFunction::Exponential)
            && m != 2
        {
            return invalid("weight_function", "logistic and exponential weights require M = 2");
        }
        if cond_dist.is_independent() && identification != Identification::NonGaussianity {
            return invalid(
                "identification",
                "independent shock distributions are identified by non-Gaussianity",
            );
        }
        if !cond_dist.is_independent() && identification == Identification::NonGaussianity {
            return invalid(
                "identification",
                "non-Gaussianity identification requires ind_Student or ind_skewed_t shocks",
            );
        }
        if identification == Identification::Heteroskedasticity && m < 2 {
            return invalid("identification", "heteroskedasticity identification requires M >= 2");
        }

        let ar_constraints = match ar_constraints {
            Some(c) => {
                if c.nrows() != m * p * d * d {
                    return invalid("AR_constraints", "constraint matrix must have M*p*d^2 rows");
                }
                Some(ArConstraints::new(c)?)
            }
            None => None,
        };

        let mean_constraints = match mean_constraints {
            Some(groups) => {
                if parametrization != Parametrization::Mean {
                    return invalid(
                        "mean_constraints",
                        "mean constraints require the mean parametrization",
                    );
                }
                Some(MeanConstraints::new(groups, m)?)
            }
            None => None,
        };

        let b_constraints = match b_constraints {
            Some(template) => {
                if !matches!(
                    identification,
                    Identification::Heteroskedasticity | Identification::NonGaussianity
                ) {
                    return invalid(
                        "B_constraints",
                        "impact-matrix constraints require heteroskedasticity or \
                         non-Gaussianity identification",
                    );
                }
                let bc = BConstraints::new(template)?;
                if bc.dim() != d {
                    return invalid("B_constraints", "template must be d x d");
                }
                Some(bc)
            }
            None => None,
        };

        let full_mean = m * d;
        let full_ar = m * p * d * d;
        let full_cov = match identification {
            Identification::ReducedForm | Identification::Recursive => m * d * (d + 1) / 2,
            Identification::Heteroskedasticity => d * d + d * (m - 1),
            Identification::NonGaussianity => m * d * d,
        };
        let n_b = b_constraints.as_ref().map_or(d * d, BConstraints::n_free);
        let layout = ParamLayout {
            mean: mean_constraints.as_ref().map_or(full_mean, |mc| mc.n_groups() * d),
            ar: ar_constraints.as_ref().map_or(full_ar, ArConstraints::n_free),
            cov: match identification {
                Identification::ReducedForm | Identification::Recursive => full_cov,
                Identification::Heteroskedasticity => n_b + d * (m - 1),
                Identification::NonGaussianity => m * n_b,
            },
            weight: weight_function.n_params(m),
            dist: cond_dist.n_params(d),
            full_mean,
            full_ar,
            full_cov,
        };

        Ok(StvarConfig {
            p,
            m,
            d,
            weight_function,
            cond_dist,
            identification,
            parametrization,
            ar_constraints,
            mean_constraints,
            b_constraints,
            layout,
        })
    }
}

fn invalid<T>(field: &'static str, reason: &'static str) -> StvarResult<T> {
    Err(StvarError::InvalidConfig { field, reason })
}
