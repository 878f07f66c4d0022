//! stvar — model configuration and the constrained-parameter reform engine.
//!
//! Purpose
//! -------
//! Own everything that turns an optimizer's flat parameter vector into the
//! structural matrices of an STVAR(p, M, d) model: the validated model
//! configuration, the parameter layout it implies, the reform and its
//! inverse, and the admissibility check run before each likelihood
//! evaluation.
//!
//! Key behaviors
//! -------------
//! - [`StvarConfig`] (built through [`StvarConfigBuilder`]) validates the
//!   variant combination and constraints once and derives [`ParamLayout`].
//! - [`reform_parameters`] expands θ into [`StructuralMatrices`];
//!   [`to_constrained_theta`] inverts it.
//! - [`check_parameter_space`] returns the first [`ParamSpaceViolation`] of a
//!   candidate, if any.
//!
//! Invariants & assumptions
//! ------------------------
//! - A `StvarConfig` is immutable after construction and shared by
//!   reference; hot-path calls never re-validate it.
//! - All functions are pure: same inputs, same outputs, no shared state.
//!
//! Conventions
//! -----------
//! - 0-based regimes and lags in every index; the block layout of θ is
//!   documented in [`config`].
//!
//! Downstream usage
//! ----------------
//! - The optimizer objective calls `reform_parameters` →
//!   `check_parameter_space` → likelihood evaluator.
//! - Diagnostics (`crate::diagnostics`) consume `StructuralMatrices`.
//!
//! Testing notes
//! -------------
//! - Unit tests per submodule; the end-to-end flow is covered by
//!   `tests/integration_stvar_pipeline.rs`.

pub mod config;
pub mod errors;
pub mod paramspace;
pub mod reform;
pub mod structural;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::config::{
    ArConstraints, BConstraints, BEntry, CondDist, Identification, MeanConstraints, ParamLayout,
    Parametrization, StvarConfig, StvarConfigBuilder, WeightFunction,
};
pub use self::errors::{StvarError, StvarResult};
pub use self::paramspace::{ParamSpaceTolerances, ParamSpaceViolation, check_parameter_space};
pub use self::reform::{expand_constrained, reform_parameters, to_constrained_theta};
pub use self::structural::StructuralMatrices;

// ---- Optional convenience prelude for downstream crates -------------------
//
//     use rust_stvar::stvar::prelude::*;

pub mod prelude {
    pub use super::{
        BEntry, CondDist, Identification, Parametrization, StructuralMatrices, StvarConfig,
        StvarError, StvarResult, WeightFunction, check_parameter_space, reform_parameters,
        to_constrained_theta,
    };
}
