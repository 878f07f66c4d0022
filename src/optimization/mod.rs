//! optimization — the bridge between the STVAR core and an `argmin` driver.
//!
//! Purpose
//! -------
//! Turn a user-supplied likelihood evaluator into a cost function the
//! optimizer can minimize, with the parameter-space policy of the core
//! applied on every evaluation.
//!
//! Key behaviors
//! -------------
//! - [`StructuralLogLikelihood`]: trait implemented by the external
//!   likelihood evaluator.
//! - [`PenalizedObjective`]: implements `argmin::core::CostFunction` with
//!   cost `−ℓ(θ)`, or [`DEFAULT_PENALTY`] for inadmissible candidates.
//!
//! Invariants & assumptions
//! ------------------------
//! - The objective holds only shared references; one configuration can
//!   serve many concurrent objectives (multi-start, population search).
//!
//! Conventions
//! -----------
//! - The optimizer conceptually maximizes `ℓ(θ)` by minimizing `c(θ) = −ℓ(θ)`.
//! - No I/O and no logging; the driver reports progress.
//!
//! Downstream usage
//! ----------------
//! - Pass a `PenalizedObjective` as the problem of an `argmin` `Executor`
//!   with any derivative-free solver (e.g. Nelder–Mead, particle swarm).

pub mod objective;

pub use self::objective::{DEFAULT_PENALTY, PenalizedObjective, StructuralLogLikelihood};

pub mod prelude {
    pub use super::{DEFAULT_PENALTY, PenalizedObjective, StructuralLogLikelihood};
}
