//! combinatorics — enumeration primitives for joint-spectral-radius work.
//!
//! Purpose
//! -------
//! Host the multiset enumerator that feeds approximations of the joint
//! spectral radius of the regime-wise companion matrices.
//!
//! Key behaviors
//! -------------
//! - [`enumerate_multisets`] builds the lexicographic `C(n+d−1, d) × d`
//!   table of non-decreasing d-tuples over `{1, …, n}`.
//! - [`multiset_count`] gives the row count without materializing it.
//!
//! Conventions
//! -----------
//! - Table entries are 1-based, matching the mathematical statement of the
//!   ground set `{1, …, n}`.
//! - Inputs are signed so that negative values can be reported as
//!   [`CombinatoricsError::InvalidMultisetInput`] instead of wrapping.

pub mod errors;
pub mod multisets;

pub use self::errors::{CombinatoricsError, CombinatoricsResult};
pub use self::multisets::{enumerate_multisets, multiset_count};

pub mod prelude {
    pub use super::{CombinatoricsError, CombinatoricsResult, enumerate_multisets};
}
