//! Errors for combinatorial enumeration.
//!
//! Invalid inputs are rejected before any allocation takes place.

/// Result alias for combinatorial routines that may produce [`CombinatoricsError`].
pub type CombinatoricsResult<T> = Result<T, CombinatoricsError>;

#[derive(Debug, Clone, PartialEq)]
pub enum CombinatoricsError {
    /// `n` must be strictly positive and `d` non-negative.
    InvalidMultisetInput { n: i64, d: i64 },

    /// The table would not fit in memory (count overflows `usize`).
    TooManyMultisets { n: i64, d: i64, count: f64 },
}

impl std::error::Error for CombinatoricsError {}

impl std::fmt::Display for CombinatoricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CombinatoricsError::InvalidMultisetInput { n, d } => write!(
                f,
                "Invalid multiset input (n = {n}, d = {d}): n must be a strictly positive integer \
                 and d must be a non-negative integer"
            ),
            CombinatoricsError::TooManyMultisets { n, d, count } => {
                write!(f, "Too many multisets for n = {n}, d = {d}: {count} rows")
            }
        }
    }
}
