//! Lexicographic enumeration of d-element multisets over `{1, …, n}`.
//!
//! Purpose
//! -------
//! Produce the table of all non-decreasing d-tuples with entries in
//! `{1, …, n}`. The table indexes the regime/coordinate combinations used
//! when approximating the joint spectral radius of the companion-matrix
//! family, which is the stability criterion that accounts for switching
//! between regimes.
//!
//! Invariants
//! ----------
//! - Row count is `C(n + d − 1, d)`.
//! - Rows are non-decreasing, the first row is all ones, the last is all `n`,
//!   and rows appear in strictly increasing lexicographic order.
//! - `d == 0` yields a single empty row (`C(n − 1, 0) = 1`).
use crate::combinatorics::errors::{CombinatoricsError, CombinatoricsResult};
use ndarray::Array2;
use statrs::function::factorial::binomial;

/// Number of d-element multisets over `{1, …, n}`, `C(n + d − 1, d)`.
///
/// Computed in floating point by `statrs`; exact for every table small
/// enough to be materialized.
pub fn multiset_count(n: u64, d: u64) -> f64 {
    if n == 0 {
        return if d == 0 { 1.0 } else { 0.0 };
    }
    binomial(n + d - 1, d).round()
}

/// enumerate_multisets — all d-element multisets of `{1, …, n}` in
/// lexicographic order.
///
/// Parameters
/// ----------
/// - `n`: `i64`
///   Size of the ground set; must be `> 0`.
/// - `d`: `i64`
///   Multiset size; must be `≥ 0`.
///
/// Returns
/// -------
/// `CombinatoricsResult<Array2<usize>>`
///   `N × d` table with `N = C(n + d − 1, d)`; row `r` is the `r`-th
///   multiset (1-based entries).
///
/// Errors
/// ------
/// - `CombinatoricsError::InvalidMultisetInput` when `n ≤ 0` or `d < 0`,
///   raised before any allocation.
/// - `CombinatoricsError::TooManyMultisets` when `N · d` does not fit in
///   `usize`.
///
/// Notes
/// -----
/// - Successor rule: scan from the last position backwards for the first
///   entry below `n`, increment it, and copy the new value into every
///   position to its right.
///
/// Examples
/// --------
/// ```rust
/// # use rust_stvar::combinatorics::enumerate_multisets;
/// let table = enumerate_multisets(3, 2).unwrap();
/// assert_eq!(table.nrows(), 6);
/// assert_eq!(table.row(1).to_vec(), vec![1, 2]);
/// ```
pub fn enumerate_multisets(n: i64, d: i64) -> CombinatoricsResult<Array2<usize>> {
    if n <= 0 || d < 0 {
        return Err(CombinatoricsError::InvalidMultisetInput { n, d });
    }
    let count = multiset_count(n as u64, d as u64);
    let width = d as usize;
    if !count.is_finite() || count * (width.max(1) as f64) >= usize::MAX as f64 {
        return Err(CombinatoricsError::TooManyMultisets { n, d, count });
    }
    let rows = count as usize;
    let top = n as usize;

    let mut table = Array2::<usize>::zeros((rows, width));
    let mut current = vec![1usize; width];
    for r in 0..rows {
        for (slot, &value) in table.row_mut(r).iter_mut().zip(current.iter()) {
            *slot = value;
        }
        if let Some(i) = (0..width).rev().find(|&i| current[i] < top) {
            let next = current[i] + 1;
            current[i..].iter_mut().for_each(|v| *v = next);
        }
    }
    Ok(table)
}
