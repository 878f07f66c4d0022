//! Vectorization operators: `vec`, pruned `vec`, and half-vectorization.
//!
//! All operators follow the column-major convention used throughout the
//! STVAR parameter layout: `vec(A)` stacks the columns of `A`, and
//! `vech(A)` stacks the lower-triangular part (diagonal included) column by
//! column. Every operator has an exact inverse on its domain:
//!
//! - `unvec_matrix(d, vec_matrix(A)) == A` for any `d×n` matrix,
//! - `pruned_vec(unpruned_vec(v, d, mask), mask) == v` whenever
//!   `v.len()` equals the number of `true` entries in `mask`,
//! - `unvech(d, vech(A)) == A` for any symmetric `d×d` matrix.
//!
//! Shape checks are O(1) and always performed; values are never inspected.
use crate::linalg::errors::{LinalgError, LinalgResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Column-major flatten of a matrix (`vec` operator).
pub fn vec_matrix(a: ArrayView2<f64>) -> Array1<f64> {
    a.t().iter().copied().collect()
}

/// Column-major reshape of `v` into a `d × (v.len() / d)` matrix.
///
/// Errors
/// ------
/// - `LinalgError::IndivisibleLength` when `d == 0` or `v.len()` is not a
///   multiple of `d`.
pub fn unvec_matrix(d: usize, v: ArrayView1<f64>) -> LinalgResult<Array2<f64>> {
    if d == 0 || v.len() % d != 0 {
        return Err(LinalgError::IndivisibleLength { len: v.len(), rows: d });
    }
    let cols = v.len() / d;
    Ok(Array2::from_shape_fn((d, cols), |(i, j)| v[j * d + i]))
}

/// pruned_vec — `vec` restricted to the entries retained by `mask`.
///
/// Purpose
/// -------
/// Flatten a structural matrix into the compact representation used by the
/// optimizer when some entries are fixed at zero by a B-constraint
/// template. Entries are visited in column-major order and kept only where
/// `mask` is `true`.
///
/// Parameters
/// ----------
/// - `w`: `ArrayView2<f64>`
///   Matrix to flatten.
/// - `mask`: `ArrayView2<bool>`
///   Retention pattern with the same shape as `w`; typically
///   `BConstraints::mask()`.
///
/// Returns
/// -------
/// `LinalgResult<Array1<f64>>`
///   Vector whose length equals the number of `true` entries in `mask`.
///
/// Errors
/// ------
/// - `LinalgError::DimensionMismatch` when `w` and `mask` differ in shape.
///
/// Notes
/// -----
/// - Entries of `w` at masked-out positions are ignored, whatever their
///   value. The inverse is [`unpruned_vec`].
pub fn pruned_vec(w: ArrayView2<f64>, mask: ArrayView2<bool>) -> LinalgResult<Array1<f64>> {
    check_same_shape(w.dim(), mask.dim())?;
    Ok(w.t().iter().zip(mask.t().iter()).filter(|(_, keep)| **keep).map(|(x, _)| *x).collect())
}

/// unpruned_vec — scatter a pruned vector back into a `d × d` matrix.
///
/// Purpose
/// -------
/// Inverse of [`pruned_vec`]: place the entries of `v`, in column-major
/// order, exactly at the positions where `mask` is `true`; every other
/// entry is zero.
///
/// Parameters
/// ----------
/// - `v`: `ArrayView1<f64>`
///   Pruned values; length must equal the number of `true` mask entries.
/// - `d`: `usize`
///   Dimension of the square output.
/// - `mask`: `ArrayView2<bool>`
///   `d × d` retention pattern.
///
/// Returns
/// -------
/// `LinalgResult<Array2<f64>>`
///   The reconstructed `d × d` matrix.
///
/// Errors
/// ------
/// - `LinalgError::DimensionMismatch` when `mask` is not `d × d`.
/// - `LinalgError::PrunedLengthMismatch` when `v.len()` differs from the
///   number of retained entries.
pub fn unpruned_vec(
    v: ArrayView1<f64>, d: usize, mask: ArrayView2<bool>,
) -> LinalgResult<Array2<f64>> {
    check_same_shape((d, d), mask.dim())?;
    let retained = mask.iter().filter(|keep| **keep).count();
    if retained != v.len() {
        return Err(LinalgError::PrunedLengthMismatch { expected: retained, found: v.len() });
    }
    let mut out = Array2::<f64>::zeros((d, d));
    let mut values = v.iter();
    for j in 0..d {
        for i in 0..d {
            if mask[[i, j]] {
                if let Some(&x) = values.next() {
                    out[[i, j]] = x;
                }
            }
        }
    }
    Ok(out)
}

/// Half-vectorization of a square matrix (`vech` operator).
///
/// Stacks `A[j.., j]` for `j = 0..d`, i.e. the lower triangle including the
/// diagonal, column by column. The strict upper triangle is ignored, so the
/// caller must guarantee symmetry for the round trip to hold.
pub fn vech(a: ArrayView2<f64>) -> LinalgResult<Array1<f64>> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    let mut out = Vec::with_capacity(rows * (rows + 1) / 2);
    for j in 0..cols {
        for i in j..rows {
            out.push(a[[i, j]]);
        }
    }
    Ok(Array1::from(out))
}

/// Inverse of [`vech`]: rebuild a symmetric `d × d` matrix by mirroring the
/// lower triangle into the upper one.
pub fn unvech(d: usize, v: ArrayView1<f64>) -> LinalgResult<Array2<f64>> {
    if v.len() != d * (d + 1) / 2 {
        return Err(LinalgError::HalfVecLengthMismatch { d, found: v.len() });
    }
    let mut out = Array2::<f64>::zeros((d, d));
    let mut k = 0;
    for j in 0..d {
        for i in j..d {
            out[[i, j]] = v[k];
            out[[j, i]] = v[k];
            k += 1;
        }
    }
    Ok(out)
}

fn check_same_shape(left: (usize, usize), right: (usize, usize)) -> LinalgResult<()> {
    if left.0 != right.0 {
        return Err(LinalgError::DimensionMismatch {
            expected: left.0,
            found: right.0,
            what: "mask rows",
        });
    }
    if left.1 != right.1 {
        return Err(LinalgError::DimensionMismatch {
            expected: left.1,
            found: right.1,
            what: "mask columns",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Column-major ordering of `vec_matrix`, `vech` and their inverses.
    // - Exact round trips for full, pruned and half vectorization.
    // - Zero placement and length checks of `unpruned_vec`.
    //
    // They intentionally DO NOT cover:
    // - How masks are derived from B-constraint templates; see
    //   `stvar::config`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // `vec_matrix` stacks columns and `unvec_matrix` inverts it exactly.
    //
    // Given
    // -----
    // - A 3×3 matrix with distinct entries.
    //
    // Expect
    // ------
    // - vec = first column, then second, then third.
    // - unvec(3, vec(A)) == A.
    fn vec_matrix_is_column_major_and_inverted_by_unvec() {
        let a = array![[1.0, 4.0, 7.0], [2.0, 5.0, 8.0], [3.0, 6.0, 9.0]];

        let v = vec_matrix(a.view());

        assert_eq!(v, array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(unvec_matrix(3, v.view()).unwrap(), a);
    }

    #[test]
    // Purpose
    // -------
    // `unvec_matrix` also reshapes wide blocks such as `[A_1 : A_2]`.
    //
    // Given
    // -----
    // - A 2×4 matrix.
    //
    // Expect
    // ------
    // - The round trip through a length-8 vector reproduces it.
    // - Lengths that are not a multiple of `d` are rejected.
    fn unvec_matrix_handles_wide_blocks_and_rejects_ragged_lengths() {
        let a = array![[1.0, 3.0, 5.0, 7.0], [2.0, 4.0, 6.0, 8.0]];

        let back = unvec_matrix(2, vec_matrix(a.view()).view()).unwrap();

        assert_eq!(back, a);
        let err = unvec_matrix(3, array![1.0, 2.0].view()).unwrap_err();
        assert_eq!(err, LinalgError::IndivisibleLength { len: 2, rows: 3 });
    }

    #[test]
    // Purpose
    // -------
    // Pruned vectorization keeps only masked entries and its inverse puts
    // them back at exactly those positions.
    //
    // Given
    // -----
    // - A 3×3 mask with three zero positions.
    // - A vector of six values.
    //
    // Expect
    // ------
    // - Zero-mask positions of the scattered matrix are exactly 0.0.
    // - pruned_vec(unpruned_vec(v)) == v.
    fn pruned_round_trip_places_values_only_at_retained_positions() {
        let mask = array![[true, false, true], [true, true, false], [false, true, true]];
        let v = array![1.5, -2.0, 3.0, 4.0, -0.5, 6.0];

        let w = unpruned_vec(v.view(), 3, mask.view()).unwrap();

        for ((i, j), &keep) in mask.indexed_iter() {
            if !keep {
                assert_eq!(w[[i, j]], 0.0);
            }
        }
        assert_eq!(w[[0, 0]], 1.5);
        assert_eq!(w[[1, 0]], -2.0);
        assert_eq!(w[[1, 1]], 3.0);
        assert_eq!(pruned_vec(w.view(), mask.view()).unwrap(), v);
    }

    #[test]
    // Purpose
    // -------
    // `unpruned_vec` fails loudly when the vector length disagrees with the
    // number of retained mask entries.
    //
    // Given
    // -----
    // - A 2×2 mask retaining three entries and a vector of length two.
    //
    // Expect
    // ------
    // - `PrunedLengthMismatch { expected: 3, found: 2 }`.
    fn unpruned_vec_rejects_length_mismatch() {
        let mask = array![[true, false], [true, true]];

        let err = unpruned_vec(array![1.0, 2.0].view(), 2, mask.view()).unwrap_err();

        assert_eq!(err, LinalgError::PrunedLengthMismatch { expected: 3, found: 2 });
    }

    #[test]
    // Purpose
    // -------
    // `vech` reads the lower triangle column by column and `unvech`
    // restores the full symmetric matrix.
    //
    // Given
    // -----
    // - A symmetric 3×3 matrix.
    //
    // Expect
    // ------
    // - vech has length 6 with the documented ordering.
    // - unvech(3, vech(A)) == A.
    fn vech_round_trip_restores_symmetric_matrix() {
        let a = array![[4.0, 1.0, 0.5], [1.0, 3.0, -0.2], [0.5, -0.2, 2.0]];

        let v = vech(a.view()).unwrap();

        assert_eq!(v, array![4.0, 1.0, 0.5, 3.0, -0.2, 2.0]);
        assert_eq!(unvech(3, v.view()).unwrap(), a);
    }

    #[test]
    // Purpose
    // -------
    // Shape guards of the half-vectorization operators.
    //
    // Given
    // -----
    // - A non-square matrix and a vector of the wrong length.
    //
    // Expect
    // ------
    // - `NotSquare` and `HalfVecLengthMismatch` respectively.
    fn half_vectorization_rejects_bad_shapes() {
        let rect = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];

        assert_eq!(vech(rect.view()).unwrap_err(), LinalgError::NotSquare { rows: 2, cols: 3 });
        assert_eq!(
            unvech(2, array![1.0, 2.0].view()).unwrap_err(),
            LinalgError::HalfVecLengthMismatch { d: 2, found: 2 }
        );
    }
}
