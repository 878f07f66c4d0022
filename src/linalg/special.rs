//! Special matrices, matrix powers and the ndarray ↔ nalgebra bridge.
//!
//! The crate stores every structural matrix as an `ndarray` array and
//! hands square matrices to `nalgebra` only for factorizations (Schur,
//! symmetric eigen, Cholesky, inversion). [`to_dmatrix`] and
//! [`from_dmatrix`] are the only conversion points.
use crate::linalg::errors::{LinalgError, LinalgResult};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};

/// Copy an `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// Entries are written column by column, matching the column-major storage
/// of `DMatrix`.
pub fn to_dmatrix(a: ArrayView2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

/// Copy a `nalgebra::DMatrix` back into an `ndarray` matrix.
pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// matrix_power — integer power by exponentiation by squaring.
///
/// Purpose
/// -------
/// Compute `A^j` with O(log j) matrix multiplications. Used to build powers
/// of companion matrices without repeated naive multiplication.
///
/// Parameters
/// ----------
/// - `a`: `ArrayView2<f64>`
///   Square matrix.
/// - `j`: `u32`
///   Non-negative exponent.
///
/// Returns
/// -------
/// `LinalgResult<Array2<f64>>`
///   `A^j`; for `j == 0` the identity, whatever the content of `A`.
///
/// Errors
/// ------
/// - `LinalgError::NotSquare` when `a` is not square.
pub fn matrix_power(a: ArrayView2<f64>, j: u32) -> LinalgResult<Array2<f64>> {
    let (rows, cols) = a.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    let mut result = Array2::<f64>::eye(rows);
    let mut base = a.to_owned();
    let mut exp = j;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.dot(&base);
        }
        exp >>= 1;
        if exp > 0 {
            base = base.dot(&base);
        }
    }
    Ok(result)
}

/// The `d × dp` selector `[I_d : 0 : … : 0]` that extracts the first block of
/// a companion-form state vector.
pub fn companion_selector(d: usize, p: usize) -> Array2<f64> {
    Array2::from_shape_fn((d, d * p), |(i, j)| if i == j { 1.0 } else { 0.0 })
}

/// The `t × t` lag-shift matrix with ones on the `i`-th sub-diagonal.
///
/// `i == 0` gives the identity and `i >= t` the zero matrix. Multiplying a
/// `t`-row residual matrix by it shifts the rows down by `i`, which is the
/// building block of Portmanteau-type autocorrelation statistics.
pub fn subdiagonal_shift(i: usize, t: usize) -> Array2<f64> {
    Array2::from_shape_fn((t, t), |(r, c)| if r == c + i { 1.0 } else { 0.0 })
}

/// order_by_sign_and_magnitude — canonical column order of an impact matrix.
///
/// Purpose
/// -------
/// Remove the sign and ordering indeterminacy of structural shocks: every
/// column is multiplied by −1 when its first entry is negative, then the
/// columns are sorted by their (now non-negative) first entry in decreasing
/// order.
///
/// Parameters
/// ----------
/// - `b`: `ArrayView2<f64>`
///   Square structural impact matrix.
///
/// Returns
/// -------
/// `LinalgResult<Array2<f64>>`
///   The canonicalized matrix. Applying the function twice gives the same
///   result as applying it once.
///
/// Errors
/// ------
/// - `LinalgError::NotSquare` when `b` is not square.
///
/// Notes
/// -----
/// - Ties keep their original relative order (stable sort).
pub fn order_by_sign_and_magnitude(b: ArrayView2<f64>) -> LinalgResult<Array2<f64>> {
    let (rows, cols) = b.dim();
    if rows != cols {
        return Err(LinalgError::NotSquare { rows, cols });
    }
    let mut flipped = b.to_owned();
    for mut column in flipped.columns_mut() {
        if column[0] < 0.0 {
            column.mapv_inplace(|x| -x);
        }
    }
    let mut order: Vec<usize> = (0..cols).collect();
    order.sort_by(|&l, &r| flipped[[0, r]].total_cmp(&flipped[[0, l]]));
    let mut out = Array2::<f64>::zeros((rows, cols));
    for (target, &source) in order.iter().enumerate() {
        out.column_mut(target).assign(&flipped.column(source));
    }
    Ok(out)
}
