//! Brute-force bracket of the joint spectral radius of the regime family.
//!
//! For a finite family `{A_1, …, A_M}` and any product length `k`,
//!
//! ```text
//! max_P ρ(P)^{1/k}  ≤  JSR  ≤  max_P ‖P‖₂^{1/k},
//! ```
//!
//! where `P` ranges over all `M^k` ordered products of length `k`. The
//! bracket tightens as `k` grows; a regime-switching model is globally
//! stable when the upper bound is below one. Products are enumerated with a
//! mixed-radix counter over regime sequences and built incrementally, so
//! each product costs one matrix multiplication.
//!
//! Matrix products do not commute, so ordered sequences are required here;
//! `combinatorics::enumerate_multisets` lists the `C(M + k − 1, k)`
//! unordered regime combinations of the same length, one per class of
//! sequences with equal regime counts.
use crate::{
    diagnostics::companion::{companion_matrices, spectral_radius},
    linalg::decomposition::sorted_symmetric_eigen,
    stvar::{
        config::StvarConfig,
        errors::{StvarError, StvarResult},
        reform::reform_parameters,
    },
};
use ndarray::{Array2, ArrayView1};

/// Upper limit on `M^k` accepted by [`jsr_bounds`].
pub const MAX_JSR_PRODUCTS: usize = 1 << 20;

/// Lower and upper bounds of the joint spectral radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsrBounds {
    pub lower: f64,
    pub upper: f64,
    /// Product length used.
    pub k: usize,
}

impl JsrBounds {
    /// `true` when the upper bound certifies stability.
    pub fn certifies_stability(&self) -> bool {
        self.upper < 1.0
    }
}

/// jsr_bounds — bracket the JSR from all products of length `k`.
///
/// Parameters
/// ----------
/// - `matrices`: `&[Array2<f64>]`
///   Non-empty family of equally sized square matrices.
/// - `k`: `usize`
///   Product length, `k ≥ 1`.
///
/// Returns
/// -------
/// `StvarResult<JsrBounds>`
///   `lower = max ρ(P)^{1/k}`, `upper = max ‖P‖₂^{1/k}`.
///
/// Errors
/// ------
/// - `StvarError::InvalidArgument` for an empty family, `k == 0`, ragged
///   shapes, or more than [`MAX_JSR_PRODUCTS`] products.
/// - Eigen solver failures.
pub fn jsr_bounds(matrices: &[Array2<f64>], k: usize) -> StvarResult<JsrBounds> {
    let Some(first) = matrices.first() else {
        return Err(StvarError::InvalidArgument { name: "matrices", reason: "family is empty" });
    };
    if k == 0 {
        return Err(StvarError::InvalidArgument { name: "k", reason: "must be at least 1" });
    }
    let n = first.nrows();
    if matrices.iter().any(|a| a.dim() != (n, n)) {
        return Err(StvarError::InvalidArgument {
            name: "matrices",
            reason: "all matrices must be square of the same size",
        });
    }
    let m = matrices.len();
    let too_many = (0..k)
        .try_fold(1_usize, |acc, _| acc.checked_mul(m))
        .is_none_or(|total| total > MAX_JSR_PRODUCTS);
    if too_many {
        return Err(StvarError::InvalidArgument {
            name: "k",
            reason: "too many products to enumerate",
        });
    }

    let exponent = 1.0 / k as f64;
    let mut lower = 0.0_f64;
    let mut upper = 0.0_f64;

    // prefix[j] = A_{seq[0]} · … · A_{seq[j]}
    let mut seq = vec![0_usize; k];
    let mut prefix: Vec<Array2<f64>> = Vec::with_capacity(k);
    prefix.push(matrices[0].clone());
    for j in 1..k {
        let next = prefix[j - 1].dot(&matrices[0]);
        prefix.push(next);
    }

    loop {
        let product = &prefix[k - 1];
        lower = lower.max(spectral_radius(product.view())?.powf(exponent));
        upper = upper.max(spectral_norm(product)?.powf(exponent));

        // advance the mixed-radix counter
        let Some(pos) = (0..k).rev().find(|&j| seq[j] + 1 < m) else {
            break;
        };
        seq[pos] += 1;
        for j in pos + 1..k {
            seq[j] = 0;
        }
        for j in pos..k {
            prefix[j] = if j == 0 {
                matrices[seq[0]].clone()
            } else {
                prefix[j - 1].dot(&matrices[seq[j]])
            };
        }
    }

    Ok(JsrBounds { lower, upper, k })
}

/// JSR bracket of the companion matrices of `(config, θ)`.
pub fn regime_jsr_bounds(
    config: &StvarConfig, theta: ArrayView1<f64>, k: usize,
) -> StvarResult<JsrBounds> {
    let sm = reform_parameters(config, theta)?;
    let companions = companion_matrices(sm.p, sm.m, sm.d, &sm.ar)?;
    jsr_bounds(&companions, k)
}

/// Spectral norm `‖P‖₂ = √λ_max(P'P)`.
fn spectral_norm(p: &Array2<f64>) -> StvarResult<f64> {
    let (values, _) = sorted_symmetric_eigen(p.t().dot(p).view())?;
    Ok(values.get(0).copied().unwrap_or(0.0).max(0.0).sqrt())
}
