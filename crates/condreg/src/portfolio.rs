//! Portfolio utilities for regularized covariance estimates
//!
//! Minimum-variance weights solve `Σw = 1` and rescale so the weights sum to
//! one. A well-conditioned `Σ` keeps this solve stable, which is the usual
//! reason to regularize the covariance in the first place.

use crate::error::{CondregError, Result};
use ndarray::{Array1, Array2, ArrayView1};

/// Below this absolute value the sum of raw weights is treated as zero
const WEIGHT_SUM_TOLERANCE: f64 = 1e-10;

/// Minimum-variance portfolio weights for a covariance matrix
///
/// # Arguments
/// * `sigma` - Symmetric positive definite covariance matrix (p x p)
///
/// # Returns
/// * Weights summing to one; equal weights when the raw solution sums to zero
pub fn min_variance_weights(sigma: &Array2<f64>) -> Result<Array1<f64>> {
    let p = sigma.nrows();
    if sigma.ncols() != p {
        return Err(CondregError::DimensionMismatch {
            expected: p,
            actual: sigma.ncols(),
        });
    }
    if p == 0 {
        return Err(CondregError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if sigma.iter().any(|x| !x.is_finite()) {
        return Err(CondregError::InvalidData(
            "covariance contains non-finite values".to_string(),
        ));
    }

    let l = cholesky(sigma)?;
    let y = forward_substitute(&l, &Array1::ones(p));
    let w = backward_substitute(&l, &y);

    let total = w.sum();
    if total.abs() < WEIGHT_SUM_TOLERANCE {
        return Ok(Array1::from_elem(p, 1.0 / p as f64));
    }
    Ok(w / total)
}

/// Cost of rebalancing from `w_old` to `w_new`
///
/// The old weights are first grown by `last_earnings` and renormalised (when
/// their sum is non-zero), so drift since the last rebalance is not charged.
///
/// # Arguments
/// * `w_new` - Target weights
/// * `w_old` - Weights held at the start of the period
/// * `last_earnings` - Gross return of the last period
/// * `rel_cost` - Cost per unit of turnover, non-negative
/// * `wealth` - Portfolio value, positive
pub fn transaction_cost(
    w_new: ArrayView1<'_, f64>,
    w_old: ArrayView1<'_, f64>,
    last_earnings: f64,
    rel_cost: f64,
    wealth: f64,
) -> Result<f64> {
    if w_new.len() != w_old.len() {
        return Err(CondregError::DimensionMismatch {
            expected: w_new.len(),
            actual: w_old.len(),
        });
    }
    if !(rel_cost.is_finite() && rel_cost >= 0.0) {
        return Err(CondregError::InvalidParameter(format!(
            "relative transaction cost must be non-negative, got {rel_cost}"
        )));
    }
    if !(wealth.is_finite() && wealth > 0.0) {
        return Err(CondregError::InvalidParameter(format!(
            "wealth must be positive, got {wealth}"
        )));
    }

    let mut drifted = &w_old * last_earnings;
    let total = drifted.sum();
    if total != 0.0 {
        drifted /= total;
    }

    let turnover: f64 = w_new
        .iter()
        .zip(drifted.iter())
        .map(|(new, old)| (new - old).abs())
        .sum();
    Ok(wealth * rel_cost * turnover)
}

/// Lower-triangular Cholesky factor `L` with `A = L·Lᵗ`
fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        for i in j..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }

            if i == j {
                if sum <= 0.0 {
                    return Err(CondregError::NotPositiveDefinite);
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    Ok(l)
}

/// Solve `L·y = b` for lower-triangular `L`
fn forward_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    y
}

/// Solve `Lᵗ·x = y` for lower-triangular `L`
fn backward_substitute(l: &Array2<f64>, y: &Array1<f64>) -> Array1<f64> {
    let n = y.len();
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}
