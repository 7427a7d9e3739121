//! Covariance estimation
//!
//! Sample covariance, its spectral decomposition, and the
//! condition-number-regularized estimator built on top of both.

pub mod condreg;
pub mod eigen;

pub use condreg::{CondregConfig, CondregEstimator, RegularizedCovariance, reconstruct};
pub use eigen::{EigenDecomposition, EigenSpectrum, jacobi_eigendecomp};

use crate::error::{CondregError, Result};
use ndarray::{Array2, Axis};

/// Trait for covariance matrix estimators
pub trait CovarianceEstimator {
    /// Estimate the covariance matrix from observations
    ///
    /// # Arguments
    /// * `data` - Matrix where each row is an observation and each column a variable
    ///
    /// # Returns
    /// * Estimated covariance matrix (p x p where p is the number of variables)
    fn estimate(&self, data: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Sample covariance `XᵗX / n`
///
/// The divisor is `n`, not `n - 1`, which makes this the Gaussian maximum
/// likelihood estimate. Without `center` the data is taken to be zero-mean.
///
/// # Arguments
/// * `data` - Observations in rows, variables in columns (n x p)
/// * `center` - Subtract column means first
pub fn sample_covariance(data: &Array2<f64>, center: bool) -> Result<Array2<f64>> {
    let (n, p) = data.dim();
    if n == 0 {
        return Err(CondregError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if p == 0 {
        return Err(CondregError::InvalidData(
            "data has no columns".to_string(),
        ));
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(CondregError::InvalidData(
            "data contains non-finite values".to_string(),
        ));
    }

    let cov = match data.mean_axis(Axis(0)) {
        Some(means) if center => {
            let centered = data - &means.insert_axis(Axis(0));
            centered.t().dot(&centered)
        }
        _ => data.t().dot(data),
    };
    Ok(cov / n as f64)
}
