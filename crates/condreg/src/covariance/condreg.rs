//! Condition-number-regularized covariance estimator
//!
//! Shrinks the sample spectrum so that `max(L̄) / min(L̄) <= k` and rebuilds
//! the covariance in the sample eigenbasis:
//!
//! S = Q · diag(L̄) · Qᵗ,   S⁻¹ = Q · diag(1/L̄) · Qᵗ

use super::CovarianceEstimator;
use super::eigen::EigenSpectrum;
use crate::error::{CondregError, Result};
use crate::shrinkage::{PathDirection, ShrinkageSolver, validate_penalty};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Regularized covariance together with its inverse
#[derive(Debug, Clone, Serialize)]
pub struct RegularizedCovariance {
    /// Regularized covariance matrix (p x p)
    pub covariance: Array2<f64>,

    /// Inverse of `covariance` (p x p)
    pub precision: Array2<f64>,

    /// Shrunk eigenvalues, in the order of the basis columns
    pub eigenvalues: Array1<f64>,
}

impl RegularizedCovariance {
    /// Condition number of the regularized covariance
    pub fn condition_number(&self) -> f64 {
        let max = self.eigenvalues.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = self.eigenvalues.iter().copied().fold(f64::INFINITY, f64::min);
        max / min
    }
}

/// Rebuild covariance and precision from a basis and shrunk eigenvalues
///
/// # Arguments
/// * `basis` - Orthonormal basis with eigenvectors in columns (p x p)
/// * `shrunk` - Eigenvalue for each basis column, all strictly positive
pub fn reconstruct(basis: &Array2<f64>, shrunk: ArrayView1<'_, f64>) -> Result<RegularizedCovariance> {
    let p = shrunk.len();
    if basis.nrows() != p {
        return Err(CondregError::DimensionMismatch {
            expected: p,
            actual: basis.nrows(),
        });
    }
    if basis.ncols() != p {
        return Err(CondregError::DimensionMismatch {
            expected: p,
            actual: basis.ncols(),
        });
    }
    if shrunk.iter().any(|&l| !(l.is_finite() && l > 0.0)) {
        return Err(CondregError::NotPositiveDefinite);
    }

    let inverse = shrunk.mapv(f64::recip);
    let scaled = basis * &shrunk.insert_axis(Axis(0));
    let scaled_inverse = basis * &inverse.view().insert_axis(Axis(0));

    Ok(RegularizedCovariance {
        covariance: scaled.dot(&basis.t()),
        precision: scaled_inverse.dot(&basis.t()),
        eigenvalues: shrunk.to_owned(),
    })
}

/// Configuration for the regularized estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondregConfig {
    /// Upper bound `k` on the condition number (default: 10.0)
    pub max_condition: f64,

    /// Direction used to trace the regularization path (default: forward)
    pub direction: PathDirection,

    /// Whether to center the data before computing the covariance
    pub center: bool,
}

impl Default for CondregConfig {
    fn default() -> Self {
        Self {
            max_condition: 10.0,
            direction: PathDirection::Forward,
            center: false,
        }
    }
}

/// Covariance estimator with a fixed condition-number bound
#[derive(Debug, Clone, Default)]
pub struct CondregEstimator {
    config: CondregConfig,
}

impl CondregEstimator {
    /// Create a new estimator, rejecting penalties that are not finite or below 1
    pub fn new(config: CondregConfig) -> Result<Self> {
        validate_penalty(config.max_condition)?;
        Ok(Self { config })
    }

    /// Estimator configuration
    pub const fn config(&self) -> &CondregConfig {
        &self.config
    }

    /// Fit the regularized covariance of a data matrix
    ///
    /// # Arguments
    /// * `data` - Observations in rows, variables in columns (n x p)
    pub fn fit(&self, data: &Array2<f64>) -> Result<RegularizedCovariance> {
        let spectrum = EigenSpectrum::from_data(data, self.config.center)?;
        self.fit_spectrum(&spectrum)
    }

    /// Fit from an already decomposed covariance
    pub fn fit_spectrum(&self, spectrum: &EigenSpectrum) -> Result<RegularizedCovariance> {
        let shrunk = ShrinkageSolver::new(self.config.direction)
            .solve_single(spectrum.eigenvalues(), self.config.max_condition)?;
        reconstruct(spectrum.basis(), shrunk.view())
    }
}

impl CovarianceEstimator for CondregEstimator {
    fn estimate(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.fit(data)?.covariance)
    }
}
