//! Error types for condreg.

use thiserror::Error;

/// Result type alias using [`CondregError`].
pub type Result<T> = std::result::Result<T, CondregError>;

/// Errors that can occur while estimating a regularized covariance matrix
#[derive(Debug, Error, PartialEq)]
pub enum CondregError {
    /// Penalty outside `[1, ∞)` or not finite
    #[error("Invalid penalty: {0} (must be a finite value >= 1)")]
    InvalidPenalty(f64),

    /// No penalty values supplied
    #[error("Penalty grid is empty")]
    EmptyGrid,

    /// Input values that cannot be used (non-finite entries, unsorted spectrum)
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Input matrix is not symmetric
    #[error("Matrix is not symmetric: entry ({row}, {col}) differs from its transpose")]
    NotSymmetric {
        /// Row of the first offending entry
        row: usize,
        /// Column of the first offending entry
        col: usize,
    },

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        actual: usize,
    },

    /// Insufficient data for estimation
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Symmetric eigen-decomposition did not converge
    #[error("Eigen-decomposition did not converge after {sweeps} sweeps")]
    DecompositionFailed {
        /// Number of Jacobi sweeps performed
        sweeps: usize,
    },

    /// Matrix is not positive definite
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,

    /// Unrecognised path direction selector
    #[error("Unknown path direction: {0:?} (expected \"forward\" or \"backward\")")]
    UnknownDirection(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
