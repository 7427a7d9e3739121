//! Eigenvalue shrinkage under a condition-number bound
//!
//! Given a sample spectrum `L` and a penalty `k >= 1`, the regularized
//! spectrum clips every reciprocal eigenvalue into a band `[u, k·u]`:
//!
//! 1/L̄ᵢ = clip(1/Lᵢ, u, k·u)
//!
//! where the floor `u` maximises the Gaussian likelihood. The optimal floor is
//! a piecewise-hyperbolic function of `k`, traced once per spectrum by
//! [`PathCurve`] and then looked up for any number of penalties by
//! [`ShrinkageSolver`].

pub mod path;
pub mod solver;

pub use path::{PathCurve, PathVertex};
pub use solver::{ShrinkageSolution, ShrinkageSolver, validate_penalties, validate_penalty};

use crate::error::{CondregError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest eigenvalue admitted by the solver.
///
/// Eigenvalues below this value are treated as numerically zero and raised to
/// it before any reciprocal or logarithm is taken.
pub const EIGENVALUE_FLOOR: f64 = f64::EPSILON;

/// Relative tolerance used to decide that the path has reached a boundary
pub(crate) const BOUNDARY_TOLERANCE: f64 = 1e-12;

/// Direction in which the regularization path is traced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathDirection {
    /// Start at `k = 1` and sweep toward the unconstrained solution
    #[default]
    Forward,

    /// Start at `k = ∞` and sweep down to the fully collapsed solution
    Backward,
}

impl PathDirection {
    /// Lowercase name used on the command line and in serialized configs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

impl fmt::Display for PathDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathDirection {
    type Err = CondregError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "backward" => Ok(Self::Backward),
            _ => Err(CondregError::UnknownDirection(s.to_string())),
        }
    }
}

/// A private, floored copy of a descending spectrum
#[derive(Debug, Clone)]
pub(crate) struct FlooredSpectrum {
    /// Eigenvalues in descending order, each at least [`EIGENVALUE_FLOOR`]
    pub(crate) values: Vec<f64>,
    /// Number of eigenvalues strictly above the floor
    pub(crate) rank: usize,
}

impl FlooredSpectrum {
    /// Validate and floor a descending spectrum
    pub(crate) fn new(eigenvalues: &[f64]) -> Result<Self> {
        if eigenvalues.is_empty() {
            return Err(CondregError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if let Some(bad) = eigenvalues.iter().find(|l| !l.is_finite()) {
            return Err(CondregError::InvalidData(format!(
                "eigenvalue {bad} is not finite"
            )));
        }

        let values: Vec<f64> = eigenvalues
            .iter()
            .map(|&l| l.max(EIGENVALUE_FLOOR))
            .collect();

        if let Some(i) = values.windows(2).position(|w| w[1] > w[0]) {
            return Err(CondregError::InvalidData(format!(
                "eigenvalues must be sorted in descending order (index {} < index {})",
                i,
                i + 1
            )));
        }

        let rank = values.iter().filter(|&&l| l > EIGENVALUE_FLOOR).count();
        Ok(Self { values, rank })
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn largest(&self) -> f64 {
        self.values[0]
    }

    pub(crate) fn smallest(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub(crate) fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Ratio of the largest to the smallest eigenvalue
    pub(crate) fn condition_number(&self) -> f64 {
        self.largest() / self.smallest()
    }

    /// True when every eigenvalue is equal (within tolerance)
    pub(crate) fn is_flat(&self) -> bool {
        self.largest() <= self.smallest() * (1.0 + BOUNDARY_TOLERANCE)
    }
}
