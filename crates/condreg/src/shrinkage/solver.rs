//! Shrunk eigenvalues for one or more penalties
//!
//! A penalty at or above the sample condition number leaves the spectrum
//! untouched. Every other penalty reads its optimal floor off the
//! regularization path, which is traced at most once per call.

use super::{FlooredSpectrum, PathCurve, PathDirection};
use crate::error::{CondregError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;

/// Shrunk spectra for a batch of penalties
#[derive(Debug, Clone, Serialize)]
pub struct ShrinkageSolution {
    /// Penalties in the order they were requested
    pub penalties: Vec<f64>,

    /// Shrunk eigenvalues, one row per penalty (g x p)
    pub shrunk_eigenvalues: Array2<f64>,

    /// Optimal floor `u` on the reciprocal eigenvalues for each penalty
    pub floors: Array1<f64>,

    /// Whether the penalty was already satisfied by the sample spectrum
    pub degenerate: Vec<bool>,
}

impl ShrinkageSolution {
    /// Shrunk eigenvalues for the `i`-th penalty
    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.shrunk_eigenvalues.row(i)
    }

    /// Number of penalties solved
    pub fn len(&self) -> usize {
        self.penalties.len()
    }

    /// True if no penalty was solved
    pub fn is_empty(&self) -> bool {
        self.penalties.is_empty()
    }
}

/// Check that a penalty is finite and at least 1
pub fn validate_penalty(penalty: f64) -> Result<()> {
    if penalty.is_finite() && penalty >= 1.0 {
        Ok(())
    } else {
        Err(CondregError::InvalidPenalty(penalty))
    }
}

/// Check a non-empty list of penalties
pub fn validate_penalties(penalties: &[f64]) -> Result<()> {
    if penalties.is_empty() {
        return Err(CondregError::EmptyGrid);
    }
    penalties.iter().try_for_each(|&k| validate_penalty(k))
}

/// Eigenvalue shrinkage solver
#[derive(Debug, Clone, Copy, Default)]
pub struct ShrinkageSolver {
    direction: PathDirection,
}

impl ShrinkageSolver {
    /// Create a solver that traces the path in the given direction
    pub const fn new(direction: PathDirection) -> Self {
        Self { direction }
    }

    /// Direction used to trace the regularization path
    pub const fn direction(&self) -> PathDirection {
        self.direction
    }

    /// Shrink a descending spectrum for every penalty in `penalties`
    ///
    /// # Arguments
    /// * `eigenvalues` - Sample eigenvalues in descending order
    /// * `penalties` - Condition-number bounds, each finite and `>= 1`
    ///
    /// # Errors
    /// Returns [`CondregError::EmptyGrid`] or [`CondregError::InvalidPenalty`]
    /// for bad penalties, and [`CondregError::InvalidData`] for a spectrum that
    /// is not finite or not sorted.
    pub fn solve(&self, eigenvalues: &[f64], penalties: &[f64]) -> Result<ShrinkageSolution> {
        validate_penalties(penalties)?;
        let spectrum = FlooredSpectrum::new(eigenvalues)?;

        let l = &spectrum.values;
        let p = l.len();
        let g = penalties.len();
        let largest = spectrum.largest();
        let smallest = spectrum.smallest();
        let condition = spectrum.condition_number();

        let mut shrunk_eigenvalues = Array2::<f64>::zeros((g, p));
        let mut floors = Array1::<f64>::zeros(g);
        let mut degenerate = vec![false; g];
        let mut path: Option<PathCurve> = None;

        for (i, &k) in penalties.iter().enumerate() {
            let mut row = shrunk_eigenvalues.row_mut(i);

            if k >= condition {
                row.assign(&ArrayView1::from(l.as_slice()));
                floors[i] = (1.0 / (k * smallest)).max(1.0 / largest);
                degenerate[i] = true;
                continue;
            }

            let u = path
                .get_or_insert_with(|| PathCurve::from_floored(&spectrum, self.direction))
                .floor_at(k);
            for (shrunk, &x) in row.iter_mut().zip(l) {
                *shrunk = 1.0 / (1.0 / x).max(u).min(k * u);
            }
            floors[i] = u;
        }

        Ok(ShrinkageSolution {
            penalties: penalties.to_vec(),
            shrunk_eigenvalues,
            floors,
            degenerate,
        })
    }

    /// Shrink a descending spectrum for a single penalty
    pub fn solve_single(&self, eigenvalues: &[f64], penalty: f64) -> Result<Array1<f64>> {
        let solution = self.solve(eigenvalues, &[penalty])?;
        Ok(solution.row(0).to_owned())
    }
}
