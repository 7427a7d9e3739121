//! K-fold cross-validation of the condition-number penalty
//!
//! Each fold trains on the complement of a contiguous block of rows, shrinks
//! the training spectrum for every candidate penalty, and scores the held-out
//! block by its Gaussian negative log-likelihood:
//!
//! nll(k) = mean_rows Σₘ yₘ² / L̄ₘ(k) + Σₘ ln L̄ₘ(k)
//!
//! where `y` is a held-out row expressed in the training eigenbasis.

use crate::covariance::{CondregConfig, CondregEstimator, EigenSpectrum, RegularizedCovariance};
use crate::error::{CondregError, Result};
use crate::shrinkage::{PathDirection, ShrinkageSolver, validate_penalties};
use ndarray::{Array2, Axis, s};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default upper limit on the number of folds
pub const DEFAULT_MAX_FOLDS: usize = 10;

/// Cross-validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationConfig {
    /// Number of folds (default: `min(n, 10)`)
    pub folds: Option<usize>,

    /// Direction used to trace each fold's regularization path
    pub direction: PathDirection,

    /// Whether to center the data with the training mean of each fold
    pub center: bool,

    /// Evaluate folds on the rayon thread pool
    pub parallel: bool,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            folds: None,
            direction: PathDirection::Forward,
            center: false,
            parallel: true,
        }
    }
}

/// Held-out scores and the selected penalty
#[derive(Debug, Clone, Serialize)]
pub struct CvResult {
    /// Candidate penalties, in grid order
    pub penalties: Vec<f64>,

    /// Held-out negative log-likelihood (folds x penalties)
    pub neg_log_likelihood: Array2<f64>,

    /// Negative log-likelihood summed over folds, one entry per penalty
    pub aggregate: Vec<f64>,

    /// Grid index with the smallest aggregate score
    pub selected_index: usize,

    /// Selected penalty after clamping to `max_condition`
    pub selected_penalty: f64,

    /// Largest condition number among the training spectra (at least 1)
    pub max_condition: f64,
}

/// Selected penalty with the full-data estimate it produces
#[derive(Debug, Clone, Serialize)]
pub struct CrossValidatedCovariance {
    /// Regularized covariance of the full data at the selected penalty
    pub estimate: RegularizedCovariance,

    /// Penalty used for `estimate`
    pub selected_penalty: f64,

    /// Cross-validation details
    pub cv: CvResult,
}

/// Scores of one fold
#[derive(Debug)]
struct FoldScore {
    scores: Vec<f64>,
    condition: f64,
}

/// K-fold penalty selector
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    config: CrossValidationConfig,
}

impl CrossValidator {
    /// Create a new cross-validator with the given configuration
    pub const fn new(config: CrossValidationConfig) -> Self {
        Self { config }
    }

    /// Cross-validation configuration
    pub const fn config(&self) -> &CrossValidationConfig {
        &self.config
    }

    /// Score every penalty and select the best one
    ///
    /// # Arguments
    /// * `data` - Observations in rows, variables in columns (n x p)
    /// * `penalties` - Candidate condition-number bounds
    ///
    /// # Returns
    /// * Per-fold scores, the selected grid index, and the selected penalty
    ///   clamped to the largest training condition number
    pub fn select(&self, data: &Array2<f64>, penalties: &[f64]) -> Result<CvResult> {
        validate_penalties(penalties)?;

        let (n, p) = data.dim();
        if n < 2 {
            return Err(CondregError::InsufficientData {
                required: 2,
                actual: n,
            });
        }
        if p == 0 {
            return Err(CondregError::InvalidData("data has no columns".to_string()));
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(CondregError::InvalidData(
                "data contains non-finite values".to_string(),
            ));
        }

        let folds = self.config.folds.unwrap_or_else(|| n.min(DEFAULT_MAX_FOLDS));
        if !(2..=n).contains(&folds) {
            return Err(CondregError::InvalidParameter(format!(
                "number of folds must be between 2 and {n}, got {folds}"
            )));
        }

        let ranges = fold_ranges(n, folds);
        let fold_scores: Vec<FoldScore> = if self.config.parallel {
            ranges
                .par_iter()
                .map(|range| self.evaluate_fold(data, range.clone(), penalties))
                .collect::<Result<Vec<_>>>()?
        } else {
            ranges
                .iter()
                .map(|range| self.evaluate_fold(data, range.clone(), penalties))
                .collect::<Result<Vec<_>>>()?
        };

        let g = penalties.len();
        let mut neg_log_likelihood = Array2::<f64>::zeros((folds, g));
        for (mut row, fold) in neg_log_likelihood.rows_mut().into_iter().zip(&fold_scores) {
            row.iter_mut()
                .zip(&fold.scores)
                .for_each(|(dst, &score)| *dst = score);
        }
        let aggregate = neg_log_likelihood.sum_axis(Axis(0)).to_vec();
        let max_condition = fold_scores
            .iter()
            .map(|fold| fold.condition)
            .fold(1.0, f64::max);

        let selected_index = median_tie_index(&aggregate).ok_or_else(|| {
            CondregError::InvalidData("cross-validation produced no finite score".to_string())
        })?;
        let best = penalties[selected_index];
        let selected_penalty = best.min(max_condition);
        if selected_penalty < best {
            log::warn!(
                "selected penalty {best} exceeds the largest training condition number; clamped to {selected_penalty}"
            );
        }
        log::info!(
            "selected penalty {selected_penalty} (grid index {selected_index} of {g}, {folds} folds)"
        );

        Ok(CvResult {
            penalties: penalties.to_vec(),
            neg_log_likelihood,
            aggregate,
            selected_index,
            selected_penalty,
            max_condition,
        })
    }

    /// Select a penalty, then fit the full data with it
    pub fn fit(&self, data: &Array2<f64>, penalties: &[f64]) -> Result<CrossValidatedCovariance> {
        let cv = self.select(data, penalties)?;
        let estimator = CondregEstimator::new(CondregConfig {
            max_condition: cv.selected_penalty,
            direction: self.config.direction,
            center: self.config.center,
        })?;
        let estimate = estimator.fit(data)?;

        Ok(CrossValidatedCovariance {
            estimate,
            selected_penalty: cv.selected_penalty,
            cv,
        })
    }

    fn evaluate_fold(
        &self,
        data: &Array2<f64>,
        held_out: Range<usize>,
        penalties: &[f64],
    ) -> Result<FoldScore> {
        let (n, p) = data.dim();
        let train_rows: Vec<usize> = (0..held_out.start).chain(held_out.end..n).collect();
        let train = data.select(Axis(0), &train_rows);
        let n_train = train_rows.len();

        let spectrum = EigenSpectrum::from_data(&train, self.config.center)?;
        // centering spends one degree of freedom on the mean
        let informative = n_train.saturating_sub(usize::from(self.config.center)).max(1);
        let condition = spectrum.leading_condition_number(informative.min(p));
        log::debug!(
            "fold rows {}..{}: {} training rows, condition number {:.4e}",
            held_out.start,
            held_out.end,
            n_train,
            condition
        );

        let solution = ShrinkageSolver::new(self.config.direction)
            .solve(spectrum.eigenvalues(), penalties)?;

        let test = data.slice(s![held_out, ..]);
        let projected = match train.mean_axis(Axis(0)) {
            Some(means) if self.config.center => {
                (&test - &means.insert_axis(Axis(0))).dot(spectrum.basis())
            }
            _ => test.dot(spectrum.basis()),
        };
        let squared = projected.mapv(|y| y * y);
        let n_test = squared.nrows() as f64;

        let scores = solution
            .shrunk_eigenvalues
            .rows()
            .into_iter()
            .map(|shrunk| {
                let quadratic = squared.dot(&shrunk.mapv(f64::recip)).sum() / n_test;
                let log_det: f64 = shrunk.iter().map(|l| l.ln()).sum();
                quadratic + log_det
            })
            .collect();

        Ok(FoldScore { scores, condition })
    }
}

/// Contiguous fold boundaries over `n` rows
///
/// The first `n % folds` folds receive one extra row. Returns no folds when
/// `folds` is zero.
pub fn fold_ranges(n: usize, folds: usize) -> Vec<Range<usize>> {
    if folds == 0 {
        return Vec::new();
    }
    let base = n / folds;
    let extra = n % folds;

    let mut start = 0;
    (0..folds)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let range = start..start + size;
            start += size;
            range
        })
        .collect()
}

/// Index of the smallest score, taking the median of exact ties
///
/// With an even number of tied indices the two middle ones are averaged and
/// rounded down. When the ties are not contiguous the result can therefore
/// be an index that is not itself a minimiser: `[2, 0, 0, 5, 0, 0]` gives 3.
/// Non-finite scores are ignored; returns `None` when no finite score remains.
pub fn median_tie_index(scores: &[f64]) -> Option<usize> {
    let best = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |m| m.min(s))))?;

    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == best)
        .map(|(i, _)| i)
        .collect();
    let m = tied.len();
    Some((tied[(m - 1) / 2] + tied[m / 2]) / 2)
}
