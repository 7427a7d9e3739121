//! Penalty selection
//!
//! Chooses the condition-number bound by k-fold cross-validation of the
//! held-out Gaussian likelihood over a grid of candidate penalties.

pub mod cv;
pub mod grid;

pub use cv::{
    CrossValidatedCovariance, CrossValidationConfig, CrossValidator, CvResult, fold_ranges,
    median_tie_index,
};
pub use grid::penalty_grid;
