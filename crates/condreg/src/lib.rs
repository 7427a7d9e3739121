#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/condreg/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod error;
pub mod portfolio;
pub mod selection;
pub mod shrinkage;

// Re-export main types
pub use covariance::{
    CondregConfig, CondregEstimator, CovarianceEstimator, EigenSpectrum, RegularizedCovariance,
    reconstruct, sample_covariance,
};
pub use error::{CondregError, Result};
pub use portfolio::{min_variance_weights, transaction_cost};
pub use selection::{
    CrossValidatedCovariance, CrossValidationConfig, CrossValidator, CvResult, penalty_grid,
};
pub use shrinkage::{
    EIGENVALUE_FLOOR, PathCurve, PathDirection, PathVertex, ShrinkageSolution, ShrinkageSolver,
};
