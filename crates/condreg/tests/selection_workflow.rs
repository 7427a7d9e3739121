//! Integration tests for cross-validated estimation and its downstream uses.

use approx::assert_relative_eq;
use condreg::{
    CondregConfig, CondregEstimator, CrossValidationConfig, CrossValidator, EigenSpectrum,
    PathDirection, min_variance_weights, penalty_grid, reconstruct,
};
use ndarray::{Array1, Array2};

/// Deterministic pseudo-random data with decaying column scales
fn sample_data(n: usize, p: usize, seed: u64) -> Array2<f64> {
    let mut state = seed;
    Array2::from_shape_fn((n, p), |(_, j)| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let uniform = (state >> 11) as f64 / (1u64 << 53) as f64;
        (uniform - 0.5) * 4.0 / (j + 1) as f64
    })
}

#[test]
fn test_full_selection_workflow() {
    let data = sample_data(60, 8, 7);
    let grid = penalty_grid(100.0, 25).unwrap();

    let result = CrossValidator::default().fit(&data, &grid).unwrap();

    assert_eq!(result.cv.neg_log_likelihood.dim(), (10, 25));
    assert!(result.selected_penalty >= 1.0);
    assert!(result.selected_penalty <= result.cv.max_condition);
    assert!(result.estimate.condition_number() <= result.selected_penalty * (1.0 + 1e-8));

    let weights = min_variance_weights(&result.estimate.covariance).unwrap();
    assert_relative_eq!(weights.sum(), 1.0, max_relative = 1e-10);
}

#[test]
fn test_wide_data_is_regularized() {
    // more variables than observations: the sample covariance is singular
    let data = sample_data(12, 20, 11);
    let spectrum = EigenSpectrum::from_data(&data, false).unwrap();
    assert!(spectrum.condition_number() > 1e6);

    let estimator = CondregEstimator::new(CondregConfig {
        max_condition: 30.0,
        ..Default::default()
    })
    .unwrap();
    let fitted = estimator.fit_spectrum(&spectrum).unwrap();
    assert_relative_eq!(fitted.condition_number(), 30.0, max_relative = 1e-8);

    // positive definite now, so the portfolio solve succeeds
    assert!(min_variance_weights(&fitted.covariance).is_ok());
}

#[test]
fn test_ties_resolve_at_median_and_clamp() {
    let data = sample_data(40, 3, 3);
    // every penalty leaves every training spectrum untouched, so all scores tie
    let penalties = [1e6, 2e6, 3e6, 4e6, 5e6];

    let cv = CrossValidator::new(CrossValidationConfig {
        folds: Some(5),
        ..Default::default()
    })
    .select(&data, &penalties)
    .unwrap();

    assert!(cv.aggregate.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(cv.selected_index, 2);
    assert_eq!(cv.selected_penalty, cv.max_condition);
    assert!(cv.max_condition < 1e6);
}

#[test]
fn test_centering_keeps_training_condition_finite() {
    // equal column scales; a centered training fold of 9 rows has rank 8
    let decaying = sample_data(10, 20, 17);
    let data = Array2::from_shape_fn((10, 20), |(i, j)| decaying[[i, j]] * (j + 1) as f64);
    let grid = [1.0, 10.0, 1e3, 1e6];

    let select = |center| {
        CrossValidator::new(CrossValidationConfig {
            center,
            ..Default::default()
        })
        .select(&data, &grid)
        .unwrap()
    };
    let raw = select(false);
    let centered = select(true);

    assert!(centered.max_condition < 1e4, "{}", centered.max_condition);
    let ratio = centered.max_condition / raw.max_condition;
    assert!((0.01..100.0).contains(&ratio), "{ratio}");
    assert!(centered.selected_penalty <= centered.max_condition);
}

#[test]
fn test_selection_is_repeatable() {
    let data = sample_data(35, 6, 5);
    let grid = penalty_grid(40.0, 15).unwrap();
    let validator = CrossValidator::new(CrossValidationConfig {
        folds: Some(7),
        direction: PathDirection::Backward,
        center: true,
        parallel: true,
    });

    let first = validator.select(&data, &grid).unwrap();
    let second = validator.select(&data, &grid).unwrap();
    assert_eq!(first.aggregate, second.aggregate);
    assert_eq!(first.selected_index, second.selected_index);
}

#[test]
fn test_directions_select_the_same_penalty() {
    let data = sample_data(50, 5, 23);
    let grid = penalty_grid(60.0, 30).unwrap();

    let forward = CrossValidator::default().select(&data, &grid).unwrap();
    let backward = CrossValidator::new(CrossValidationConfig {
        direction: PathDirection::Backward,
        ..Default::default()
    })
    .select(&data, &grid)
    .unwrap();

    for (a, b) in forward.aggregate.iter().zip(&backward.aggregate) {
        assert_relative_eq!(*a, *b, max_relative = 1e-8);
    }
}

#[test]
fn test_reconstruct_from_precomputed_decomposition() {
    // rotation by 30 degrees
    let (sin, cos) = std::f64::consts::FRAC_PI_6.sin_cos();
    let basis = Array2::from_shape_vec((2, 2), vec![cos, -sin, sin, cos]).unwrap();
    let spectrum = EigenSpectrum::from_parts(basis, Array1::from_vec(vec![1.0, 16.0])).unwrap();
    assert_eq!(spectrum.eigenvalues(), &[16.0, 1.0]);

    let estimator = CondregEstimator::new(CondregConfig {
        max_condition: 4.0,
        ..Default::default()
    })
    .unwrap();
    let fitted = estimator.fit_spectrum(&spectrum).unwrap();

    // both ends clamp at k = 4: 16u + 4u = 2, so L̄ = [1/u, 1/(4u)] = [10, 2.5]
    assert_relative_eq!(fitted.eigenvalues[0], 10.0, max_relative = 1e-12);
    assert_relative_eq!(fitted.eigenvalues[1], 2.5, max_relative = 1e-12);

    let manual = reconstruct(spectrum.basis(), fitted.eigenvalues.view()).unwrap();
    assert_eq!(manual.covariance, fitted.covariance);
}
