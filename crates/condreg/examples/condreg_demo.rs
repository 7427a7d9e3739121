//! Walkthrough of condition-number-regularized covariance estimation
//!
//! This example covers:
//! - The regularization path of a sample spectrum
//! - Batch shrinkage for several penalties
//! - Cross-validated penalty selection on wide data
//! - Minimum-variance weights and rebalancing cost

use condreg::{
    CondregConfig, CondregEstimator, CrossValidator, EigenSpectrum, PathCurve, PathDirection,
    ShrinkageSolver, min_variance_weights, penalty_grid, transaction_cost,
};
use ndarray::Array2;

fn main() {
    println!("==========================================================");
    println!("        Condition-Number Regularization - Demo");
    println!("==========================================================\n");

    // Demo 1: Regularization path
    demo_regularization_path();

    // Demo 2: Batch shrinkage
    demo_batch_shrinkage();

    // Demo 3: Cross-validated estimate
    demo_cross_validation();

    println!("==========================================================");
    println!("                    Demo Complete!");
    println!("==========================================================");
}

/// Deterministic returns with a shared market component
fn sample_returns(n_periods: usize, n_assets: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_periods, n_assets), |(t, j)| {
        let t_f = t as f64;
        let market = 0.01 * (t_f * 0.37).sin();
        let idio = 0.02 * ((t_f + 1.0) * (j as f64 * 0.61 + 0.3)).sin() / (1.0 + j as f64 * 0.1);
        market + idio
    })
}

/// Demo 1: Regularization path
fn demo_regularization_path() {
    println!("----------------------------------------------------------");
    println!("Demo 1: Regularization Path");
    println!("----------------------------------------------------------");

    let eigenvalues = [100.0, 40.0, 10.0, 4.0, 1.0];
    println!("Sample eigenvalues: {:?}", eigenvalues);

    let forward = PathCurve::build(&eigenvalues, PathDirection::Forward).unwrap();
    let backward = PathCurve::build(&eigenvalues, PathDirection::Backward).unwrap();

    println!("\n  {:>10} {:>12} {:>12}", "penalty", "floor u", "ceiling v");
    for vertex in forward.vertices() {
        println!(
            "  {:>10.4} {:>12.6} {:>12.6}",
            vertex.penalty, vertex.floor, vertex.ceiling
        );
    }
    println!("  (held floor beyond the last vertex: {:.6})", forward.terminal_floor());

    println!("\nFloor lookups (forward vs backward):");
    for k in [1.0, 3.0, 12.0, 50.0, 200.0] {
        println!(
            "  k = {:>6.1}: {:.8} / {:.8}",
            k,
            forward.floor_at(k),
            backward.floor_at(k)
        );
    }
    println!();
}

/// Demo 2: Batch shrinkage
fn demo_batch_shrinkage() {
    println!("----------------------------------------------------------");
    println!("Demo 2: Batch Shrinkage");
    println!("----------------------------------------------------------");

    let eigenvalues = [100.0, 40.0, 10.0, 4.0, 1.0];
    let penalties = [1.0, 5.0, 20.0, 100.0, 500.0];
    let solution = ShrinkageSolver::default()
        .solve(&eigenvalues, &penalties)
        .unwrap();

    for (i, &k) in penalties.iter().enumerate() {
        let row: Vec<String> = solution
            .row(i)
            .iter()
            .map(|l| format!("{:8.3}", l))
            .collect();
        println!(
            "  k = {:>5}: [{}]{}",
            k,
            row.join(" "),
            if solution.degenerate[i] {
                "  (unchanged)"
            } else {
                ""
            }
        );
    }
    println!();
}

/// Demo 3: Cross-validated estimate
fn demo_cross_validation() {
    println!("----------------------------------------------------------");
    println!("Demo 3: Cross-Validated Estimate");
    println!("----------------------------------------------------------");

    let returns = sample_returns(40, 25);
    let spectrum = EigenSpectrum::from_data(&returns, true).unwrap();
    println!(
        "Sample covariance: dimension {}, rank {}, condition number {:.3e}",
        spectrum.dim(),
        spectrum.rank(),
        spectrum.condition_number()
    );

    let grid = penalty_grid(200.0, 40).unwrap();
    let result = CrossValidator::default().fit(&returns, &grid).unwrap();
    println!(
        "Selected penalty: {:.3} (grid index {}, largest training condition {:.3e})",
        result.selected_penalty, result.cv.selected_index, result.cv.max_condition
    );
    println!(
        "Regularized condition number: {:.3}",
        result.estimate.condition_number()
    );

    let weights = min_variance_weights(&result.estimate.covariance).unwrap();
    println!("\nMinimum-variance weights (first 5):");
    for (i, w) in weights.iter().take(5).enumerate() {
        println!("  Asset {:>2}: {:>8.4}%", i + 1, w * 100.0);
    }

    // Compare against a fixed bound
    let fixed = CondregEstimator::new(CondregConfig {
        max_condition: 10.0,
        ..Default::default()
    })
    .unwrap()
    .fit(&returns)
    .unwrap();
    let fixed_weights = min_variance_weights(&fixed.covariance).unwrap();

    let cost = transaction_cost(
        weights.view(),
        fixed_weights.view(),
        1.01,
        0.001,
        1_000_000.0,
    )
    .unwrap();
    println!("\nCost of moving from k = 10 weights to cross-validated weights: ${cost:.2}");
    println!();
}
