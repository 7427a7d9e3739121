//! Property tests for the regularization path and the shrinkage solver.

use approx::assert_relative_eq;
use condreg::{EIGENVALUE_FLOOR, PathCurve, PathDirection, ShrinkageSolver};
use proptest::prelude::*;

/// Descending spectra, optionally with a tail of exact zeros
fn spectrum() -> impl Strategy<Value = Vec<f64>> {
    (prop::collection::vec(0.01f64..100.0, 2..12), 0usize..3).prop_map(|(mut values, zeros)| {
        values.sort_by(|a, b| b.total_cmp(a));
        values.extend(std::iter::repeat_n(0.0, zeros));
        values
    })
}

fn floored(values: &[f64]) -> Vec<f64> {
    values.iter().map(|&l| l.max(EIGENVALUE_FLOOR)).collect()
}

fn condition(values: &[f64]) -> f64 {
    let l = floored(values);
    l[0] / l[l.len() - 1]
}

fn ratio(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    max / min
}

proptest! {
    #[test]
    fn prop_ratio_matches_penalty(values in spectrum(), k in 1.0f64..50.0) {
        let shrunk = ShrinkageSolver::default().solve_single(&values, k).unwrap();
        let shrunk = shrunk.to_vec();

        if k < condition(&values) {
            assert_relative_eq!(ratio(&shrunk), k, max_relative = 1e-8);
        } else {
            prop_assert!(ratio(&shrunk) <= k * (1.0 + 1e-12));
        }
        prop_assert!(shrunk.iter().all(|l| l.is_finite() && *l >= EIGENVALUE_FLOOR));
    }

    #[test]
    fn prop_unit_penalty_gives_mean(values in spectrum()) {
        let l = floored(&values);
        let mean = l.iter().sum::<f64>() / l.len() as f64;
        let shrunk = ShrinkageSolver::default().solve_single(&values, 1.0).unwrap();
        for value in shrunk.iter() {
            assert_relative_eq!(*value, mean, max_relative = 1e-9);
        }
    }

    #[test]
    fn prop_large_penalty_keeps_spectrum(values in spectrum(), factor in 1.0f64..10.0) {
        let k = condition(&values) * factor;
        prop_assume!(k.is_finite());
        let solution = ShrinkageSolver::default().solve(&values, &[k]).unwrap();

        prop_assert!(solution.degenerate[0]);
        for (a, b) in solution.row(0).iter().zip(floored(&values)) {
            prop_assert_eq!(*a, b);
        }
    }

    #[test]
    fn prop_directions_agree(values in spectrum(), k in 1.0f64..50.0) {
        let forward = PathCurve::build(&values, PathDirection::Forward).unwrap();
        let backward = PathCurve::build(&values, PathDirection::Backward).unwrap();

        assert_relative_eq!(forward.floor_at(k), backward.floor_at(k), max_relative = 1e-8);
    }

    #[test]
    fn prop_path_is_monotone(values in spectrum(), backward in any::<bool>()) {
        let direction = if backward { PathDirection::Backward } else { PathDirection::Forward };
        let curve = PathCurve::build(&values, direction).unwrap();
        let vertices = curve.vertices();

        assert_relative_eq!(vertices[0].penalty, 1.0, max_relative = 1e-12);
        for pair in vertices.windows(2) {
            prop_assert!(pair[1].penalty > pair[0].penalty);
            prop_assert!(pair[1].floor <= pair[0].floor * (1.0 + 1e-12));
            prop_assert!(pair[1].ceiling >= pair[0].ceiling * (1.0 - 1e-12));
        }
    }

    #[test]
    fn prop_batch_matches_single(values in spectrum(), ks in prop::collection::vec(1.0f64..80.0, 1..6)) {
        let solver = ShrinkageSolver::new(PathDirection::Backward);
        let batch = solver.solve(&values, &ks).unwrap();
        for (i, &k) in ks.iter().enumerate() {
            let single = solver.solve_single(&values, k).unwrap();
            for (a, b) in batch.row(i).iter().zip(single.iter()) {
                prop_assert_eq!(a, b);
            }
        }
    }
}
