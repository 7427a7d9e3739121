//! Regularization path of the optimal floor
//!
//! For a fixed penalty `k`, split the spectrum into three groups: eigenvalues
//! clamped at the floor (`1/Lᵢ < u`, the prefix `A`), eigenvalues clamped at
//! the ceiling (`1/Lᵢ > v = k·u`, the suffix `B`) and free eigenvalues in
//! between. The first-order optimality condition of the likelihood reads
//!
//! u·Σ_A Lᵢ + v·Σ_B Lᵢ = |A| + |B|
//!
//! so while the groups do not change, `(u, v)` moves along a straight line.
//! The path is therefore a chain of line segments in the `(u, v)` plane whose
//! breakpoints are the points where an eigenvalue leaves or joins a clamped
//! group. Along each segment `1/u` is linear in `k`, which makes linear
//! interpolation of `1/u` exact.

use super::{BOUNDARY_TOLERANCE, FlooredSpectrum, PathDirection};
use crate::error::Result;
use serde::Serialize;

/// A breakpoint on the regularization path
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathVertex {
    /// Lower bound `u` on the reciprocal eigenvalues
    pub floor: f64,
    /// Upper bound `v` on the reciprocal eigenvalues
    pub ceiling: f64,
    /// Condition-number penalty `k = v / u`
    pub penalty: f64,
}

impl PathVertex {
    const fn new(floor: f64, ceiling: f64) -> Self {
        Self {
            floor,
            ceiling,
            penalty: ceiling / floor,
        }
    }
}

/// Piecewise-linear regularization path for one spectrum
///
/// Vertices are ordered by strictly increasing penalty, starting at `k = 1`.
/// Beyond the last vertex the ceiling no longer binds: the floor stays at the
/// last vertex's value for every larger penalty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathCurve {
    vertices: Vec<PathVertex>,
}

impl PathCurve {
    /// Trace the path of a descending spectrum in the given direction
    ///
    /// # Errors
    /// Returns an error if the spectrum is empty, contains non-finite values
    /// or is not sorted in descending order.
    pub fn build(eigenvalues: &[f64], direction: PathDirection) -> Result<Self> {
        let spectrum = FlooredSpectrum::new(eigenvalues)?;
        Ok(Self::from_floored(&spectrum, direction))
    }

    /// Trace the path starting from `k = 1`
    pub fn forward(eigenvalues: &[f64]) -> Result<Self> {
        Self::build(eigenvalues, PathDirection::Forward)
    }

    /// Trace the path starting from `k = ∞`
    pub fn backward(eigenvalues: &[f64]) -> Result<Self> {
        Self::build(eigenvalues, PathDirection::Backward)
    }

    pub(crate) fn from_floored(spectrum: &FlooredSpectrum, direction: PathDirection) -> Self {
        let vertices = if spectrum.is_flat() {
            vec![PathVertex::new(1.0 / spectrum.mean(), 1.0 / spectrum.mean())]
        } else {
            match direction {
                PathDirection::Forward => trace_forward(&spectrum.values, spectrum.rank),
                PathDirection::Backward => trace_backward(&spectrum.values, spectrum.rank),
            }
        };
        log::trace!(
            "{} path over {} eigenvalues has {} vertices",
            direction,
            spectrum.len(),
            vertices.len()
        );
        Self { vertices }
    }

    /// Breakpoints ordered by increasing penalty
    pub fn vertices(&self) -> &[PathVertex] {
        &self.vertices
    }

    /// Number of breakpoints
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false: a path has at least the `k = 1` vertex
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Penalty of the last breakpoint
    pub fn max_penalty(&self) -> f64 {
        self.last().penalty
    }

    /// Floor held for every penalty beyond the last breakpoint
    pub fn terminal_floor(&self) -> f64 {
        self.last().floor
    }

    /// Optimal floor `u` for the given penalty
    ///
    /// Penalties at or below the first vertex return its floor; penalties past
    /// the last vertex return [`Self::terminal_floor`].
    pub fn floor_at(&self, penalty: f64) -> f64 {
        let idx = self.vertices.partition_point(|vertex| vertex.penalty < penalty);
        if idx == 0 {
            return self.vertices[0].floor;
        }
        if idx == self.vertices.len() {
            return self.terminal_floor();
        }

        let lo = &self.vertices[idx - 1];
        let hi = &self.vertices[idx];
        let t = (penalty - lo.penalty) / (hi.penalty - lo.penalty);
        1.0 / ((1.0 - t) / lo.floor + t / hi.floor)
    }

    fn last(&self) -> &PathVertex {
        &self.vertices[self.vertices.len() - 1]
    }
}

/// Sweep from the collapsed solution `u = v = 1/mean(L)` toward `k = ∞`.
///
/// `alpha` is the size of the floor-clamped prefix, `beta` the first index of
/// the ceiling-clamped suffix. Eigenvalues past `rank` are numerically zero and
/// stay in the suffix for every finite penalty.
fn trace_forward(l: &[f64], rank: usize) -> Vec<PathVertex> {
    let mean = l.iter().sum::<f64>() / l.len() as f64;
    let mut u = 1.0 / mean;
    let mut v = u;
    let mut vertices = vec![PathVertex::new(u, v)];

    let mut alpha = l
        .iter()
        .take_while(|&&x| 1.0 / x < u * (1.0 - BOUNDARY_TOLERANCE))
        .count();
    let mut beta = alpha
        + l[alpha..]
            .iter()
            .take_while(|&&x| 1.0 / x <= v * (1.0 + BOUNDARY_TOLERANCE))
            .count();
    let mut slope_num: f64 = l[..alpha].iter().sum();
    let mut slope_denom: f64 = l[beta..].iter().sum();

    while alpha > 0 && beta < rank {
        let floor_bound = 1.0 / l[alpha - 1];
        let ceiling_bound = 1.0 / l[beta];

        let mut v_new = ceiling_bound;
        let mut u_new = u - slope_denom * (v_new - v) / slope_num;
        if u_new < floor_bound {
            u_new = floor_bound;
            v_new = v - slope_num * (u_new - u) / slope_denom;
        }

        while alpha > 0 && 1.0 / l[alpha - 1] >= u_new * (1.0 - BOUNDARY_TOLERANCE) {
            alpha -= 1;
            slope_num -= l[alpha];
        }
        while beta < rank && 1.0 / l[beta] <= v_new * (1.0 + BOUNDARY_TOLERANCE) {
            slope_denom -= l[beta];
            beta += 1;
        }

        u = u_new;
        v = v_new;
        vertices.push(PathVertex::new(u, v));
    }

    vertices
}

/// Sweep from the unconstrained solution down to `k = 1`.
///
/// At `k = ∞` the floor solves `u·Σ_{i<alpha} Lᵢ = alpha + (p - rank)` for the
/// prefix size `alpha` whose boundaries sandwich `u`.
fn trace_backward(l: &[f64], rank: usize) -> Vec<PathVertex> {
    let deficiency = (l.len() - rank) as f64;

    let mut alpha = 1;
    let mut slope_num = l[0];
    let mut u = (1.0 + deficiency) / slope_num;
    while alpha < rank && 1.0 / l[alpha] <= u * (1.0 + BOUNDARY_TOLERANCE) {
        slope_num += l[alpha];
        alpha += 1;
        u = (alpha as f64 + deficiency) / slope_num;
    }

    // Every non-zero eigenvalue sits at the floor: only the k = 1 corner remains
    if alpha >= rank {
        return vec![PathVertex::new(u, u)];
    }

    let mut beta = rank - 1;
    let mut v = 1.0 / l[beta];
    let mut slope_denom: f64 = l[beta..].iter().sum();
    while beta > alpha && 1.0 / l[beta - 1] >= v * (1.0 - BOUNDARY_TOLERANCE) {
        beta -= 1;
        slope_denom += l[beta];
    }

    let mut vertices = vec![PathVertex::new(u, v)];
    loop {
        let diagonal = (slope_num * u + slope_denom * v) / (slope_num + slope_denom);
        let reaches_diagonal = alpha >= beta
            || (diagonal <= (1.0 / l[alpha]) * (1.0 + BOUNDARY_TOLERANCE)
                && diagonal >= (1.0 / l[beta - 1]) * (1.0 - BOUNDARY_TOLERANCE));
        if reaches_diagonal {
            vertices.push(PathVertex::new(diagonal, diagonal));
            break;
        }

        let floor_bound = 1.0 / l[alpha];
        let ceiling_bound = 1.0 / l[beta - 1];

        let mut v_new = ceiling_bound;
        let mut u_new = u - slope_denom * (v_new - v) / slope_num;
        if u_new > floor_bound {
            u_new = floor_bound;
            v_new = v - slope_num * (u_new - u) / slope_denom;
        }

        while alpha < beta && 1.0 / l[alpha] <= u_new * (1.0 + BOUNDARY_TOLERANCE) {
            slope_num += l[alpha];
            alpha += 1;
        }
        while beta > alpha && 1.0 / l[beta - 1] >= v_new * (1.0 - BOUNDARY_TOLERANCE) {
            beta -= 1;
            slope_denom += l[beta];
        }

        u = u_new;
        v = v_new;
        vertices.push(PathVertex::new(u, v));
    }

    vertices.reverse();
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrinkage::EIGENVALUE_FLOOR;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn harmonic(p: usize) -> Vec<f64> {
        (0..p).map(|i| 100.0 / (i + 1) as f64).collect()
    }

    #[test]
    fn test_forward_path_three_eigenvalues() {
        let path = PathCurve::forward(&[100.0, 10.0, 1.0]).unwrap();
        let vertices = path.vertices();
        assert_eq!(vertices.len(), 3);

        // k = 1 corner: u = v = 1/mean
        assert_relative_eq!(vertices[0].floor, 1.0 / 37.0, epsilon = 1e-15);
        assert_relative_eq!(vertices[0].penalty, 1.0);

        // ceiling reaches 1/10
        assert_relative_eq!(vertices[1].floor, 0.019, epsilon = 1e-12);
        assert_relative_eq!(vertices[1].ceiling, 0.1, epsilon = 1e-12);

        // both boundaries at once: u = 1/100, v = 1
        assert_relative_eq!(vertices[2].floor, 0.01, epsilon = 1e-12);
        assert_relative_eq!(vertices[2].ceiling, 1.0, epsilon = 1e-12);
        assert_relative_eq!(path.max_penalty(), 100.0, max_relative = 1e-10);
    }

    #[test]
    fn test_backward_matches_forward_three_eigenvalues() {
        let forward = PathCurve::forward(&[100.0, 10.0, 1.0]).unwrap();
        let backward = PathCurve::backward(&[100.0, 10.0, 1.0]).unwrap();
        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.vertices().iter().zip(backward.vertices()) {
            assert_relative_eq!(f.floor, b.floor, max_relative = 1e-10);
            assert_relative_eq!(f.ceiling, b.ceiling, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_interpolation_is_exact_on_a_segment() {
        let path = PathCurve::forward(&[100.0, 10.0, 1.0]).unwrap();
        // On the first segment u·100 + 5u·11 = 3
        assert_relative_eq!(path.floor_at(5.0), 3.0 / 155.0, max_relative = 1e-12);
    }

    #[test]
    fn test_floor_is_held_past_last_vertex() {
        let path = PathCurve::forward(&[100.0, 10.0, 1.0]).unwrap();
        assert_relative_eq!(path.floor_at(1e6), path.terminal_floor());
        assert_relative_eq!(path.floor_at(0.5), 1.0 / 37.0, epsilon = 1e-15);
    }

    #[rstest]
    #[case(harmonic(10))]
    #[case(vec![9.0, 7.5, 7.5, 3.0, 1.0, 1.0, 0.2])]
    #[case(vec![5.0, 5.0, 5.0, 1.0, 1.0])]
    #[case(vec![12.0, 3.0, 0.5, 0.0, 0.0])]
    fn test_path_is_monotone(#[case] eigenvalues: Vec<f64>) {
        for direction in [PathDirection::Forward, PathDirection::Backward] {
            let path = PathCurve::build(&eigenvalues, direction).unwrap();
            let vertices = path.vertices();
            assert_relative_eq!(vertices[0].penalty, 1.0, epsilon = 1e-12);
            for pair in vertices.windows(2) {
                assert!(pair[1].penalty > pair[0].penalty, "{direction}: {pair:?}");
                assert!(pair[1].floor <= pair[0].floor * (1.0 + 1e-12));
                assert!(pair[1].ceiling >= pair[0].ceiling * (1.0 - 1e-12));
            }
        }
    }

    #[rstest]
    #[case(harmonic(10))]
    #[case(vec![9.0, 7.5, 7.5, 3.0, 1.0, 1.0, 0.2])]
    #[case(vec![12.0, 3.0, 0.5, 0.0, 0.0])]
    fn test_directions_agree(#[case] eigenvalues: Vec<f64>) {
        let forward = PathCurve::forward(&eigenvalues).unwrap();
        let backward = PathCurve::backward(&eigenvalues).unwrap();
        assert_relative_eq!(
            forward.terminal_floor(),
            backward.terminal_floor(),
            max_relative = 1e-9
        );
        for k in [1.0, 1.5, 2.0, 4.0, 10.0, 50.0] {
            assert_relative_eq!(forward.floor_at(k), backward.floor_at(k), max_relative = 1e-9);
        }
    }

    #[test]
    fn test_rank_deficient_terminal_floor() {
        // u·12 = |A| + (p - rank) with A = {0}
        let path = PathCurve::forward(&[12.0, 3.0, 0.0]).unwrap();
        assert_relative_eq!(path.terminal_floor(), 2.0 / 12.0, max_relative = 1e-9);
        assert!(path.vertices().iter().all(|v| v.ceiling < 1.0 / EIGENVALUE_FLOOR));
    }

    #[rstest]
    #[case(PathDirection::Forward)]
    #[case(PathDirection::Backward)]
    fn test_eigenvalue_equal_to_mean_starts_free(#[case] direction: PathDirection) {
        // mean is 2, so the middle eigenvalue is neither floored nor capped at k = 1
        let path = PathCurve::build(&[3.0, 2.0, 1.0], direction).unwrap();
        let vertices = path.vertices();
        assert_eq!(vertices.len(), 2);
        assert_relative_eq!(vertices[0].floor, 0.5, max_relative = 1e-12);
        assert_relative_eq!(vertices[1].floor, 1.0 / 3.0, max_relative = 1e-12);
        assert_relative_eq!(vertices[1].ceiling, 1.0, max_relative = 1e-12);

        // 3u + 2u = 2 on the segment
        assert_relative_eq!(path.floor_at(2.0), 0.4, max_relative = 1e-12);
    }

    #[test]
    fn test_flat_spectrum_has_single_vertex() {
        let path = PathCurve::forward(&[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(path.len(), 1);
        assert_relative_eq!(path.floor_at(3.0), 0.5);
    }
}
