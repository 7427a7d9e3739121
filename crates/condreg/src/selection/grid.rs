//! Penalty grids for cross-validation

use crate::error::{CondregError, Result};

/// Grid of `numpts` increasing penalties from 1 to `gridmax`
///
/// Points are placed at the normalised reciprocals of an evenly spaced grid,
/// so they crowd toward 1 where the held-out likelihood changes fastest.
///
/// # Arguments
/// * `gridmax` - Largest penalty, finite and greater than 1
/// * `numpts` - Number of grid points, at least 2
///
/// # Returns
/// * Strictly increasing penalties, the first exactly 1 and the last exactly `gridmax`
pub fn penalty_grid(gridmax: f64, numpts: usize) -> Result<Vec<f64>> {
    if !(gridmax.is_finite() && gridmax > 1.0) {
        return Err(CondregError::InvalidParameter(format!(
            "grid maximum must be a finite value > 1, got {gridmax}"
        )));
    }
    if numpts < 2 {
        return Err(CondregError::InvalidParameter(format!(
            "grid needs at least 2 points, got {numpts}"
        )));
    }

    let step = (gridmax - 1.0) / (numpts - 1) as f64;
    let smallest = 1.0 / gridmax;
    let spread = 1.0 - smallest;

    let mut grid: Vec<f64> = (0..numpts)
        .rev()
        .map(|i| {
            let x = 1.0 + i as f64 * step;
            let normalised = (1.0 / x - smallest) / spread;
            1.0 + normalised * (gridmax - 1.0)
        })
        .collect();

    grid[0] = 1.0;
    grid[numpts - 1] = gridmax;
    Ok(grid)
}
