//! Symmetric eigen-decomposition of covariance matrices
//!
//! Uses cyclic Jacobi sweeps: stable, dependency-free and accurate for the
//! moderate dimensions typical of covariance estimation, though slower than
//! LAPACK for very large matrices.

use super::sample_covariance;
use crate::error::{CondregError, Result};
use crate::shrinkage::EIGENVALUE_FLOOR;
use ndarray::{Array1, Array2};
use serde::Serialize;

/// Maximum number of full Jacobi sweeps
pub const DEFAULT_MAX_SWEEPS: usize = 100;

/// Convergence threshold on the off-diagonal norm, relative to the Frobenius norm
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Relative tolerance for the symmetry check
const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Result of eigenvalue decomposition
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// Eigenvalues (sorted in descending order)
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors (columns are eigenvectors)
    pub eigenvectors: Array2<f64>,
}

/// Descending spectrum of a covariance matrix with its orthonormal basis
///
/// Eigenvalues are floored to [`EIGENVALUE_FLOOR`] on construction; the rank
/// counts the eigenvalues that were above the floor before flooring.
#[derive(Debug, Clone, Serialize)]
pub struct EigenSpectrum {
    eigenvalues: Vec<f64>,
    basis: Array2<f64>,
    rank: usize,
}

impl EigenSpectrum {
    /// Decompose a symmetric covariance matrix
    ///
    /// # Errors
    /// Returns an error if the matrix is empty, not square, contains
    /// non-finite values, is not symmetric, or the decomposition fails.
    pub fn from_covariance(cov: &Array2<f64>) -> Result<Self> {
        let decomp = jacobi_eigendecomp(cov, DEFAULT_MAX_SWEEPS, DEFAULT_TOLERANCE)?;
        Ok(Self::from_sorted(
            decomp.eigenvalues.to_vec(),
            decomp.eigenvectors,
        ))
    }

    /// Decompose the sample covariance `XᵗX / n` of a data matrix
    ///
    /// # Arguments
    /// * `data` - Observations in rows, variables in columns (n x p)
    /// * `center` - Subtract column means before forming the covariance
    pub fn from_data(data: &Array2<f64>, center: bool) -> Result<Self> {
        let cov = sample_covariance(data, center)?;
        Self::from_covariance(&cov)
    }

    /// Assemble a spectrum from a precomputed decomposition
    ///
    /// Eigenvalues may come in any order; they are sorted in descending order
    /// together with the matching basis columns.
    pub fn from_parts(basis: Array2<f64>, eigenvalues: Array1<f64>) -> Result<Self> {
        let p = eigenvalues.len();
        if p == 0 {
            return Err(CondregError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if basis.nrows() != p {
            return Err(CondregError::DimensionMismatch {
                expected: p,
                actual: basis.nrows(),
            });
        }
        if basis.ncols() != p {
            return Err(CondregError::DimensionMismatch {
                expected: p,
                actual: basis.ncols(),
            });
        }
        if eigenvalues.iter().chain(basis.iter()).any(|x| !x.is_finite()) {
            return Err(CondregError::InvalidData(
                "spectral decomposition contains non-finite values".to_string(),
            ));
        }

        let (values, vectors) = sort_descending(&eigenvalues, &basis);
        Ok(Self::from_sorted(values.to_vec(), vectors))
    }

    fn from_sorted(eigenvalues: Vec<f64>, basis: Array2<f64>) -> Self {
        let rank = eigenvalues.iter().filter(|&&l| l > EIGENVALUE_FLOOR).count();
        let eigenvalues = eigenvalues
            .into_iter()
            .map(|l| l.max(EIGENVALUE_FLOOR))
            .collect();
        Self {
            eigenvalues,
            basis,
            rank,
        }
    }

    /// Floored eigenvalues in descending order
    pub fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    /// Orthonormal basis; column `j` belongs to `eigenvalues()[j]`
    pub const fn basis(&self) -> &Array2<f64> {
        &self.basis
    }

    /// Number of eigenvalues above the floor
    pub const fn rank(&self) -> usize {
        self.rank
    }

    /// Number of numerically zero eigenvalues
    pub fn num_zero(&self) -> usize {
        self.dim() - self.rank
    }

    /// Dimension `p` of the underlying matrix
    pub fn dim(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Condition number of the floored spectrum
    pub fn condition_number(&self) -> f64 {
        self.leading_condition_number(self.dim())
    }

    /// Condition number restricted to the `count` largest eigenvalues
    ///
    /// `count` is clamped to `1..=dim()`.
    pub fn leading_condition_number(&self, count: usize) -> f64 {
        let m = count.clamp(1, self.dim());
        self.eigenvalues[0] / self.eigenvalues[m - 1]
    }
}

/// Jacobi eigenvalue decomposition for symmetric matrices
///
/// # Arguments
/// * `matrix` - Symmetric matrix to decompose
/// * `max_sweeps` - Maximum number of cyclic sweeps over the upper triangle
/// * `tolerance` - Convergence threshold on the off-diagonal Frobenius norm,
///   relative to the Frobenius norm of `matrix`
///
/// # Returns
/// * Eigenvalues in descending order with matching eigenvectors
pub fn jacobi_eigendecomp(
    matrix: &Array2<f64>,
    max_sweeps: usize,
    tolerance: f64,
) -> Result<EigenDecomposition> {
    let n = validate_symmetric(matrix)?;

    // Symmetrize away rounding noise before rotating
    let mut a = (matrix + &matrix.t()) / 2.0;
    let mut v = Array2::<f64>::eye(n);
    let threshold = tolerance * frobenius_norm(&a);

    let mut sweeps = 0;
    while off_diagonal_norm(&a) > threshold {
        if sweeps == max_sweeps {
            return Err(CondregError::DecompositionFailed { sweeps });
        }
        sweeps += 1;

        for p in 0..n {
            for q in (p + 1)..n {
                if a[[p, q]] == 0.0 {
                    continue;
                }
                let (cos_theta, sin_theta) = compute_rotation(a[[p, p]], a[[q, q]], a[[p, q]]);
                apply_jacobi_rotation(&mut a, &mut v, p, q, cos_theta, sin_theta);
            }
        }
    }

    let (eigenvalues, eigenvectors) = sort_descending(&a.diag().to_owned(), &v);
    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
    })
}

/// Check that `matrix` is a non-empty, finite, symmetric square matrix
fn validate_symmetric(matrix: &Array2<f64>) -> Result<usize> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(CondregError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    if n == 0 {
        return Err(CondregError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if matrix.iter().any(|x| !x.is_finite()) {
        return Err(CondregError::InvalidData(
            "matrix contains non-finite values".to_string(),
        ));
    }

    let scale = matrix.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    for i in 0..n {
        for j in (i + 1)..n {
            if (matrix[[i, j]] - matrix[[j, i]]).abs() > SYMMETRY_TOLERANCE * scale {
                return Err(CondregError::NotSymmetric { row: i, col: j });
            }
        }
    }
    Ok(n)
}

fn frobenius_norm(matrix: &Array2<f64>) -> f64 {
    matrix.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn off_diagonal_norm(matrix: &Array2<f64>) -> f64 {
    let n = matrix.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += 2.0 * matrix[[i, j]] * matrix[[i, j]];
        }
    }
    sum.sqrt()
}

/// Compute the rotation (cos, sin) that annihilates `a[p, q]`
fn compute_rotation(app: f64, aqq: f64, apq: f64) -> (f64, f64) {
    let tau = (aqq - app) / (2.0 * apq);
    let t = if tau >= 0.0 {
        1.0 / (tau + tau.hypot(1.0))
    } else {
        -1.0 / (-tau + tau.hypot(1.0))
    };

    // cos = 1/sqrt(1 + t^2), sin = t * cos
    let cos_theta = 1.0 / t.hypot(1.0);
    let sin_theta = t * cos_theta;

    (cos_theta, sin_theta)
}

/// Apply a Jacobi rotation to matrix A and eigenvector matrix V
fn apply_jacobi_rotation(
    a: &mut Array2<f64>,
    v: &mut Array2<f64>,
    p: usize,
    q: usize,
    cos_theta: f64,
    sin_theta: f64,
) {
    let n = a.nrows();

    let app = a[[p, p]];
    let aqq = a[[q, q]];
    let apq = a[[p, q]];

    a[[p, p]] = cos_theta * cos_theta * app - 2.0 * cos_theta * sin_theta * apq
        + sin_theta * sin_theta * aqq;
    a[[q, q]] = sin_theta * sin_theta * app
        + 2.0 * cos_theta * sin_theta * apq
        + cos_theta * cos_theta * aqq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for i in 0..n {
        if i != p && i != q {
            let aip = a[[i, p]];
            let aiq = a[[i, q]];

            a[[i, p]] = cos_theta * aip - sin_theta * aiq;
            a[[p, i]] = a[[i, p]];

            a[[i, q]] = sin_theta * aip + cos_theta * aiq;
            a[[q, i]] = a[[i, q]];
        }
    }

    for i in 0..n {
        let vip = v[[i, p]];
        let viq = v[[i, q]];

        v[[i, p]] = cos_theta * vip - sin_theta * viq;
        v[[i, q]] = sin_theta * vip + cos_theta * viq;
    }
}

/// Sort eigenvalues in descending order, carrying the basis columns along
fn sort_descending(eigenvalues: &Array1<f64>, vectors: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = eigenvalues.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&i, &j| eigenvalues[j].total_cmp(&eigenvalues[i]));

    let sorted_eigenvalues = indices.iter().map(|&i| eigenvalues[i]).collect();
    let mut sorted_vectors = Array2::<f64>::zeros(vectors.dim());
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        sorted_vectors
            .column_mut(new_idx)
            .assign(&vectors.column(old_idx));
    }

    (sorted_eigenvalues, sorted_vectors)
}
