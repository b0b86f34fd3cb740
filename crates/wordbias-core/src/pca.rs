// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Principal Component Analysis
// ─────────────────────────────────────────────────────────────────────
//! Centered rows → symmetric scatter matrix → eigenpairs.
//!
//! Definitional matrices are tiny (two rows per word pair) but wide
//! (hundreds of dimensions), so the eigenproblem is solved on whichever
//! of the Gram (rows × rows) or covariance (dims × dims) matrix is
//! smaller. Eigenpairs come from a threshold cyclic Jacobi iteration.

use wordbias_types::{BiasError, BiasResult};

use crate::vector_ops::{dot, l2_norm};

/// Eigenvalues below this (relative to the largest) carry no variance.
const RANK_EPS: f64 = 1e-12;

/// Fitted principal components.
#[derive(Debug, Clone)]
pub struct Pca {
    /// Unit-length principal axes, strongest first.
    pub components: Vec<Vec<f64>>,
    /// Variance along each component (sample variance, `n - 1` divisor).
    pub explained_variance: Vec<f64>,
    /// Share of total variance captured by each component.
    pub explained_variance_ratio: Vec<f64>,
}

impl Pca {
    /// Fit up to `n_components` components to `rows`.
    ///
    /// The count is capped at `min(rows, dims)`. Input with no variance
    /// at all is numerically unstable.
    pub fn fit(rows: &[Vec<f64>], n_components: usize) -> BiasResult<Self> {
        let n_samples = rows.len();
        if n_samples < 2 {
            return Err(BiasError::NumericalInstability(format!(
                "PCA needs at least 2 rows, got {n_samples}"
            )));
        }
        let dim = rows[0].len();
        if let Some(bad) = rows.iter().find(|r| r.len() != dim) {
            return Err(BiasError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }

        let max_components = n_samples.min(dim);
        let k = if n_components > max_components {
            log::warn!(
                "PCA: {n_components} components requested, capping at {max_components}"
            );
            max_components
        } else {
            n_components
        };

        // Center columns
        let mut centered = rows.to_vec();
        for j in 0..dim {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n_samples as f64;
            for row in centered.iter_mut() {
                row[j] -= mean;
            }
        }

        let (eigvals, axes) = if n_samples <= dim {
            gram_eigenpairs(&centered)
        } else {
            covariance_eigenpairs(&centered, dim)
        };

        let total: f64 = eigvals.iter().filter(|v| **v > 0.0).sum();
        if !(total > 0.0) || !total.is_finite() {
            return Err(BiasError::NumericalInstability(
                "PCA input has no variance".to_string(),
            ));
        }

        let denom = (n_samples - 1) as f64;
        let mut components = Vec::with_capacity(k);
        let mut explained_variance = Vec::with_capacity(k);
        let mut explained_variance_ratio = Vec::with_capacity(k);
        for (lambda, axis) in eigvals.into_iter().zip(axes).take(k) {
            let lambda = lambda.max(0.0);
            components.push(axis);
            explained_variance.push(lambda / denom);
            explained_variance_ratio.push(lambda / total);
        }

        Ok(Self {
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    pub fn first_component(&self) -> &[f64] {
        &self.components[0]
    }

    pub fn first_ratio(&self) -> f64 {
        self.explained_variance_ratio[0]
    }
}

/// Eigenpairs via the n×n Gram matrix X Xᵀ; axes are Xᵀu / ‖Xᵀu‖.
/// Returned in descending eigenvalue order.
fn gram_eigenpairs(x: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = x.len();
    let dim = x[0].len();
    let mut a = vec![0.0; n * n];
    for i in 0..n {
        for j in i..n {
            let g = dot(&x[i], &x[j]);
            a[i * n + j] = g;
            a[j * n + i] = g;
        }
    }
    let (vals, vecs) = symmetric_eigen_desc(a, n);
    let top = vals.first().copied().unwrap_or(0.0).max(0.0);

    let mut axes = Vec::with_capacity(n);
    for col in 0..n {
        let mut axis = vec![0.0; dim];
        if vals[col] > RANK_EPS * top {
            for (row, xr) in x.iter().enumerate() {
                let u = vecs[row * n + col];
                for (a, v) in axis.iter_mut().zip(xr) {
                    *a += u * v;
                }
            }
            let norm = l2_norm(&axis);
            if norm > 0.0 {
                axis.iter_mut().for_each(|a| *a /= norm);
            }
        }
        axes.push(axis);
    }
    (vals, axes)
}

/// Eigenpairs via the d×d scatter matrix Xᵀ X.
fn covariance_eigenpairs(x: &[Vec<f64>], dim: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let mut a = vec![0.0; dim * dim];
    for row in x {
        for i in 0..dim {
            for j in i..dim {
                a[i * dim + j] += row[i] * row[j];
            }
        }
    }
    for i in 0..dim {
        for j in 0..i {
            a[i * dim + j] = a[j * dim + i];
        }
    }
    let (vals, vecs) = symmetric_eigen_desc(a, dim);
    let axes = (0..dim)
        .map(|col| (0..dim).map(|row| vecs[row * dim + col]).collect())
        .collect();
    (vals, axes)
}

/// Eigen-decompose a symmetric row-major n×n matrix, sorted descending.
/// Eigenvectors are the columns of the returned matrix.
fn symmetric_eigen_desc(a: Vec<f64>, n: usize) -> (Vec<f64>, Vec<f64>) {
    let (mut eigvals, mut eigvecs) = Jacobi::new(a, n).solve();
    sort_eigenpairs_desc(&mut eigvals, &mut eigvecs, n);
    (eigvals, eigvecs)
}

/// Sort eigenvalues descending, rearranging eigenvector columns accordingly.
fn sort_eigenpairs_desc(eigvals: &mut [f64], eigvecs: &mut [f64], n: usize) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| {
        eigvals[b]
            .partial_cmp(&eigvals[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let sorted_vals: Vec<f64> = indices.iter().map(|&i| eigvals[i]).collect();
    eigvals[..n].copy_from_slice(&sorted_vals);

    let old_vecs = eigvecs.to_vec();
    for (new_col, &old_col) in indices.iter().enumerate() {
        for row in 0..n {
            eigvecs[row * n + new_col] = old_vecs[row * n + old_col];
        }
    }
}

/// Cyclic Jacobi iteration: a symmetric row-major matrix driven to
/// diagonal form by plane rotations, accumulated in `v` (columns are the
/// eigenvectors).
struct Jacobi {
    n: usize,
    a: Vec<f64>,
    v: Vec<f64>,
}

impl Jacobi {
    const MAX_SWEEPS: usize = 100;
    /// Sweeps that skip entries well below the current largest one.
    const THRESHOLD_SWEEPS: usize = 4;

    fn new(a: Vec<f64>, n: usize) -> Self {
        let mut v = vec![0.0; n * n];
        for i in 0..n {
            v[i * n + i] = 1.0;
        }
        Self { n, a, v }
    }

    /// Eigenvalues (unsorted, matching the columns of the vector matrix).
    fn solve(mut self) -> (Vec<f64>, Vec<f64>) {
        let n = self.n;
        // Scatter matrices of unit vectors are O(1), but a wide covariance
        // accumulates many small terms; stop relative to the diagonal.
        let scale = (0..n).map(|i| self.a[i * n + i].abs()).fold(0.0, f64::max);
        let tol = 1e-14 * scale.max(f64::MIN_POSITIVE);

        for sweep in 0..Self::MAX_SWEEPS {
            let largest = self.largest_off_diagonal();
            if largest < tol {
                break;
            }
            let threshold = if sweep < Self::THRESHOLD_SWEEPS {
                0.2 * largest / (n * n) as f64
            } else {
                0.0
            };
            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = self.a[p * n + q];
                    if apq != 0.0 && apq.abs() >= threshold {
                        self.annihilate(p, q);
                    }
                }
            }
        }

        let eigvals = (0..n).map(|i| self.a[i * n + i]).collect();
        (eigvals, self.v)
    }

    fn largest_off_diagonal(&self) -> f64 {
        let n = self.n;
        (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| p * n + q))
            .map(|idx| self.a[idx].abs())
            .fold(0.0, f64::max)
    }

    /// One rotation in the (p, q) plane that zeroes `a[p][q]`, applied in
    /// Rutishauser's update form.
    fn annihilate(&mut self, p: usize, q: usize) {
        let n = self.n;
        let apq = self.a[p * n + q];
        let t = rotation_tangent(self.a[p * n + p], self.a[q * n + q], apq);
        let c = 1.0 / (1.0 + t * t).sqrt();
        let s = t * c;
        let tau = s / (1.0 + c);
        let rotate = |xp: f64, xq: f64| (xp - s * (xq + tau * xp), xq + s * (xp - tau * xq));

        self.a[p * n + p] -= t * apq;
        self.a[q * n + q] += t * apq;
        self.a[p * n + q] = 0.0;
        self.a[q * n + p] = 0.0;

        for r in (0..n).filter(|&r| r != p && r != q) {
            let (rp, rq) = rotate(self.a[r * n + p], self.a[r * n + q]);
            self.a[r * n + p] = rp;
            self.a[p * n + r] = rp;
            self.a[r * n + q] = rq;
            self.a[q * n + r] = rq;
        }
        for r in 0..n {
            let (rp, rq) = rotate(self.v[r * n + p], self.v[r * n + q]);
            self.v[r * n + p] = rp;
            self.v[r * n + q] = rq;
        }
    }
}

/// Tangent of the Jacobi angle, taking the smaller root so |t| ≤ 1.
fn rotation_tangent(app: f64, aqq: f64, apq: f64) -> f64 {
    let diff = aqq - app;
    if diff.abs() < 1e-300 {
        return 1.0f64.copysign(apq);
    }
    let theta = diff / (2.0 * apq);
    1.0f64.copysign(theta) / (theta.abs() + theta.hypot(1.0))
}
