// ─────────────────────────────────────────────────────────────────────
// Word-Bias Kernel — Vector Primitives
// ─────────────────────────────────────────────────────────────────────
//! Stateless geometric primitives over dense `f64` slices.
//!
//! Directions passed to `project`/`reject` are assumed unit-length.
//! Slices must share a dimension; this is checked in debug builds only.

use wordbias_types::{BiasError, BiasResult};

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
pub fn l2_norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Element-wise `a - b`.
pub fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Scale `v` to unit length.
///
/// A zero or non-finite norm is reported as numerical instability
/// instead of producing NaNs.
pub fn normalize(v: &[f64]) -> BiasResult<Vec<f64>> {
    let norm = l2_norm(v);
    if norm == 0.0 || !norm.is_finite() {
        return Err(BiasError::NumericalInstability(format!(
            "cannot normalize a vector with norm {norm}"
        )));
    }
    Ok(v.iter().map(|x| x / norm).collect())
}

/// Component of `v` along the unit direction `d`.
pub fn project(v: &[f64], d: &[f64]) -> Vec<f64> {
    let scalar = dot(v, d);
    d.iter().map(|x| scalar * x).collect()
}

/// Component of `v` orthogonal to the unit direction `d`.
pub fn reject(v: &[f64], d: &[f64]) -> Vec<f64> {
    project_reject(v, d).1
}

/// `(project(v, d), reject(v, d))` with a single inner product.
pub fn project_reject(v: &[f64], d: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let scalar = dot(v, d);
    let projected: Vec<f64> = d.iter().map(|x| scalar * x).collect();
    let rejected = sub(v, &projected);
    (projected, rejected)
}

/// `(a·b) / (‖a‖‖b‖)`. NaN when either vector is zero.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    dot(a, b) / (l2_norm(a) * l2_norm(b))
}

/// Centroid of equally-sized rows. `None` for an empty slice.
pub fn mean(rows: &[Vec<f64>]) -> Option<Vec<f64>> {
    let first = rows.first()?;
    let mut center = vec![0.0; first.len()];
    for row in rows {
        debug_assert_eq!(row.len(), center.len());
        for (c, x) in center.iter_mut().zip(row) {
            *c += x;
        }
    }
    let n = rows.len() as f64;
    for c in center.iter_mut() {
        *c /= n;
    }
    Some(center)
}

/// Element-wise sum of equally-sized rows. `None` for an empty slice.
pub fn sum(rows: &[Vec<f64>]) -> Option<Vec<f64>> {
    let first = rows.first()?;
    let mut total = vec![0.0; first.len()];
    for row in rows {
        for (t, x) in total.iter_mut().zip(row) {
            *t += x;
        }
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]).unwrap();
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_zero_vector_is_error() {
        assert!(matches!(
            normalize(&[0.0, 0.0, 0.0]),
            Err(BiasError::NumericalInstability(_))
        ));
    }

    #[test]
    fn test_normalize_nan_is_error() {
        assert!(normalize(&[f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_project_reject_decomposition() {
        let d = [1.0, 0.0, 0.0];
        let v = [0.5, 0.3, -0.2];
        let (p, r) = project_reject(&v, &d);
        assert_eq!(p, vec![0.5, 0.0, 0.0]);
        assert_eq!(r, vec![0.0, 0.3, -0.2]);
        assert!(dot(&r, &d).abs() < 1e-15);
        assert_eq!(project(&v, &d), p);
        assert_eq!(reject(&v, &d), r);
    }

    #[test]
    fn test_reject_orthogonal_to_oblique_direction() {
        let d = normalize(&[1.0, 1.0, 1.0]).unwrap();
        let v = [0.9, -0.4, 2.5];
        let r = reject(&v, &d);
        assert!(dot(&r, &d).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_nan());
    }

    #[test]
    fn test_mean_and_sum() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 6.0]];
        assert_eq!(mean(&rows).unwrap(), vec![2.0, 4.0]);
        assert_eq!(sum(&rows).unwrap(), vec![4.0, 8.0]);
        assert!(mean(&[]).is_none());
    }
}
