use crate::blas::{dot, norm2};
use crate::householder::householder_solve;
use crate::{Mat, SlsqpError};

/// Solution of a non-negative least squares problem.
#[derive(Debug, Clone)]
pub struct NnlsSolution {
    /// Minimizer, every entry `>= 0`
    pub x: Vec<f64>,
    /// `b - A x`
    pub residual: Vec<f64>,
    /// Euclidean norm of the residual
    pub rnorm: f64,
}

/// NNLS: non-negative least squares (Lawson & Hanson, chapter 23).
///
/// Given an `m x n` matrix `A` and an `m`-vector `b`, computes the `n`-vector
/// `x` solving
///
/// ```text
///     min |A x - b|   subject to   x >= 0
/// ```
///
/// Columns move between the free set `Z` and the passive set `P`. A column
/// enters `P` when its dual `w = A'(b - A x)` is the largest positive one and
/// the least squares solution on `P` keeps it positive; columns leave `P`
/// when an interpolation step drives them to zero. Entering columns and
/// interpolation steps together are capped at `3 n` iterations.
pub fn nnls(a: &Mat, b: &[f64]) -> Result<NnlsSolution, SlsqpError> {
    let m = a.rows();
    let n = a.cols();
    debug_assert_eq!(b.len(), m);

    let max_iter = 3 * n;
    let mut iter_count = 0;
    let mut x = vec![0.0; n];
    let mut passive: Vec<usize> = Vec::with_capacity(n.min(m));
    // duals below this are rounding noise
    let scale = a.as_slice().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let dual_tol = 10.0 * f64::EPSILON * scale * m.max(n) as f64;

    loop {
        let residual = residual(a, &x, b);
        let dual: Vec<f64> = (0..n).map(|j| dot(a.col(j), &residual)).collect();

        // Pick the entering column; columns whose trial solution is not
        // positive (or that are dependent on P) are skipped for this round.
        let mut rejected = vec![false; n];
        let mut trial = None;
        while passive.len() < m {
            let mut best: Option<usize> = None;
            for j in 0..n {
                if rejected[j] || passive.contains(&j) {
                    continue;
                }
                if best.is_none_or(|k| dual[j] > dual[k]) {
                    best = Some(j);
                }
            }
            let Some(j) = best else { break };
            if dual[j] <= dual_tol {
                break;
            }

            passive.push(j);
            match householder_solve(a, &passive, b) {
                Some(z) if z[z.len() - 1] > 0.0 => {
                    trial = Some(z);
                    break;
                }
                _ => {
                    passive.pop();
                    rejected[j] = true;
                }
            }
        }
        let Some(mut z) = trial else { break };
        iter_count += 1;
        if iter_count > max_iter {
            return Err(SlsqpError::IterationLimitExceededLSQ);
        }

        loop {
            if z.iter().all(|&z_k| z_k > 0.0) {
                for (&k, &z_k) in passive.iter().zip(&z) {
                    x[k] = z_k;
                }
                break;
            }

            iter_count += 1;
            if iter_count > max_iter {
                return Err(SlsqpError::IterationLimitExceededLSQ);
            }

            // largest step towards z keeping x feasible
            let mut alpha = 1.0;
            let mut blocking = None;
            for (&k, &z_k) in passive.iter().zip(&z) {
                if z_k <= 0.0 {
                    let t = x[k] / (x[k] - z_k);
                    if t < alpha {
                        alpha = t;
                        blocking = Some(k);
                    }
                }
            }
            for (&k, &z_k) in passive.iter().zip(&z) {
                x[k] += alpha * (z_k - x[k]);
            }

            if let Some(k) = blocking {
                x[k] = 0.0;
            }
            passive.retain(|&k| {
                if x[k] <= 0.0 {
                    x[k] = 0.0;
                    false
                } else {
                    true
                }
            });
            if passive.is_empty() {
                break;
            }
            z = householder_solve(a, &passive, b).ok_or(SlsqpError::SingularMatrixC)?;
        }
    }

    let residual = residual(a, &x, b);
    let rnorm = norm2(&residual);
    Ok(NnlsSolution { x, residual, rnorm })
}

fn residual(a: &Mat, x: &[f64], b: &[f64]) -> Vec<f64> {
    let mut r = b.to_vec();
    for (j, &x_j) in x.iter().enumerate() {
        if x_j != 0.0 {
            crate::blas::axpy(-x_j, a.col(j), &mut r);
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nnls_basic() {
        // A = I, b = [1, 1] => x = [1, 1]
        let a = Mat::from_rows(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let sol = nnls(&a, &[1.0, 1.0]).unwrap();

        assert!((sol.x[0] - 1.0).abs() < 1e-10);
        assert!((sol.x[1] - 1.0).abs() < 1e-10);
        assert!(sol.rnorm < 1e-10);
    }

    #[test]
    fn test_nnls_constraint() {
        // A = [1 1; 1 2], b = [1, -1]
        // The unconstrained solution [3, -2] is infeasible. With x = [0, 0]
        // the residual is [1, -1] (norm sqrt 2), which beats x = [1, 0].
        let a = Mat::from_rows(&[&[1.0, 1.0], &[1.0, 2.0]]);
        let sol = nnls(&a, &[1.0, -1.0]).unwrap();

        assert!(sol.x.iter().all(|&x| x >= 0.0));
        assert!((sol.rnorm - 2.0f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_nnls_deletion() {
        // A = [1 1; 1 2; 1 3], b = [1, 0, -1]
        // Unconstrained solution is [2, -1]; on x[1] = 0 the objective is
        // 3 x0^2 + 2, minimized at x0 = 0.
        let a = Mat::from_rows(&[&[1.0, 1.0], &[1.0, 2.0], &[1.0, 3.0]]);
        let sol = nnls(&a, &[1.0, 0.0, -1.0]).unwrap();

        assert_eq!(sol.x[1], 0.0);
        assert!(sol.x[0].abs() < 1e-10);
        assert!((sol.rnorm - 2.0f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_nnls_active_bound_with_interior_component() {
        // min (x0 - 2)^2 + (x1 + 1)^2 over x >= 0 => x = [2, 0]
        let a = Mat::from_rows(&[&[1.0, 0.0], &[0.0, 1.0]]);
        let sol = nnls(&a, &[2.0, -1.0]).unwrap();

        assert!((sol.x[0] - 2.0).abs() < 1e-12);
        assert_eq!(sol.x[1], 0.0);
        assert!((sol.residual[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_nnls_dependent_columns() {
        // Two opposite columns: only the one pointing towards b is used.
        let a = Mat::from_rows(&[&[1.0, -1.0], &[0.0, 0.0]]);
        let sol = nnls(&a, &[3.0, 1.0]).unwrap();

        assert!((sol.x[0] - 3.0).abs() < 1e-12);
        assert_eq!(sol.x[1], 0.0);
        assert!((sol.rnorm - 1.0).abs() < 1e-12);
    }
}
