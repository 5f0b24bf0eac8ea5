//! Least distance and inequality-constrained least squares problems.
//!
//! The QP subproblem of SLSQP is reduced, following Lawson & Hanson
//! (chapter 23), as
//!
//! ```text
//!     LSI:  min |E x - f|  s.t.  G x >= h     (E upper triangular)
//!     LDP:  min |y|        s.t.  G E^-1 y >= h - G E^-1 f
//!     NNLS: min |[G E^-1 | h']' u - e_{n+1}|  s.t.  u >= 0
//! ```

use crate::blas::dot;
use crate::nnls::nnls;
use crate::{Mat, SlsqpError};

/// Below this value of `1 - h'u` the least distance problem is declared
/// infeasible; the NNLS residual then vanishes up to rounding.
const INCOMPATIBILITY_TOLERANCE: f64 = 1.0e-12;

/// Primal solution with one non-negative multiplier per constraint row.
#[derive(Debug, Clone)]
pub struct ConstrainedSolution {
    pub x: Vec<f64>,
    pub multipliers: Vec<f64>,
}

/// LDP: least distance programming, `min |x|  s.t.  G x >= h`.
///
/// `g` is `mg x n`. Returns [`SlsqpError::IncompatibleConstraints`] when the
/// constraints admit no solution.
pub fn ldp(g: &Mat, h: &[f64]) -> Result<ConstrainedSolution, SlsqpError> {
    let mg = g.rows();
    let n = g.cols();
    if mg == 0 {
        return Ok(ConstrainedSolution {
            x: vec![0.0; n],
            multipliers: Vec::new(),
        });
    }

    let mut a = Mat::new(n + 1, mg);
    for j in 0..mg {
        let col = a.col_mut(j);
        for i in 0..n {
            col[i] = g[(j, i)];
        }
        col[n] = h[j];
    }
    let mut b = vec![0.0; n + 1];
    b[n] = 1.0;

    let sol = nnls(&a, &b)?;
    let fac = 1.0 - dot(h, &sol.x);
    if sol.rnorm <= 0.0 || fac <= INCOMPATIBILITY_TOLERANCE {
        return Err(SlsqpError::IncompatibleConstraints);
    }

    let x = (0..n)
        .map(|i| (0..mg).map(|j| g[(j, i)] * sol.x[j]).sum::<f64>() / fac)
        .collect();
    let multipliers = sol.x.iter().map(|u| u / fac).collect();
    Ok(ConstrainedSolution { x, multipliers })
}

/// LSI: `min |E x - f|  s.t.  G x >= h` for an upper triangular, nonsingular `E`.
///
/// The multipliers satisfy `E'(E x - f) = G' lambda`, i.e. they are the
/// multipliers of the original constrained least squares problem.
pub fn lsi(e: &Mat, f: &[f64], g: &Mat, h: &[f64]) -> Result<ConstrainedSolution, SlsqpError> {
    let n = e.cols();
    let mg = g.rows();
    if (0..n).any(|i| e[(i, i)] == 0.0 || !e[(i, i)].is_finite()) {
        return Err(SlsqpError::SingularMatrixE);
    }

    // G E^-1, one row at a time: solve E' z = g_row by forward substitution.
    let mut g_hat = Mat::new(mg, n);
    for row in 0..mg {
        for i in 0..n {
            let partial: f64 = (0..i).map(|k| e[(k, i)] * g_hat[(row, k)]).sum();
            g_hat[(row, i)] = (g[(row, i)] - partial) / e[(i, i)];
        }
    }
    let h_hat: Vec<f64> = (0..mg).map(|row| h[row] - dot(&g_hat.row(row), f)).collect();

    let ConstrainedSolution { x: y, multipliers } = ldp(&g_hat, &h_hat)?;

    // back substitution: E x = y + f
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = (i + 1..n).map(|k| e[(i, k)] * x[k]).sum();
        x[i] = (y[i] + f[i] - tail) / e[(i, i)];
    }
    Ok(ConstrainedSolution { x, multipliers })
}
