//! Level-1 vector kernels used by the solver.
//!
//! Only unit strides are needed here, so the kernels work on slices and
//! take their length from the shorter operand.

/// DDOT: dot product of two vectors.
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y).map(|(x_i, y_i)| x_i * y_i).sum()
}

/// DNRM2: euclidean norm, scaled to avoid overflow on large entries.
pub fn norm2(x: &[f64]) -> f64 {
    let scale = x.iter().fold(0.0_f64, |acc, x_i| acc.max(x_i.abs()));
    if scale == 0.0 {
        return 0.0;
    }
    let sum: f64 = x.iter().map(|x_i| (x_i / scale).powi(2)).sum();
    scale * sum.sqrt()
}

/// DAXPY: y = alpha * x + y
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    if alpha == 0.0 {
        return;
    }
    y.iter_mut().zip(x).for_each(|(y_i, x_i)| *y_i += alpha * x_i);
}

/// DSCAL: x = alpha * x
pub fn scale(alpha: f64, x: &mut [f64]) {
    x.iter_mut().for_each(|x_i| *x_i *= alpha);
}
