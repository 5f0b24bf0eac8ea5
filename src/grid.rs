//! Dense sampling of the demo objective and constraints for plotting.

use ndarray::{Array1, Array2};

use crate::problem::{
    GRID_COLS, GRID_RANGE, GRID_ROWS, disk_constraint, half_plane_constraint, objective,
};

/// `fun`, `con1` and `con2` are indexed `[i, j]` for the point `(x1[i], x2[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSamples {
    pub x1: Array1<f64>,
    pub x2: Array1<f64>,
    /// Objective values
    pub fun: Array2<f64>,
    /// Negated disk constraint, positive where infeasible
    pub con1: Array2<f64>,
    /// Negated half-plane constraint, positive where infeasible
    pub con2: Array2<f64>,
}

impl GridSamples {
    /// Samples the demo problem on its default `GRID_ROWS x GRID_COLS` grid.
    pub fn sample() -> Self {
        Self::sample_with(GRID_ROWS, GRID_COLS, GRID_RANGE)
    }

    pub fn sample_with(rows: usize, cols: usize, (lo, hi): (f64, f64)) -> Self {
        let x1 = Array1::linspace(lo, hi, rows);
        let x2 = Array1::linspace(lo, hi, cols);

        let mut fun = Array2::zeros((rows, cols));
        let mut con1 = Array2::zeros((rows, cols));
        let mut con2 = Array2::zeros((rows, cols));
        for (i, &a) in x1.iter().enumerate() {
            for (j, &b) in x2.iter().enumerate() {
                let x = [a, b];
                fun[[i, j]] = objective(&x);
                con1[[i, j]] = -disk_constraint(&x);
                con2[[i, j]] = -half_plane_constraint(&x);
            }
        }
        log::debug!("sampled {}x{} grid on [{}, {}]", rows, cols, lo, hi);

        Self {
            x1,
            x2,
            fun,
            con1,
            con2,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.fun.dim()
    }
}
