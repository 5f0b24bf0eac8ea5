//! The demo problem instance:
//!
//! ```text
//!     min  (1 - x1)^2 + (1 - x2)^2 + 1/2 (2 x2 - x1^2)^2
//!     s.t. 1 - x1^2 - x2^2 >= 0
//!          5 - x1 - 3 x2   >= 0
//!          -5 <= x1, x2 <= 5
//! ```

use crate::{Constraint, MinimizeOptions, OptimizeResult, minimize};

/// Start point of the optimization
pub const X0: [f64; 2] = [1.0, 1.0];
pub const BOUNDS: [(f64, f64); 2] = [(-5.0, 5.0), (-5.0, 5.0)];
pub const TOLERANCE: f64 = 1e-6;
pub const MAX_ITER: usize = 100;

/// Plotting window, the same on both axes
pub const GRID_RANGE: (f64, f64) = (-5.0, 5.0);
/// Samples along x1
pub const GRID_ROWS: usize = 100;
/// Samples along x2
pub const GRID_COLS: usize = 99;
/// Number of objective contour levels
pub const CONTOUR_LEVELS: usize = 100;
/// Values of `-g` shaded as infeasible
pub const INFEASIBLE_RANGE: (f64, f64) = (0.0, 1000.0);

pub fn objective(x: &[f64]) -> f64 {
    (1.0 - x[0]).powi(2) + (1.0 - x[1]).powi(2) + 0.5 * (2.0 * x[1] - x[0].powi(2)).powi(2)
}

/// Unit disk: feasible inside the circle of radius 1
pub fn disk_constraint(x: &[f64]) -> f64 {
    1.0 - x[0].powi(2) - x[1].powi(2)
}

/// Feasible below the line x1 + 3 x2 = 5
pub fn half_plane_constraint(x: &[f64]) -> f64 {
    5.0 - x[0] - 3.0 * x[1]
}

pub fn constraints() -> Vec<Constraint<'static>> {
    vec![
        Constraint::Ineq(Box::new(disk_constraint)),
        Constraint::Ineq(Box::new(half_plane_constraint)),
    ]
}

pub fn options() -> MinimizeOptions {
    MinimizeOptions {
        tol: TOLERANCE,
        max_iter: MAX_ITER,
    }
}

/// Runs the optimizer on the demo problem.
pub fn solve() -> OptimizeResult {
    minimize(objective, &X0, &BOUNDS, constraints(), &options())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_values() {
        assert_eq!(objective(&[1.0, 1.0]), 0.5);
        assert_eq!(objective(&[1.0, 0.5]), 0.25);
        assert_eq!(objective(&[0.0, 0.0]), 2.0);
    }

    #[test]
    fn test_constraint_values() {
        assert_eq!(disk_constraint(&[0.0, 0.0]), 1.0);
        assert_eq!(half_plane_constraint(&[0.0, 0.0]), 5.0);
        assert_eq!(disk_constraint(&[1.0, 1.0]), -1.0);
        assert_eq!(half_plane_constraint(&[2.0, 1.0]), 0.0);
    }

    #[test]
    fn test_constraints_are_inequalities() {
        let cons = constraints();
        assert_eq!(cons.len(), 2);
        assert!(cons.iter().all(|c| !c.is_equality()));
        assert_eq!(cons[0].eval(&[0.5, 0.5]), 0.5);
        assert_eq!(cons[1].eval(&[0.5, 0.5]), 3.0);
    }
}
