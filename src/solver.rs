use std::fmt;

use crate::{Constraint, Mat, SlsqpError, SlsqpMode, SlsqpObserver};

/// Quantities carried from one major iteration to the next: the merit
/// function, its directional derivative and the line search step.
#[derive(Debug, Clone, Default)]
pub struct IterationState {
    /// Line search step length
    pub alpha: f64,
    /// Objective value at the start of the line search
    pub prev_f: f64,
    /// g'd for the current search direction
    pub directional_derivative: f64,
    /// Sum of constraint violations at the current point
    pub constraint_violation: f64,
    /// 1 - relaxation, where relaxation is the extra variable used when the
    /// linearized constraints are incompatible
    pub incompatibility_factor: f64,
    /// Merit function at the current line search point
    pub merit_value: f64,
    /// Directional derivative of the merit function, scaled by alpha
    pub merit_derivative: f64,
    /// Merit function at the start of the line search
    pub merit_value_at_start: f64,
    /// Number of Hessian resets after non-descent directions, shared by one optimization
    pub reset_count: u32,
}

/// SLSQP solver state.
///
/// The solver is a reverse-communication state machine: every call to
/// [`Slsqp::step`] advances it by one phase and reports the next
/// [`SlsqpMode`]. [`crate::fmin_slsqp`] drives it to completion.
pub struct Slsqp<'a, O: SlsqpObserver = ()> {
    /// Objective function
    pub func: Box<dyn Fn(&[f64]) -> f64 + 'a>,
    /// Constraints, equalities first
    pub constraints: Vec<Constraint<'a>>,

    max_iter: usize,

    /// Current point
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub f: f64,
    /// Objective gradient (size n+1, the last entry belongs to the relaxation variable)
    pub gradient: Vec<f64>,
    /// Constraint values at `x`
    pub constraint_values: Vec<f64>,
    /// Constraint Jacobian, m x (n+1)
    pub jac: Mat,
    /// Lower bounds, `-inf` when unbounded
    pub lower_bounds: Vec<f64>,
    /// Upper bounds, `+inf` when unbounded
    pub upper_bounds: Vec<f64>,
    /// Accuracy requirement
    pub accuracy: f64,
    /// Relaxed accuracy used after repeated Hessian resets
    pub tolerance: f64,

    iter_count: usize,
    nfev: usize,
    njev: usize,

    /// Number of equality constraints
    pub num_equals: usize,
    /// Lagrange multipliers of the last QP subproblem, one per constraint
    pub multipliers: Vec<f64>,
    /// Penalty weights of the merit function
    pub penalties: Vec<f64>,
    /// LDL' factors of the Hessian approximation, (n+1) x (n+1)
    pub hessian: Mat,
    /// Point at the start of the line search
    pub x_prev: Vec<f64>,
    /// Search direction of the QP subproblem (size n+1)
    pub search_direction: Vec<f64>,
    /// BFGS workspace
    pub bfgs_u: Vec<f64>,
    /// BFGS workspace, holds the Lagrangian gradient between iterations
    pub bfgs_v: Vec<f64>,
    pub state: IterationState,
    /// Observer for optimization steps
    pub observer: O,
    pub(crate) mode: SlsqpMode,
}

impl<'a, O: SlsqpObserver> fmt::Debug for Slsqp<'a, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slsqp")
            .field("mode", &self.mode)
            .field("x", &self.x)
            .field("f", &self.f)
            .field("gradient", &self.gradient)
            .field("c", &self.constraint_values)
            .field("jac", &self.jac)
            .field("lower_bounds", &self.lower_bounds)
            .field("upper_bounds", &self.upper_bounds)
            .field("accuracy", &self.accuracy)
            .field("iter_count", &self.iter_count)
            .field("nfev", &self.nfev)
            .field("njev", &self.njev)
            .field("num_equals", &self.num_equals)
            .field("multipliers", &self.multipliers)
            .field("penalties", &self.penalties)
            .field("hessian", &self.hessian)
            .field("search_direction", &self.search_direction)
            .field("state", &self.state)
            .finish()
    }
}

impl<'a, O: SlsqpObserver> Slsqp<'a, O> {
    // sqrt(eps) for finite difference gradient estimation
    const EPSILON: f64 = 1.4901161193847656e-08;

    pub fn new_with_observer(
        x0: Vec<f64>,
        bounds: &[(f64, f64)],
        func: Box<dyn Fn(&[f64]) -> f64 + 'a>,
        mut constraints: Vec<Constraint<'a>>,
        max_iter: usize,
        acc: f64,
        observer: O,
    ) -> Self {
        // equalities first; the sort is stable so the caller's order survives within each kind
        constraints.sort_by_key(|c| match c {
            Constraint::Eq(_) => 0,
            Constraint::Ineq(_) => 1,
        });
        let num_equals = constraints
            .iter()
            .filter(|c| matches!(c, Constraint::Eq(..)))
            .count();

        let accuracy = acc.abs();
        let n = x0.len();
        let m = constraints.len();

        let mut lower_bounds = vec![f64::NEG_INFINITY; n];
        let mut upper_bounds = vec![f64::INFINITY; n];
        for (i, &(lower, upper)) in bounds.iter().take(n).enumerate() {
            lower_bounds[i] = lower;
            upper_bounds[i] = upper;
        }

        let x = x0
            .iter()
            .zip(lower_bounds.iter().zip(&upper_bounds))
            .map(|(&x_i, (&lower, &upper))| x_i.max(lower).min(upper))
            .collect();

        Self {
            func,
            constraints,
            max_iter,
            x,
            f: 0.0,
            gradient: vec![0.0; n + 1],
            constraint_values: vec![0.0; m],
            jac: Mat::new(m, n + 1),
            lower_bounds,
            upper_bounds,
            accuracy,
            tolerance: accuracy * 10.0,
            iter_count: 0,
            nfev: 0,
            njev: 0,
            num_equals,
            multipliers: vec![0.0; m],
            penalties: vec![0.0; m],
            hessian: Mat::new(n + 1, n + 1),
            x_prev: vec![0.0; n],
            search_direction: vec![0.0; n + 1],
            bfgs_u: vec![0.0; n + 1],
            bfgs_v: vec![0.0; n + 1],
            state: IterationState::default(),
            observer,
            mode: SlsqpMode::Init,
        }
    }

    #[inline(always)]
    pub fn num_vars(&self) -> usize {
        self.x.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn mode(&self) -> SlsqpMode {
        self.mode
    }

    /// Evaluates the objective and all constraints at the current point.
    pub fn evaluate_func(&mut self) {
        self.nfev += 1;
        self.f = (self.func)(&self.x);
        for (value, con) in self.constraint_values.iter_mut().zip(&self.constraints) {
            *value = con.eval(&self.x);
        }
    }

    /// Forward-difference gradient of the objective.
    pub fn evaluate_gradient(&mut self) {
        self.njev += 1;
        let f0 = self.f;
        let n = self.num_vars();
        for i in 0..n {
            let saved = self.x[i];
            self.x[i] += Self::EPSILON;
            let f1 = (self.func)(&self.x);
            self.gradient[i] = (f1 - f0) / Self::EPSILON;
            self.x[i] = saved;
        }
        self.gradient[n] = 0.0;
    }

    /// Forward-difference Jacobian of the constraints.
    pub fn evaluate_jacobian(&mut self) {
        let n = self.num_vars();
        for (j, con) in self.constraints.iter().enumerate() {
            let c0 = self.constraint_values[j];
            for i in 0..n {
                let saved = self.x[i];
                self.x[i] += Self::EPSILON;
                let c1 = con.eval(&self.x);
                self.jac[(j, i)] = (c1 - c0) / Self::EPSILON;
                self.x[i] = saved;
            }
        }
    }

    /// Violation of constraint `j` at the current point: `|c|` for
    /// equalities, `max(-c, 0)` for inequalities.
    pub fn violation(&self, j: usize) -> f64 {
        let c = self.constraint_values[j];
        if j < self.num_equals {
            c.abs()
        } else {
            (-c).max(0.0)
        }
    }

    pub fn total_violation(&self) -> f64 {
        (0..self.num_constraints()).map(|j| self.violation(j)).sum()
    }

    /// `f + sum_j penalty_j * violation_j`
    pub fn merit(&self) -> f64 {
        self.f + self.penalty_term()
    }

    pub(crate) fn penalty_term(&self) -> f64 {
        (0..self.num_constraints())
            .map(|j| self.penalties[j] * self.violation(j))
            .sum()
    }

    /// i-th component of J' lambda with the current multipliers
    pub(crate) fn jac_transpose_multipliers(&self, i: usize) -> f64 {
        crate::blas::dot(self.jac.col(i), &self.multipliers)
    }

    pub fn incr_iter_count(&mut self) -> Result<(), SlsqpError> {
        self.iter_count += 1;
        if self.iter_count > self.max_iter {
            return Err(SlsqpError::IterationLimitExceeded);
        }
        Ok(())
    }

    pub fn iter_count(&self) -> usize {
        self.iter_count
    }

    /// Number of objective/constraint evaluations (excluding finite differences)
    pub fn nfev(&self) -> usize {
        self.nfev
    }

    /// Number of gradient/Jacobian evaluations
    pub fn njev(&self) -> usize {
        self.njev
    }

    pub(crate) fn reset_hessian(&mut self) {
        self.hessian.set_identity();
    }
}

impl Slsqp<'static, ()> {
    pub fn new(
        x0: Vec<f64>,
        bounds: &[(f64, f64)],
        func: Box<dyn Fn(&[f64]) -> f64 + 'static>,
        constraints: Vec<Constraint<'static>>,
        max_iter: usize,
        acc: f64,
    ) -> Self {
        Self::new_with_observer(x0, bounds, func, constraints, max_iter, acc, ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_start_and_orders_constraints() {
        let constraints = vec![
            Constraint::Ineq(Box::new(|x: &[f64]| x[0])),
            Constraint::Eq(Box::new(|x: &[f64]| x[1] - 1.0)),
        ];
        let solver = Slsqp::new(
            vec![7.0, -3.0],
            &[(-5.0, 5.0), (-5.0, 5.0)],
            Box::new(|x: &[f64]| x[0] + x[1]),
            constraints,
            100,
            -1e-6,
        );

        assert_eq!(solver.x, vec![5.0, -3.0]);
        assert_eq!(solver.num_equals, 1);
        assert!(matches!(solver.constraints[0], Constraint::Eq(..)));
        assert_eq!(solver.accuracy, 1e-6);
        assert_eq!(solver.mode(), SlsqpMode::Init);
    }

    #[test]
    fn test_unbounded_when_no_bounds_given() {
        let solver = Slsqp::new(
            vec![1.0],
            &[],
            Box::new(|x: &[f64]| x[0]),
            vec![],
            10,
            1e-6,
        );
        assert_eq!(solver.lower_bounds, vec![f64::NEG_INFINITY]);
        assert_eq!(solver.upper_bounds, vec![f64::INFINITY]);
    }

    #[test]
    fn test_finite_differences() {
        let constraints = vec![Constraint::Ineq(Box::new(|x: &[f64]| 1.0 - x[0] * x[1]))];
        let mut solver = Slsqp::new(
            vec![1.0, 2.0],
            &[],
            Box::new(|x: &[f64]| x[0] * x[0] + 3.0 * x[1]),
            constraints,
            10,
            1e-6,
        );
        solver.evaluate_func();
        solver.evaluate_gradient();
        solver.evaluate_jacobian();

        assert_eq!(solver.f, 7.0);
        assert!((solver.gradient[0] - 2.0).abs() < 1e-6);
        assert!((solver.gradient[1] - 3.0).abs() < 1e-6);
        assert!((solver.jac[(0, 0)] + 2.0).abs() < 1e-6);
        assert!((solver.jac[(0, 1)] + 1.0).abs() < 1e-6);
        assert_eq!(solver.nfev(), 1);
        assert_eq!(solver.njev(), 1);
        // violated: 1 - 2 = -1
        assert_eq!(solver.total_violation(), 1.0);
    }
}
