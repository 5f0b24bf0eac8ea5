use crate::blas::{axpy, dot, norm2, scale};
use crate::ldl::ldl_update;
use crate::{Slsqp, SlsqpError, SlsqpEvent, SlsqpMode, SlsqpObserver};

/// At most this many backtracking trials per line search
const MAX_LINE_SEARCH_TRIALS: u32 = 10;
/// After this many Hessian resets without a descent direction the relaxed
/// convergence test decides
const MAX_HESSIAN_RESETS: u32 = 5;

impl<'a, O: SlsqpObserver> Slsqp<'a, O> {
    /// Advances the solver by one phase.
    ///
    /// - `Init`: evaluate f, c and their derivatives, then compute the first direction
    /// - `LineSearch`: backtrack along the direction on the merit function
    /// - `EvalGrad`: re-evaluate derivatives, update the Hessian, compute the next direction
    ///
    /// Returns the next mode; `Success` is terminal.
    pub fn step(&mut self) -> Result<SlsqpMode, SlsqpError> {
        let mode_result = match self.mode {
            SlsqpMode::Init => self.initialize(),
            SlsqpMode::LineSearch => self.line_search(),
            SlsqpMode::EvalGrad => {
                self.evaluate_gradient();
                self.evaluate_jacobian();
                self.update_hessian();
                self.compute_direction()
            }
            SlsqpMode::Success => Ok(SlsqpMode::Success),
        };

        if let Ok(mode) = mode_result {
            self.mode = mode;
        }
        self.emit_step_event();
        mode_result
    }

    fn initialize(&mut self) -> Result<SlsqpMode, SlsqpError> {
        if self.num_equals > self.num_vars() {
            return Err(SlsqpError::MoreEqualityConstraints);
        }
        self.evaluate_func();
        self.evaluate_gradient();
        self.evaluate_jacobian();
        self.reset_hessian();
        self.compute_direction()
    }

    /// emit step event, captures solver key values
    fn emit_step_event(&mut self) {
        if self.observer.is_active() {
            let n = self.num_vars();
            let iter = self.iter_count();
            self.observer.on_event(SlsqpEvent::Step {
                iter,
                mode: self.mode,
                x: &self.x,
                f: self.f,
                g: &self.gradient[..n],
                c: &self.constraint_values,
                alpha: self.state.alpha,
                s: &self.search_direction[..n],
                h: self.hessian.as_slice(),
            });
        }
    }

    /// Solves the QP subproblem at the current point and prepares the line
    /// search. Returns `Success` directly when the KKT conditions already hold.
    fn compute_direction(&mut self) -> Result<SlsqpMode, SlsqpError> {
        let n = self.num_vars();
        let m = self.num_constraints();

        loop {
            self.incr_iter_count()?;

            self.state.incompatibility_factor = 1.0;
            match self.solve_qp(n) {
                Ok(()) => {}
                Err(SlsqpError::IncompatibleConstraints) => {
                    log::warn!(
                        "iteration {}: linearized constraints incompatible, relaxing",
                        self.iter_count()
                    );
                    self.solve_relaxed_qp()?;
                }
                Err(err) => return Err(err),
            }

            // gradient of the Lagrangian at the current point, kept for the BFGS update
            for i in 0..n {
                self.bfgs_v[i] = self.gradient[i] - self.jac_transpose_multipliers(i);
            }
            self.state.prev_f = self.f;
            self.x_prev.copy_from_slice(&self.x);

            let gs = dot(&self.gradient[..n], &self.search_direction[..n]);
            self.state.directional_derivative = gs;
            self.state.constraint_violation = self.total_violation();

            let mut kkt = gs.abs();
            for j in 0..m {
                let lambda = self.multipliers[j].abs();
                self.penalties[j] = lambda.max(0.5 * (self.penalties[j] + lambda));
                kkt += lambda * self.constraint_values[j].abs();
            }
            if kkt < self.accuracy && self.state.constraint_violation < self.accuracy {
                return Ok(SlsqpMode::Success);
            }

            let penalty = self.penalty_term();
            self.state.merit_value_at_start = self.f + penalty;
            self.state.merit_derivative = gs - penalty * self.state.incompatibility_factor;

            log::debug!(
                "iteration {}: f = {:.10e}, violation = {:.3e}, |d| = {:.3e}",
                self.iter_count(),
                self.f,
                self.state.constraint_violation,
                norm2(&self.search_direction[..n])
            );

            if self.state.merit_derivative < 0.0 {
                return Ok(SlsqpMode::LineSearch);
            }

            self.state.reset_count += 1;
            if self.state.reset_count > MAX_HESSIAN_RESETS {
                return self.check_relaxed_convergence();
            }
            log::debug!("no descent direction, resetting the Hessian approximation");
            self.reset_hessian();
        }
    }

    /// Backtracking on the merit function, starting with the full step.
    fn line_search(&mut self) -> Result<SlsqpMode, SlsqpError> {
        self.state.alpha = 1.0;
        let mut trials = 1;
        self.take_step();

        loop {
            self.evaluate_func();
            self.state.merit_value = self.merit();

            let merit_change = self.state.merit_value - self.state.merit_value_at_start;
            if merit_change <= self.state.merit_derivative / 10.0 || trials > MAX_LINE_SEARCH_TRIALS
            {
                return Ok(self.check_convergence());
            }
            // minimizer of the quadratic interpolating the merit along the step
            self.state.alpha = (self.state.merit_derivative
                / (2.0 * (self.state.merit_derivative - merit_change)))
                .max(0.1);
            trials += 1;
            self.take_step();
        }
    }

    /// Scales the direction by alpha and moves to `x_prev + d`.
    fn take_step(&mut self) {
        let n = self.num_vars();
        let alpha = self.state.alpha;
        self.state.merit_derivative *= alpha;
        scale(alpha, &mut self.search_direction[..n]);
        self.x.copy_from_slice(&self.x_prev);
        axpy(1.0, &self.search_direction[..n], &mut self.x);
    }

    /// Damped BFGS update of the LDL' factors (Powell's modification keeps
    /// the update positive definite when the curvature condition fails).
    fn update_hessian(&mut self) {
        let n = self.num_vars();

        // u = change of the Lagrangian gradient along the step
        for i in 0..n {
            self.bfgs_u[i] = self.gradient[i] - self.jac_transpose_multipliers(i) - self.bfgs_v[i];
        }

        // v = B d = L D L' d, evaluated in place
        for i in 0..n {
            let tail: f64 = (i + 1..n)
                .map(|j| self.hessian[(j, i)] * self.search_direction[j])
                .sum();
            self.bfgs_v[i] = self.search_direction[i] + tail;
        }
        for i in 0..n {
            self.bfgs_v[i] *= self.hessian[(i, i)];
        }
        for i in (0..n).rev() {
            let head: f64 = (0..i).map(|j| self.hessian[(i, j)] * self.bfgs_v[j]).sum();
            self.bfgs_v[i] += head;
        }

        let du = dot(&self.search_direction[..n], &self.bfgs_u[..n]);
        let dbd = dot(&self.search_direction[..n], &self.bfgs_v[..n]);
        let threshold = 0.2 * dbd;
        if du < threshold {
            let theta = (dbd - threshold) / (dbd - du);
            scale(theta, &mut self.bfgs_u[..n]);
            axpy(1.0 - theta, &self.bfgs_v[..n], &mut self.bfgs_u[..n]);
        }

        ldl_update(
            &mut self.hessian,
            n,
            &mut self.bfgs_u,
            1.0 / du.max(threshold),
            &mut self.bfgs_v,
        );
        ldl_update(
            &mut self.hessian,
            n,
            &mut self.bfgs_v,
            -1.0 / dbd,
            &mut self.bfgs_u,
        );
    }

    fn check_convergence(&mut self) -> SlsqpMode {
        self.state.constraint_violation = self.total_violation();
        let n = self.num_vars();
        if ((self.f - self.state.prev_f).abs() < self.accuracy
            || norm2(&self.search_direction[..n]) < self.accuracy)
            && self.state.constraint_violation < self.accuracy
        {
            SlsqpMode::Success
        } else {
            SlsqpMode::EvalGrad
        }
    }

    fn check_relaxed_convergence(&mut self) -> Result<SlsqpMode, SlsqpError> {
        let n = self.num_vars();
        if ((self.f - self.state.prev_f).abs() < self.tolerance
            || norm2(&self.search_direction[..n]) < self.tolerance)
            && self.state.constraint_violation < self.tolerance
        {
            Ok(SlsqpMode::Success)
        } else {
            Err(SlsqpError::PositiveDirectionalDerivative)
        }
    }
}
