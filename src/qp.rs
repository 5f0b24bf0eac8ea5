use crate::ldp::lsi;
use crate::{Mat, Slsqp, SlsqpError, SlsqpObserver};

/// Which QP row a constraint row of the subproblem came from.
#[derive(Debug, Clone, Copy)]
enum RowSource {
    /// Constraint `j`, with the sign of its row (equalities appear twice)
    Constraint(usize, f64),
    Bound,
}

impl<O: SlsqpObserver> Slsqp<'_, O> {
    /// Solves the quadratic subproblem
    ///
    /// ```text
    ///     min 1/2 d'Bd + g'd
    ///     s.t. J_eq d + c_eq  = 0
    ///          J_in d + c_in >= 0
    ///          lower - x <= d <= upper - x
    /// ```
    ///
    /// with `B = L D L'` taken from `self.hessian`. The search direction is
    /// written to `self.search_direction` and the constraint multipliers to
    /// `self.multipliers`.
    ///
    /// `num_vars` is either n, or n+1 when solving the relaxed problem whose
    /// last variable scales down the constraint residuals (see
    /// `solve_relaxed_qp`). The relaxation variable lives in `[0, 1]` and its
    /// objective weight is the last diagonal entry of `self.hessian`.
    pub(crate) fn solve_qp(&mut self, num_vars: usize) -> Result<(), SlsqpError> {
        let n = self.num_vars();
        let relaxed = num_vars == n + 1;
        let m = self.num_constraints();

        // 1/2 d'Bd + g'd = 1/2 |E d - f|^2 + const, with E = D^1/2 L' and E'f = -g
        let mut e = Mat::new(num_vars, num_vars);
        for i in 0..n {
            let d_sqrt = self.hessian[(i, i)].sqrt();
            e[(i, i)] = d_sqrt;
            for k in i + 1..n {
                e[(i, k)] = d_sqrt * self.hessian[(k, i)];
            }
        }
        if relaxed {
            e[(n, n)] = self.hessian[(n, n)];
        }
        let mut f = vec![0.0; num_vars];
        for i in 0..n {
            let partial: f64 = (0..i).map(|k| e[(k, i)] * f[k]).sum();
            f[i] = (self.gradient[i] - partial) / e[(i, i)];
        }
        crate::blas::scale(-1.0, &mut f);

        let mut lower: Vec<f64> = (0..n).map(|i| self.lower_bounds[i] - self.x[i]).collect();
        let mut upper: Vec<f64> = (0..n).map(|i| self.upper_bounds[i] - self.x[i]).collect();
        if relaxed {
            lower.push(0.0);
            upper.push(1.0);
        }

        let mut rows: Vec<(Vec<f64>, f64, RowSource)> = Vec::with_capacity(m + 2 * num_vars);
        for j in 0..m {
            let grad: Vec<f64> = (0..num_vars).map(|i| self.jac[(j, i)]).collect();
            let c = self.constraint_values[j];
            let negated = (j < self.num_equals).then(|| grad.iter().map(|v| -v).collect::<Vec<f64>>());
            rows.push((grad, -c, RowSource::Constraint(j, 1.0)));
            if let Some(negated) = negated {
                rows.push((negated, c, RowSource::Constraint(j, -1.0)));
            }
        }
        for i in 0..num_vars {
            if lower[i].is_finite() {
                let mut unit = vec![0.0; num_vars];
                unit[i] = 1.0;
                rows.push((unit, lower[i], RowSource::Bound));
            }
            if upper[i].is_finite() {
                let mut unit = vec![0.0; num_vars];
                unit[i] = -1.0;
                rows.push((unit, -upper[i], RowSource::Bound));
            }
        }

        let mut g = Mat::new(rows.len(), num_vars);
        let mut h = Vec::with_capacity(rows.len());
        for (r, (coefficients, rhs, _)) in rows.iter().enumerate() {
            for (i, &value) in coefficients.iter().enumerate() {
                g[(r, i)] = value;
            }
            h.push(*rhs);
        }

        let sol = lsi(&e, &f, &g, &h)?;

        self.search_direction[..num_vars].copy_from_slice(&sol.x);
        if !relaxed {
            self.search_direction[n] = 0.0;
        }
        self.multipliers.fill(0.0);
        for ((_, _, source), lambda) in rows.iter().zip(&sol.multipliers) {
            if let RowSource::Constraint(j, sign) = *source {
                self.multipliers[j] += sign * lambda;
            }
        }
        Ok(())
    }

    /// Re-solves an incompatible subproblem with one extra variable `delta`
    /// that relaxes the violated linearized constraints to
    /// `J d + c * (1 - delta) >= 0`. The penalty on `delta` grows tenfold
    /// on every further failure, at most five times.
    pub(crate) fn solve_relaxed_qp(&mut self) -> Result<(), SlsqpError> {
        const INITIAL_WEIGHT: f64 = 100.0;
        const MAX_RETRIES: u32 = 5;

        let n = self.num_vars();
        for j in 0..self.num_constraints() {
            let c = self.constraint_values[j];
            self.jac[(j, n)] = if j < self.num_equals { -c } else { (-c).max(0.0) };
        }
        self.gradient[n] = 0.0;
        self.hessian[(n, n)] = INITIAL_WEIGHT;

        let mut retries = 0;
        loop {
            match self.solve_qp(n + 1) {
                Ok(()) => break,
                Err(SlsqpError::IncompatibleConstraints) if retries < MAX_RETRIES => {
                    self.hessian[(n, n)] *= 10.0;
                    retries += 1;
                }
                Err(err) => return Err(err),
            }
        }
        self.state.incompatibility_factor = 1.0 - self.search_direction[n];
        log::debug!(
            "relaxed subproblem solved after {} retries, relaxation {:.3e}",
            retries,
            self.search_direction[n]
        );
        Ok(())
    }
}
