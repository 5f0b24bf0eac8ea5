//! Constrained nonlinear minimization with SLSQP, plus the pieces of the
//! "hello optimization" demo: the problem instance, grid sampling and plotting.

pub mod blas;
pub mod error;
pub use error::SlsqpError;
pub mod grid;
pub mod householder;
pub mod ldl;
pub mod ldp;
pub mod matrix;
pub mod mode;
pub use mode::SlsqpMode;
pub mod nnls;
pub mod plot;
pub mod problem;
mod qp;
mod solver;
mod solver_body;
pub use matrix::Mat;
pub use solver::{IterationState, Slsqp};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Constraint definition
pub enum Constraint<'a> {
    /// Equality constraint: f(x) == 0
    Eq(Box<dyn Fn(&[f64]) -> f64 + 'a>),
    /// Inequality constraint: f(x) >= 0
    Ineq(Box<dyn Fn(&[f64]) -> f64 + 'a>),
}

impl Constraint<'_> {
    pub fn eval(&self, x: &[f64]) -> f64 {
        match self {
            Constraint::Eq(fun) | Constraint::Ineq(fun) => fun(x),
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, Constraint::Eq(_))
    }
}

impl fmt::Debug for Constraint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Eq(_) => f.write_str("Eq(..)"),
            Constraint::Ineq(_) => f.write_str("Ineq(..)"),
        }
    }
}

/// Events that can be observed during the optimization process.
#[derive(Debug, Clone)]
pub enum SlsqpEvent<'a> {
    /// Emitted at the end of each solver step, after the mode has advanced
    Step {
        iter: usize,
        mode: SlsqpMode,
        x: &'a [f64],
        f: f64,
        g: &'a [f64],
        c: &'a [f64],
        alpha: f64,
        s: &'a [f64],
        h: &'a [f64],
    },
}

/// Trait for observing the optimization process.
pub trait SlsqpObserver {
    /// Events are only built when this returns true, so an inactive observer costs nothing.
    fn is_active(&self) -> bool;

    fn on_event(&mut self, event: SlsqpEvent);
}

/// The default observer, does nothing.
impl SlsqpObserver for () {
    #[inline(always)]
    fn is_active(&self) -> bool {
        false
    }

    #[inline(always)]
    fn on_event(&mut self, _event: SlsqpEvent) {}
}

impl<O: SlsqpObserver + ?Sized> SlsqpObserver for &mut O {
    fn is_active(&self) -> bool {
        (**self).is_active()
    }

    fn on_event(&mut self, event: SlsqpEvent) {
        (**self).on_event(event)
    }
}

/// Snapshot of one major iteration, handed to [`fmin_slsqp`] callbacks.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationStep {
    pub iter: usize,
    pub mode: SlsqpMode,
    pub x: Vec<f64>,
    pub fun: f64,
    /// Objective gradient (first n elements)
    pub grad: Vec<f64>,
    pub constraints: Vec<f64>,
    /// LDL' factors of the Hessian approximation, column major
    pub l: Vec<f64>,
    /// Step size of the last line search
    pub alpha: f64,
    /// Search direction (first n elements)
    pub s: Vec<f64>,
}

/// Observer that forwards major iterations to a closure.
pub struct CallbackObserver<'a> {
    callback: Option<&'a mut dyn FnMut(&OptimizationStep)>,
}

impl<'a> CallbackObserver<'a> {
    pub fn new(callback: Option<&'a mut dyn FnMut(&OptimizationStep)>) -> Self {
        Self { callback }
    }
}

impl SlsqpObserver for CallbackObserver<'_> {
    fn is_active(&self) -> bool {
        self.callback.is_some()
    }

    fn on_event(&mut self, event: SlsqpEvent) {
        let Some(cb) = self.callback.as_mut() else {
            return;
        };
        let SlsqpEvent::Step {
            iter,
            mode,
            x,
            f,
            g,
            c,
            alpha,
            s,
            h,
        } = event;

        // EvalGrad steps belong to the iteration whose line search just ended
        if matches!(mode, SlsqpMode::LineSearch | SlsqpMode::Success) {
            cb(&OptimizationStep {
                iter,
                mode,
                x: x.to_vec(),
                fun: f,
                grad: g.to_vec(),
                constraints: c.to_vec(),
                l: h.to_vec(),
                alpha,
                s: s.to_vec(),
            });
        }
    }
}

/// Outcome of a minimization, laid out like scipy's `OptimizeResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    /// Final point
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub fun: f64,
    /// Objective gradient at `x`
    pub jac: Vec<f64>,
    /// Number of major iterations
    pub nit: usize,
    /// Number of function evaluations
    pub nfev: usize,
    /// Number of gradient evaluations
    pub njev: usize,
    /// Exit status, 0 on success
    pub status: i32,
    pub success: bool,
    pub message: String,
}

impl fmt::Display for OptimizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>8}: {}", "message", self.message)?;
        writeln!(f, "{:>8}: {}", "success", self.success)?;
        writeln!(f, "{:>8}: {}", "status", self.status)?;
        writeln!(f, "{:>8}: {}", "fun", self.fun)?;
        writeln!(f, "{:>8}: {:?}", "x", self.x)?;
        writeln!(f, "{:>8}: {}", "nit", self.nit)?;
        writeln!(f, "{:>8}: {:?}", "jac", self.jac)?;
        writeln!(f, "{:>8}: {}", "nfev", self.nfev)?;
        write!(f, "{:>8}: {}", "njev", self.njev)
    }
}

/// Options of [`minimize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeOptions {
    /// Accuracy requirement
    pub tol: f64,
    /// Maximum number of major iterations
    pub max_iter: usize,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            tol: 1e-6,
            max_iter: 100,
        }
    }
}

/// Minimizes `func` from `x0` subject to `bounds` and `constraints`, like
/// `scipy.optimize.minimize(method="SLSQP")`.
///
/// Solver failures are reported through `status`, `success` and `message`.
pub fn minimize<'a>(
    func: impl Fn(&[f64]) -> f64 + 'a,
    x0: &[f64],
    bounds: &[(f64, f64)],
    constraints: Vec<Constraint<'a>>,
    options: &MinimizeOptions,
) -> OptimizeResult {
    fmin_slsqp_observed(
        func,
        x0,
        bounds,
        constraints,
        options.max_iter,
        options.tol,
        (),
    )
}

/// SLSQP in the shape of `scipy.optimize.fmin_slsqp`.
///
/// # Parameters
/// - `func`: Objective function f(x)
/// - `x0`: Initial point
/// - `bounds`: Variable bounds [(lower, upper), ...], no bounds if empty
/// - `constraints`: List of constraints (equality or inequality)
/// - `max_iter`: Maximum number of iterations
/// - `acc`: Accuracy requirement
/// - `callback`: Optional callback function called at each major iteration
pub fn fmin_slsqp<'a>(
    func: impl Fn(&[f64]) -> f64 + 'a,
    x0: &[f64],
    bounds: &[(f64, f64)],
    constraints: Vec<Constraint<'a>>,
    max_iter: usize,
    acc: f64,
    callback: Option<&mut dyn FnMut(&OptimizationStep)>,
) -> OptimizeResult {
    let observer = CallbackObserver::new(callback);
    fmin_slsqp_observed(func, x0, bounds, constraints, max_iter, acc, observer)
}

/// Version of fmin_slsqp that accepts a generic observer.
pub fn fmin_slsqp_observed<'a, O: SlsqpObserver>(
    func: impl Fn(&[f64]) -> f64 + 'a,
    x0: &[f64],
    bounds: &[(f64, f64)],
    constraints: Vec<Constraint<'a>>,
    max_iter: usize,
    acc: f64,
    observer: O,
) -> OptimizeResult {
    let mut solver = Slsqp::new_with_observer(
        x0.to_vec(),
        bounds,
        Box::new(func),
        constraints,
        max_iter,
        acc,
        observer,
    );

    let outcome = loop {
        match solver.step() {
            Ok(SlsqpMode::Success) => break Ok(()),
            Ok(_) => {}
            Err(err) => break Err(err),
        }
    };

    let n = solver.num_vars();
    let (status, message) = match outcome {
        Ok(()) => (0, SlsqpMode::Success.message().to_string()),
        Err(err) => (err.code(), err.to_string()),
    };
    let nit = solver.iter_count();
    log::info!(
        "SLSQP finished after {} iterations ({} function, {} gradient evaluations): {}",
        nit,
        solver.nfev(),
        solver.njev(),
        message
    );

    OptimizeResult {
        fun: solver.f,
        jac: solver.gradient[..n].to_vec(),
        nit,
        nfev: solver.nfev(),
        njev: solver.njev(),
        status,
        success: status == 0,
        message,
        x: solver.x,
    }
}
