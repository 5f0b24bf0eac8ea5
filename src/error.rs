//! Failure modes of the SLSQP iteration.
//!
//! The numeric codes follow the `status` values reported by scipy's SLSQP so
//! that printed results read the same way.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlsqpError {
    #[error("More equality constraints than independent variables")]
    MoreEqualityConstraints,
    #[error("More than 3*n iterations in LSQ subproblem")]
    IterationLimitExceededLSQ,
    #[error("Inequality constraints incompatible")]
    IncompatibleConstraints,
    #[error("Singular matrix E in LSQ subproblem")]
    SingularMatrixE,
    #[error("Singular matrix C in LSQ subproblem")]
    SingularMatrixC,
    #[error("Positive directional derivative for linesearch")]
    PositiveDirectionalDerivative,
    #[error("Iteration limit reached")]
    IterationLimitExceeded,
}

impl SlsqpError {
    /// Exit status code, as reported in `OptimizeResult::status`.
    pub fn code(&self) -> i32 {
        match self {
            Self::MoreEqualityConstraints => 2,
            Self::IterationLimitExceededLSQ => 3,
            Self::IncompatibleConstraints => 4,
            Self::SingularMatrixE => 5,
            Self::SingularMatrixC => 6,
            Self::PositiveDirectionalDerivative => 8,
            Self::IterationLimitExceeded => 9,
        }
    }

    /// Returns `true` for failures raised while solving the QP subproblem.
    pub fn is_subproblem_error(&self) -> bool {
        matches!(
            self,
            Self::IterationLimitExceededLSQ
                | Self::IncompatibleConstraints
                | Self::SingularMatrixE
                | Self::SingularMatrixC
        )
    }
}
