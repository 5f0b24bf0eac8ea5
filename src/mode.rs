/// Where the reverse-communication loop of [`crate::Slsqp`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[repr(i32)]
pub enum SlsqpMode {
    /// Nothing evaluated yet
    Init = -2,
    /// Optimization terminated successfully.
    Success = 0,
    /// Next step evaluates f and c along the search direction
    LineSearch = 1,
    /// Next step evaluates gradients and updates the Hessian approximation
    EvalGrad = -1,
}

impl SlsqpMode {
    pub fn message(&self) -> &'static str {
        match self {
            SlsqpMode::Init => "Initializing solver.",
            SlsqpMode::Success => "Optimization terminated successfully",
            SlsqpMode::LineSearch => "Function evaluation required (f & c)",
            SlsqpMode::EvalGrad => "Gradient evaluation required (g & a)",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SlsqpMode::Success)
    }
}

impl std::fmt::Display for SlsqpMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
