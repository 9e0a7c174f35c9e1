//! Run summaries reported by the optimizers.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::Scalar;

/// Reason for optimization termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    /// The epoch objective changed by less than the tolerance
    Converged,
    /// The iteration budget was exhausted
    MaxIterations,
    /// A callback asked the run to stop
    CallbackRequest,
    /// The epoch objective became NaN or infinite
    NumericalError,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Converged => "converged",
            Self::MaxIterations => "maximum iterations reached",
            Self::CallbackRequest => "stopped by callback",
            Self::NumericalError => "non-finite objective",
        };
        f.write_str(text)
    }
}

/// What happened during one call to `optimize`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSummary<T: Scalar> {
    /// Samples processed
    pub iterations: usize,
    /// Updates applied to the iterate
    pub steps: usize,
    /// Completed passes over the data
    pub epochs: usize,
    /// Reason for termination
    pub termination_reason: TerminationReason,
    /// Objective value returned to the caller
    pub final_objective: T,
    /// Total optimization time
    pub duration: Duration,
}

impl<T: Scalar> OptimizationSummary<T> {
    /// Returns true when the run stopped on the tolerance test.
    pub fn converged(&self) -> bool {
        self.termination_reason == TerminationReason::Converged
    }
}
