//! The contract every stochastic optimizer implements.
//!
//! An optimizer takes a separable objective and an iterate, mutates the
//! iterate in place and returns a scalar objective. Optimizer families do not
//! share a base type; each one implements [`Optimizer`] on its own.

use crate::{
    callback::Callback,
    error::Result,
    function::SeparableFunction,
    summary::OptimizationSummary,
    types::{DVector, Scalar},
};
use std::fmt::Debug;

/// Core trait for optimization algorithms over separable functions.
///
/// Configuration is read at the start of each call. Because every method that
/// runs an optimization takes `&mut self`, a configuration cannot change while
/// a run is in progress.
pub trait Optimizer<T: Scalar>: Debug {
    /// Returns a human-readable name identifying the algorithm.
    fn name(&self) -> &str;

    /// Minimizes `function` starting from `iterate`, invoking `callbacks` in
    /// registration order.
    ///
    /// The iterate is updated in place. The returned objective is
    /// algorithm-specific; see the implementor's documentation.
    ///
    /// # Errors
    ///
    /// Invalid configurations, shape mismatches and errors raised by
    /// `function` are returned unchanged. Callback-requested stops are not
    /// errors.
    fn optimize_with_callbacks<F>(
        &mut self,
        function: &F,
        iterate: &mut DVector<T>,
        callbacks: &mut [&mut dyn Callback<T>],
    ) -> Result<T>
    where
        F: SeparableFunction<T>;

    /// Minimizes `function` starting from `iterate`, without callbacks.
    fn optimize<F>(&mut self, function: &F, iterate: &mut DVector<T>) -> Result<T>
    where
        F: SeparableFunction<T>,
    {
        self.optimize_with_callbacks(function, iterate, &mut [])
    }

    /// Summary of the last successful call, if any.
    ///
    /// Cleared at the start of every call, so a failed call leaves `None`.
    fn last_summary(&self) -> Option<&OptimizationSummary<T>>;
}
