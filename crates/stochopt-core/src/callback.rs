//! Callback support for optimization algorithms.
//!
//! Callbacks observe the optimization process at fixed lifecycle points and
//! may ask it to stop. Every hook has a no-op default and returns `true` to
//! request termination. Stopping through a callback is a normal outcome, not
//! an error.
//!
//! Hook order within one run:
//!
//! ```text
//! begin_optimization
//! repeat per batch:  evaluate, gradient, step_taken
//! per epoch:         end_epoch
//! end_optimization
//! ```

use crate::{
    function::SeparableFunction,
    types::{DVector, Scalar},
    update::UpdatePolicy,
};
use num_traits::Float;
use std::time::{Duration, Instant};

/// Information passed to [`Callback::step_taken`].
#[derive(Debug)]
pub struct StepInfo<'a, T: Scalar> {
    /// Samples processed so far in this run, including this batch
    pub iteration: usize,
    /// Updates applied so far in this run, including this one
    pub step: usize,
    /// Zero-based epoch the batch belongs to
    pub epoch: usize,
    /// Effective step size used for this update
    pub step_size: T,
    /// Sample indices of the batch
    pub batch: &'a [usize],
    /// Batch objective evaluated before the update
    pub objective: T,
    /// The update policy after computing this step
    pub update_policy: &'a dyn UpdatePolicy<T>,
    /// Elapsed time since the start of the run
    pub elapsed: Duration,
}

/// Information passed to [`Callback::end_epoch`].
#[derive(Debug, Clone, Copy)]
pub struct EpochInfo<T: Scalar> {
    /// Zero-based index of the finished epoch
    pub epoch: usize,
    /// Samples processed so far in this run
    pub iteration: usize,
    /// Sum of the batch objectives of the epoch
    pub objective: T,
    /// Elapsed time since the start of the run
    pub elapsed: Duration,
}

/// Trait for optimization callbacks.
///
/// Callbacks allow monitoring and controlling the optimization process.
/// They can be used for logging, early stopping, snapshotting, etc. Hooks
/// that receive `&mut DVector<T>` may change the iterate's values (e.g. to
/// project onto a constraint set) but must not change its length.
pub trait Callback<T: Scalar> {
    /// Called once before the first batch.
    fn begin_optimization(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        false
    }

    /// Called after a batch objective has been evaluated.
    fn evaluate(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &DVector<T>,
        _batch: &[usize],
        _objective: T,
    ) -> bool {
        false
    }

    /// Called after a batch gradient has been computed.
    fn gradient(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &DVector<T>,
        _batch: &[usize],
        _gradient: &DVector<T>,
    ) -> bool {
        false
    }

    /// Called after the step has been applied to the iterate.
    fn step_taken(
        &mut self,
        _info: &StepInfo<'_, T>,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        false
    }

    /// Called after every full pass over the data.
    fn end_epoch(
        &mut self,
        _info: &EpochInfo<T>,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        false
    }

    /// Called once with the final objective. The run is over, so the returned
    /// signal has no further effect.
    fn end_optimization(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
        _objective: T,
    ) -> bool {
        false
    }
}

/// Ordered collection of callbacks invoked as one.
///
/// Every callback sees every hook, in registration order, even after an
/// earlier one asked to stop. The aggregate signal is the OR of all signals.
pub struct CallbackSet<'a, 'b, T: Scalar> {
    callbacks: &'a mut [&'b mut dyn Callback<T>],
}

impl<'a, 'b, T: Scalar> CallbackSet<'a, 'b, T> {
    /// Wraps the callbacks in registration order.
    pub fn new(callbacks: &'a mut [&'b mut dyn Callback<T>]) -> Self {
        Self { callbacks }
    }

    /// Number of registered callbacks.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns true when no callback is registered.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Invokes `begin_optimization` on every callback.
    pub fn begin_optimization(
        &mut self,
        function: &dyn SeparableFunction<T>,
        iterate: &mut DVector<T>,
    ) -> bool {
        let mut stop = false;
        for callback in self.callbacks.iter_mut() {
            stop |= callback.begin_optimization(function, iterate);
        }
        stop
    }

    /// Invokes `evaluate` on every callback.
    pub fn evaluate(
        &mut self,
        function: &dyn SeparableFunction<T>,
        iterate: &DVector<T>,
        batch: &[usize],
        objective: T,
    ) -> bool {
        let mut stop = false;
        for callback in self.callbacks.iter_mut() {
            stop |= callback.evaluate(function, iterate, batch, objective);
        }
        stop
    }

    /// Invokes `gradient` on every callback.
    pub fn gradient(
        &mut self,
        function: &dyn SeparableFunction<T>,
        iterate: &DVector<T>,
        batch: &[usize],
        gradient: &DVector<T>,
    ) -> bool {
        let mut stop = false;
        for callback in self.callbacks.iter_mut() {
            stop |= callback.gradient(function, iterate, batch, gradient);
        }
        stop
    }

    /// Invokes `step_taken` on every callback.
    pub fn step_taken(
        &mut self,
        info: &StepInfo<'_, T>,
        function: &dyn SeparableFunction<T>,
        iterate: &mut DVector<T>,
    ) -> bool {
        let mut stop = false;
        for callback in self.callbacks.iter_mut() {
            stop |= callback.step_taken(info, function, iterate);
        }
        stop
    }

    /// Invokes `end_epoch` on every callback.
    pub fn end_epoch(
        &mut self,
        info: &EpochInfo<T>,
        function: &dyn SeparableFunction<T>,
        iterate: &mut DVector<T>,
    ) -> bool {
        let mut stop = false;
        for callback in self.callbacks.iter_mut() {
            stop |= callback.end_epoch(info, function, iterate);
        }
        stop
    }

    /// Invokes `end_optimization` on every callback.
    pub fn end_optimization(
        &mut self,
        function: &dyn SeparableFunction<T>,
        iterate: &mut DVector<T>,
        objective: T,
    ) -> bool {
        let mut stop = false;
        for callback in self.callbacks.iter_mut() {
            stop |= callback.end_optimization(function, iterate, objective);
        }
        stop
    }
}

/// A no-op callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl<T: Scalar> Callback<T> for NoOpCallback {}

/// A callback that logs progress through the `log` facade.
#[derive(Debug, Clone)]
pub struct LogProgress {
    every: usize,
    logged: usize,
}

impl LogProgress {
    /// Logs the objective every `every` epochs (at least every epoch).
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            logged: 0,
        }
    }

    /// Number of epoch lines written so far.
    pub fn logged_epochs(&self) -> usize {
        self.logged
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<T: Scalar> Callback<T> for LogProgress {
    fn begin_optimization(
        &mut self,
        function: &dyn SeparableFunction<T>,
        iterate: &mut DVector<T>,
    ) -> bool {
        log::info!(
            "starting optimization: {} terms, {} parameters",
            function.num_functions(),
            iterate.len()
        );
        false
    }

    fn end_epoch(
        &mut self,
        info: &EpochInfo<T>,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        if (info.epoch + 1) % self.every == 0 {
            self.logged += 1;
            log::info!(
                "epoch {}: objective = {}, iteration = {}",
                info.epoch + 1,
                info.objective,
                info.iteration
            );
        }
        false
    }

    fn end_optimization(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
        objective: T,
    ) -> bool {
        log::info!("optimization complete, final objective = {}", objective);
        false
    }
}

/// Stops when the epoch objective has not improved for `patience` epochs.
#[derive(Debug, Clone)]
pub struct EarlyStopAtMinLoss<T: Scalar> {
    patience: usize,
    best: Option<T>,
    bad_epochs: usize,
}

impl<T: Scalar> EarlyStopAtMinLoss<T> {
    /// Creates the callback with the number of epochs to wait for improvement.
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best: None,
            bad_epochs: 0,
        }
    }

    /// Lowest epoch objective seen so far.
    pub fn best_objective(&self) -> Option<T> {
        self.best
    }
}

impl<T: Scalar> Callback<T> for EarlyStopAtMinLoss<T> {
    fn begin_optimization(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        self.best = None;
        self.bad_epochs = 0;
        false
    }

    fn end_epoch(
        &mut self,
        info: &EpochInfo<T>,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        match self.best {
            Some(best) if info.objective >= best => {
                self.bad_epochs += 1;
                if self.bad_epochs >= self.patience {
                    log::info!(
                        "no improvement for {} epochs, stopping at epoch {}",
                        self.bad_epochs,
                        info.epoch + 1
                    );
                    return true;
                }
            }
            _ => {
                self.best = Some(info.objective);
                self.bad_epochs = 0;
            }
        }
        false
    }
}

/// Stops once a wall-clock budget is spent.
///
/// The driver has no timeout of its own; this is the cooperative way to bound
/// run time. The budget is checked after every step.
#[derive(Debug, Clone)]
pub struct TimerStop {
    limit: Duration,
    start: Option<Instant>,
}

impl TimerStop {
    /// Creates a timer with the given budget.
    pub fn new(limit: Duration) -> Self {
        Self { limit, start: None }
    }
}

impl<T: Scalar> Callback<T> for TimerStop {
    fn begin_optimization(
        &mut self,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        self.start = Some(Instant::now());
        false
    }

    fn step_taken(
        &mut self,
        _info: &StepInfo<'_, T>,
        _function: &dyn SeparableFunction<T>,
        _iterate: &mut DVector<T>,
    ) -> bool {
        match self.start {
            Some(start) if start.elapsed() >= self.limit => {
                log::info!("time budget of {:?} exhausted", self.limit);
                true
            }
            _ => false,
        }
    }
}

/// Keeps a copy of the iterate with the lowest epoch objective.
#[derive(Debug, Clone, Default)]
pub struct StoreBestCoordinates<T: Scalar> {
    best_objective: Option<T>,
    best_coordinates: Option<DVector<T>>,
}

impl<T: Scalar> StoreBestCoordinates<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            best_objective: None,
            best_coordinates: None,
        }
    }

    /// Lowest epoch objective seen so far.
    pub fn best_objective(&self) -> Option<T> {
        self.best_objective
    }

    /// Iterate at the end of the best epoch.
    pub fn best_coordinates(&self) -> Option<&DVector<T>> {
        self.best_coordinates.as_ref()
    }
}

impl<T: Scalar> Callback<T> for StoreBestCoordinates<T> {
    fn end_epoch(
        &mut self,
        info: &EpochInfo<T>,
        _function: &dyn SeparableFunction<T>,
        iterate: &mut DVector<T>,
    ) -> bool {
        let improved = match self.best_objective {
            Some(best) => info.objective < best,
            None => !<T as Float>::is_nan(info.objective),
        };
        if improved {
            self.best_objective = Some(info.objective);
            self.best_coordinates = Some(iterate.clone());
        }
        false
    }
}
