//! Generic stochastic gradient descent driver.
//!
//! [`Sgd`] runs mini-batch epochs over a [`SeparableFunction`] and knows
//! nothing about the update mathematics: the step for each batch comes from an
//! [`UpdatePolicy`], the step size from a [`DecayPolicy`]. Concrete optimizers
//! such as Padam are thin bindings of a policy pair to this driver.
//!
//! # Algorithm Overview
//!
//! For every call to [`Sgd::optimize`]:
//! 1. (Re)initialize the policies when the reset policy is on or on first use
//! 2. Each epoch, shuffle the sample order (or keep the identity order)
//! 3. For each batch: evaluate objective and gradient, ask the decay policy
//!    for the step size, ask the update policy for a step, subtract it
//! 4. At the end of each epoch, compare the summed batch objectives with the
//!    previous epoch's and stop once they differ by less than the tolerance
//!
//! One iteration is one processed sample: a batch of size `b` advances the
//! iteration counter by `b`, and the last batch is truncated so a non-zero
//! budget is never exceeded.

use log::{debug, info, warn};
use num_traits::Float;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Instant;
use stochopt_core::{
    callback::{Callback, CallbackSet, EpochInfo, StepInfo},
    decay::{DecayPolicy, NoDecay},
    error::{OptimizerError, Result},
    function::SeparableFunction,
    optimizer::Optimizer,
    summary::{OptimizationSummary, TerminationReason},
    types::{DVector, Scalar},
    update::{check_gradient_dimension, UpdatePolicy},
};

/// Configuration for the SGD driver.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SgdConfig<T: Scalar> {
    /// Base step size handed to the decay policy
    pub step_size: T,
    /// Number of samples per batch
    pub batch_size: usize,
    /// Maximum number of processed samples (0 = unbounded)
    pub max_iterations: usize,
    /// Epoch objective change below which the run converges (<= 0 disables)
    pub tolerance: T,
    /// Whether to shuffle the sample order every epoch
    pub shuffle: bool,
    /// Whether to reinitialize policy state on every call
    pub reset_policy: bool,
    /// Whether to compute the exact objective over all terms at the end
    pub exact_objective: bool,
}

impl<T: Scalar> Default for SgdConfig<T> {
    fn default() -> Self {
        Self {
            step_size: <T as Scalar>::from_f64(0.01),
            batch_size: 32,
            max_iterations: 100_000,
            tolerance: T::DEFAULT_TOLERANCE,
            shuffle: true,
            reset_policy: true,
            exact_objective: false,
        }
    }
}

impl<T: Scalar> SgdConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base step size.
    pub fn with_step_size(mut self, step_size: T) -> Self {
        self.step_size = step_size;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the iteration budget in samples (0 = unbounded).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enables or disables per-epoch shuffling.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Enables or disables the reset policy.
    pub fn with_reset_policy(mut self, reset_policy: bool) -> Self {
        self.reset_policy = reset_policy;
        self
    }

    /// Enables or disables the exact final objective.
    pub fn with_exact_objective(mut self, exact_objective: bool) -> Self {
        self.exact_objective = exact_objective;
        self
    }
}

/// Stochastic gradient descent over separable functions.
///
/// Generic over the update policy `U` (gradient to step) and the decay policy
/// `D` (step size over time). The driver owns its RNG so that shuffling is
/// reproducible with [`Sgd::with_seed`].
///
/// # Examples
///
/// ```rust
/// use stochopt_core::{decay::NoDecay, optimizer::Optimizer, types::DVector};
/// use stochopt_optim::{momentum::VanillaUpdate, sgd::{Sgd, SgdConfig}};
/// # use stochopt_core::{error::Result, function::SeparableFunction};
/// # #[derive(Debug)]
/// # struct Squares;
/// # impl SeparableFunction<f64> for Squares {
/// #     fn num_functions(&self) -> usize { 2 }
/// #     fn evaluate(&self, x: &DVector<f64>, idx: &[usize]) -> Result<f64> {
/// #         Ok(idx.iter().map(|&i| x[i] * x[i]).sum())
/// #     }
/// #     fn gradient(&self, x: &DVector<f64>, idx: &[usize], g: &mut DVector<f64>) -> Result<()> {
/// #         g.fill(0.0);
/// #         for &i in idx { g[i] = 2.0 * x[i]; }
/// #         Ok(())
/// #     }
/// # }
///
/// let config = SgdConfig::new()
///     .with_step_size(0.1)
///     .with_batch_size(1)
///     .with_max_iterations(200)
///     .with_tolerance(0.0);
/// let mut sgd = Sgd::new(config, VanillaUpdate::new(), NoDecay).with_seed(42);
///
/// let mut x = DVector::from_vec(vec![1.0, -2.0]);
/// let objective = sgd.optimize(&Squares, &mut x)?;
/// assert!(objective < 1e-6);
/// # Ok::<(), stochopt_core::error::OptimizerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Sgd<T, U, D = NoDecay>
where
    T: Scalar,
    U: UpdatePolicy<T>,
    D: DecayPolicy<T>,
{
    config: SgdConfig<T>,
    update_policy: U,
    decay_policy: D,
    rng: StdRng,
    last_summary: Option<OptimizationSummary<T>>,
}

impl<T, U, D> Sgd<T, U, D>
where
    T: Scalar,
    U: UpdatePolicy<T>,
    D: DecayPolicy<T>,
{
    /// Creates a driver with an entropy-seeded RNG.
    pub fn new(config: SgdConfig<T>, update_policy: U, decay_policy: D) -> Self {
        Self {
            config,
            update_policy,
            decay_policy,
            rng: StdRng::from_entropy(),
            last_summary: None,
        }
    }

    /// Reseeds the shuffling RNG, builder style.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_seed(seed);
        self
    }

    /// Reseeds the shuffling RNG.
    pub fn set_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SgdConfig<T> {
        &self.config
    }

    /// Returns the configuration for modification between calls.
    pub fn config_mut(&mut self) -> &mut SgdConfig<T> {
        &mut self.config
    }

    /// Returns the update policy.
    pub fn update_policy(&self) -> &U {
        &self.update_policy
    }

    /// Returns the update policy for modification between calls.
    pub fn update_policy_mut(&mut self) -> &mut U {
        &mut self.update_policy
    }

    /// Returns the decay policy.
    pub fn decay_policy(&self) -> &D {
        &self.decay_policy
    }

    /// Returns the decay policy for modification between calls.
    pub fn decay_policy_mut(&mut self) -> &mut D {
        &mut self.decay_policy
    }

    fn validate(&self, num_functions: usize) -> Result<()> {
        if self.config.batch_size == 0 {
            return Err(OptimizerError::invalid_configuration(
                "batch size must be at least 1",
                "batch_size",
                "0",
            ));
        }
        if num_functions == 0 {
            return Err(OptimizerError::invalid_configuration(
                "function has no separable terms",
                "num_functions",
                "0",
            ));
        }
        Ok(())
    }

    /// Full pass over all terms in batches of `batch_size`.
    fn exact_objective<F>(&self, function: &F, iterate: &DVector<T>) -> Result<T>
    where
        F: SeparableFunction<T>,
    {
        let num_functions = function.num_functions();
        let mut objective = T::zero();
        let mut begin = 0;
        while begin < num_functions {
            let count = self.config.batch_size.min(num_functions - begin);
            objective += function.evaluate_range(iterate, begin, count)?;
            begin += count;
        }
        Ok(objective)
    }
}

impl<T, U, D> Optimizer<T> for Sgd<T, U, D>
where
    T: Scalar,
    U: UpdatePolicy<T>,
    D: DecayPolicy<T>,
{
    fn name(&self) -> &str {
        self.update_policy.name()
    }

    /// Runs mini-batch epochs until convergence, budget exhaustion, a
    /// callback stop or a non-finite epoch objective.
    ///
    /// Returns the final objective: the exact objective when configured,
    /// otherwise the sum of the batch objectives of the last completed epoch
    /// (or of the current epoch if none completed).
    fn optimize_with_callbacks<F>(
        &mut self,
        function: &F,
        iterate: &mut DVector<T>,
        callbacks: &mut [&mut dyn Callback<T>],
    ) -> Result<T>
    where
        F: SeparableFunction<T>,
    {
        let start = Instant::now();
        self.last_summary = None;

        let num_functions = function.num_functions();
        self.validate(num_functions)?;

        let dimension = iterate.len();
        if self.config.reset_policy || !self.update_policy.is_initialized() {
            self.update_policy.initialize(dimension);
            self.decay_policy.initialize(dimension);
        }

        let batch_size = self.config.batch_size;
        let budget = self.config.max_iterations;
        let tolerance = self.config.tolerance;
        let base_step_size = self.config.step_size;

        info!(
            "{}: optimizing {} functions ({} parameters), batch size {}, step size {}",
            self.update_policy.name(),
            num_functions,
            dimension,
            batch_size,
            base_step_size
        );

        let objective_fn: &dyn SeparableFunction<T> = function;
        let mut callbacks = CallbackSet::new(callbacks);

        let mut order: Vec<usize> = (0..num_functions).collect();
        let mut gradient = DVector::zeros(dimension);
        let mut iteration = 0;
        let mut steps = 0;
        let mut epochs = 0;
        let mut epoch_objective = T::zero();
        let mut last_objective: Option<T> = None;
        let mut reason = TerminationReason::MaxIterations;

        let mut terminate = callbacks.begin_optimization(objective_fn, iterate);
        check_iterate(iterate, dimension)?;
        if terminate {
            reason = TerminationReason::CallbackRequest;
        }

        'run: while !terminate {
            if self.config.shuffle {
                order.shuffle(&mut self.rng);
            }

            epoch_objective = T::zero();
            let mut offset = 0;
            let mut exhausted = false;

            while offset < num_functions {
                let mut effective = batch_size.min(num_functions - offset);
                if budget > 0 {
                    effective = effective.min(budget - iteration);
                }
                let batch = &order[offset..offset + effective];

                let objective = function.evaluate_with_gradient(iterate, batch, &mut gradient)?;
                check_gradient_dimension(iterate, &gradient)?;
                epoch_objective += objective;

                terminate |= callbacks.evaluate(objective_fn, iterate, batch, objective);
                terminate |= callbacks.gradient(objective_fn, iterate, batch, &gradient);

                let step_size = self
                    .decay_policy
                    .step_size(base_step_size, steps, iterate, &gradient);
                let step = self
                    .update_policy
                    .compute_step(iterate, step_size, &gradient)?;
                *iterate -= &step;

                steps += 1;
                iteration += effective;
                offset += effective;

                let info = StepInfo {
                    iteration,
                    step: steps,
                    epoch: epochs,
                    step_size,
                    batch,
                    objective,
                    update_policy: &self.update_policy,
                    elapsed: start.elapsed(),
                };
                terminate |= callbacks.step_taken(&info, objective_fn, iterate);
                check_iterate(iterate, dimension)?;

                if terminate {
                    info!(
                        "{}: stopped by callback after {} steps",
                        self.update_policy.name(),
                        steps
                    );
                    reason = TerminationReason::CallbackRequest;
                    break 'run;
                }
                if budget > 0 && iteration >= budget {
                    exhausted = true;
                    break;
                }
            }

            if offset < num_functions {
                info!(
                    "{}: maximum iterations ({}) reached; terminating optimization",
                    self.update_policy.name(),
                    budget
                );
                break;
            }

            let previous = last_objective.replace(epoch_objective);
            let info = EpochInfo {
                epoch: epochs,
                iteration,
                objective: epoch_objective,
                elapsed: start.elapsed(),
            };
            epochs += 1;
            debug!(
                "{}: epoch {}, objective {}",
                self.update_policy.name(),
                epochs,
                epoch_objective
            );

            terminate |= callbacks.end_epoch(&info, objective_fn, iterate);
            check_iterate(iterate, dimension)?;

            if !Float::is_finite(epoch_objective) {
                warn!(
                    "{}: objective diverged to {}; terminating optimization",
                    self.update_policy.name(),
                    epoch_objective
                );
                reason = TerminationReason::NumericalError;
                break;
            }

            if let Some(previous) = previous {
                if tolerance > T::zero()
                    && <T as Float>::abs(previous - epoch_objective) < tolerance
                {
                    info!(
                        "{}: minimized within tolerance {}; terminating optimization",
                        self.update_policy.name(),
                        tolerance
                    );
                    reason = TerminationReason::Converged;
                    break;
                }
            }

            if terminate {
                reason = TerminationReason::CallbackRequest;
                break;
            }
            if exhausted {
                info!(
                    "{}: maximum iterations ({}) reached; terminating optimization",
                    self.update_policy.name(),
                    budget
                );
                break;
            }
        }

        let final_objective = if self.config.exact_objective {
            self.exact_objective(function, iterate)?
        } else {
            last_objective.unwrap_or(epoch_objective)
        };

        callbacks.end_optimization(objective_fn, iterate, final_objective);

        self.last_summary = Some(OptimizationSummary {
            iterations: iteration,
            steps,
            epochs,
            termination_reason: reason,
            final_objective,
            duration: start.elapsed(),
        });

        Ok(final_objective)
    }

    fn last_summary(&self) -> Option<&OptimizationSummary<T>> {
        self.last_summary.as_ref()
    }
}

fn check_iterate<T: Scalar>(iterate: &DVector<T>, dimension: usize) -> Result<()> {
    if iterate.len() != dimension {
        return Err(OptimizerError::dimension_mismatch(dimension, iterate.len()));
    }
    Ok(())
}
