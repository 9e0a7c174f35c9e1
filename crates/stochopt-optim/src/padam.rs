//! Partially adaptive moment estimation (Padam).
//!
//! Padam sits between SGD with momentum and Adam: the second moment enters
//! the step through a partial exponent `p ∈ (0, ½]` instead of a square root.
//! `p = ½` gives an AMSGrad-style fully adaptive step, `p → 0` approaches
//! plain momentum.
//!
//! # Algorithm
//!
//! Per step with gradient g and effective step size α, componentwise:
//! 1. m ← β₁ m + (1 − β₁) g
//! 2. v ← β₂ v + (1 − β₂) g²
//! 3. v̂ ← max(v̂, v)
//! 4. step = α m / (v̂ᵖ + ε)
//!
//! The running maximum keeps the effective learning rate from growing when
//! the second moment decays. No bias correction is applied.
//!
//! # References
//!
//! - Chen & Gu, "Closing the Generalization Gap of Adaptive Gradient Methods
//!   in Training Deep Neural Networks" (2018)

use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use stochopt_core::{
    callback::Callback,
    decay::NoDecay,
    error::{OptimizerError, Result},
    function::SeparableFunction,
    optimizer::Optimizer,
    summary::OptimizationSummary,
    types::{DVector, Scalar},
    update::{check_gradient_dimension, check_state_dimension, UpdatePolicy, UpdateState},
};

use crate::sgd::{Sgd, SgdConfig};

/// Moment estimates kept by [`PadamUpdate`].
#[derive(Debug, Clone, PartialEq)]
pub struct PadamState<T: Scalar> {
    /// First moment estimate
    pub m: DVector<T>,
    /// Second moment estimate
    pub v: DVector<T>,
    /// Running maximum of the second moment
    pub v_hat: DVector<T>,
    /// Steps computed since initialization
    pub steps: usize,
}

impl<T: Scalar> PadamState<T> {
    /// Zeroed state for `dimension` parameters.
    pub fn zeros(dimension: usize) -> Self {
        Self {
            m: DVector::zeros(dimension),
            v: DVector::zeros(dimension),
            v_hat: DVector::zeros(dimension),
            steps: 0,
        }
    }
}

impl<T: Scalar> UpdateState<T> for PadamState<T> {
    fn optimizer_name(&self) -> &str {
        "Padam"
    }

    fn dimension(&self) -> usize {
        self.m.len()
    }

    fn steps(&self) -> usize {
        self.steps
    }

    fn summary(&self) -> HashMap<String, String> {
        let mut summary = HashMap::new();
        summary.insert("steps".to_string(), self.steps.to_string());
        summary.insert(
            "m_norm".to_string(),
            format!("{:.6e}", Scalar::to_f64(self.m.norm())),
        );
        summary.insert(
            "v_hat_max".to_string(),
            format!("{:.6e}", Scalar::to_f64(self.v_hat.max())),
        );
        summary
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Padam update policy.
#[derive(Debug, Clone)]
pub struct PadamUpdate<T: Scalar> {
    beta1: T,
    beta2: T,
    partial: T,
    epsilon: T,
    state: Option<PadamState<T>>,
}

impl<T: Scalar> PadamUpdate<T> {
    /// Creates the policy. `partial` is not range checked.
    pub fn new(beta1: T, beta2: T, partial: T, epsilon: T) -> Self {
        Self {
            beta1,
            beta2,
            partial,
            epsilon,
            state: None,
        }
    }

    /// First moment decay rate β₁.
    pub fn beta1(&self) -> T {
        self.beta1
    }

    /// Sets β₁.
    pub fn set_beta1(&mut self, beta1: T) {
        self.beta1 = beta1;
    }

    /// Second moment decay rate β₂.
    pub fn beta2(&self) -> T {
        self.beta2
    }

    /// Sets β₂.
    pub fn set_beta2(&mut self, beta2: T) {
        self.beta2 = beta2;
    }

    /// Partial adaptivity exponent p.
    pub fn partial(&self) -> T {
        self.partial
    }

    /// Sets p.
    pub fn set_partial(&mut self, partial: T) {
        self.partial = partial;
    }

    /// Denominator floor ε.
    pub fn epsilon(&self) -> T {
        self.epsilon
    }

    /// Sets ε.
    pub fn set_epsilon(&mut self, epsilon: T) {
        self.epsilon = epsilon;
    }

    /// Moment estimates, once initialized.
    pub fn padam_state(&self) -> Option<&PadamState<T>> {
        self.state.as_ref()
    }
}

impl<T: Scalar> Default for PadamUpdate<T> {
    fn default() -> Self {
        Self::new(
            <T as Scalar>::from_f64(0.9),
            <T as Scalar>::from_f64(0.999),
            <T as Scalar>::from_f64(0.25),
            <T as Scalar>::from_f64(1e-8),
        )
    }
}

impl<T: Scalar> UpdatePolicy<T> for PadamUpdate<T> {
    fn name(&self) -> &str {
        "Padam"
    }

    fn initialize(&mut self, dimension: usize) {
        self.state = Some(PadamState::zeros(dimension));
    }

    fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    fn compute_step(
        &mut self,
        iterate: &DVector<T>,
        step_size: T,
        gradient: &DVector<T>,
    ) -> Result<DVector<T>> {
        let (beta1, beta2, partial, epsilon) = (self.beta1, self.beta2, self.partial, self.epsilon);
        let state = self.state.as_mut().ok_or_else(|| {
            OptimizerError::invalid_configuration(
                "Padam update used before initialization",
                "state",
                "uninitialized",
            )
        })?;
        check_state_dimension(state.m.len(), iterate.len())?;
        check_gradient_dimension(iterate, gradient)?;

        state.m.axpy(T::one() - beta1, gradient, beta1);
        state
            .v
            .axpy(T::one() - beta2, &gradient.component_mul(gradient), beta2);
        state
            .v_hat
            .zip_apply(&state.v, |v_hat, v| *v_hat = <T as Float>::max(*v_hat, v));
        state.steps += 1;

        let denominator = state
            .v_hat
            .map(|v_hat| <T as Float>::powf(v_hat, partial) + epsilon);
        Ok(state.m.component_div(&denominator) * step_size)
    }

    fn state(&self) -> Option<&dyn UpdateState<T>> {
        self.state.as_ref().map(|s| s as &dyn UpdateState<T>)
    }
}

/// Configuration for the [`Padam`] optimizer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PadamConfig<T: Scalar> {
    /// Step size (α)
    pub step_size: T,
    /// Number of samples per batch
    pub batch_size: usize,
    /// First moment decay rate (β₁)
    pub beta1: T,
    /// Second moment decay rate (β₂)
    pub beta2: T,
    /// Partial adaptivity exponent (p)
    pub partial: T,
    /// Denominator floor (ε)
    pub epsilon: T,
    /// Maximum number of processed samples (0 = unbounded)
    pub max_iterations: usize,
    /// Epoch objective change below which the run converges
    pub tolerance: T,
    /// Whether to shuffle the sample order every epoch
    pub shuffle: bool,
    /// Whether to reinitialize the moments on every call
    pub reset_policy: bool,
    /// Whether to compute the exact objective at the end
    pub exact_objective: bool,
}

impl<T: Scalar> Default for PadamConfig<T> {
    fn default() -> Self {
        Self {
            step_size: <T as Scalar>::from_f64(0.001),
            batch_size: 32,
            beta1: <T as Scalar>::from_f64(0.9),
            beta2: <T as Scalar>::from_f64(0.999),
            partial: <T as Scalar>::from_f64(0.25),
            epsilon: <T as Scalar>::from_f64(1e-8),
            max_iterations: 100_000,
            tolerance: T::DEFAULT_TOLERANCE,
            shuffle: true,
            reset_policy: true,
            exact_objective: false,
        }
    }
}

impl<T: Scalar> PadamConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the step size.
    pub fn with_step_size(mut self, step_size: T) -> Self {
        self.step_size = step_size;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the first moment decay rate (β₁).
    pub fn with_beta1(mut self, beta1: T) -> Self {
        self.beta1 = beta1;
        self
    }

    /// Sets the second moment decay rate (β₂).
    pub fn with_beta2(mut self, beta2: T) -> Self {
        self.beta2 = beta2;
        self
    }

    /// Sets the partial adaptivity exponent.
    pub fn with_partial(mut self, partial: T) -> Self {
        self.partial = partial;
        self
    }

    /// Sets the epsilon value for numerical stability.
    pub fn with_epsilon(mut self, epsilon: T) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the iteration budget in samples (0 = unbounded).
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the convergence tolerance (<= 0 disables the check).
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

    fn split(self) -> (SgdConfig<T>, PadamUpdate<T>) {
        let sgd = SgdConfig {
            step_size: self.step_size,
            batch_size: self.batch_size,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            shuffle: self.shuffle,
            reset_policy: self.reset_policy,
            exact_objective: self.exact_objective,
        };
        let update = PadamUpdate::new(self.beta1, self.beta2, self.partial, self.epsilon);
        (sgd, update)
    }
}

/// Padam optimizer: [`PadamUpdate`] and [`NoDecay`] bound to [`Sgd`].
///
/// # Examples
///
/// ```rust
/// use stochopt_core::{optimizer::Optimizer, types::DVector};
/// use stochopt_optim::padam::{Padam, PadamConfig};
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
/// let mut padam = Padam::new(
///     PadamConfig::new()
///         .with_step_size(0.01)
///         .with_batch_size(1)
///         .with_max_iterations(2_000)
///         .with_partial(0.125)
///         .with_exact_objective(true),
/// )
/// .with_seed(42);
///
/// let mut x = DVector::from_vec(vec![1.0, -2.0]);
/// let start = 5.0;
/// let objective = padam.optimize(&Squares, &mut x)?;
/// assert!(objective < start);
/// assert!(padam.last_summary().is_some());
/// # Ok::<(), stochopt_core::error::OptimizerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Padam<T: Scalar> {
    sgd: Sgd<T, PadamUpdate<T>, NoDecay>,
}

impl<T: Scalar> Padam<T> {
    /// Creates a new Padam optimizer with the given configuration.
    pub fn new(config: PadamConfig<T>) -> Self {
        let (sgd_config, update) = config.split();
        Self {
            sgd: Sgd::new(sgd_config, update, NoDecay),
        }
    }

    /// Creates a new Padam optimizer with default configuration.
    pub fn with_default_config() -> Self {
        Self::new(PadamConfig::default())
    }

    /// Reseeds the shuffling RNG, builder style.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sgd.set_seed(seed);
        self
    }

    /// Reseeds the shuffling RNG.
    pub fn set_seed(&mut self, seed: u64) {
        self.sgd.set_seed(seed);
    }

    /// The underlying driver.
    pub fn sgd(&self) -> &Sgd<T, PadamUpdate<T>, NoDecay> {
        &self.sgd
    }

    /// The update policy, including its moment estimates.
    pub fn update_policy(&self) -> &PadamUpdate<T> {
        self.sgd.update_policy()
    }

    /// The update policy for modification between calls.
    pub fn update_policy_mut(&mut self) -> &mut PadamUpdate<T> {
        self.sgd.update_policy_mut()
    }

    /// Step size.
    pub fn step_size(&self) -> T {
        self.sgd.config().step_size
    }

    /// Sets the step size.
    pub fn set_step_size(&mut self, step_size: T) {
        self.sgd.config_mut().step_size = step_size;
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.sgd.config().batch_size
    }

    /// Sets the batch size.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.sgd.config_mut().batch_size = batch_size;
    }

    /// First moment decay rate.
    pub fn beta1(&self) -> T {
        self.update_policy().beta1()
    }

    /// Sets the first moment decay rate.
    pub fn set_beta1(&mut self, beta1: T) {
        self.update_policy_mut().set_beta1(beta1);
    }

    /// Second moment decay rate.
    pub fn beta2(&self) -> T {
        self.update_policy().beta2()
    }

    /// Sets the second moment decay rate.
    pub fn set_beta2(&mut self, beta2: T) {
        self.update_policy_mut().set_beta2(beta2);
    }

    /// Partial adaptivity exponent.
    pub fn partial(&self) -> T {
        self.update_policy().partial()
    }

    /// Sets the partial adaptivity exponent.
    pub fn set_partial(&mut self, partial: T) {
        self.update_policy_mut().set_partial(partial);
    }

    /// Denominator floor.
    pub fn epsilon(&self) -> T {
        self.update_policy().epsilon()
    }

    /// Sets the denominator floor.
    pub fn set_epsilon(&mut self, epsilon: T) {
        self.update_policy_mut().set_epsilon(epsilon);
    }

    /// Iteration budget in samples.
    pub fn max_iterations(&self) -> usize {
        self.sgd.config().max_iterations
    }

    /// Sets the iteration budget in samples (0 = unbounded).
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.sgd.config_mut().max_iterations = max_iterations;
    }

    /// Convergence tolerance.
    pub fn tolerance(&self) -> T {
        self.sgd.config().tolerance
    }

    /// Sets the convergence tolerance.
    pub fn set_tolerance(&mut self, tolerance: T) {
        self.sgd.config_mut().tolerance = tolerance;
    }

    /// Whether samples are shuffled each epoch.
    pub fn shuffle(&self) -> bool {
        self.sgd.config().shuffle
    }

    /// Enables or disables shuffling.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.sgd.config_mut().shuffle = shuffle;
    }

    /// Whether the moments are reset on every call.
    pub fn reset_policy(&self) -> bool {
        self.sgd.config().reset_policy
    }

    /// Enables or disables the reset policy.
    pub fn set_reset_policy(&mut self, reset_policy: bool) {
        self.sgd.config_mut().reset_policy = reset_policy;
    }

    /// Whether the exact objective is computed at the end.
    pub fn exact_objective(&self) -> bool {
        self.sgd.config().exact_objective
    }

    /// Enables or disables the exact final objective.
    pub fn set_exact_objective(&mut self, exact_objective: bool) {
        self.sgd.config_mut().exact_objective = exact_objective;
    }
}

impl<T: Scalar> Default for Padam<T> {
    fn default() -> Self {
        Self::with_default_config()
    }
}

impl<T: Scalar> Optimizer<T> for Padam<T> {
    fn name(&self) -> &str {
        "Padam"
    }

    fn optimize_with_callbacks<F>(
        &mut self,
        function: &F,
        iterate: &mut DVector<T>,
        callbacks: &mut [&mut dyn Callback<T>],
    ) -> Result<T>
    where
        F: SeparableFunction<T>,
    {
        self.sgd
            .optimize_with_callbacks(function, iterate, callbacks)
    }

    fn last_summary(&self) -> Option<&OptimizationSummary<T>> {
        self.sgd.last_summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use stochopt_core::test_functions::SphereFunction;

    #[test]
    fn test_padam_step_formula() {
        let mut policy = PadamUpdate::new(0.9, 0.999, 0.25, 1e-8);
        policy.initialize(2);

        let x = DVector::from_vec(vec![0.0, 0.0]);
        let g = DVector::from_vec(vec![2.0, -1.0]);
        let step = policy.compute_step(&x, 0.1, &g).unwrap();

        for i in 0..2 {
            let m = 0.1 * g[i];
            let v: f64 = 0.001 * g[i] * g[i];
            let expected = 0.1 * m / (v.powf(0.25) + 1e-8);
            assert_relative_eq!(step[i], expected, epsilon = 1e-12);
        }

        let state = policy.padam_state().unwrap();
        assert_eq!(state.steps, 1);
        assert_eq!(state.v, state.v_hat);
    }

    #[test]
    fn test_v_hat_is_running_max() {
        let mut policy = PadamUpdate::new(0.0, 0.0, 0.5, 0.0);
        policy.initialize(1);
        let x = DVector::from_vec(vec![0.0]);

        policy
            .compute_step(&x, 1.0, &DVector::from_vec(vec![3.0]))
            .unwrap();
        // With β₂ = 0, v tracks g² exactly while v̂ keeps the maximum.
        let step = policy
            .compute_step(&x, 1.0, &DVector::from_vec(vec![1.0]))
            .unwrap();

        let state = policy.padam_state().unwrap();
        assert_relative_eq!(state.v[0], 1.0);
        assert_relative_eq!(state.v_hat[0], 9.0);
        assert_relative_eq!(step[0], 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_half_matches_amsgrad_without_bias_correction() {
        let mut policy = PadamUpdate::new(0.9, 0.999, 0.5, 1e-8);
        policy.initialize(1);
        let x = DVector::from_vec(vec![0.0]);
        let step = policy
            .compute_step(&x, 1.0, &DVector::from_vec(vec![4.0]))
            .unwrap();
        let expected = 0.4 / ((0.001_f64 * 16.0).sqrt() + 1e-8);
        assert_relative_eq!(step[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_gradient_gives_zero_step() {
        let mut policy = PadamUpdate::<f64>::default();
        policy.initialize(3);
        let x = DVector::zeros(3);
        let step = policy.compute_step(&x, 0.1, &DVector::zeros(3)).unwrap();
        assert_eq!(step, DVector::zeros(3));
    }

    #[test]
    fn test_state_dimension_mismatch() {
        let mut policy = PadamUpdate::<f64>::default();
        policy.initialize(2);
        let x = DVector::zeros(3);

        let err = policy
            .compute_step(&x, 0.1, &DVector::zeros(3))
            .unwrap_err();
        assert!(matches!(err, OptimizerError::InvalidConfiguration { .. }));

        let x = DVector::zeros(2);
        let err = policy
            .compute_step(&x, 0.1, &DVector::zeros(4))
            .unwrap_err();
        assert_eq!(err, OptimizerError::dimension_mismatch(2, 4));
    }

    #[test]
    fn test_state_summary() {
        let mut policy = PadamUpdate::<f64>::default();
        assert!(UpdatePolicy::state(&policy).is_none());
        policy.initialize(2);

        let state = UpdatePolicy::state(&policy).unwrap();
        assert_eq!(state.optimizer_name(), "Padam");
        assert_eq!(state.dimension(), 2);
        assert_eq!(state.steps(), 0);
        assert_eq!(state.summary().get("steps").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_default_config() {
        let padam = Padam::<f64>::default();
        assert_eq!(padam.step_size(), 0.001);
        assert_eq!(padam.batch_size(), 32);
        assert_eq!(padam.beta1(), 0.9);
        assert_eq!(padam.beta2(), 0.999);
        assert_eq!(padam.partial(), 0.25);
        assert_eq!(padam.epsilon(), 1e-8);
        assert_eq!(padam.max_iterations(), 100_000);
        assert_eq!(padam.tolerance(), 1e-5);
        assert!(padam.shuffle());
        assert!(padam.reset_policy());
        assert!(!padam.exact_objective());
    }

    #[test]
    fn test_setters() {
        let mut padam = Padam::<f64>::default();
        padam.set_step_size(0.01);
        padam.set_batch_size(8);
        padam.set_beta1(0.8);
        padam.set_beta2(0.99);
        padam.set_partial(0.125);
        padam.set_epsilon(1e-6);
        padam.set_max_iterations(50);
        padam.set_tolerance(-1.0);
        padam.set_shuffle(false);
        padam.set_reset_policy(false);
        padam.set_exact_objective(true);

        assert_eq!(padam.step_size(), 0.01);
        assert_eq!(padam.batch_size(), 8);
        assert_eq!(padam.beta1(), 0.8);
        assert_eq!(padam.beta2(), 0.99);
        assert_eq!(padam.partial(), 0.125);
        assert_eq!(padam.epsilon(), 1e-6);
        assert_eq!(padam.max_iterations(), 50);
        assert_eq!(padam.tolerance(), -1.0);
        assert!(!padam.shuffle());
        assert!(!padam.reset_policy());
        assert!(padam.exact_objective());
    }

    #[test]
    fn test_padam_minimizes_sphere() {
        let f = SphereFunction::new(4);
        let mut padam = Padam::new(PadamConfig::new().with_tolerance(-1.0)).with_seed(1);
        let mut x: DVector<f64> = f.initial_point().unwrap();

        let objective = padam.optimize(&f, &mut x).unwrap();

        assert!(objective <= 1e-5, "objective {}", objective);
        assert!(x.norm() < 1e-3);
        let summary = padam.last_summary().unwrap();
        assert_eq!(summary.iterations, 100_000);
        assert_eq!(summary.steps, 25_000);
    }
}
