//! Plain and momentum gradient updates.
//!
//! - [`VanillaUpdate`]: step = α g, no state
//! - [`MomentumUpdate`]: v ← μ v + g, step = α v

use std::any::Any;
use std::collections::HashMap;
use stochopt_core::{
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
    update::{check_gradient_dimension, check_state_dimension, UpdatePolicy, UpdateState},
};

/// Plain stochastic gradient step.
#[derive(Debug, Clone, Copy, Default)]
pub struct VanillaUpdate {
    initialized: bool,
}

impl VanillaUpdate {
    /// Creates the policy.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Scalar> UpdatePolicy<T> for VanillaUpdate {
    fn name(&self) -> &str {
        "SGD"
    }

    fn initialize(&mut self, _dimension: usize) {
        self.initialized = true;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn compute_step(
        &mut self,
        iterate: &DVector<T>,
        step_size: T,
        gradient: &DVector<T>,
    ) -> Result<DVector<T>> {
        check_gradient_dimension(iterate, gradient)?;
        Ok(gradient * step_size)
    }
}

/// Velocity carried by [`MomentumUpdate`].
#[derive(Debug, Clone)]
pub struct MomentumState<T: Scalar> {
    /// Accumulated velocity
    pub velocity: DVector<T>,
    /// Steps computed since initialization
    pub steps: usize,
}

impl<T: Scalar> UpdateState<T> for MomentumState<T> {
    fn optimizer_name(&self) -> &str {
        "Momentum SGD"
    }

    fn dimension(&self) -> usize {
        self.velocity.len()
    }

    fn steps(&self) -> usize {
        self.steps
    }

    fn summary(&self) -> HashMap<String, String> {
        let mut summary = HashMap::new();
        summary.insert("steps".to_string(), self.steps.to_string());
        summary.insert(
            "velocity_norm".to_string(),
            format!("{:.6e}", Scalar::to_f64(self.velocity.norm())),
        );
        summary
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Classical momentum: v ← μ v + g, step = α v.
#[derive(Debug, Clone)]
pub struct MomentumUpdate<T: Scalar> {
    momentum: T,
    state: Option<MomentumState<T>>,
}

impl<T: Scalar> MomentumUpdate<T> {
    /// Creates the policy with momentum coefficient μ.
    pub fn new(momentum: T) -> Self {
        Self {
            momentum,
            state: None,
        }
    }

    /// Momentum coefficient μ.
    pub fn momentum(&self) -> T {
        self.momentum
    }

    /// Sets the momentum coefficient μ.
    pub fn set_momentum(&mut self, momentum: T) {
        self.momentum = momentum;
    }

    /// Current velocity state, once initialized.
    pub fn momentum_state(&self) -> Option<&MomentumState<T>> {
        self.state.as_ref()
    }
}

impl<T: Scalar> Default for MomentumUpdate<T> {
    fn default() -> Self {
        Self::new(<T as Scalar>::from_f64(0.5))
    }
}

impl<T: Scalar> UpdatePolicy<T> for MomentumUpdate<T> {
    fn name(&self) -> &str {
        "Momentum SGD"
    }

    fn initialize(&mut self, dimension: usize) {
        self.state = Some(MomentumState {
            velocity: DVector::zeros(dimension),
            steps: 0,
        });
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
        let momentum = self.momentum;
        let state = self.state.as_mut().ok_or_else(|| {
            OptimizerError::invalid_configuration(
                "momentum update used before initialization",
                "state",
                "uninitialized",
            )
        })?;
        check_state_dimension(state.velocity.len(), iterate.len())?;
        check_gradient_dimension(iterate, gradient)?;

        state.velocity.axpy(T::one(), gradient, momentum);
        state.steps += 1;
        Ok(&state.velocity * step_size)
    }

    fn state(&self) -> Option<&dyn UpdateState<T>> {
        self.state.as_ref().map(|s| s as &dyn UpdateState<T>)
    }
}
