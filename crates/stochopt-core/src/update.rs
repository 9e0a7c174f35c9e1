//! Update policies: how a raw gradient becomes a step.
//!
//! An update policy owns whatever per-parameter state its algorithm needs
//! (momentum, moment estimates, ...). The driver decides when that state is
//! (re)allocated through [`UpdatePolicy::initialize`] and otherwise treats the
//! policy as a black box that maps a gradient to a step.

use crate::{
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;

/// Trait for stateful gradient-to-step transformations.
///
/// The driver subtracts the returned step from the iterate:
/// x ← x − step(α, g).
pub trait UpdatePolicy<T: Scalar>: Debug {
    /// Returns a human-readable name identifying the update rule.
    fn name(&self) -> &str;

    /// Allocates zeroed state for an iterate with `dimension` parameters,
    /// discarding any previous state.
    fn initialize(&mut self, dimension: usize);

    /// Returns true once `initialize` has been called.
    fn is_initialized(&self) -> bool;

    /// Computes the step for `gradient` with the effective step size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the retained state was sized for a
    /// different iterate, and `DimensionMismatch` when the gradient does not
    /// match the iterate.
    fn compute_step(
        &mut self,
        iterate: &DVector<T>,
        step_size: T,
        gradient: &DVector<T>,
    ) -> Result<DVector<T>>;

    /// Read-only view of the policy state, if the policy keeps any.
    fn state(&self) -> Option<&dyn UpdateState<T>> {
        None
    }
}

/// Trait for the state an update policy carries between steps.
pub trait UpdateState<T: Scalar>: Debug {
    /// Returns the name of the update rule this state belongs to.
    fn optimizer_name(&self) -> &str;

    /// Number of parameters the state was allocated for.
    fn dimension(&self) -> usize;

    /// Number of steps computed since the state was allocated.
    fn steps(&self) -> usize;

    /// Returns a summary of the current state as key-value pairs.
    fn summary(&self) -> HashMap<String, String>;

    /// Concrete state for downcasting, e.g. to read moment estimates from a
    /// callback.
    fn as_any(&self) -> &dyn Any;
}

/// Checks that state allocated for `state_dim` parameters can be applied to
/// an iterate of length `iterate_dim`.
pub fn check_state_dimension(state_dim: usize, iterate_dim: usize) -> Result<()> {
    if state_dim != iterate_dim {
        return Err(OptimizerError::invalid_configuration(
            format!(
                "update policy state has {} parameters but the iterate has {}; \
                 enable the reset policy when changing the iterate size",
                state_dim, iterate_dim
            ),
            "iterate",
            iterate_dim.to_string(),
        ));
    }
    Ok(())
}

/// Checks that a gradient has the same length as the iterate.
pub fn check_gradient_dimension<T: Scalar>(
    iterate: &DVector<T>,
    gradient: &DVector<T>,
) -> Result<()> {
    if iterate.len() != gradient.len() {
        return Err(OptimizerError::dimension_mismatch(iterate.len(), gradient.len()));
    }
    Ok(())
}
