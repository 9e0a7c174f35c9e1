//! Core traits and types for stochastic optimization.
//!
//! This crate provides the building blocks shared by the stochastic
//! optimizers in `stochopt-optim`: the separable objective interface, the
//! update and decay policy seams of the generic driver, and the callback
//! protocol used to observe and interrupt a run.
//!
//! # Key Concepts
//!
//! - **Separable functions**: Objectives written as a sum of `n` terms that
//!   can be evaluated on any subset of indices
//! - **Update policies**: Stateful rules turning a gradient into a step
//! - **Decay policies**: Rules giving the effective step size of each update
//! - **Callbacks**: Observers that may request early termination
//!
//! # Modules
//!
//! - [`callback`]: Callback trait, aggregate and stock callbacks
//! - [`decay`]: Step size decay policies
//! - [`error`]: Error types for optimization
//! - [`function`]: Separable objective interface
//! - [`optimizer`]: The optimizer trait
//! - [`summary`]: Termination reasons and run summaries
//! - [`types`]: Scalar trait and vector aliases
//! - [`update`]: Update policy and state traits

#![cfg_attr(not(feature = "std"), no_std)]

pub mod callback;
pub mod decay;
pub mod error;
pub mod function;
pub mod optimizer;
pub mod summary;
pub mod types;
pub mod update;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_functions;

// Re-export commonly used items at the crate root
pub use error::{OptimizerError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use stochopt_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::callback::{
        Callback, CallbackSet, EarlyStopAtMinLoss, EpochInfo, LogProgress, NoOpCallback,
        StepInfo, StoreBestCoordinates, TimerStop,
    };
    pub use crate::decay::{DecayPolicy, DecaySchedule, NoDecay, ScheduledDecay};
    pub use crate::error::{OptimizerError, Result};
    pub use crate::function::{CountingFunction, DerivativeChecker, SeparableFunction};
    pub use crate::optimizer::Optimizer;
    pub use crate::summary::{OptimizationSummary, TerminationReason};
    pub use crate::types::{DVector, Scalar};
    pub use crate::update::{UpdatePolicy, UpdateState};
}
