//! # StochOpt
//!
//! Mini-batch stochastic optimization of separable functions
//! f(x) = Σᵢ fᵢ(x).
//!
//! The [`Sgd`] driver walks the terms in shuffled mini-batches and delegates
//! the step to an [`UpdatePolicy`] and the step size to a [`DecayPolicy`].
//! [`Padam`] binds the driver to the partially adaptive moment update.
//!
//! ## Quick Start
//!
//! ```rust
//! use stochopt::prelude::*;
//!
//! /// f(x) = Σᵢ (xᵢ − i)², one term per coordinate.
//! #[derive(Debug)]
//! struct Shifted(usize);
//!
//! impl SeparableFunction<f64> for Shifted {
//!     fn num_functions(&self) -> usize {
//!         self.0
//!     }
//!
//!     fn evaluate(&self, x: &DVector<f64>, indices: &[usize]) -> Result<f64> {
//!         Ok(indices.iter().map(|&i| (x[i] - i as f64).powi(2)).sum())
//!     }
//!
//!     fn gradient(&self, x: &DVector<f64>, indices: &[usize], g: &mut DVector<f64>) -> Result<()> {
//!         g.fill(0.0);
//!         for &i in indices {
//!             g[i] = 2.0 * (x[i] - i as f64);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let function = Shifted(3);
//! let mut x = DVector::zeros(3);
//!
//! let mut padam = Padam::new(
//!     PadamConfig::new()
//!         .with_step_size(0.05)
//!         .with_batch_size(1)
//!         .with_max_iterations(30_000)
//!         .with_tolerance(1e-12)
//!         .with_exact_objective(true),
//! )
//! .with_seed(7);
//!
//! let objective = padam.optimize(&function, &mut x)?;
//! assert!(objective < 1e-2);
//! # Ok(())
//! # }
//! ```

pub use nalgebra;
pub use stochopt_core;
pub use stochopt_optim;

pub use stochopt_core::{
    callback::{Callback, CallbackSet},
    decay::{DecayPolicy, NoDecay, ScheduledDecay},
    error::{OptimizerError, Result},
    function::SeparableFunction,
    optimizer::Optimizer,
    summary::{OptimizationSummary, TerminationReason},
    types::{DVector, Scalar},
    update::{UpdatePolicy, UpdateState},
};
pub use stochopt_optim::{
    MomentumUpdate, Padam, PadamConfig, PadamUpdate, Sgd, SgdConfig, VanillaUpdate,
};

#[cfg(feature = "test-utils")]
pub use stochopt_core::test_functions;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use stochopt_core::prelude::*;
    pub use stochopt_optim::{
        MomentumState, MomentumUpdate, Padam, PadamConfig, PadamState, PadamUpdate, Sgd,
        SgdConfig, VanillaUpdate,
    };
}
