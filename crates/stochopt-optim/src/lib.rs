//! StochOpt Optimization - Stochastic gradient optimizers for separable functions.
//!
//! This crate provides the generic mini-batch driver and the update policies
//! that plug into it.
//!
//! # Available Optimizers
//!
//! - **SGD**: Generic driver, parameterized by update and decay policies
//! - **Padam**: Partially adaptive moment estimation bound to the driver
//! - **Momentum**: Plain and classical momentum update policies
//!
//! # Examples
//!
//! ```rust
//! use stochopt_optim::{Optimizer, Padam, PadamConfig};
//!
//! // Padam with a smaller partial exponent and a reproducible shuffle
//! let padam = Padam::<f64>::new(
//!     PadamConfig::new()
//!         .with_step_size(0.01)
//!         .with_partial(0.125)
//! ).with_seed(42);
//!
//! assert_eq!(padam.partial(), 0.125);
//! assert_eq!(padam.name(), "Padam");
//! assert!(padam.last_summary().is_none());
//! ```

pub mod momentum;
pub mod padam;
pub mod sgd;

// Re-export main optimizers for convenience
pub use momentum::{MomentumState, MomentumUpdate, VanillaUpdate};
pub use padam::{Padam, PadamConfig, PadamState, PadamUpdate};
pub use sgd::{Sgd, SgdConfig};

// Re-export commonly used items from core
pub use stochopt_core::decay::{DecayPolicy, NoDecay, ScheduledDecay};
pub use stochopt_core::optimizer::Optimizer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports() {
        let _config = SgdConfig::<f64>::new();
        let _padam = PadamConfig::<f64>::new();
        let _momentum = MomentumUpdate::new(0.9_f64);
        let _decay = ScheduledDecay::<f64>::inverse_sqrt();
    }
}
