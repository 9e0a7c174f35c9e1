//! Decay policies: how the step size evolves during optimization.
//!
//! The driver asks its decay policy for the effective step size before every
//! update. The default [`NoDecay`] hands back the configured step size
//! unchanged; [`ScheduledDecay`] shrinks it along a fixed schedule.
//!
//! # Schedules
//!
//! With base step size α₀ and update count k:
//!
//! - **Exponential**: αₖ = α₀ · γᵏ where 0 < γ < 1
//! - **Polynomial**: αₖ = α₀ / (1 + βk)ᵖ
//! - **Inverse square root**: αₖ = α₀ / √(1 + k), the standard choice for
//!   stochastic optimization
//!
//! # Example
//!
//! ```rust
//! use stochopt_core::decay::{DecayPolicy, ScheduledDecay};
//! use stochopt_core::types::DVector;
//!
//! let mut decay = ScheduledDecay::inverse_sqrt();
//! let x = DVector::<f64>::zeros(2);
//! let g = DVector::<f64>::zeros(2);
//! assert_eq!(decay.step_size(1.0, 3, &x, &g), 0.5);
//! ```

use crate::types::{DVector, Scalar};
use num_traits::Float;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for step size decay strategies.
pub trait DecayPolicy<T: Scalar>: Debug {
    /// Prepares the policy for an iterate with `dimension` parameters.
    ///
    /// Called whenever the update policy is (re)initialized.
    fn initialize(&mut self, _dimension: usize) {}

    /// Returns the effective step size for the next update.
    ///
    /// # Arguments
    ///
    /// * `base` - The configured step size
    /// * `iteration` - Number of updates already applied in this run
    /// * `iterate` - The current iterate
    /// * `gradient` - The gradient about to be applied
    fn step_size(
        &mut self,
        base: T,
        iteration: usize,
        iterate: &DVector<T>,
        gradient: &DVector<T>,
    ) -> T;
}

/// Identity decay: the step size never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDecay;

impl<T: Scalar> DecayPolicy<T> for NoDecay {
    fn step_size(
        &mut self,
        base: T,
        _iteration: usize,
        _iterate: &DVector<T>,
        _gradient: &DVector<T>,
    ) -> T {
        base
    }
}

/// Deterministic step size schedules relative to the configured step size.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DecaySchedule<T: Scalar> {
    /// Exponential decay: αₖ = α₀ · γᵏ where 0 < γ < 1
    Exponential {
        /// Decay factor γ ∈ (0, 1), typically 0.9-0.99
        rate: T,
    },

    /// Polynomial decay: αₖ = α₀ / (1 + βk)ᵖ where β > 0, p > 0
    Polynomial {
        /// Decay coefficient β > 0, controls decay speed
        rate: T,
        /// Decay power p > 0, typically 0.5-1.0 for convergence
        power: T,
    },

    /// Inverse square root decay: αₖ = α₀ / √(1 + k)
    InverseSqrt,
}

impl<T: Scalar> DecaySchedule<T> {
    /// Computes αₖ for update `iteration` from the base step size α₀.
    pub fn apply(&self, base: T, iteration: usize) -> T {
        let k = <T as Scalar>::from_usize(iteration);

        match self {
            Self::Exponential { rate } => base * <T as Float>::powf(*rate, k),
            Self::Polynomial { rate, power } => {
                base / <T as Float>::powf(T::one() + *rate * k, *power)
            }
            Self::InverseSqrt => base / <T as Float>::sqrt(T::one() + k),
        }
    }
}

/// Decay policy following a [`DecaySchedule`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduledDecay<T: Scalar> {
    /// The schedule to follow
    pub schedule: DecaySchedule<T>,
}

impl<T: Scalar> ScheduledDecay<T> {
    /// Creates a decay policy from an explicit schedule.
    pub fn new(schedule: DecaySchedule<T>) -> Self {
        Self { schedule }
    }

    /// Creates an exponential decay policy αₖ = α₀ · γᵏ.
    pub fn exponential(rate: T) -> Self {
        Self::new(DecaySchedule::Exponential { rate })
    }

    /// Creates a polynomial decay policy αₖ = α₀ / (1 + βk)ᵖ.
    pub fn polynomial(rate: T, power: T) -> Self {
        Self::new(DecaySchedule::Polynomial { rate, power })
    }

    /// Creates an inverse square root decay policy αₖ = α₀ / √(1 + k).
    pub fn inverse_sqrt() -> Self {
        Self::new(DecaySchedule::InverseSqrt)
    }
}

impl<T: Scalar> DecayPolicy<T> for ScheduledDecay<T> {
    fn step_size(
        &mut self,
        base: T,
        iteration: usize,
        _iterate: &DVector<T>,
        _gradient: &DVector<T>,
    ) -> T {
        self.schedule.apply(base, iteration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zeros() -> DVector<f64> {
        DVector::zeros(2)
    }

    #[test]
    fn test_no_decay() {
        let mut decay = NoDecay;
        assert_eq!(decay.step_size(0.1, 0, &zeros(), &zeros()), 0.1);
        assert_eq!(decay.step_size(0.1, 100, &zeros(), &zeros()), 0.1);
        assert_eq!(decay.step_size(0.1, 1000, &zeros(), &zeros()), 0.1);
    }

    #[test]
    fn test_exponential_decay() {
        let mut decay = ScheduledDecay::exponential(0.9);
        let step0 = decay.step_size(1.0, 0, &zeros(), &zeros());
        let step1 = decay.step_size(1.0, 1, &zeros(), &zeros());
        let step10 = decay.step_size(1.0, 10, &zeros(), &zeros());

        assert!((step0 - 1.0).abs() < 1e-10);
        assert!((step1 - 0.9).abs() < 1e-10);
        assert!(step10 < step1);
        assert!(step10 < 0.5); // 0.9^10 ≈ 0.349
    }

    #[test]
    fn test_polynomial_decay() {
        let mut decay = ScheduledDecay::polynomial(0.1, 2.0);
        let step0 = decay.step_size(1.0, 0, &zeros(), &zeros());
        let step10 = decay.step_size(1.0, 10, &zeros(), &zeros());

        assert!((step0 - 1.0).abs() < 1e-10);
        // At k=10: 1.0 / (1 + 0.1*10)^2 = 1.0 / 4 = 0.25
        assert!((step10 - 0.25).abs() < 1e-10);
    }

    #[test]
    fn test_inverse_sqrt_decay() {
        let schedule = DecaySchedule::<f64>::InverseSqrt;
        assert!((schedule.apply(2.0, 0) - 2.0).abs() < 1e-10);
        // At k=3: 2.0 / sqrt(4) = 1.0
        assert!((schedule.apply(2.0, 3) - 1.0).abs() < 1e-10);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_schedule_serde_round_trip() {
        let decay = ScheduledDecay::polynomial(0.5_f64, 0.75);
        let json = serde_json::to_string(&decay).unwrap();
        let back: ScheduledDecay<f64> = serde_json::from_str(&json).unwrap();
        pretty_assertions::assert_eq!(decay, back);
    }

    proptest! {
        #[test]
        fn prop_no_decay_is_identity(base in 1e-8f64..10.0, iteration in 0usize..1_000_000) {
            let x = DVector::from_element(3, base);
            let mut decay = NoDecay;
            prop_assert_eq!(decay.step_size(base, iteration, &x, &x), base);
        }

        #[test]
        fn prop_schedules_never_increase(base in 1e-6f64..1.0, k in 0usize..10_000) {
            for schedule in [
                DecaySchedule::Exponential { rate: 0.95 },
                DecaySchedule::Polynomial { rate: 0.01, power: 0.75 },
                DecaySchedule::InverseSqrt,
            ] {
                prop_assert!(schedule.apply(base, k + 1) <= schedule.apply(base, k));
                prop_assert!(schedule.apply(base, k) <= base);
            }
        }
    }
}
