//! Separable test objectives.
//!
//! Standard problems used by the test suites and benchmarks of the optimizer
//! crates. Enabled by the `test-utils` feature.

use crate::{
    error::{OptimizerError, Result},
    function::{check_indices, SeparableFunction},
    types::{DVector, Scalar},
};
use nalgebra::DMatrix;
use num_traits::Float;

/// f(x) = Σᵢ xᵢ², with one separable term per coordinate.
///
/// The unique minimizer is the origin with value zero.
#[derive(Debug, Clone)]
pub struct SphereFunction {
    dimension: usize,
}

impl SphereFunction {
    /// Creates the sphere function in `dimension` variables.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Number of variables.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl<T: Scalar> SeparableFunction<T> for SphereFunction {
    fn num_functions(&self) -> usize {
        self.dimension
    }

    fn evaluate(&self, iterate: &DVector<T>, indices: &[usize]) -> Result<T> {
        check_indices(indices, self.dimension)?;
        check_len(iterate, self.dimension)?;
        Ok(indices
            .iter()
            .fold(T::zero(), |acc, &i| acc + iterate[i] * iterate[i]))
    }

    fn gradient(
        &self,
        iterate: &DVector<T>,
        indices: &[usize],
        gradient: &mut DVector<T>,
    ) -> Result<()> {
        check_indices(indices, self.dimension)?;
        check_len(iterate, self.dimension)?;
        let two = <T as Scalar>::from_f64(2.0);
        gradient.fill(T::zero());
        for &i in indices {
            gradient[i] += two * iterate[i];
        }
        Ok(())
    }

    /// Alternating start `[1, -1, 2, -2, 3, -3, ...]`.
    fn initial_point(&self) -> Option<DVector<T>> {
        Some(DVector::from_fn(self.dimension, |i, _| {
            let magnitude = <T as Scalar>::from_usize(i / 2 + 1);
            if i % 2 == 0 {
                magnitude
            } else {
                -magnitude
            }
        }))
    }
}

/// Three-term separable function in three variables:
///
/// - f₀(x) = −exp(−|x₀|)
/// - f₁(x) = x₁²
/// - f₂(x) = x₂⁴ + 3x₂²
///
/// The minimum is −1 at the origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SgdTestFunction;

impl SgdTestFunction {
    /// Creates the function.
    pub fn new() -> Self {
        Self
    }

    fn term<T: Scalar>(x: &DVector<T>, i: usize) -> T {
        match i {
            0 => -<T as Float>::exp(-<T as Float>::abs(x[0])),
            1 => x[1] * x[1],
            _ => {
                let sq = x[2] * x[2];
                sq * sq + <T as Scalar>::from_f64(3.0) * sq
            }
        }
    }
}

impl<T: Scalar> SeparableFunction<T> for SgdTestFunction {
    fn num_functions(&self) -> usize {
        3
    }

    fn evaluate(&self, iterate: &DVector<T>, indices: &[usize]) -> Result<T> {
        check_indices(indices, 3)?;
        check_len(iterate, 3)?;
        Ok(indices
            .iter()
            .fold(T::zero(), |acc, &i| acc + Self::term(iterate, i)))
    }

    fn gradient(
        &self,
        iterate: &DVector<T>,
        indices: &[usize],
        gradient: &mut DVector<T>,
    ) -> Result<()> {
        check_indices(indices, 3)?;
        check_len(iterate, 3)?;
        gradient.fill(T::zero());
        for &i in indices {
            match i {
                0 => {
                    let x = iterate[0];
                    let magnitude = <T as Float>::exp(-<T as Float>::abs(x));
                    // Subgradient zero at the kink.
                    if x > T::zero() {
                        gradient[0] += magnitude;
                    } else if x < T::zero() {
                        gradient[0] -= magnitude;
                    }
                }
                1 => gradient[1] += <T as Scalar>::from_f64(2.0) * iterate[1],
                _ => {
                    let x = iterate[2];
                    gradient[2] += <T as Scalar>::from_f64(4.0) * x * x * x
                        + <T as Scalar>::from_f64(6.0) * x;
                }
            }
        }
        Ok(())
    }

    fn initial_point(&self) -> Option<DVector<T>> {
        Some(DVector::from_vec(vec![
            <T as Scalar>::from_f64(6.0),
            <T as Scalar>::from_f64(-45.6),
            <T as Scalar>::from_f64(6.2),
        ]))
    }
}

/// Least squares over samples: fᵢ(x) = ½ (aᵢᵀx − bᵢ)², one term per row of A.
#[derive(Debug, Clone)]
pub struct LinearLeastSquares<T: Scalar> {
    /// Sample matrix, one sample per row
    pub a: DMatrix<T>,
    /// Targets, one per sample
    pub b: DVector<T>,
}

impl<T: Scalar> LinearLeastSquares<T> {
    /// Creates the problem, checking that A and b agree on the sample count.
    pub fn new(a: DMatrix<T>, b: DVector<T>) -> Result<Self> {
        if a.nrows() != b.len() {
            return Err(OptimizerError::dimension_mismatch(a.nrows(), b.len()));
        }
        Ok(Self { a, b })
    }

    /// Builds a consistent problem whose exact solution is `solution`.
    pub fn with_solution(a: DMatrix<T>, solution: &DVector<T>) -> Result<Self> {
        if a.ncols() != solution.len() {
            return Err(OptimizerError::dimension_mismatch(a.ncols(), solution.len()));
        }
        let b = &a * solution;
        Ok(Self { a, b })
    }

    fn residual(&self, iterate: &DVector<T>, i: usize) -> T {
        self.a.row(i).transpose().dot(iterate) - self.b[i]
    }
}

impl<T: Scalar> SeparableFunction<T> for LinearLeastSquares<T> {
    fn num_functions(&self) -> usize {
        self.a.nrows()
    }

    fn evaluate(&self, iterate: &DVector<T>, indices: &[usize]) -> Result<T> {
        check_indices(indices, self.a.nrows())?;
        check_len(iterate, self.a.ncols())?;
        let half = <T as Scalar>::from_f64(0.5);
        Ok(indices.iter().fold(T::zero(), |acc, &i| {
            let r = self.residual(iterate, i);
            acc + half * r * r
        }))
    }

    fn gradient(
        &self,
        iterate: &DVector<T>,
        indices: &[usize],
        gradient: &mut DVector<T>,
    ) -> Result<()> {
        check_indices(indices, self.a.nrows())?;
        check_len(iterate, self.a.ncols())?;
        gradient.fill(T::zero());
        for &i in indices {
            let r = self.residual(iterate, i);
            gradient.axpy(r, &self.a.row(i).transpose(), T::one());
        }
        Ok(())
    }

    fn initial_point(&self) -> Option<DVector<T>> {
        Some(DVector::zeros(self.a.ncols()))
    }
}

fn check_len<T: Scalar>(iterate: &DVector<T>, expected: usize) -> Result<()> {
    if iterate.len() != expected {
        return Err(OptimizerError::dimension_mismatch(expected, iterate.len()));
    }
    Ok(())
}
