//! Separable objective functions.
//!
//! A separable function is a sum of `n` independent terms,
//! f(x) = Σᵢ fᵢ(x), as in empirical risk minimization where each term is the
//! loss on one sample. Stochastic optimizers only ever touch a subset of the
//! terms at a time, so every operation here takes the indices of the terms to
//! include.
//!
//! # Design
//!
//! - Index subsets are passed as slices so the driver can hand out batches of
//!   a shuffled permutation without copying the underlying data.
//! - Gradients are written into a caller-owned buffer and are accumulated
//!   (summed) over the requested terms.
//! - Contiguous range helpers mirror the classical `(begin, batch_size)`
//!   calling convention.

use crate::{
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
};
use num_traits::Float;
use std::cell::RefCell;
use std::fmt::Debug;

/// Trait for objective functions made of separable terms.
///
/// Implementors must provide the number of terms, batch evaluation and batch
/// gradient. The remaining methods have default implementations built on top
/// of those three.
pub trait SeparableFunction<T: Scalar>: Debug {
    /// Number of separable terms `n`.
    fn num_functions(&self) -> usize;

    /// Evaluates the sum of the terms listed in `indices` at `iterate`.
    fn evaluate(&self, iterate: &DVector<T>, indices: &[usize]) -> Result<T>;

    /// Computes the gradient of the sum of the terms listed in `indices`.
    ///
    /// The result overwrites `gradient`, which has the iterate's length.
    fn gradient(
        &self,
        iterate: &DVector<T>,
        indices: &[usize],
        gradient: &mut DVector<T>,
    ) -> Result<()>;

    /// Evaluates the terms and their gradient in one call.
    ///
    /// # Default Implementation
    ///
    /// Calls `evaluate` then `gradient`. Override when both share work.
    fn evaluate_with_gradient(
        &self,
        iterate: &DVector<T>,
        indices: &[usize],
        gradient: &mut DVector<T>,
    ) -> Result<T> {
        let value = self.evaluate(iterate, indices)?;
        self.gradient(iterate, indices, gradient)?;
        Ok(value)
    }

    /// Evaluates `count` consecutive terms starting at `begin`.
    fn evaluate_range(&self, iterate: &DVector<T>, begin: usize, count: usize) -> Result<T> {
        let indices = range_indices(begin, count, self.num_functions())?;
        self.evaluate(iterate, &indices)
    }

    /// Computes the gradient of `count` consecutive terms starting at `begin`.
    fn gradient_range(
        &self,
        iterate: &DVector<T>,
        begin: usize,
        count: usize,
        gradient: &mut DVector<T>,
    ) -> Result<()> {
        let indices = range_indices(begin, count, self.num_functions())?;
        self.gradient(iterate, &indices, gradient)
    }

    /// Evaluates the full objective over all `n` terms.
    fn evaluate_all(&self, iterate: &DVector<T>) -> Result<T> {
        self.evaluate_range(iterate, 0, self.num_functions())
    }

    /// Returns a suggested starting point, if the function has one.
    ///
    /// Only test harnesses use this; the optimizers never call it.
    fn initial_point(&self) -> Option<DVector<T>> {
        None
    }
}

/// Builds the index list `begin..begin + count`, checking it against `len`.
pub fn range_indices(begin: usize, count: usize, len: usize) -> Result<Vec<usize>> {
    let end = begin.saturating_add(count);
    if end > len {
        return Err(OptimizerError::index_out_of_range(end - 1, len));
    }
    Ok((begin..end).collect())
}

/// Checks that every index in `indices` is smaller than `len`.
///
/// Implementors of [`SeparableFunction`] can call this before touching data.
pub fn check_indices(indices: &[usize], len: usize) -> Result<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(OptimizerError::index_out_of_range(index, len)),
        None => Ok(()),
    }
}

/// Wrapper to count function evaluations for testing and debugging.
#[derive(Debug)]
pub struct CountingFunction<F> {
    /// The underlying separable function
    pub inner: F,
    /// Number of evaluate calls
    pub evaluate_count: RefCell<usize>,
    /// Number of gradient calls
    pub gradient_count: RefCell<usize>,
    /// Number of terms touched by gradient calls
    pub terms_visited: RefCell<usize>,
    /// Index batches seen by gradient calls, in order
    pub batches: RefCell<Vec<Vec<usize>>>,
}

impl<F> CountingFunction<F> {
    /// Creates a new counting wrapper around a separable function.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            evaluate_count: RefCell::new(0),
            gradient_count: RefCell::new(0),
            terms_visited: RefCell::new(0),
            batches: RefCell::new(Vec::new()),
        }
    }

    /// Resets all counters to zero and forgets recorded batches.
    pub fn reset_counts(&self) {
        *self.evaluate_count.borrow_mut() = 0;
        *self.gradient_count.borrow_mut() = 0;
        *self.terms_visited.borrow_mut() = 0;
        self.batches.borrow_mut().clear();
    }

    /// Returns the `(evaluate, gradient)` call counts.
    pub fn counts(&self) -> (usize, usize) {
        (*self.evaluate_count.borrow(), *self.gradient_count.borrow())
    }

    /// Returns a copy of the recorded gradient batches.
    pub fn recorded_batches(&self) -> Vec<Vec<usize>> {
        self.batches.borrow().clone()
    }
}

impl<T, F> SeparableFunction<T> for CountingFunction<F>
where
    T: Scalar,
    F: SeparableFunction<T>,
{
    fn num_functions(&self) -> usize {
        self.inner.num_functions()
    }

    fn evaluate(&self, iterate: &DVector<T>, indices: &[usize]) -> Result<T> {
        *self.evaluate_count.borrow_mut() += 1;
        self.inner.evaluate(iterate, indices)
    }

    fn gradient(
        &self,
        iterate: &DVector<T>,
        indices: &[usize],
        gradient: &mut DVector<T>,
    ) -> Result<()> {
        *self.gradient_count.borrow_mut() += 1;
        *self.terms_visited.borrow_mut() += indices.len();
        self.batches.borrow_mut().push(indices.to_vec());
        self.inner.gradient(iterate, indices, gradient)
    }

    fn initial_point(&self) -> Option<DVector<T>> {
        self.inner.initial_point()
    }
}

/// Utilities for checking gradient implementations.
pub struct DerivativeChecker;

impl DerivativeChecker {
    /// Checks a batch gradient against central finite differences.
    ///
    /// # Returns
    ///
    /// A tuple of (passes, max_error) where passes indicates if the
    /// gradient is correct within tolerance, and max_error is the
    /// maximum component-wise error.
    pub fn check_gradient<T, F>(
        function: &F,
        iterate: &DVector<T>,
        indices: &[usize],
        tol: T,
    ) -> Result<(bool, T)>
    where
        T: Scalar,
        F: SeparableFunction<T> + ?Sized,
    {
        let mut analytical = DVector::zeros(iterate.len());
        function.gradient(iterate, indices, &mut analytical)?;

        let h = <T as Float>::sqrt(T::EPSILON);
        let mut max_error = T::zero();

        for i in 0..iterate.len() {
            let mut plus = iterate.clone();
            let mut minus = iterate.clone();
            plus[i] += h;
            minus[i] -= h;

            let f_plus = function.evaluate(&plus, indices)?;
            let f_minus = function.evaluate(&minus, indices)?;
            let fd = (f_plus - f_minus) / (h + h);

            max_error = <T as Float>::max(max_error, <T as Float>::abs(analytical[i] - fd));
        }

        Ok((max_error < tol, max_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// f(x) = Σᵢ wᵢ xᵢ², one term per coordinate.
    #[derive(Debug)]
    struct WeightedSquares {
        weights: Vec<f64>,
    }

    impl SeparableFunction<f64> for WeightedSquares {
        fn num_functions(&self) -> usize {
            self.weights.len()
        }

        fn evaluate(&self, x: &DVector<f64>, indices: &[usize]) -> Result<f64> {
            check_indices(indices, self.weights.len())?;
            Ok(indices.iter().map(|&i| self.weights[i] * x[i] * x[i]).sum())
        }

        fn gradient(
            &self,
            x: &DVector<f64>,
            indices: &[usize],
            gradient: &mut DVector<f64>,
        ) -> Result<()> {
            check_indices(indices, self.weights.len())?;
            gradient.fill(0.0);
            for &i in indices {
                gradient[i] += 2.0 * self.weights[i] * x[i];
            }
            Ok(())
        }
    }

    fn weighted() -> WeightedSquares {
        WeightedSquares {
            weights: vec![1.0, 2.0, 3.0],
        }
    }

    #[test]
    fn test_range_helpers() {
        let f = weighted();
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0]);

        assert_relative_eq!(f.evaluate_range(&x, 0, 2).unwrap(), 3.0);
        assert_relative_eq!(f.evaluate_range(&x, 1, 2).unwrap(), 5.0);
        assert_relative_eq!(f.evaluate_all(&x).unwrap(), 6.0);

        let mut g = DVector::zeros(3);
        f.gradient_range(&x, 2, 1, &mut g).unwrap();
        assert_relative_eq!(g, DVector::from_vec(vec![0.0, 0.0, 6.0]));
    }

    #[test]
    fn test_range_out_of_bounds() {
        let f = weighted();
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0]);

        let err = f.evaluate_range(&x, 2, 2).unwrap_err();
        assert_eq!(err, OptimizerError::index_out_of_range(3, 3));

        assert!(range_indices(0, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_check_indices() {
        assert!(check_indices(&[0, 2, 1], 3).is_ok());
        assert!(matches!(
            check_indices(&[0, 5], 3),
            Err(OptimizerError::IndexOutOfRange { index: 5, len: 3 })
        ));
    }

    #[test]
    fn test_evaluate_with_gradient_default() {
        let f = weighted();
        let x = DVector::from_vec(vec![1.0, -1.0, 2.0]);
        let mut g = DVector::zeros(3);

        let value = f.evaluate_with_gradient(&x, &[0, 2], &mut g).unwrap();
        assert_relative_eq!(value, 13.0);
        assert_relative_eq!(g, DVector::from_vec(vec![2.0, 0.0, 12.0]));
    }

    #[test]
    fn test_counting_function() {
        let f = CountingFunction::new(weighted());
        let x = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        let mut g = DVector::zeros(3);

        assert_eq!(f.counts(), (0, 0));

        f.evaluate(&x, &[0]).unwrap();
        assert_eq!(f.counts(), (1, 0));

        f.evaluate_with_gradient(&x, &[1, 2], &mut g).unwrap();
        assert_eq!(f.counts(), (2, 1));
        assert_eq!(*f.terms_visited.borrow(), 2);
        assert_eq!(f.recorded_batches(), vec![vec![1, 2]]);

        f.reset_counts();
        assert_eq!(f.counts(), (0, 0));
        assert!(f.recorded_batches().is_empty());
    }

    #[test]
    fn test_derivative_checker() {
        let f = weighted();
        let x = DVector::from_vec(vec![0.5, -1.5, 2.0]);

        let (passes, error) = DerivativeChecker::check_gradient(&f, &x, &[0, 1, 2], 1e-6).unwrap();
        assert!(passes);
        assert!(error < 1e-6);
    }
}
