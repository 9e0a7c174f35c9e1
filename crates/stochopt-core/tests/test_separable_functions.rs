//! Integration tests for the separable function contract and its helpers

use approx::assert_relative_eq;
use proptest::prelude::*;
use stochopt_core::prelude::*;
use stochopt_core::function::{check_indices, range_indices};

/// Logistic loss over fixed samples: fᵢ(w) = ln(1 + exp(−yᵢ aᵢᵀw)).
#[derive(Debug)]
struct Logistic {
    samples: Vec<(DVector<f64>, f64)>,
}

impl Logistic {
    fn new(n: usize, dim: usize) -> Self {
        let samples = (0..n)
            .map(|i| {
                let a = DVector::from_fn(dim, |j, _| ((i * 7 + j * 3) % 5) as f64 - 2.0);
                let y = if i % 2 == 0 { 1.0 } else { -1.0 };
                (a, y)
            })
            .collect();
        Self { samples }
    }
}

impl SeparableFunction<f64> for Logistic {
    fn num_functions(&self) -> usize {
        self.samples.len()
    }

    fn evaluate(&self, w: &DVector<f64>, indices: &[usize]) -> Result<f64> {
        check_indices(indices, self.samples.len())?;
        Ok(indices
            .iter()
            .map(|&i| {
                let (a, y) = &self.samples[i];
                (-y * a.dot(w)).exp().ln_1p()
            })
            .sum())
    }

    fn gradient(
        &self,
        w: &DVector<f64>,
        indices: &[usize],
        gradient: &mut DVector<f64>,
    ) -> Result<()> {
        check_indices(indices, self.samples.len())?;
        gradient.fill(0.0);
        for &i in indices {
            let (a, y) = &self.samples[i];
            let margin = y * a.dot(w);
            let weight = -y / (1.0 + margin.exp());
            gradient.axpy(weight, a, 1.0);
        }
        Ok(())
    }

    fn evaluate_with_gradient(
        &self,
        w: &DVector<f64>,
        indices: &[usize],
        gradient: &mut DVector<f64>,
    ) -> Result<f64> {
        self.gradient(w, indices, gradient)?;
        self.evaluate(w, indices)
    }
}

#[test]
fn test_logistic_gradient_matches_finite_differences() {
    let f = Logistic::new(12, 4);
    let w = DVector::from_vec(vec![0.3, -0.2, 0.1, 0.05]);

    let all: Vec<usize> = (0..12).collect();
    let (passes, error) = DerivativeChecker::check_gradient(&f, &w, &all, 1e-4).unwrap();
    assert!(passes, "max error {}", error);

    let (passes, _) = DerivativeChecker::check_gradient(&f, &w, &[3, 7], 1e-4).unwrap();
    assert!(passes);
}

#[test]
fn test_counting_wrapper_splits_combined_call() {
    let f = CountingFunction::new(Logistic::new(4, 2));
    let w = DVector::zeros(2);
    let mut g = DVector::zeros(2);

    let value = f.evaluate_with_gradient(&w, &[0, 1], &mut g).unwrap();

    // The wrapper counts both halves of the combined call.
    assert_relative_eq!(value, 2.0 * 2.0_f64.ln(), epsilon = 1e-12);
    assert_eq!(f.counts(), (1, 1));
}

#[test]
fn test_range_helpers_match_index_lists() {
    let f = Logistic::new(9, 3);
    let w = DVector::from_vec(vec![0.1, 0.2, -0.3]);

    let by_range = f.evaluate_range(&w, 2, 4).unwrap();
    let by_index = f.evaluate(&w, &[2, 3, 4, 5]).unwrap();
    assert_relative_eq!(by_range, by_index);

    let mut g_range = DVector::zeros(3);
    let mut g_index = DVector::zeros(3);
    f.gradient_range(&w, 2, 4, &mut g_range).unwrap();
    f.gradient(&w, &[2, 3, 4, 5], &mut g_index).unwrap();
    assert_relative_eq!(g_range, g_index);

    assert!(matches!(
        f.evaluate_range(&w, 8, 2),
        Err(OptimizerError::IndexOutOfRange { index: 9, len: 9 })
    ));
    assert_eq!(range_indices(3, 2, 9).unwrap(), vec![3, 4]);
}

proptest! {
    #[test]
    fn prop_objective_is_additive_over_partitions(
        n in 1usize..30,
        split in 0usize..30,
        w0 in -1.0f64..1.0,
    ) {
        let split = split.min(n);
        let f = Logistic::new(n, 3);
        let w = DVector::from_element(3, w0);

        let left: Vec<usize> = (0..split).collect();
        let right: Vec<usize> = (split..n).collect();
        let total = f.evaluate_all(&w).unwrap();
        let parts = f.evaluate(&w, &left).unwrap() + f.evaluate(&w, &right).unwrap();
        prop_assert!((total - parts).abs() <= 1e-10 * total.abs().max(1.0));

        let mut g_all = DVector::zeros(3);
        let mut g_left = DVector::zeros(3);
        let mut g_right = DVector::zeros(3);
        f.gradient_range(&w, 0, n, &mut g_all).unwrap();
        f.gradient(&w, &left, &mut g_left).unwrap();
        f.gradient(&w, &right, &mut g_right).unwrap();
        prop_assert!((g_all - (g_left + g_right)).norm() <= 1e-10);
    }
}
