//! Benchmarks for the SGD driver and its update policies
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::DMatrix;
use stochopt_core::{
    decay::NoDecay,
    optimizer::Optimizer,
    test_functions::{LinearLeastSquares, SphereFunction},
    types::DVector,
};
use stochopt_optim::{MomentumUpdate, Padam, PadamConfig, Sgd, SgdConfig, VanillaUpdate};

fn least_squares(samples: usize, dim: usize) -> LinearLeastSquares<f64> {
    let a = DMatrix::from_fn(samples, dim, |i, j| (((i * 31 + j * 17) % 13) as f64 - 6.0) / 6.0);
    let solution = DVector::from_fn(dim, |j, _| j as f64 / dim as f64);
    LinearLeastSquares::with_solution(a, &solution).expect("consistent shapes")
}

fn benchmark_update_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_policies");

    for &dim in &[10, 100, 1000] {
        let f = SphereFunction::new(dim);
        let x0: DVector<f64> = DVector::from_element(dim, 1.0);
        let config = SgdConfig::new()
            .with_step_size(0.01)
            .with_batch_size(8)
            .with_max_iterations(10 * dim)
            .with_tolerance(-1.0);

        group.bench_with_input(BenchmarkId::new("vanilla", dim), &dim, |b, _| {
            b.iter(|| {
                let mut sgd = Sgd::new(config.clone(), VanillaUpdate::new(), NoDecay).with_seed(0);
                let mut x = x0.clone();
                sgd.optimize(black_box(&f), &mut x)
            });
        });

        group.bench_with_input(BenchmarkId::new("momentum", dim), &dim, |b, _| {
            b.iter(|| {
                let mut sgd =
                    Sgd::new(config.clone(), MomentumUpdate::new(0.9), NoDecay).with_seed(0);
                let mut x = x0.clone();
                sgd.optimize(black_box(&f), &mut x)
            });
        });

        group.bench_with_input(BenchmarkId::new("padam", dim), &dim, |b, _| {
            b.iter(|| {
                let mut padam = Padam::new(
                    PadamConfig::new()
                        .with_batch_size(8)
                        .with_max_iterations(10 * dim)
                        .with_tolerance(-1.0),
                )
                .with_seed(0);
                let mut x = x0.clone();
                padam.optimize(black_box(&f), &mut x)
            });
        });
    }

    group.finish();
}

fn benchmark_batch_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_sizes");
    let f = least_squares(2000, 20);

    for &batch in &[1, 32, 256] {
        group.bench_with_input(BenchmarkId::new("padam", batch), &batch, |b, &batch| {
            b.iter(|| {
                let mut padam = Padam::new(
                    PadamConfig::new()
                        .with_step_size(0.01)
                        .with_batch_size(batch)
                        .with_max_iterations(20_000)
                        .with_tolerance(-1.0),
                )
                .with_seed(0);
                let mut x = DVector::zeros(20);
                padam.optimize(black_box(&f), &mut x)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_update_policies, benchmark_batch_sizes);
criterion_main!(benches);
