use criterion::{Criterion, criterion_group, criterion_main};
use hello_optimization::grid::GridSamples;
use hello_optimization::problem;
use hello_optimization::{Constraint, fmin_slsqp};
use std::hint::black_box;

fn bench_demo_solve(c: &mut Criterion) {
    c.bench_function("demo_solve", |b| b.iter(|| black_box(problem::solve())));
}

fn bench_constrained_rosenbrock(c: &mut Criterion) {
    c.bench_function("constrained_rosenbrock", |b| {
        b.iter(|| {
            let constraints = vec![Constraint::Ineq(Box::new(|x: &[f64]| {
                2.0 - x[0] * x[0] - x[1] * x[1]
            }))];
            black_box(fmin_slsqp(
                |x: &[f64]| 100.0 * (x[1] - x[0].powi(2)).powi(2) + (1.0 - x[0]).powi(2),
                &[-1.2, 1.0],
                &[(-2.0, 2.0), (-2.0, 2.0)],
                constraints,
                100,
                1e-6,
                None,
            ))
        })
    });
}

fn bench_grid_sampling(c: &mut Criterion) {
    c.bench_function("grid_100x99", |b| b.iter(|| black_box(GridSamples::sample())));
}

criterion_group!(
    benches,
    bench_demo_solve,
    bench_constrained_rosenbrock,
    bench_grid_sampling
);
criterion_main!(benches);
