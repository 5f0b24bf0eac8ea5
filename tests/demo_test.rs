use hello_optimization::grid::GridSamples;
use hello_optimization::plot::build_plot;
use hello_optimization::problem::{
    self, BOUNDS, disk_constraint, half_plane_constraint, objective,
};

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

#[test]
fn test_demo_converges() {
    let res = problem::solve();
    assert!(res.success, "{}", res.message);
    assert_eq!(res.status, 0);
    assert_eq!(res.message, "Optimization terminated successfully");
    assert!(res.nit > 0 && res.nit <= problem::MAX_ITER);
    assert!(res.nfev >= res.njev);
}

#[test]
fn test_demo_optimum_is_feasible() {
    let res = problem::solve();
    assert!(disk_constraint(&res.x) >= -1e-6);
    assert!(half_plane_constraint(&res.x) >= -1e-6);
    for (x, (lo, hi)) in res.x.iter().zip(BOUNDS) {
        assert!(*x >= lo && *x <= hi);
    }
    // the disk constraint is active, the half-plane is not
    assert!(disk_constraint(&res.x).abs() < 1e-6);
    assert!(half_plane_constraint(&res.x) > 1.0);
}

#[test]
fn test_demo_reported_value_matches_objective() {
    let res = problem::solve();
    let f = objective(&res.x);
    assert!((f - res.fun).abs() <= 1e-9 * f.abs().max(1.0));
    assert_eq!(res.jac.len(), 2);
}

#[test]
fn test_demo_optimum_location() {
    let res = problem::solve();
    assert!(distance(&res.x, &[0.86, 0.46]) < 0.05);
    assert!((res.x[0] - 0.861639).abs() < 1e-4);
    assert!((res.x[1] - 0.507521).abs() < 1e-4);
    assert!((res.fun - 0.298840).abs() < 1e-4);
}

#[test]
fn test_demo_from_infeasible_start() {
    let res = hello_optimization::minimize(
        objective,
        &[4.0, 4.0],
        &BOUNDS,
        problem::constraints(),
        &problem::options(),
    );
    assert!(res.success, "{}", res.message);
    assert!((res.x[0] - 0.861639).abs() < 1e-4);
    assert!((res.x[1] - 0.507521).abs() < 1e-4);
}

#[test]
fn test_demo_result_is_reproducible() {
    let a = problem::solve();
    let b = problem::solve();
    assert_eq!(a, b);
}

#[test]
fn test_grid_and_plot_for_demo() {
    let res = problem::solve();
    let grid = GridSamples::sample();
    assert_eq!(grid.shape(), (problem::GRID_ROWS, problem::GRID_COLS));
    assert!(grid.fun.iter().chain(&grid.con1).chain(&grid.con2).all(|v| v.is_finite()));
    // objective is non-negative everywhere
    assert!(grid.fun.iter().all(|&v| v >= 0.0));

    let json = build_plot(&grid, &res.x).to_json();
    assert!(json.contains("\"x*\""));
}
