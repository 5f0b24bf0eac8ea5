//! NNLS checked against its optimality conditions on a deterministic batch of
//! pseudo-random problems:
//!
//! x >= 0, w = A'(b - A x) <= 0, and w_j = 0 wherever x_j > 0.

use hello_optimization::Mat;
use hello_optimization::nnls::nnls;

/// Small linear congruential generator, uniform in [-1, 1)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

fn check_kkt(a: &Mat, b: &[f64], x: &[f64], tol: f64) -> Result<(), String> {
    let (m, n) = (a.rows(), a.cols());
    let mut r = b.to_vec();
    for j in 0..n {
        for i in 0..m {
            r[i] -= a[(i, j)] * x[j];
        }
    }
    for j in 0..n {
        if x[j] < 0.0 {
            return Err(format!("x[{j}] = {} is negative", x[j]));
        }
        let w: f64 = (0..m).map(|i| a[(i, j)] * r[i]).sum();
        if w > tol {
            return Err(format!("dual w[{j}] = {w} is positive"));
        }
        if x[j] > 0.0 && w.abs() > tol {
            return Err(format!("x[{j}] > 0 but dual w[{j}] = {w}"));
        }
    }
    Ok(())
}

#[test]
fn test_nnls_kkt_random_problems() {
    let mut rng = Lcg(42);
    let mut failures = Vec::new();

    for case in 0..200 {
        let m = 3 + case % 6;
        let n = 1 + case % m;
        let mut a = Mat::new(m, n);
        for j in 0..n {
            for i in 0..m {
                a[(i, j)] = rng.next();
            }
        }
        let b: Vec<f64> = (0..m).map(|_| 3.0 * rng.next()).collect();

        match nnls(&a, &b) {
            Ok(sol) => {
                if let Err(msg) = check_kkt(&a, &b, &sol.x, 1e-8) {
                    failures.push(format!("case {case} ({m}x{n}): {msg}"));
                }
                let r_norm: f64 = sol.residual.iter().map(|v| v * v).sum::<f64>().sqrt();
                assert!((r_norm - sol.rnorm).abs() < 1e-10);
            }
            Err(err) => failures.push(format!("case {case} ({m}x{n}): {err}")),
        }
    }

    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_nnls_nonnegative_target_is_fit_exactly() {
    // b in the cone spanned by the columns: residual vanishes
    let mut rng = Lcg(7);
    for _ in 0..20 {
        let mut a = Mat::new(5, 3);
        for j in 0..3 {
            for i in 0..5 {
                a[(i, j)] = rng.next();
            }
        }
        let x_true = [0.5 + rng.next().abs(), 0.0, 1.0 + rng.next().abs()];
        let b: Vec<f64> = (0..5)
            .map(|i| (0..3).map(|j| a[(i, j)] * x_true[j]).sum())
            .collect();

        let sol = nnls(&a, &b).unwrap();
        assert!(sol.rnorm < 1e-8, "rnorm = {}", sol.rnorm);
        for (x, t) in sol.x.iter().zip(x_true) {
            assert!((x - t).abs() < 1e-6);
        }
    }
}
