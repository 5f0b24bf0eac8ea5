use crate::Mat;

/// Rank-one update of LDL' factors: `L D L' <- L D L' + sigma * z z'`.
///
/// `factors` holds `D` on its diagonal and the strictly lower part of the unit
/// lower triangular `L` below it; only the leading `order x order` block is
/// touched. `z` is overwritten. `work` is only used when `sigma < 0`.
///
/// Method of Fletcher & Powell (1974), "On the modification of LDL'
/// factorizations", Math. Comp. 28, 1067-1078. A negative update that would
/// lose positive definiteness is clipped so the factors stay definite.
pub fn ldl_update(factors: &mut Mat, order: usize, z: &mut [f64], sigma: f64, work: &mut [f64]) {
    const MACHINE_EPS: f64 = 2.22e-16;

    if sigma == 0.0 || order == 0 {
        return;
    }
    let downdate = sigma < 0.0;
    let mut t = 1.0 / sigma;

    if downdate {
        // Precompute the t sequence from the solution of L w = z.
        work[..order].copy_from_slice(&z[..order]);
        for i in 0..order {
            let w_i = work[i];
            t += w_i * w_i / factors[(i, i)];
            for j in i + 1..order {
                work[j] -= w_i * factors[(j, i)];
            }
        }
        if t >= 0.0 {
            t = MACHINE_EPS / sigma;
        }
        for j in (0..order).rev() {
            let w_j = work[j];
            work[j] = t;
            t -= w_j * w_j / factors[(j, j)];
        }
    }

    for i in 0..order {
        let z_i = z[i];
        let delta = z_i / factors[(i, i)];
        let t_next = if downdate { work[i] } else { t + delta * z_i };
        let ratio = t_next / t;
        factors[(i, i)] *= ratio;
        if i + 1 == order {
            break;
        }

        let beta = delta / t_next;
        if ratio <= 4.0 {
            for j in i + 1..order {
                z[j] -= z_i * factors[(j, i)];
                factors[(j, i)] += beta * z[j];
            }
        } else {
            let gamma = t / t_next;
            for j in i + 1..order {
                let l_ji = factors[(j, i)];
                factors[(j, i)] = gamma * l_ji + beta * z[j];
                z[j] -= z_i * l_ji;
            }
        }
        t = t_next;
    }
}

/// Multiplies out LDL' factors into the dense symmetric matrix they represent.
pub fn ldl_to_dense(factors: &Mat, order: usize) -> Mat {
    let unit_lower = |i: usize, k: usize| if i == k { 1.0 } else { factors[(i, k)] };
    let mut dense = Mat::new(order, order);
    for i in 0..order {
        for j in 0..order {
            dense[(i, j)] = (0..=i.min(j))
                .map(|k| unit_lower(i, k) * factors[(k, k)] * unit_lower(j, k))
                .sum();
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    // L = [1 0; 2 1], D = diag(3, 4), so L D L' = [3 6; 6 16]
    fn sample_factors() -> Mat {
        let mut factors = Mat::new(2, 2);
        factors[(0, 0)] = 3.0;
        factors[(1, 0)] = 2.0;
        factors[(1, 1)] = 4.0;
        factors
    }

    #[test]
    fn test_positive_update() {
        let mut factors = sample_factors();
        let mut z = [1.0, 2.0];
        let mut work = [0.0; 2];
        ldl_update(&mut factors, 2, &mut z, 1.0, &mut work);

        // [3 6; 6 16] + [1 2; 2 4] = [4 8; 8 20] = [1 0; 2 1] diag(4, 4) [1 2; 0 1]
        assert_eq!(factors[(0, 0)], 4.0);
        assert_eq!(factors[(1, 0)], 2.0);
        assert_eq!(factors[(1, 1)], 4.0);
    }

    #[test]
    fn test_negative_update_undoes_positive() {
        let mut factors = sample_factors();
        let mut work = [0.0; 2];
        ldl_update(&mut factors, 2, &mut [1.0, 2.0], 1.0, &mut work);
        ldl_update(&mut factors, 2, &mut [1.0, 2.0], -1.0, &mut work);

        assert!((factors[(0, 0)] - 3.0).abs() < 1e-12);
        assert!((factors[(1, 0)] - 2.0).abs() < 1e-12);
        assert!((factors[(1, 1)] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_matches_dense_product() {
        let mut factors = Mat::new(3, 3);
        factors.set_identity();
        let mut z = [1.0, -2.0, 0.5];
        let z_copy = z;
        let mut work = [0.0; 3];
        ldl_update(&mut factors, 3, &mut z, 0.5, &mut work);

        let dense = ldl_to_dense(&factors, 3);
        for i in 0..3 {
            for j in 0..3 {
                let identity = if i == j { 1.0 } else { 0.0 };
                let expected = identity + 0.5 * z_copy[i] * z_copy[j];
                assert!((dense[(i, j)] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_update_only_touches_leading_block() {
        let mut factors = Mat::new(3, 3);
        factors.set_identity();
        factors[(2, 2)] = 100.0;
        ldl_update(&mut factors, 2, &mut [1.0, 1.0, 9.0], 1.0, &mut [0.0; 3]);
        assert_eq!(factors[(2, 2)], 100.0);
        assert_eq!(factors[(2, 0)], 0.0);
    }
}
