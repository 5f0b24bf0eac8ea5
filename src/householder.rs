use crate::Mat;
use crate::blas::{axpy, dot, norm2};

/// Solves the least squares problem `min |A[:, columns] z - b|` by Householder QR.
///
/// Returns `None` when a column is numerically dependent on the columns
/// before it, using the test of Lawson & Hanson: the new diagonal element
/// must still change the norm of the part of the column already
/// triangularized.
///
/// The number of columns must not exceed the number of rows.
pub fn householder_solve(a: &Mat, columns: &[usize], b: &[f64]) -> Option<Vec<f64>> {
    let m = a.rows();
    let p = columns.len();
    debug_assert!(p <= m);

    let mut r: Vec<Vec<f64>> = columns.iter().map(|&j| a.col(j).to_vec()).collect();
    let mut rhs = b.to_vec();
    let mut v = vec![0.0; m];

    for k in 0..p {
        let below = norm2(&r[k][k..]);
        let above = norm2(&r[k][..k]);
        if (above + 0.01 * below) - above <= 0.0 {
            return None;
        }

        // reflector mapping r[k][k..] onto alpha * e_k
        let alpha = if r[k][k] > 0.0 { -below } else { below };
        v[k] = r[k][k] - alpha;
        v[k + 1..].copy_from_slice(&r[k][k + 1..]);
        let vtv = dot(&v[k..], &v[k..]);

        for col in r.iter_mut().skip(k) {
            let s = 2.0 * dot(&v[k..], &col[k..]) / vtv;
            axpy(-s, &v[k..], &mut col[k..]);
        }
        let s = 2.0 * dot(&v[k..], &rhs[k..]) / vtv;
        axpy(-s, &v[k..], &mut rhs[k..]);
    }

    let mut z = vec![0.0; p];
    for k in (0..p).rev() {
        let tail: f64 = (k + 1..p).map(|j| r[j][k] * z[j]).sum();
        z[k] = (rhs[k] - tail) / r[k][k];
    }
    Some(z)
}
