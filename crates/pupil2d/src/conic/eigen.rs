//! 3×3 eigen-solve for the ellipse-constrained conic fit.

use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

/// Eigenvector of the reduced scatter system `C1⁻¹ M` that satisfies the
/// ellipse constraint `4·a0·a2 − a1² > 0`.
///
/// `C1⁻¹ M` is not symmetric, so eigenvalues come from the characteristic
/// cubic and eigenvectors from the adjugate of `(A − λI)`. With exact data
/// (five or more points on one ellipse) the wanted eigenvalue is zero; with
/// noise it is the constrained one of smallest magnitude.
pub(crate) fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let trace = a.trace();
    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    // λ³ − tr·λ² + minor_sum·λ − det = 0
    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in real_cubic_roots(-trace, minor_sum, -det) {
        let Some(v) = null_vector(&(system - Matrix3::identity() * ev)) else {
            continue;
        };
        let constraint = 4.0 * v[0] * v[2] - v[1] * v[1];
        if constraint <= 0.0 {
            continue;
        }
        match best {
            Some((best_ev, _)) if best_ev <= ev.abs() => {}
            _ => best = Some((ev.abs(), v)),
        }
    }
    best.map(|(_, v)| v)
}

/// Unit null vector of a rank-2 3×3 matrix: the adjugate row of largest norm.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]),
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]),
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]),
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]),
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];

    let best = rows
        .iter()
        .max_by(|p, q| p.norm_squared().total_cmp(&q.norm_squared()))?;
    let norm_sq = best.norm_squared();
    if !(norm_sq >= 1e-30) {
        return None;
    }
    Some(best / norm_sq.sqrt())
}

/// Real roots of the monic cubic x³ + b x² + c x + d = 0 (one or three).
fn real_cubic_roots(b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depressed cubic t³ + pt + q = 0 with x = t − b/3
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    let disc = -4.0 * p * p * p - 27.0 * q * q;
    if disc >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        (0..3)
            .map(|k| 2.0 * r * ((theta + 2.0 * PI * k as f64) / 3.0).cos() + shift)
            .collect()
    } else {
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v + shift]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cubic_roots_of_known_polynomial() {
        // (x − 1)(x − 2)(x − 3) = x³ − 6x² + 11x − 6
        let mut roots = real_cubic_roots(-6.0, 11.0, -6.0);
        roots.sort_by(f64::total_cmp);
        assert_eq!(roots.len(), 3);
        assert_relative_eq!(roots[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(roots[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(roots[2], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn cubic_with_single_real_root() {
        // x³ + x + 2 = (x + 1)(x² − x + 2)
        let roots = real_cubic_roots(0.0, 1.0, 2.0);
        assert_eq!(roots.len(), 1);
        assert_relative_eq!(roots[0], -1.0, epsilon = 1e-9);
    }

    #[test]
    fn null_vector_of_singular_matrix() {
        let m = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0);
        let v = null_vector(&m).expect("rank-2 matrix has a null vector");
        assert_relative_eq!(v[2].abs(), 1.0, epsilon = 1e-12);
    }
}
