//! Direct least-squares ellipse fitting (Fitzgibbon et al., 1999).

use imageproc::point::Point;
use nalgebra::{DMatrix, Matrix3, Vector6};

use super::eigen::constrained_eigenvector;
use super::types::{DistanceEvaluator, Ellipse};
use super::ConicCoeffs;

/// Fewest points accepted by the direct fit (a conic has five degrees of
/// freedom).
pub const MIN_FIT_POINTS: usize = 5;

/// Fit a conic to a set of 2D points using the direct least-squares method
/// of Fitzgibbon et al. (1999).
///
/// The method solves a constrained eigenvalue problem enforcing the ellipse
/// constraint (B² − 4AC < 0) via the constraint matrix C₁.
///
/// Requires at least [`MIN_FIT_POINTS`] points. The fitted conic is validated
/// to represent a proper ellipse.
pub fn fit_conic_direct(points: &[[f64; 2]]) -> Option<ConicCoeffs> {
    let n = points.len();
    if n < MIN_FIT_POINTS {
        return None;
    }

    // Shift to centroid, scale so that mean distance from centroid ≈ √2.
    let (mean_x, mean_y, scale) = normalization_params(points);

    // Design matrix D = [x², xy, y², x, y, 1] in normalized coords
    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, &[px, py]) in points.iter().enumerate() {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }

    // Scatter matrix S = Dᵀ D, partitioned into 3x3 blocks
    let s = d.transpose() * &d;
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    // Ellipse constraint 4AC − B² = 1:  C1 = [[0, 0, 2], [0, -1, 0], [2, 0, 0]]
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    // (S11 − S12 S22⁻¹ S21) a1 = λ C1 a1
    let s22_inv = s22.try_inverse()?;
    let m = s11 - s12 * s22_inv * s12.transpose();
    let system = c1.try_inverse()? * m;

    let a1 = constrained_eigenvector(&system)?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let coeffs_norm = Vector6::new(a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]);
    let conic = ConicCoeffs(denormalize_conic(&coeffs_norm, mean_x, mean_y, scale));
    if !conic.is_ellipse() {
        return None;
    }

    let ellipse = conic.to_ellipse()?;
    if !ellipse.is_valid() {
        return None;
    }

    Some(conic)
}

/// Fit an ellipse and return geometric ellipse parameters.
pub fn fit_ellipse_direct(points: &[[f64; 2]]) -> Option<Ellipse> {
    fit_conic_direct(points)?.to_ellipse()
}

/// Fit an ellipse to integer pixel coordinates.
pub fn fit_ellipse_pixels(points: &[Point<i32>]) -> Option<Ellipse> {
    let pts: Vec<[f64; 2]> = points.iter().map(|p| [p.x as f64, p.y as f64]).collect();
    fit_ellipse_direct(&pts)
}

/// Mean squared point-to-boundary distance of `points` against `ellipse`.
///
/// Returns `f64::INFINITY` for an empty point set so that it never passes a
/// threshold test.
pub fn fit_variance(ellipse: &Ellipse, points: &[Point<i32>]) -> f64 {
    if points.is_empty() {
        return f64::INFINITY;
    }
    let eval = DistanceEvaluator::new(ellipse);
    let sum_sq: f64 = points
        .iter()
        .map(|p| {
            let d = eval.distance(p.x as f64, p.y as f64);
            d * d
        })
        .sum();
    sum_sq / points.len() as f64
}

/// Compute normalization parameters for a point set.
/// Returns (mean_x, mean_y, scale).
fn normalization_params(points: &[[f64; 2]]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = points
        .iter()
        .map(|p| ((p[0] - mean_x).powi(2) + (p[1] - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    (mean_x, mean_y, scale)
}

/// Map conic coefficients fitted in normalized coordinates
/// x' = s(x − mx), y' = s(y − my) back to the original frame.
fn denormalize_conic(c: &Vector6<f64>, mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a_, b_, c_, d_, e_, f_] = [c[0], c[1], c[2], c[3], c[4], c[5]];
    let s2 = s * s;

    let a = a_ * s2;
    let b = b_ * s2;
    let c = c_ * s2;
    let d = -2.0 * a_ * s2 * mx - b_ * s2 * my + d_ * s;
    let e = -b_ * s2 * mx - 2.0 * c_ * s2 * my + e_ * s;
    let f =
        a_ * s2 * mx * mx + b_ * s2 * mx * my + c_ * s2 * my * my - d_ * s * mx - e_ * s * my + f_;

    [a, b, c, d, e, f]
}
