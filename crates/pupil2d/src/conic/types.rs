//! Ellipse value type and conic conversions.

use nalgebra::{Matrix2, SymmetricEigen, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// General conic: A x² + B xy + C y² + D x + E y + F = 0
/// Stored as [A, B, C, D, E, F].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicCoeffs(pub [f64; 6]);

/// Geometric ellipse parameters.
///
/// Plain value type: every pipeline stage builds a new ellipse from a fit
/// instead of adjusting an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ellipse {
    /// Center x.
    pub cx: f64,
    /// Center y.
    pub cy: f64,
    /// Semi-major axis length.
    pub a: f64,
    /// Semi-minor axis length.
    pub b: f64,
    /// Rotation angle of the major axis from +x, in radians (−π/2, π/2].
    pub angle: f64,
}

impl ConicCoeffs {
    /// Algebraic distance of a point (x, y) to this conic.
    pub fn algebraic_distance(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f] = self.0;
        a * x * x + b * x * y + c * y * y + d * x + e * y + f
    }

    /// Check whether the conic represents an ellipse (discriminant B²−4AC < 0).
    pub fn is_ellipse(&self) -> bool {
        let [a, b, c, ..] = self.0;
        b * b - 4.0 * a * c < 0.0
    }

    /// Convert to geometric ellipse parameters.
    /// Returns `None` if the conic is not an ellipse.
    pub fn to_ellipse(self) -> Option<Ellipse> {
        conic_to_ellipse(&self)
    }
}

impl Ellipse {
    /// Build an ellipse, canonicalizing so that `a >= b` and the angle lies
    /// in (−π/2, π/2]. Negative radii are taken by magnitude.
    pub fn new(cx: f64, cy: f64, a: f64, b: f64, angle: f64) -> Self {
        let (a, b) = (a.abs(), b.abs());
        let (a, b, angle) = if a >= b {
            (a, b, angle)
        } else {
            (b, a, angle + FRAC_PI_2)
        };
        Self {
            cx,
            cy,
            a,
            b,
            angle: normalize_angle(angle),
        }
    }

    /// Circle of the given radius.
    pub fn circle(cx: f64, cy: f64, r: f64) -> Self {
        Self::new(cx, cy, r, r, 0.0)
    }

    /// Check basic validity: positive semi-axes, finite values.
    pub fn is_valid(&self) -> bool {
        self.a > 0.0
            && self.b > 0.0
            && self.a.is_finite()
            && self.b.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.angle.is_finite()
    }

    /// Full major axis length (2a).
    pub fn major_axis(&self) -> f64 {
        2.0 * self.a.max(self.b)
    }

    /// Full minor axis length (2b).
    pub fn minor_axis(&self) -> f64 {
        2.0 * self.a.min(self.b)
    }

    /// Minor / major axis ratio in [0, 1]; 0 for a degenerate ellipse.
    pub fn roundness(&self) -> f64 {
        let major = self.a.max(self.b);
        if major <= 0.0 {
            return 0.0;
        }
        self.a.min(self.b) / major
    }

    /// Perimeter via Ramanujan's second approximation.
    ///
    /// Exact for circles and strictly increasing in both semi-axes.
    pub fn perimeter(&self) -> f64 {
        let (a, b) = (self.a.abs(), self.b.abs());
        let sum = a + b;
        if sum <= 0.0 {
            return 0.0;
        }
        let h = ((a - b) / sum).powi(2);
        PI * sum * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
    }

    /// Enclosed area, π·a·b.
    pub fn area(&self) -> f64 {
        PI * self.a.abs() * self.b.abs()
    }

    /// Same ellipse with its center shifted by (dx, dy).
    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            ..*self
        }
    }

    /// Convert back to conic coefficients.
    pub fn to_conic(self) -> ConicCoeffs {
        ellipse_to_conic(&self)
    }

    /// Sample `n` points on the ellipse boundary.
    pub fn sample_points(&self, n: usize) -> Vec<[f64; 2]> {
        let cos_a = self.angle.cos();
        let sin_a = self.angle.sin();
        (0..n)
            .map(|i| {
                let t = 2.0 * PI * (i as f64) / (n as f64);
                let px = self.a * t.cos();
                let py = self.b * t.sin();
                let x = self.cx + cos_a * px - sin_a * py;
                let y = self.cy + sin_a * px + cos_a * py;
                [x, y]
            })
            .collect()
    }

    /// Signed first-order geometric distance from a point to the boundary
    /// (Sampson distance): negative inside, positive outside.
    pub fn signed_distance(&self, x: f64, y: f64) -> f64 {
        DistanceEvaluator::new(self).signed_distance(x, y)
    }

    /// Unsigned distance from a point to the boundary.
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        self.signed_distance(x, y).abs()
    }
}

/// Precomputed conic of an ellipse for repeated distance queries over many
/// points (edge support, fit variance).
#[derive(Debug, Clone, Copy)]
pub struct DistanceEvaluator {
    conic: ConicCoeffs,
}

impl DistanceEvaluator {
    pub fn new(ellipse: &Ellipse) -> Self {
        Self {
            conic: ellipse.to_conic(),
        }
    }

    /// Algebraic value divided by the gradient norm.
    #[inline]
    pub fn signed_distance(&self, x: f64, y: f64) -> f64 {
        let [ca, cb, cc, cd, ce, _cf] = self.conic.0;
        let alg = self.conic.algebraic_distance(x, y);
        let gx = 2.0 * ca * x + cb * y + cd;
        let gy = cb * x + 2.0 * cc * y + ce;
        let grad_mag_sq = gx * gx + gy * gy;
        if grad_mag_sq < 1e-30 {
            return alg;
        }
        alg / grad_mag_sq.sqrt()
    }

    #[inline]
    pub fn distance(&self, x: f64, y: f64) -> f64 {
        self.signed_distance(x, y).abs()
    }
}

// ── Conversion: conic ↔ ellipse ────────────────────────────────────────────

/// Geometric parameters of the conic A x² + B xy + C y² + D x + E y + F = 0.
///
/// The center solves `∇ = 0`; the axes come from the eigen decomposition of
/// the quadratic part, the smaller eigenvalue giving the major axis.
/// `None` for hyperbolas, parabolas and empty or degenerate ellipses.
pub fn conic_to_ellipse(c: &ConicCoeffs) -> Option<Ellipse> {
    if !c.is_ellipse() {
        return None;
    }
    let [a, b, cc, d, e, _] = c.0;
    let q = Matrix2::new(a, 0.5 * b, 0.5 * b, cc);
    let center = (2.0 * q).try_inverse()? * Vector2::new(-d, -e);
    let at_center = c.algebraic_distance(center.x, center.y);
    if !(at_center.abs() > 1e-15) {
        return None;
    }

    let eig = SymmetricEigen::new(q);
    let (major, minor) = if eig.eigenvalues[0] <= eig.eigenvalues[1] {
        (0, 1)
    } else {
        (1, 0)
    };
    let a_sq = -at_center / eig.eigenvalues[major];
    let b_sq = -at_center / eig.eigenvalues[minor];
    if !(a_sq > 0.0 && b_sq > 0.0) {
        return None;
    }
    let axis = eig.eigenvectors.column(major);
    Some(Ellipse::new(
        center.x,
        center.y,
        a_sq.sqrt(),
        b_sq.sqrt(),
        axis[1].atan2(axis[0]),
    ))
}

/// Convert geometric ellipse parameters to general conic coefficients,
/// scaled so that the conic evaluates to −1 at the center.
pub fn ellipse_to_conic(e: &Ellipse) -> ConicCoeffs {
    let cos_a = e.angle.cos();
    let sin_a = e.angle.sin();
    let a2 = (e.a * e.a).max(1e-300);
    let b2 = (e.b * e.b).max(1e-300);

    let ca = cos_a * cos_a / a2 + sin_a * sin_a / b2;
    let cb = 2.0 * cos_a * sin_a * (1.0 / a2 - 1.0 / b2);
    let cc = sin_a * sin_a / a2 + cos_a * cos_a / b2;
    let cd = -2.0 * ca * e.cx - cb * e.cy;
    let ce = -cb * e.cx - 2.0 * cc * e.cy;
    let cf = ca * e.cx * e.cx + cb * e.cx * e.cy + cc * e.cy * e.cy - 1.0;

    ConicCoeffs([ca, cb, cc, cd, ce, cf])
}

/// Normalize angle to (−π/2, π/2].
fn normalize_angle(mut angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    while angle > FRAC_PI_2 {
        angle -= PI;
    }
    while angle <= -FRAC_PI_2 {
        angle += PI;
    }
    angle
}
