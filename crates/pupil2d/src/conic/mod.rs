//! Ellipse geometry and direct conic fitting.
//!
//! Implements:
//! - [`Ellipse`] value type with perimeter (Ramanujan II), area and signed
//!   point-to-boundary distance.
//! - Direct least-squares conic fit (Fitzgibbon et al., "Direct Least Square
//!   Fitting of Ellipses", 1999).
//! - Conversion between general conic coefficients and geometric parameters.

mod eigen;
mod fit;
mod types;

pub use fit::{
    fit_conic_direct, fit_ellipse_direct, fit_ellipse_pixels, fit_variance, MIN_FIT_POINTS,
};
pub use types::{ConicCoeffs, DistanceEvaluator, Ellipse};
