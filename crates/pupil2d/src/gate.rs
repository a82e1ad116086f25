//! Geometric plausibility test shared by seeding and candidate selection.

use crate::conic::Ellipse;
use crate::detector::DetectionParameters;

/// Border, in pixels, kept free of pupil centers inside an ROI of the
/// given width.
///
/// A coarse pupil-width guess is a quarter of the ROI width; a quarter of
/// that is the padding.
pub(crate) fn center_padding(roi_width: u32) -> u32 {
    (roi_width / 2) / 2 / 4
}

/// Accepts ellipses whose center, roundness and size could belong to a
/// pupil inside one ROI.
#[derive(Debug, Clone, Copy)]
pub struct EllipseGate {
    /// Allowed center area `[x0, x1) × [y0, y1)` in ROI coordinates.
    center_min: [f64; 2],
    center_max: [f64; 2],
    min_roundness: f64,
    min_major: f64,
    max_major: f64,
}

impl EllipseGate {
    pub fn new(roi_width: u32, roi_height: u32, params: &DetectionParameters) -> Self {
        let pad = center_padding(roi_width) as f64;
        Self {
            center_min: [pad, pad],
            center_max: [roi_width as f64 - pad, roi_height as f64 - pad],
            min_roundness: params.ellipse_roundness_ratio as f64,
            min_major: params.pupil_size_min as f64,
            max_major: params.pupil_size_max as f64,
        }
    }

    /// Padding rectangle as `(x, y, w, h)` in ROI coordinates.
    pub fn center_area(&self) -> (f64, f64, f64, f64) {
        (
            self.center_min[0],
            self.center_min[1],
            self.center_max[0] - self.center_min[0],
            self.center_max[1] - self.center_min[1],
        )
    }

    pub fn accepts(&self, e: &Ellipse) -> bool {
        if !e.is_valid() {
            return false;
        }
        let center_inside = e.cx >= self.center_min[0]
            && e.cx < self.center_max[0]
            && e.cy >= self.center_min[1]
            && e.cy < self.center_max[1];
        let major = e.major_axis();
        center_inside
            && e.roundness() >= self.min_roundness
            && major >= self.min_major
            && major <= self.max_major
    }
}
