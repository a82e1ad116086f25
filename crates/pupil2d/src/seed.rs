//! Single-segment ellipse seeds.
//!
//! A segment becomes a seed when its own ellipse fit is plausible and tight.
//! Seeds whose hull area and arc length cover most of the fitted ellipse are
//! strong; the merge search starts from strong seeds when there are any.

use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point;

use crate::conic::{fit_ellipse_pixels, fit_variance, Ellipse, MIN_FIT_POINTS};
use crate::detector::DetectionParameters;
use crate::gate::EllipseGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrength {
    Strong,
    Weak,
}

/// Measurements of one accepted seed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Seed {
    /// Index into the segment list.
    pub segment: usize,
    pub ellipse: Ellipse,
    /// Mean squared point-to-boundary distance.
    pub variance: f64,
    /// Convex-hull area / ellipse area.
    pub area_ratio: f64,
    /// Open arc length / ellipse perimeter.
    pub perimeter_ratio: f64,
    pub strength: SeedStrength,
}

/// All seeds of one frame, in segment order.
#[derive(Debug, Clone, Default)]
pub struct SeedSet {
    pub seeds: Vec<Seed>,
}

impl SeedSet {
    pub fn strong(&self) -> impl Iterator<Item = usize> + '_ {
        self.with_strength(SeedStrength::Strong)
    }

    pub fn weak(&self) -> impl Iterator<Item = usize> + '_ {
        self.with_strength(SeedStrength::Weak)
    }

    fn with_strength(&self, strength: SeedStrength) -> impl Iterator<Item = usize> + '_ {
        self.seeds
            .iter()
            .filter(move |s| s.strength == strength)
            .map(|s| s.segment)
    }

    /// Segment indices the search starts from: strong seeds if any, else
    /// weak seeds. Empty when there are no seeds at all.
    pub fn search_roots(&self) -> Vec<usize> {
        let strong: Vec<usize> = self.strong().collect();
        if !strong.is_empty() {
            return strong;
        }
        self.weak().collect()
    }
}

/// Shoelace area of a closed polygon.
pub(crate) fn polygon_area(poly: &[Point<i32>]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut twice = 0i64;
    for (i, p) in poly.iter().enumerate() {
        let q = poly[(i + 1) % poly.len()];
        twice += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    twice.abs() as f64 * 0.5
}

/// `(area_ratio, perimeter_ratio)` of a segment against its ellipse.
pub(crate) fn support_ratios(ellipse: &Ellipse, segment: &[Point<i32>]) -> (f64, f64) {
    let hull = convex_hull(segment);
    let area = ellipse.area();
    let perimeter = ellipse.perimeter();
    if area <= 0.0 || perimeter <= 0.0 {
        return (0.0, 0.0);
    }
    (
        polygon_area(&hull) / area,
        arc_length(segment, false) / perimeter,
    )
}

fn in_range(v: f64, range: [f32; 2]) -> bool {
    range[0] as f64 <= v && v <= range[1] as f64
}

/// Fit, gate and grade every segment with enough points to fit.
pub fn classify_segments(
    segments: &[Vec<Point<i32>>],
    gate: &EllipseGate,
    params: &DetectionParameters,
) -> SeedSet {
    let threshold = params.initial_ellipse_fit_threshold as f64;
    let mut seeds = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        if segment.len() < MIN_FIT_POINTS {
            continue;
        }
        let Some(ellipse) = fit_ellipse_pixels(segment) else {
            continue;
        };
        if !gate.accepts(&ellipse) {
            continue;
        }
        let variance = fit_variance(&ellipse, segment);
        if !(variance < threshold) {
            continue;
        }
        let (area_ratio, perimeter_ratio) = support_ratios(&ellipse, segment);
        let strong = in_range(perimeter_ratio, params.strong_perimeter_ratio_range)
            && in_range(area_ratio, params.strong_area_ratio_range);
        let strength = if strong {
            SeedStrength::Strong
        } else {
            SeedStrength::Weak
        };
        tracing::trace!(
            segment = i,
            variance,
            area_ratio,
            perimeter_ratio,
            ?strength,
            "seed"
        );
        seeds.push(Seed {
            segment: i,
            ellipse,
            variance,
            area_ratio,
            perimeter_ratio,
            strength,
        });
    }
    SeedSet { seeds }
}
