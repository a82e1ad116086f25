//! Candidate scoring by true edge support, and the final refit.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::morphology::{grayscale_dilate, Mask};
use imageproc::point::Point;

use crate::conic::{fit_ellipse_pixels, DistanceEvaluator, Ellipse, MIN_FIT_POINTS};
use crate::contour::nonzero_points;
use crate::detector::DetectionParameters;
use crate::gate::EllipseGate;
use crate::preprocess::pixelwise_min;
use crate::search::SegmentSet;

/// Edge pixels closer than this to an ellipse boundary support it (px).
pub const SUPPORT_TOLERANCE: f64 = 1.3;

/// Refit ellipses changing the major axis by more than this fraction are
/// flagged as inconsistent.
pub const MAX_REFIT_SIZE_CHANGE: f64 = 0.3;

/// Edge pixels within [`SUPPORT_TOLERANCE`] of the boundary of `ellipse`.
pub fn support_pixels(ellipse: &Ellipse, raw_edges: &[Point<i32>]) -> Vec<Point<i32>> {
    let eval = DistanceEvaluator::new(ellipse);
    raw_edges
        .iter()
        .copied()
        .filter(|p| eval.distance(p.x as f64, p.y as f64) <= SUPPORT_TOLERANCE)
        .collect()
}

/// Supporting edge pixel count divided by the ellipse perimeter.
pub fn support_ratio(ellipse: &Ellipse, raw_edges: &[Point<i32>]) -> f64 {
    let perimeter = ellipse.perimeter();
    if !(perimeter > 0.0) {
        return 0.0;
    }
    let eval = DistanceEvaluator::new(ellipse);
    let count = raw_edges
        .iter()
        .filter(|p| eval.distance(p.x as f64, p.y as f64) <= SUPPORT_TOLERANCE)
        .count();
    count as f64 / perimeter
}

/// One maximal merge, fitted and scored.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Candidate {
    pub segments: SegmentSet,
    /// Fit in ROI coordinates.
    pub ellipse: Ellipse,
    /// True support ratio against the raw edge pixels.
    pub support: f64,
    /// Passed the final support threshold and the plausibility gate.
    pub accepted: bool,
    /// Support reaches the strong perimeter threshold.
    pub strong: bool,
}

/// Scored candidates and the index of the selected one.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub candidates: Vec<Candidate>,
    pub winner: Option<usize>,
}

impl Selection {
    pub fn winner(&self) -> Option<&Candidate> {
        self.winner.map(|i| &self.candidates[i])
    }
}

pub(crate) fn concat_segments(set: &SegmentSet, segments: &[Vec<Point<i32>>]) -> Vec<Point<i32>> {
    let mut points = Vec::new();
    for i in set.iter() {
        points.extend_from_slice(&segments[i]);
    }
    points
}

/// Fit and score each solution in order. The last accepted one wins.
pub fn select_candidate(
    solutions: &[SegmentSet],
    segments: &[Vec<Point<i32>>],
    raw_edges: &[Point<i32>],
    gate: &EllipseGate,
    params: &DetectionParameters,
) -> Selection {
    let final_min = params.final_perimeter_ratio_range[0] as f64;
    let strong_min = params.strong_perimeter_ratio_range[0] as f64;

    let mut selection = Selection::default();
    for set in solutions {
        let points = concat_segments(set, segments);
        let Some(ellipse) = fit_ellipse_pixels(&points) else {
            tracing::trace!(segments = ?set, "candidate fit failed");
            continue;
        };
        let support = support_ratio(&ellipse, raw_edges);
        let accepted = support >= final_min && gate.accepts(&ellipse);
        let strong = accepted && support >= strong_min;
        tracing::trace!(segments = ?set, support, accepted, strong, "candidate");
        if accepted {
            selection.winner = Some(selection.candidates.len());
        }
        selection.candidates.push(Candidate {
            segments: set.clone(),
            ellipse,
            support,
            accepted,
            strong,
        });
    }
    selection
}

/// Result of refitting on raw edge pixels.
#[derive(Debug, Clone)]
pub struct Refit {
    /// Refit ellipse, or the candidate when the refit was impossible.
    pub ellipse: Ellipse,
    /// Edge pixels inside the corridor around the winning segments.
    pub pixels: Vec<Point<i32>>,
    /// Plausible and within [`MAX_REFIT_SIZE_CHANGE`] of the candidate.
    pub consistent: bool,
}

/// Mask of the segments' polylines, about three pixels wide.
pub(crate) fn corridor_mask(
    width: u32,
    height: u32,
    set: &SegmentSet,
    segments: &[Vec<Point<i32>>],
) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for seg in set.iter().map(|i| &segments[i]) {
        if let [only] = seg.as_slice() {
            if only.x >= 0 && only.y >= 0 && (only.x as u32) < width && (only.y as u32) < height {
                mask.put_pixel(only.x as u32, only.y as u32, Luma([255]));
            }
        }
        for w in seg.windows(2) {
            draw_line_segment_mut(
                &mut mask,
                (w[0].x as f32, w[0].y as f32),
                (w[1].x as f32, w[1].y as f32),
                Luma([255]),
            );
        }
    }
    grayscale_dilate(&mask, &Mask::disk(1))
}

/// Refit the winner on the edge pixels lying along its segments.
pub fn refit_on_edges(
    candidate: &Candidate,
    segments: &[Vec<Point<i32>>],
    edges: &GrayImage,
    gate: &EllipseGate,
) -> Refit {
    let corridor = corridor_mask(edges.width(), edges.height(), &candidate.segments, segments);
    let pixels = nonzero_points(&pixelwise_min(&[edges, &corridor]));

    let refit = if pixels.len() >= MIN_FIT_POINTS {
        fit_ellipse_pixels(&pixels)
    } else {
        None
    };
    let Some(ellipse) = refit else {
        tracing::debug!(pixels = pixels.len(), "refit failed, keeping candidate");
        return Refit {
            ellipse: candidate.ellipse,
            pixels,
            consistent: false,
        };
    };

    let size_change = (1.0 - candidate.ellipse.major_axis() / ellipse.major_axis()).abs();
    let consistent = gate.accepts(&ellipse) && size_change < MAX_REFIT_SIZE_CHANGE;
    Refit {
        ellipse,
        pixels,
        consistent,
    }
}

/// Warm-start check of a prior ellipse (ROI coordinates) against the new
/// frame's edges.
///
/// Returns the ellipse refit on its supporting pixels together with the
/// prior's support ratio, or `None` when the support is below the strong
/// perimeter threshold.
pub fn warm_start_fit(
    prior: &Ellipse,
    raw_edges: &[Point<i32>],
    params: &DetectionParameters,
) -> Option<(Ellipse, f64)> {
    if raw_edges.is_empty() {
        return None;
    }
    let perimeter = prior.perimeter();
    if !(perimeter > 0.0) {
        return None;
    }
    let pixels = support_pixels(prior, raw_edges);
    let support = pixels.len() as f64 / perimeter;
    if support < params.strong_perimeter_ratio_range[0] as f64 {
        tracing::debug!(support, "warm start rejected");
        return None;
    }
    let refit = fit_ellipse_pixels(&pixels)?;
    Some((refit, support))
}
