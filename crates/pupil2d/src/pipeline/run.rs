//! Per-frame orchestration: ROI → masks/edges → (warm start) → segments →
//! seeds → merge search → selection → refit.

use image::GrayImage;
use imageproc::rect::Rect;

use super::result::{DetectionOutcome, PupilDetection, Roi};
use crate::api::FrameInput;
use crate::conic::Ellipse;
use crate::contour::{decompose, nonzero_points};
use crate::debug_dump::{RefitDebug, StagesDebug, WarmStartDebug};
use crate::detector::{DetectionParameters, DetectorOptions, DetectorState};
use crate::gate::EllipseGate;
use crate::overlay::{self, Overlays, BLUE, GREEN, RED, ROYAL_BLUE, WHITE, YELLOW};
use crate::preprocess::{
    analyze_spikes, build_edge_maps, intensity_histogram, GLINT_OFFSET, SPIKE_WINDOW,
};
use crate::search::{merge_search, FitVarianceTest};
use crate::seed::{classify_segments, SeedStrength};
use crate::select::{refit_on_edges, select_candidate, warm_start_fit};

/// Region to process: the user ROI intersected with the pupil ROI, clipped
/// to the image. Falls back to the clipped user ROI when the intersection
/// is empty. `None` when nothing of the user ROI lies inside the image.
pub(crate) fn processing_roi(
    image_width: u32,
    image_height: u32,
    user_roi: Rect,
    pupil_roi: Rect,
) -> Option<Rect> {
    if image_width == 0 || image_height == 0 {
        return None;
    }
    let frame = Rect::at(0, 0).of_size(image_width, image_height);
    let user = user_roi.intersect(frame)?;
    Some(user.intersect(pupil_roi).unwrap_or(user))
}

fn crop(image: &GrayImage, roi: Rect) -> GrayImage {
    image::imageops::crop_imm(
        image,
        roi.left() as u32,
        roi.top() as u32,
        roi.width(),
        roi.height(),
    )
    .to_image()
}

/// Run one detection. `stages` is filled when a debug dump is requested.
pub(crate) fn run(
    input: &FrameInput<'_>,
    params: &DetectionParameters,
    options: &DetectorOptions,
    state: &mut DetectorState,
    mut overlays: Overlays<'_>,
    mut stages: Option<&mut StagesDebug>,
) -> PupilDetection {
    if let Some(surface) = overlays.debug.as_deref_mut() {
        overlay::clear(surface);
    }
    let (img_w, img_h) = input.image.dimensions();
    let Some(rect) = processing_roi(img_w, img_h, input.user_roi, input.pupil_roi) else {
        tracing::debug!("ROI lies outside the image");
        let roi = Roi {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        };
        return PupilDetection::failed(DetectionOutcome::NoSegments, input.timestamp, roi);
    };
    let roi = Roi::from(rect);
    let offset = (roi.x, roi.y);
    let (dx, dy) = (roi.x as f64, roi.y as f64);
    let to_frame = |e: &Ellipse| e.translated(dx, dy);
    let fail = |outcome| PupilDetection::failed(outcome, input.timestamp, roi);

    let roi_img = crop(input.image, rect);
    let hist = intensity_histogram(&roi_img);
    let spikes = analyze_spikes(&hist, SPIKE_WINDOW);
    let maps = build_edge_maps(&roi_img, &spikes, params);
    let gate = EllipseGate::new(roi.width, roi.height, params);
    if let Some(d) = stages.as_deref_mut() {
        d.spikes = Some(spikes);
    }

    if let Some(surface) = overlays.color.as_deref_mut() {
        overlay::draw_histogram(surface, &hist, &spikes, params.intensity_range, GLINT_OFFSET);
        overlay::tint_masks(surface, roi, &maps.edges, &maps.dark_mask, &maps.glint_mask);
        overlay::draw_dotted_rect(
            surface,
            roi.x,
            roi.y,
            roi.width as i32,
            roi.height as i32,
            WHITE,
        );
        let (px, py, pw, ph) = gate.center_area();
        overlay::draw_dotted_rect(
            surface,
            roi.x + px as i32,
            roi.y + py as i32,
            pw as i32,
            ph as i32,
            YELLOW,
        );
        overlay::draw_size_gauges(
            surface,
            params.pupil_size_min as f64,
            state.pupil_size,
            params.pupil_size_max as f64,
        );
    }

    if options.warm_start {
        if let Some(prior) = state.take_armed_prior() {
            let local_prior = prior.translated(-dx, -dy);
            let raw = nonzero_points(&maps.edges);
            let warm = warm_start_fit(&local_prior, &raw, params);
            if let Some(d) = stages.as_deref_mut() {
                d.raw_edge_count = raw.len();
                d.warm_start = Some(WarmStartDebug {
                    prior: local_prior,
                    accepted: warm.is_some(),
                });
            }
            if let Some((ellipse, support)) = warm {
                let frame_ellipse = to_frame(&ellipse);
                state.record_strong_prior(frame_ellipse);
                state.pupil_size = ellipse.major_axis();
                if let Some(surface) = overlays.color.as_deref_mut() {
                    overlay::draw_ellipse(surface, &frame_ellipse, GREEN);
                }
                tracing::debug!(support, "warm start accepted");
                return PupilDetection::found(
                    DetectionOutcome::WarmStart,
                    frame_ellipse,
                    support,
                    input.timestamp,
                    roi,
                );
            }
        }
    }

    let decomposition = decompose(&maps.edges, params.contour_size_min);
    let segments = &decomposition.segments;
    if let Some(d) = stages.as_deref_mut() {
        d.raw_edge_count = decomposition.raw_edges.len();
        d.traced_contours = decomposition.n_traced;
        d.long_contours = decomposition.n_long;
        d.segments = segments
            .iter()
            .map(|s| s.iter().map(|p| [p.x, p.y]).collect())
            .collect();
    }
    if let Some(surface) = overlays.debug.as_deref_mut() {
        overlay::draw_segments(surface, segments, offset);
    }
    if segments.is_empty() {
        tracing::debug!("no segments");
        return fail(DetectionOutcome::NoSegments);
    }

    let seeds = classify_segments(segments, &gate, params);
    let roots = seeds.search_roots();
    if let Some(surface) = overlays.debug.as_deref_mut() {
        for seed in &seeds.seeds {
            let (color, thickness) = match seed.strength {
                SeedStrength::Strong => (ROYAL_BLUE, 2),
                SeedStrength::Weak => (BLUE, 1),
            };
            overlay::draw_polyline(surface, &segments[seed.segment], offset, color, thickness);
            overlay::draw_ellipse(surface, &to_frame(&seed.ellipse), BLUE);
        }
    }
    if let Some(d) = stages.as_deref_mut() {
        d.seeds = seeds.seeds.clone();
        d.search_roots = roots.clone();
    }
    tracing::debug!(
        seeds = seeds.seeds.len(),
        strong = seeds.strong().count(),
        roots = roots.len(),
        "seeds classified"
    );
    if roots.is_empty() {
        return fail(DetectionOutcome::NoSeeds);
    }

    let mut test = FitVarianceTest::new(segments, params.initial_ellipse_fit_threshold as f64);
    let search = merge_search(segments.len(), &roots, &options.search, &mut test);
    let selection = select_candidate(
        &search.solutions,
        segments,
        &decomposition.raw_edges,
        &gate,
        params,
    );
    if let Some(surface) = overlays.debug.as_deref_mut() {
        for c in &selection.candidates {
            let color = if c.strong { GREEN } else { RED };
            overlay::draw_ellipse(surface, &to_frame(&c.ellipse), color);
        }
    }
    if let Some(d) = stages.as_deref_mut() {
        d.search = Some(search.stats);
        d.solutions = search.solutions.clone();
        d.candidates = selection.candidates.clone();
        d.winner = selection.winner;
    }

    let Some(winner) = selection.winner() else {
        tracing::debug!(candidates = selection.candidates.len(), "no accepted candidate");
        return fail(DetectionOutcome::NoCandidate);
    };
    if winner.strong {
        state.record_strong_prior(to_frame(&winner.ellipse));
    }

    let refit = refit_on_edges(winner, segments, &maps.edges, &gate);
    state.pupil_size = refit.ellipse.major_axis();
    if let Some(surface) = overlays.color.as_deref_mut() {
        overlay::mark_pixels_red(surface, &refit.pixels, offset);
        if refit.consistent {
            overlay::draw_ellipse(surface, &to_frame(&refit.ellipse), GREEN);
        }
    }
    if let Some(d) = stages.as_deref_mut() {
        d.refit = Some(RefitDebug {
            ellipse: refit.ellipse,
            pixel_count: refit.pixels.len(),
            consistent: refit.consistent,
        });
    }
    tracing::debug!(
        support = winner.support,
        strong = winner.strong,
        consistent = refit.consistent,
        pupil_size = state.pupil_size,
        "pupil detected"
    );

    PupilDetection::found(
        DetectionOutcome::Detected,
        to_frame(&refit.ellipse),
        winner.support,
        input.timestamp,
        roi,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roi_intersects_and_clips() {
        let user = Rect::at(-10, -10).of_size(100, 100);
        let pupil = Rect::at(50, 60).of_size(100, 100);
        let r = processing_roi(200, 200, user, pupil).expect("roi");
        assert_eq!((r.left(), r.top(), r.width(), r.height()), (50, 60, 40, 30));
    }

    #[test]
    fn disjoint_pupil_roi_falls_back_to_user_roi() {
        let user = Rect::at(10, 10).of_size(50, 40);
        let pupil = Rect::at(150, 150).of_size(20, 20);
        let r = processing_roi(200, 200, user, pupil).expect("roi");
        assert_eq!((r.left(), r.top(), r.width(), r.height()), (10, 10, 50, 40));
    }

    #[test]
    fn user_roi_outside_image_is_rejected() {
        let user = Rect::at(300, 300).of_size(10, 10);
        assert!(processing_roi(200, 200, user, user).is_none());
        assert!(processing_roi(0, 0, user, user).is_none());
    }
}
