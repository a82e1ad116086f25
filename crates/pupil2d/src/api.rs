//! High-level detection API.
//!
//! [`Detector`] is the entry point. It owns the cross-frame
//! [`DetectorState`]; one instance follows one camera stream.

use image::GrayImage;
use imageproc::rect::Rect;

use crate::debug_dump::{DebugDump, StagesDebug};
use crate::detector::{DetectionParameters, DetectorOptions, DetectorState};
use crate::overlay::Overlays;
use crate::pipeline::{self, PupilDetection};

/// One grayscale frame and the regions to search in it.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub image: &'a GrayImage,
    /// Copied verbatim into the result.
    pub timestamp: f64,
    /// Caller-chosen search area, frame coordinates.
    pub user_roi: Rect,
    /// Tighter area expected to contain the pupil, frame coordinates.
    pub pupil_roi: Rect,
}

impl<'a> FrameInput<'a> {
    /// Search the whole frame.
    pub fn full_frame(image: &'a GrayImage, timestamp: f64) -> Self {
        let rect = Rect::at(0, 0).of_size(image.width().max(1), image.height().max(1));
        Self::with_roi(image, timestamp, rect)
    }

    /// Search one region, used as both the user and the pupil ROI.
    pub fn with_roi(image: &'a GrayImage, timestamp: f64, roi: Rect) -> Self {
        Self {
            image,
            timestamp,
            user_roi: roi,
            pupil_roi: roi,
        }
    }
}

/// Pupil detector for one camera stream.
///
/// # Examples
///
/// ```no_run
/// use pupil2d::{DetectionParameters, Detector, FrameInput, Overlays};
/// use image::GrayImage;
///
/// let mut detector = Detector::new();
/// let params = DetectionParameters::default();
/// let frame = GrayImage::new(320, 240);
/// let result = detector.detect(&FrameInput::full_frame(&frame, 0.0), &params, Overlays::none());
/// println!("confidence {}", result.confidence);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Detector {
    options: DetectorOptions,
    state: DetectorState,
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DetectorOptions) -> Self {
        Self {
            options,
            state: DetectorState::default(),
        }
    }

    /// Resume from a previously persisted state.
    pub fn with_state(options: DetectorOptions, state: DetectorState) -> Self {
        Self { options, state }
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    /// Forget everything learned from previous frames.
    pub fn reset_state(&mut self) {
        self.state = DetectorState::default();
    }

    /// Detect the pupil in one frame.
    ///
    /// Never fails: frames without a usable pupil yield confidence 0 and an
    /// explanatory [`DetectionOutcome`](crate::DetectionOutcome).
    pub fn detect(
        &mut self,
        input: &FrameInput<'_>,
        params: &DetectionParameters,
        overlays: Overlays<'_>,
    ) -> PupilDetection {
        pipeline::run(input, params, &self.options, &mut self.state, overlays, None)
    }

    /// Like [`detect`](Self::detect), also returning every intermediate
    /// stage.
    pub fn detect_with_debug(
        &mut self,
        input: &FrameInput<'_>,
        params: &DetectionParameters,
        overlays: Overlays<'_>,
    ) -> (PupilDetection, DebugDump) {
        let mut stages = StagesDebug::default();
        let result = pipeline::run(
            input,
            params,
            &self.options,
            &mut self.state,
            overlays,
            Some(&mut stages),
        );
        let dump = DebugDump::new(
            input.image.dimensions(),
            params,
            &self.options.search,
            stages,
            result.clone(),
        );
        (result, dump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::Ellipse;
    use crate::pipeline::DetectionOutcome;
    use crate::overlay::WHITE;
    use crate::test_utils::{draw_eye_image, standard_eye};
    use approx::assert_relative_eq;
    use image::{Luma, Rgb, RgbImage};

    fn pupil() -> Ellipse {
        Ellipse::new(120.0, 110.0, 30.0, 22.0, 0.3)
    }

    fn detect_once(detector: &mut Detector, img: &GrayImage) -> PupilDetection {
        detector.detect(
            &FrameInput::full_frame(img, 1.5),
            &DetectionParameters::default(),
            Overlays::none(),
        )
    }

    fn assert_close(found: &Ellipse, truth: &Ellipse) {
        assert_relative_eq!(found.cx, truth.cx, epsilon = 1.0);
        assert_relative_eq!(found.cy, truth.cy, epsilon = 1.0);
        assert_relative_eq!(found.a, truth.a, epsilon = 1.5);
        assert_relative_eq!(found.b, truth.b, epsilon = 1.5);
    }

    #[test]
    fn detects_clean_synthetic_pupil() {
        let truth = pupil();
        let img = standard_eye(&truth);
        let mut detector = Detector::new();
        let result = detect_once(&mut detector, &img);

        assert_eq!(result.outcome, DetectionOutcome::Detected);
        assert_eq!(result.timestamp, 1.5);
        let params = DetectionParameters::default();
        assert!(result.confidence >= params.strong_perimeter_ratio_range[0] as f64);
        assert!(result.confidence <= 1.0);
        let found = result.ellipse.expect("ellipse");
        assert_relative_eq!(found.cx, truth.cx, epsilon = 0.02 * truth.a);
        assert_relative_eq!(found.cy, truth.cy, epsilon = 0.02 * truth.a);
        assert_relative_eq!(found.a, truth.a, epsilon = 0.02 * truth.a);
        assert_relative_eq!(found.b, truth.b, epsilon = 0.02 * truth.b);
        assert_relative_eq!(detector.state().pupil_size, found.major_axis(), epsilon = 1e-9);
    }

    #[test]
    fn uniform_frame_has_zero_confidence() {
        let img = GrayImage::from_pixel(120, 100, Luma([128]));
        let mut detector = Detector::new();
        let result = detect_once(&mut detector, &img);
        assert_eq!(result.confidence, 0.0);
        assert!(result.ellipse.is_none());
        assert_eq!(result.outcome, DetectionOutcome::NoSegments);
        assert_eq!(detector.state(), &DetectorState::default());
    }

    #[test]
    fn oversized_pupil_yields_no_seeds() {
        let img = standard_eye(&Ellipse::new(120.0, 120.0, 70.0, 60.0, 0.0));
        let mut detector = Detector::new();
        let result = detect_once(&mut detector, &img);
        assert_eq!(result.outcome, DetectionOutcome::NoSeeds);
        assert_eq!(result.confidence, 0.0);
        assert!(result.ellipse.is_none());
        assert_eq!(detector.state(), &DetectorState::default());
    }

    #[test]
    fn strict_support_threshold_yields_no_candidate() {
        let img = standard_eye(&pupil());
        let params = DetectionParameters {
            final_perimeter_ratio_range: [5.0, 6.0],
            ..Default::default()
        };
        let mut detector = Detector::new();
        let result = detector.detect(&FrameInput::full_frame(&img, 0.0), &params, Overlays::none());
        assert_eq!(result.outcome, DetectionOutcome::NoCandidate);
        assert_eq!(result.confidence, 0.0);
        assert!(result.ellipse.is_none());
        assert_eq!(detector.state(), &DetectorState::default());
    }

    #[test]
    fn empty_image_degrades_gracefully() {
        let img = GrayImage::new(0, 0);
        let result = detect_once(&mut Detector::new(), &img);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.roi.area(), 0);
    }

    #[test]
    fn detection_is_deterministic() {
        let img = standard_eye(&pupil());
        let a = detect_once(&mut Detector::new(), &img);
        let b = detect_once(&mut Detector::new(), &img);
        assert_eq!(a, b);
    }

    #[test]
    fn result_is_reported_in_frame_coordinates() {
        let truth = Ellipse::new(150.0, 130.0, 26.0, 20.0, -0.2);
        let img = draw_eye_image(240, 240, &truth, Some((20, 200, 8)));
        let roi = Rect::at(60, 40).of_size(170, 170);
        let result = Detector::new().detect(
            &FrameInput::with_roi(&img, 0.0, roi),
            &DetectionParameters::default(),
            Overlays::none(),
        );
        assert_eq!((result.roi.x, result.roi.y), (60, 40));
        assert_eq!((result.roi.width, result.roi.height), (170, 170));
        assert_close(&result.ellipse.expect("ellipse"), &truth);
    }

    #[test]
    fn warm_start_reuses_supported_prior() {
        let truth = pupil();
        let img = standard_eye(&truth);
        let options = DetectorOptions {
            warm_start: true,
            ..Default::default()
        };
        let state = DetectorState {
            pupil_size: truth.major_axis(),
            prior_ellipse: Some(truth.translated(0.4, -0.3)),
            use_strong_prior: true,
        };
        let mut detector = Detector::with_state(options.clone(), state.clone());
        let result = detect_once(&mut detector, &img);
        assert_eq!(result.outcome, DetectionOutcome::WarmStart);
        assert!(result.confidence >= 0.8);
        assert_close(&result.ellipse.expect("ellipse"), &truth);
        assert!(detector.state().use_strong_prior);

        // A prior that no longer matches falls through to the full pipeline
        let stale = DetectorState {
            prior_ellipse: Some(truth.translated(25.0, 0.0)),
            ..state.clone()
        };
        let mut detector = Detector::with_state(options, stale);
        let result = detect_once(&mut detector, &img);
        assert_eq!(result.outcome, DetectionOutcome::Detected);

        // Disabled warm start ignores an armed prior
        let mut detector = Detector::with_state(DetectorOptions::default(), state);
        let result = detect_once(&mut detector, &img);
        assert_eq!(result.outcome, DetectionOutcome::Detected);
    }

    #[test]
    fn overlays_receive_drawings() {
        let img = standard_eye(&pupil());
        let mut color = RgbImage::new(240, 240);
        let mut debug = RgbImage::new(240, 240);
        let overlays = Overlays {
            color: Some(&mut color),
            debug: Some(&mut debug),
        };
        let result = Detector::new().detect(
            &FrameInput::full_frame(&img, 0.0),
            &DetectionParameters::default(),
            overlays,
        );
        assert!(result.confidence > 0.0);
        assert!(color.pixels().any(|p| p.0[1] == 255));
        assert!(debug.pixels().any(|p| p.0 != [0, 0, 0]));
    }

    #[test]
    fn overlays_frame_the_processed_roi_on_a_cleared_debug_surface() {
        let img = standard_eye(&pupil());
        let input = FrameInput {
            image: &img,
            timestamp: 0.0,
            user_roi: Rect::at(0, 0).of_size(240, 240),
            pupil_roi: Rect::at(20, 30).of_size(180, 180),
        };
        let mut color = RgbImage::new(240, 240);
        let mut debug = RgbImage::from_pixel(240, 240, Rgb([7, 7, 7]));
        let overlays = Overlays {
            color: Some(&mut color),
            debug: Some(&mut debug),
        };
        let result = Detector::new().detect(&input, &DetectionParameters::default(), overlays);
        assert_eq!((result.roi.x, result.roi.y), (20, 30));
        assert_eq!(color.get_pixel(20, 30).0, WHITE);
        assert_eq!(color.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(debug.get_pixel(0, 0).0, [0, 0, 0]);
        assert!(debug.pixels().all(|p| p.0 != [7, 7, 7]));
    }

    #[test]
    fn debug_dump_records_stages() {
        let img = standard_eye(&pupil());
        let mut detector = Detector::new();
        let (result, dump) = detector.detect_with_debug(
            &FrameInput::full_frame(&img, 0.0),
            &DetectionParameters::default(),
            Overlays::none(),
        );
        assert_eq!(dump.schema_version, crate::debug_dump::DEBUG_SCHEMA_V1);
        assert_eq!(dump.result, result);
        assert!(!dump.stages.segments.is_empty());
        assert!(!dump.stages.seeds.is_empty());
        assert!(dump.stages.winner.is_some());
        assert!(dump.stages.refit.is_some());
        let json = serde_json::to_string(&dump).expect("serialize");
        assert!(json.contains("\"schema_version\":\"pupil2d.debug.v1\""));
    }
}
