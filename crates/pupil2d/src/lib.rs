//! pupil2d: 2-D pupil ellipse detector for eye-tracking camera frames.
//!
//! One call processes one grayscale frame and returns an ellipse estimate
//! with a confidence in `[0, 1]`. The pipeline stages are:
//!
//! 1. **Histogram** – dark (pupil) and bright (glint) intensity spikes.
//! 2. **Masks / edges** – Canny edges restricted to dark, non-glint pixels.
//! 3. **Contours** – traced, simplified and split at sharp turns.
//! 4. **Seeds** – segments whose own ellipse fit is plausible and tight.
//! 5. **Merge search** – depth-first union of segments with pruning of
//!    every superset of a failing union.
//! 6. **Selection** – candidates scored by raw edge support, winner refit on
//!    the edge pixels along its segments.
//!
//! # Public API
//! - [`Detector`] with [`FrameInput`] and [`DetectionParameters`]
//! - [`PupilDetection`] and [`DetectionOutcome`] for results
//! - [`Overlays`] / [`DrawingSurface`] for optional visualization
//! - stage functions (`preprocess`, `contour`, `seed`, `search`, `select`)
//!   for tooling and benchmarks

mod api;
pub mod conic;
pub mod contour;
pub mod debug_dump;
mod detector;
pub mod gate;
pub mod overlay;
mod pipeline;
pub mod preprocess;
pub mod search;
pub mod seed;
pub mod select;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::{Detector, FrameInput};
pub use conic::Ellipse;
pub use debug_dump::DebugDump;
pub use detector::{
    DetectionParameters, DetectorOptions, DetectorState, ParamsError, SearchConfig,
    DEFAULT_PUPIL_SIZE,
};
pub use overlay::{DrawingSurface, Overlays};
pub use pipeline::{DetectionOutcome, PupilDetection, Roi};
