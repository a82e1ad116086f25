//! ROI intensity analysis and edge extraction.
//!
//! The histogram's darkest and brightest populated bins split the ROI into
//! pupil, iris/skin and glint populations. Canny edges survive only where
//! the ROI is dark enough to be pupil and not glint.

mod edges;
mod histogram;

pub use edges::{build_edge_maps, EdgeMaps, GLINT_OFFSET};
pub(crate) use edges::pixelwise_min;
pub use histogram::{analyze_spikes, intensity_histogram, HistogramSpikes, SPIKE_WINDOW};
