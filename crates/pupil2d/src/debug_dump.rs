//! Versioned debug dump of one detection call.
//!
//! Intended for manual inspection and tooling. The regular result
//! ([`PupilDetection`]) stays small; this dump carries every intermediate
//! stage and is produced only by [`Detector::detect_with_debug`].
//!
//! [`Detector::detect_with_debug`]: crate::Detector::detect_with_debug

use serde::Serialize;

use crate::conic::Ellipse;
use crate::detector::{DetectionParameters, SearchConfig};
use crate::pipeline::{PupilDetection, Roi};
use crate::preprocess::HistogramSpikes;
use crate::search::{SearchStats, SegmentSet};
use crate::seed::Seed;
use crate::select::Candidate;

pub const DEBUG_SCHEMA_V1: &str = "pupil2d.debug.v1";

#[derive(Debug, Clone, Serialize)]
pub struct DebugDump {
    pub schema_version: String,
    pub image: ImageDebug,
    pub params: DetectionParameters,
    pub search_config: SearchConfig,
    pub stages: StagesDebug,
    pub result: PupilDetection,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageDebug {
    pub width: u32,
    pub height: u32,
    /// Processed ROI in frame coordinates.
    pub roi: Roi,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StagesDebug {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spikes: Option<HistogramSpikes>,
    pub raw_edge_count: usize,
    pub traced_contours: usize,
    pub long_contours: usize,
    /// Split segments in ROI coordinates, longest first.
    pub segments: Vec<Vec<[i32; 2]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warm_start: Option<WarmStartDebug>,
    pub seeds: Vec<Seed>,
    pub search_roots: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchStats>,
    pub solutions: Vec<SegmentSet>,
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refit: Option<RefitDebug>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WarmStartDebug {
    /// Prior in ROI coordinates.
    pub prior: Ellipse,
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefitDebug {
    /// Refit in ROI coordinates.
    pub ellipse: Ellipse,
    pub pixel_count: usize,
    pub consistent: bool,
}

impl DebugDump {
    pub(crate) fn new(
        image_size: (u32, u32),
        params: &DetectionParameters,
        search_config: &SearchConfig,
        stages: StagesDebug,
        result: PupilDetection,
    ) -> Self {
        Self {
            schema_version: DEBUG_SCHEMA_V1.to_string(),
            image: ImageDebug {
                width: image_size.0,
                height: image_size.1,
                roi: result.roi,
            },
            params: params.clone(),
            search_config: *search_config,
            stages,
            result,
        }
    }
}
