use imageproc::rect::Rect;

use crate::conic::Ellipse;

/// How a detection call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// Full pipeline produced an ellipse.
    Detected,
    /// The previous ellipse was still supported and was refit directly.
    WarmStart,
    /// No contour segment survived decomposition.
    NoSegments,
    /// No segment produced a plausible, tight ellipse.
    NoSeeds,
    /// No merged candidate reached the final support threshold.
    NoCandidate,
}

impl DetectionOutcome {
    pub fn is_detection(self) -> bool {
        matches!(self, Self::Detected | Self::WarmStart)
    }
}

/// Processed region in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<Rect> for Roi {
    fn from(r: Rect) -> Self {
        Self {
            x: r.left(),
            y: r.top(),
            width: r.width(),
            height: r.height(),
        }
    }
}

/// Result of one detection call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PupilDetection {
    /// Support-based confidence in `[0, 1]`; 0 means no usable detection.
    pub confidence: f64,
    /// Pupil ellipse in frame coordinates; `None` when confidence is 0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ellipse: Option<Ellipse>,
    /// Copied from the frame input.
    pub timestamp: f64,
    pub outcome: DetectionOutcome,
    /// Region actually processed.
    pub roi: Roi,
}

impl PupilDetection {
    pub(crate) fn failed(outcome: DetectionOutcome, timestamp: f64, roi: Roi) -> Self {
        debug_assert!(!outcome.is_detection());
        Self {
            confidence: 0.0,
            ellipse: None,
            timestamp,
            outcome,
            roi,
        }
    }

    pub(crate) fn found(
        outcome: DetectionOutcome,
        ellipse: Ellipse,
        support: f64,
        timestamp: f64,
        roi: Roi,
    ) -> Self {
        Self {
            confidence: support.clamp(0.0, 1.0),
            ellipse: Some(ellipse),
            timestamp,
            outcome,
            roi,
        }
    }

    /// Pupil diameter (major axis) if detected.
    pub fn diameter(&self) -> Option<f64> {
        self.ellipse.map(|e| e.major_axis())
    }
}
