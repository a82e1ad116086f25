use crate::conic::Ellipse;

/// Major-axis length assumed before the first accepted detection (px).
pub const DEFAULT_PUPIL_SIZE: f64 = 100.0;

/// Cross-frame memory of one detector instance.
///
/// Only candidate selection and the warm-start step write to it. Nothing
/// here is shared between detector instances.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectorState {
    /// Major-axis length of the last accepted (refit) ellipse.
    pub pupil_size: f64,
    /// Last strongly supported ellipse, in frame coordinates.
    pub prior_ellipse: Option<Ellipse>,
    /// Armed after a strongly supported detection; consumed by the
    /// warm-start step on the next call.
    pub use_strong_prior: bool,
}

impl Default for DetectorState {
    fn default() -> Self {
        Self {
            pupil_size: DEFAULT_PUPIL_SIZE,
            prior_ellipse: None,
            use_strong_prior: false,
        }
    }
}

impl DetectorState {
    /// Remember a strongly supported ellipse and arm the warm-start flag.
    pub(crate) fn record_strong_prior(&mut self, ellipse_frame: Ellipse) {
        self.prior_ellipse = Some(ellipse_frame);
        self.use_strong_prior = true;
    }

    /// Take the prior if the warm-start flag is armed. Disarms the flag
    /// whether or not a prior is present.
    pub(crate) fn take_armed_prior(&mut self) -> Option<Ellipse> {
        if !std::mem::take(&mut self.use_strong_prior) {
            return None;
        }
        self.prior_ellipse
    }
}
