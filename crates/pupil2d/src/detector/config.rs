use std::path::Path;

/// Errors reported by [`DetectionParameters::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamsError {
    /// A numeric field is NaN or infinite.
    NotFinite {
        /// Field name.
        field: &'static str,
    },
    /// A `[min, max]` pair is reversed or negative.
    InvalidRange {
        /// Field name.
        field: &'static str,
        /// Offending range.
        range: [f32; 2],
    },
    /// Canny aperture other than 3, 5 or 7.
    UnsupportedAperture(u32),
    /// Median blur size must be odd (or ≤ 1 to disable blurring).
    EvenBlurSize(u32),
    /// A field that must be strictly positive is not.
    NotPositive {
        /// Field name.
        field: &'static str,
    },
}

impl std::fmt::Display for ParamsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFinite { field } => write!(f, "{} must be finite", field),
            Self::InvalidRange { field, range } => {
                write!(
                    f,
                    "{} must satisfy 0 <= min <= max, got [{}, {}]",
                    field, range[0], range[1]
                )
            }
            Self::UnsupportedAperture(k) => {
                write!(f, "canny_aperture must be 3, 5 or 7, got {}", k)
            }
            Self::EvenBlurSize(k) => write!(f, "blur_size must be odd, got {}", k),
            Self::NotPositive { field } => write!(f, "{} must be > 0", field),
        }
    }
}

impl std::error::Error for ParamsError {}

/// Per-call tuning parameters of the 2-D pupil detector.
///
/// Sizes are full axis lengths in pixels. Field names accept the spellings
/// used by existing eye-tracker settings files as serde aliases.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectionParameters {
    /// Intensity offset above the darkest histogram spike that still counts
    /// as pupil.
    pub intensity_range: i32,
    /// Median blur kernel size; blurring is skipped for values ≤ 1.
    pub blur_size: u32,
    /// Canny low threshold, in aperture-`canny_aperture` Sobel units.
    #[serde(alias = "canny_treshold")]
    pub canny_threshold: f32,
    /// High / low Canny threshold ratio.
    #[serde(alias = "canny_ration")]
    pub canny_ratio: f32,
    /// Sobel aperture the Canny thresholds are expressed for (3, 5 or 7).
    pub canny_aperture: u32,
    /// Smallest plausible pupil major axis (px).
    pub pupil_size_min: f32,
    /// Largest plausible pupil major axis (px).
    pub pupil_size_max: f32,
    /// Arc length / perimeter range for strong seeds; its minimum is also
    /// the strong true-support threshold.
    pub strong_perimeter_ratio_range: [f32; 2],
    /// Convex hull area / ellipse area range for strong seeds.
    pub strong_area_ratio_range: [f32; 2],
    /// True-support range for the final candidate; only the minimum gates.
    pub final_perimeter_ratio_range: [f32; 2],
    /// Traced contours must have more points than this.
    pub contour_size_min: usize,
    /// Minimum minor / major axis ratio.
    pub ellipse_roundness_ratio: f32,
    /// Maximum mean squared point-to-ellipse distance (px²).
    #[serde(alias = "initial_ellipse_fit_treshhold")]
    pub initial_ellipse_fit_threshold: f32,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            intensity_range: 23,
            blur_size: 5,
            canny_threshold: 160.0,
            canny_ratio: 2.0,
            canny_aperture: 5,
            pupil_size_min: 10.0,
            pupil_size_max: 100.0,
            strong_perimeter_ratio_range: [0.8, 1.1],
            strong_area_ratio_range: [0.6, 1.1],
            final_perimeter_ratio_range: [0.6, 1.2],
            contour_size_min: 5,
            ellipse_roundness_ratio: 0.1,
            initial_ellipse_fit_threshold: 1.8,
        }
    }
}

impl DetectionParameters {
    /// Load parameters from a JSON file. All fields are required.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&data)?;
        params.validate()?;
        Ok(params)
    }

    /// Boundary check for caller-supplied parameters.
    ///
    /// The detector itself never fails on bad parameters; it degrades to a
    /// zero-confidence result. Callers should validate once before the
    /// tracking loop.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let scalars = [
            ("canny_threshold", self.canny_threshold),
            ("canny_ratio", self.canny_ratio),
            ("pupil_size_min", self.pupil_size_min),
            ("pupil_size_max", self.pupil_size_max),
            ("ellipse_roundness_ratio", self.ellipse_roundness_ratio),
            (
                "initial_ellipse_fit_threshold",
                self.initial_ellipse_fit_threshold,
            ),
        ];
        for (field, v) in scalars {
            if !v.is_finite() {
                return Err(ParamsError::NotFinite { field });
            }
        }
        if self.canny_threshold <= 0.0 {
            return Err(ParamsError::NotPositive {
                field: "canny_threshold",
            });
        }
        if self.canny_ratio <= 0.0 {
            return Err(ParamsError::NotPositive {
                field: "canny_ratio",
            });
        }
        if self.initial_ellipse_fit_threshold <= 0.0 {
            return Err(ParamsError::NotPositive {
                field: "initial_ellipse_fit_threshold",
            });
        }
        if !matches!(self.canny_aperture, 3 | 5 | 7) {
            return Err(ParamsError::UnsupportedAperture(self.canny_aperture));
        }
        if self.blur_size > 1 && self.blur_size % 2 == 0 {
            return Err(ParamsError::EvenBlurSize(self.blur_size));
        }

        let ranges = [
            ("pupil_size", [self.pupil_size_min, self.pupil_size_max]),
            ("strong_perimeter_ratio_range", self.strong_perimeter_ratio_range),
            ("strong_area_ratio_range", self.strong_area_ratio_range),
            ("final_perimeter_ratio_range", self.final_perimeter_ratio_range),
        ];
        for (field, range) in ranges {
            let [lo, hi] = range;
            if !lo.is_finite() || !hi.is_finite() {
                return Err(ParamsError::NotFinite { field });
            }
            if lo < 0.0 || lo > hi {
                return Err(ParamsError::InvalidRange { field, range });
            }
        }
        Ok(())
    }

    /// Canny `(low, high)` thresholds rescaled to the 3×3 Sobel response.
    ///
    /// A unit intensity step produces a response of 4 with the 3×3 Sobel
    /// kernel, 48 with 5×5 and 640 with 7×7.
    pub fn canny_thresholds_3x3(&self) -> (f32, f32) {
        let gain = match self.canny_aperture {
            5 => 48.0,
            7 => 640.0,
            _ => 4.0,
        };
        let scale = 4.0 / gain;
        let low = self.canny_threshold * scale;
        (low, low * self.canny_ratio)
    }
}

/// Limits of the segment-merge search.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Largest number of segments merged into one candidate.
    pub max_depth: usize,
    /// Hard cap on frontier pops per call; bounds worst-case work.
    pub max_evaluations: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_evaluations: 1000,
        }
    }
}

/// Detector-lifetime options (not part of the per-call parameters).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DetectorOptions {
    /// Segment-merge search limits.
    pub search: SearchConfig,
    /// Try the previous strong ellipse first and skip the segment search
    /// when it is still well supported by the new frame's edges.
    pub warm_start: bool,
}
