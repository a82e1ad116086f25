use image::GrayImage;

/// Bins holding more than this many pixels count as populated.
pub const SPIKE_WINDOW: u32 = 40;

/// Populated-intensity bounds of an ROI histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HistogramSpikes {
    /// Darkest populated intensity (pupil population).
    pub lowest: u8,
    /// Brightest populated intensity (glint population).
    pub highest: u8,
    /// Count of the fullest populated bin; 0 when nothing is populated.
    pub max_count: u32,
}

impl HistogramSpikes {
    /// Result for a histogram without any populated bin.
    pub const DEGENERATE: Self = Self {
        lowest: 0,
        highest: 255,
        max_count: 0,
    };

    pub fn is_degenerate(&self) -> bool {
        self.max_count == 0
    }
}

/// 256-bin intensity histogram of a grayscale image.
pub fn intensity_histogram(image: &GrayImage) -> [u32; 256] {
    imageproc::stats::histogram(image).channels[0]
}

/// Scan `hist` for bins with more than `window` pixels.
///
/// Bins are visited in increasing intensity order, so equal counts resolve
/// to the lowest index.
pub fn analyze_spikes(hist: &[u32; 256], window: u32) -> HistogramSpikes {
    let mut populated = hist
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > window);

    let Some((first, &first_count)) = populated.next() else {
        return HistogramSpikes::DEGENERATE;
    };
    let (highest, max_count) = populated.fold(
        (first, first_count),
        |(_, max_count), (i, &count)| (i, max_count.max(count)),
    );

    HistogramSpikes {
        lowest: first as u8,
        highest: highest as u8,
        max_count,
    }
}
