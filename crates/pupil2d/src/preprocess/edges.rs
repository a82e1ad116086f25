use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_dilate, grayscale_erode, grayscale_open, Mask};

use super::histogram::HistogramSpikes;
use crate::detector::DetectionParameters;

/// Intensities within this margin of the brightest spike are treated as glint.
pub const GLINT_OFFSET: i32 = 5;

/// Masks and edge maps computed for one ROI.
#[derive(Debug, Clone)]
pub struct EdgeMaps {
    /// 255 where the ROI is dark enough to be pupil (after dilation).
    pub dark_mask: GrayImage,
    /// 255 where the ROI is not glint (after erosion).
    pub glint_mask: GrayImage,
    /// Opened and median-blurred ROI fed to Canny.
    pub filtered: GrayImage,
    /// Canny edges restricted to dark, non-glint pixels.
    pub edges: GrayImage,
}

/// Binary mask: 255 where `pixel <= max_value`, 0 elsewhere.
pub(crate) fn threshold_at_most(image: &GrayImage, max_value: i32) -> GrayImage {
    let mut out = GrayImage::new(image.width(), image.height());
    for (dst, src) in out.pixels_mut().zip(image.pixels()) {
        if (src[0] as i32) <= max_value {
            *dst = Luma([255]);
        }
    }
    out
}

/// Pixelwise minimum of equally sized images.
pub(crate) fn pixelwise_min(images: &[&GrayImage]) -> GrayImage {
    let Some((first, rest)) = images.split_first() else {
        return GrayImage::new(0, 0);
    };
    let mut out = (*first).clone();
    for img in rest {
        debug_assert_eq!(img.dimensions(), out.dimensions());
        for (dst, src) in out.pixels_mut().zip(img.pixels()) {
            dst[0] = dst[0].min(src[0]);
        }
    }
    out
}

fn dark_mask(roi: &GrayImage, spikes: &HistogramSpikes, intensity_range: i32) -> GrayImage {
    let kernel = Mask::disk(3);
    let mask = threshold_at_most(roi, spikes.lowest as i32 + intensity_range);
    let mask = grayscale_dilate(&mask, &kernel);
    grayscale_dilate(&mask, &kernel)
}

fn glint_mask(roi: &GrayImage, spikes: &HistogramSpikes) -> GrayImage {
    let mask = threshold_at_most(roi, spikes.highest as i32 - GLINT_OFFSET);
    grayscale_erode(&mask, &Mask::disk(3))
}

/// Remove eyelash clutter, then median-blur when `blur_size > 1`.
fn smooth_roi(roi: &GrayImage, blur_size: u32) -> GrayImage {
    let opened = grayscale_open(roi, &Mask::disk(4));
    if blur_size > 1 {
        let r = blur_size / 2;
        imageproc::filter::median_filter(&opened, r, r)
    } else {
        opened
    }
}

/// Build the dark / glint masks and the restricted edge map of one ROI.
pub fn build_edge_maps(
    roi: &GrayImage,
    spikes: &HistogramSpikes,
    params: &DetectionParameters,
) -> EdgeMaps {
    let dark_mask = dark_mask(roi, spikes, params.intensity_range);
    let glint_mask = glint_mask(roi, spikes);
    let filtered = smooth_roi(roi, params.blur_size);

    let (low, high) = params.canny_thresholds_3x3();
    let raw_edges = imageproc::edges::canny(&filtered, low, high);
    let edges = pixelwise_min(&[&raw_edges, &glint_mask, &dark_mask]);

    tracing::trace!(
        lowest = spikes.lowest,
        highest = spikes.highest,
        low,
        high,
        "edge maps built"
    );

    EdgeMaps {
        dark_mask,
        glint_mask,
        filtered,
        edges,
    }
}
