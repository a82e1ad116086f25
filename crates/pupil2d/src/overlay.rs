//! Visualization side channel.
//!
//! The detector draws into caller-provided surfaces only when they are
//! present in [`Overlays`]; the core never depends on them. Both surfaces
//! are addressed in frame coordinates.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::point::Point;

use crate::conic::Ellipse;
use crate::pipeline::Roi;
use crate::preprocess::HistogramSpikes;

pub type Color = [u8; 3];

pub const RED: Color = [255, 0, 0];
pub const GREEN: Color = [0, 255, 0];
pub const BLUE: Color = [0, 0, 255];
pub const ROYAL_BLUE: Color = [65, 105, 225];
pub const YELLOW: Color = [255, 255, 0];
pub const WHITE: Color = [255, 255, 255];

const SEGMENT_PALETTE: [Color; 6] = [RED, BLUE, ROYAL_BLUE, YELLOW, WHITE, GREEN];

/// An RGB canvas the detector can annotate.
pub trait DrawingSurface {
    /// `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);
    fn pixel(&self, x: u32, y: u32) -> Color;
    fn set_pixel(&mut self, x: u32, y: u32, color: Color);
    /// One-pixel line; parts outside the surface are clipped.
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color);
    /// Circle outline; parts outside the surface are clipped.
    fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: Color);
}

impl DrawingSurface for RgbImage {
    fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn pixel(&self, x: u32, y: u32) -> Color {
        self.get_pixel(x, y).0
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.put_pixel(x, y, Rgb(color));
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32), color: Color) {
        draw_line_segment_mut(self, from, to, Rgb(color));
    }

    fn draw_circle(&mut self, center: (i32, i32), radius: i32, color: Color) {
        if radius > 0 {
            draw_hollow_circle_mut(self, center, radius, Rgb(color));
        }
    }
}

/// Optional drawing targets for one detection call.
///
/// `color` receives the histogram, mask tint, ROI frames and size gauges;
/// `debug` receives segments, seeds and candidate ellipses.
#[derive(Default)]
pub struct Overlays<'a> {
    pub color: Option<&'a mut dyn DrawingSurface>,
    pub debug: Option<&'a mut dyn DrawingSurface>,
}

impl<'a> Overlays<'a> {
    pub fn none() -> Self {
        Self::default()
    }
}

fn in_bounds(surface: &dyn DrawingSurface, x: i32, y: i32) -> bool {
    let (w, h) = surface.size();
    x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h
}

/// Draw the normalized histogram along the right edge, one row per bin,
/// with markers at the spike bounds and their thresholds.
pub(crate) fn draw_histogram(
    surface: &mut dyn DrawingSurface,
    hist: &[u32; 256],
    spikes: &HistogramSpikes,
    intensity_range: i32,
    glint_offset: i32,
) {
    const SCALE_X: f32 = 100.0;
    let right = surface.size().0 as f32;
    let max = spikes.max_count.max(1) as f32;
    for (i, &count) in hist.iter().enumerate() {
        let len = (count as f32 / max).min(1.0) * SCALE_X;
        surface.draw_line((right, i as f32), (right - len, i as f32), BLUE);
    }
    let markers = [
        (spikes.lowest as i32, RED),
        (spikes.lowest as i32 + intensity_range, YELLOW),
        (spikes.highest as i32, RED),
        (spikes.highest as i32 - glint_offset, WHITE),
    ];
    for (row, color) in markers {
        let row = row as f32;
        surface.draw_line((right, row), (right - 0.5 * SCALE_X, row), color);
    }
}

/// Tint the ROI: green channel raised by edges, blue channel raised by the
/// dark mask and cut by the glint mask.
pub(crate) fn tint_masks(
    surface: &mut dyn DrawingSurface,
    roi: Roi,
    edges: &image::GrayImage,
    dark: &image::GrayImage,
    glint: &image::GrayImage,
) {
    for (x, y, e) in edges.enumerate_pixels() {
        let (fx, fy) = (roi.x + x as i32, roi.y + y as i32);
        if !in_bounds(surface, fx, fy) {
            continue;
        }
        let [r, g, b] = surface.pixel(fx as u32, fy as u32);
        let g = g.max(e[0]);
        let b = b.max(dark.get_pixel(x, y)[0]).min(glint.get_pixel(x, y)[0]);
        surface.set_pixel(fx as u32, fy as u32, [r, g, b]);
    }
}

/// Reset every pixel to black.
pub(crate) fn clear(surface: &mut dyn DrawingSurface) {
    let (w, h) = surface.size();
    for y in 0..h {
        for x in 0..w {
            surface.set_pixel(x, y, [0, 0, 0]);
        }
    }
}

/// Rectangle outline drawn on every other pixel.
pub(crate) fn draw_dotted_rect(
    surface: &mut dyn DrawingSurface,
    x: i32,
    y: i32,
    w: i32,
    h: i32,
    color: Color,
) {
    if w <= 0 || h <= 0 {
        return;
    }
    let (x1, y1) = (x + w - 1, y + h - 1);
    let mut dot = |px: i32, py: i32| {
        if in_bounds(surface, px, py) {
            surface.set_pixel(px as u32, py as u32, color);
        }
    };
    for px in (x..=x1).step_by(2) {
        dot(px, y);
        dot(px, y1);
    }
    for py in (y..=y1).step_by(2) {
        dot(x, py);
        dot(x1, py);
    }
}

/// Min / current / max pupil size gauges in the lower-left corner.
pub(crate) fn draw_size_gauges(
    surface: &mut dyn DrawingSurface,
    size_min: f64,
    size_current: f64,
    size_max: f64,
) {
    let (_, h) = surface.size();
    let center = (100, h as i32 - 100);
    surface.draw_circle(center, (size_min / 2.0).round() as i32, RED);
    surface.draw_circle(center, (size_current / 2.0).round() as i32, GREEN);
    surface.draw_circle(center, (size_max / 2.0).round() as i32, RED);
}

/// Open polyline shifted by `offset`, `thickness` pixels wide.
pub(crate) fn draw_polyline(
    surface: &mut dyn DrawingSurface,
    points: &[Point<i32>],
    offset: (i32, i32),
    color: Color,
    thickness: u32,
) {
    let t = thickness.max(1) as i32;
    for w in points.windows(2) {
        for d in 0..t {
            let shift = (d - (t - 1) / 2) as f32;
            for (dx, dy) in [(shift, 0.0), (0.0, shift)] {
                let a = (
                    (w[0].x + offset.0) as f32 + dx,
                    (w[0].y + offset.1) as f32 + dy,
                );
                let b = (
                    (w[1].x + offset.0) as f32 + dx,
                    (w[1].y + offset.1) as f32 + dy,
                );
                surface.draw_line(a, b, color);
            }
        }
    }
}

/// Segment polylines in cycling colors.
pub(crate) fn draw_segments(
    surface: &mut dyn DrawingSurface,
    segments: &[Vec<Point<i32>>],
    offset: (i32, i32),
) {
    for (i, seg) in segments.iter().enumerate() {
        draw_polyline(surface, seg, offset, SEGMENT_PALETTE[i % SEGMENT_PALETTE.len()], 1);
    }
}

/// Ellipse outline approximated by a closed polyline.
pub(crate) fn draw_ellipse(surface: &mut dyn DrawingSurface, e: &Ellipse, color: Color) {
    if !e.is_valid() {
        return;
    }
    let n = ((e.perimeter() / 4.0).ceil() as usize).clamp(16, 360);
    let pts = e.sample_points(n);
    for i in 0..n {
        let [x0, y0] = pts[i];
        let [x1, y1] = pts[(i + 1) % n];
        surface.draw_line((x0 as f32, y0 as f32), (x1 as f32, y1 as f32), color);
    }
}

/// Saturate the red channel at each pixel.
pub(crate) fn mark_pixels_red(
    surface: &mut dyn DrawingSurface,
    pixels: &[Point<i32>],
    offset: (i32, i32),
) {
    for p in pixels {
        let (x, y) = (p.x + offset.0, p.y + offset.1);
        if in_bounds(surface, x, y) {
            let [_, g, b] = surface.pixel(x as u32, y as u32);
            surface.set_pixel(x as u32, y as u32, [255, g, b]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn count_color(img: &RgbImage, color: Color) -> usize {
        img.pixels().filter(|p| p.0 == color).count()
    }

    #[test]
    fn ellipse_outline_lands_on_boundary() {
        let mut img = RgbImage::new(100, 100);
        let e = Ellipse::new(50.0, 50.0, 30.0, 20.0, 0.4);
        draw_ellipse(&mut img, &e, GREEN);
        let drawn: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == GREEN)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert!(drawn.len() > 100);
        for (x, y) in drawn {
            assert!(e.distance(x as f64, y as f64) < 1.5);
        }
    }

    #[test]
    fn histogram_rows_scale_with_counts() {
        let mut img = RgbImage::new(300, 260);
        let mut hist = [0u32; 256];
        hist[10] = 200;
        hist[100] = 150;
        let spikes = HistogramSpikes {
            lowest: 10,
            highest: 100,
            max_count: 200,
        };
        draw_histogram(&mut img, &hist, &spikes, 20, 5);
        // Full-length bar ends 100 px from the right edge
        assert_eq!(img.get_pixel(201, 10).0, BLUE);
        assert_eq!(img.get_pixel(198, 10).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(260, 10).0, RED);
        assert_eq!(img.get_pixel(210, 30).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(255, 100).0, RED);
        assert_eq!(img.get_pixel(230, 100).0, BLUE);
        assert_eq!(img.get_pixel(220, 100).0, [0, 0, 0]);
        assert_eq!(img.get_pixel(260, 30).0, YELLOW);
        assert_eq!(img.get_pixel(260, 95).0, WHITE);
    }

    #[test]
    fn masks_tint_roi_channels() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([10, 10, 10]));
        let roi = Roi {
            x: 2,
            y: 3,
            width: 4,
            height: 4,
        };
        let mut edges = GrayImage::new(4, 4);
        edges.put_pixel(1, 1, Luma([255]));
        let dark = GrayImage::from_pixel(4, 4, Luma([255]));
        let mut glint = GrayImage::from_pixel(4, 4, Luma([255]));
        glint.put_pixel(0, 0, Luma([0]));
        tint_masks(&mut img, roi, &edges, &dark, &glint);
        assert_eq!(img.get_pixel(3, 4).0, [10, 255, 255]);
        assert_eq!(img.get_pixel(2, 3).0, [10, 10, 0]);
        assert_eq!(img.get_pixel(0, 0).0, [10, 10, 10]);
    }

    #[test]
    fn clear_blanks_the_surface() {
        let mut img = RgbImage::from_pixel(6, 4, Rgb([9, 8, 7]));
        clear(&mut img);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn drawing_is_clipped() {
        let mut img = RgbImage::new(20, 20);
        draw_dotted_rect(&mut img, -5, -5, 40, 40, WHITE);
        mark_pixels_red(&mut img, &[Point::new(-1, 3), Point::new(4, 4)], (1, 1));
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0]);
        draw_size_gauges(&mut img, 10.0, 20.0, 30.0);
        draw_segments(&mut img, &[vec![Point::new(0, 0), Point::new(30, 30)]], (0, 0));
        assert!(count_color(&img, RED) >= 1);
    }
}
