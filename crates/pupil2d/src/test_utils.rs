//! Synthetic eye images and outlines shared by unit tests and benches.

use image::{GrayImage, Luma};
use imageproc::point::Point;

use crate::conic::Ellipse;

/// Intensities of the synthetic eye.
pub(crate) const PUPIL_PIX: u8 = 30;
pub(crate) const IRIS_PIX: u8 = 150;
pub(crate) const GLINT_PIX: u8 = 255;

/// Rasterize the boundary of `e` as a closed 8-connected curve of 255s.
pub(crate) fn draw_ellipse_outline(w: u32, h: u32, e: &Ellipse) -> GrayImage {
    let mut img = GrayImage::new(w, h);
    for p in ellipse_arc_pixels(e, 0.0, std::f64::consts::TAU) {
        if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
            img.put_pixel(p.x as u32, p.y as u32, Luma([255]));
        }
    }
    img
}

fn touches(p: Point<i32>, q: Point<i32>) -> bool {
    (p.x - q.x).abs() <= 1 && (p.y - q.y).abs() <= 1
}

/// Rounded pixels along the arc of `e` between parameter angles `t0` and
/// `t1` (radians), in traversal order, thinned to an 8-connected chain.
pub(crate) fn ellipse_arc_pixels(e: &Ellipse, t0: f64, t1: f64) -> Vec<Point<i32>> {
    let (sin_a, cos_a) = e.angle.sin_cos();
    let n = ((t1 - t0).abs() * e.a.max(e.b) * 4.0).ceil().max(2.0) as usize;
    let mut out: Vec<Point<i32>> = Vec::with_capacity(n);
    for i in 0..=n {
        let t = t0 + (t1 - t0) * i as f64 / n as f64;
        let (px, py) = (e.a * t.cos(), e.b * t.sin());
        let p = Point::new(
            (e.cx + cos_a * px - sin_a * py).round() as i32,
            (e.cy + sin_a * px + cos_a * py).round() as i32,
        );
        if out.last() == Some(&p) || out.first() == Some(&p) {
            continue;
        }
        // Drop staircase corners
        if out.len() >= 2 && touches(out[out.len() - 2], p) {
            out.pop();
        }
        out.push(p);
    }
    out
}

/// Render an eye crop: a dark filled pupil on a uniform iris, with an
/// optional bright square glint `(x0, y0, side)`.
pub(crate) fn draw_eye_image(
    w: u32,
    h: u32,
    pupil: &Ellipse,
    glint: Option<(u32, u32, u32)>,
) -> GrayImage {
    let conic = pupil.to_conic();
    GrayImage::from_fn(w, h, |x, y| {
        if let Some((gx, gy, side)) = glint {
            if x >= gx && x < gx + side && y >= gy && y < gy + side {
                return Luma([GLINT_PIX]);
            }
        }
        let inside = conic.algebraic_distance(x as f64, y as f64) < 0.0;
        Luma([if inside { PUPIL_PIX } else { IRIS_PIX }])
    })
}

/// The standard synthetic frame: 240×240 with one pupil and one glint.
pub(crate) fn standard_eye(pupil: &Ellipse) -> GrayImage {
    draw_eye_image(240, 240, pupil, Some((190, 20, 10)))
}
