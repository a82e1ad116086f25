//! Edge map → curvature-split polyline segments.
//!
//! Segments are kept short so that the merge search stays tractable: each
//! traced contour is simplified with Douglas-Peucker and cut at sharp turns
//! and inflections.

mod split;

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

pub use split::{split_polyline, MIN_SEGMENT_POINTS, SPLIT_ANGLE_DEG};

/// Douglas-Peucker tolerance for contour simplification (px).
pub const SIMPLIFY_EPSILON: f64 = 1.5;

/// Output of [`decompose`].
#[derive(Debug, Clone, Default)]
pub struct Decomposition {
    /// Every non-zero edge pixel, row-major.
    pub raw_edges: Vec<Point<i32>>,
    /// Number of traced contours before the length filter.
    pub n_traced: usize,
    /// Number of contours passing the length filter.
    pub n_long: usize,
    /// Split segments, longest first.
    pub segments: Vec<Vec<Point<i32>>>,
}

/// Coordinates of all non-zero pixels in row-major order.
pub fn nonzero_points(image: &GrayImage) -> Vec<Point<i32>> {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| Point::new(x as i32, y as i32))
        .collect()
}

fn simplify(contour: &[Point<i32>]) -> Vec<Point<i32>> {
    if contour.len() < 3 {
        return contour.to_vec();
    }
    approximate_polygon_dp(contour, SIMPLIFY_EPSILON, false)
}

/// Trace, filter, simplify and split the contours of an edge map.
pub fn decompose(edges: &GrayImage, contour_size_min: usize) -> Decomposition {
    let raw_edges = nonzero_points(edges);
    let traced = find_contours::<i32>(edges);
    let n_traced = traced.len();

    let mut n_long = 0usize;
    let mut segments = Vec::new();
    for contour in traced.iter().filter(|c| c.points.len() > contour_size_min) {
        n_long += 1;
        let simplified = simplify(&contour.points);
        split_polyline(&simplified, SPLIT_ANGLE_DEG, MIN_SEGMENT_POINTS, &mut segments);
    }
    segments.sort_by(|a, b| b.len().cmp(&a.len()));

    tracing::debug!(
        raw_edges = raw_edges.len(),
        traced = n_traced,
        long = n_long,
        segments = segments.len(),
        "contours decomposed"
    );

    Decomposition {
        raw_edges,
        n_traced,
        n_long,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::Ellipse;
    use crate::test_utils::draw_ellipse_outline;
    use image::Luma;

    #[test]
    fn nonzero_points_are_row_major() {
        let mut img = GrayImage::new(5, 4);
        img.put_pixel(3, 0, Luma([1]));
        img.put_pixel(1, 2, Luma([255]));
        img.put_pixel(0, 3, Luma([7]));
        assert_eq!(
            nonzero_points(&img),
            vec![Point::new(3, 0), Point::new(1, 2), Point::new(0, 3)]
        );
    }

    #[test]
    fn empty_edge_map_has_no_segments() {
        let d = decompose(&GrayImage::new(32, 32), 5);
        assert!(d.raw_edges.is_empty());
        assert!(d.segments.is_empty());
    }

    #[test]
    fn ellipse_outline_gives_convex_segments() {
        let e = Ellipse::new(60.0, 60.0, 35.0, 25.0, 0.4);
        let edges = draw_ellipse_outline(120, 120, &e);
        let d = decompose(&edges, 5);
        assert!(!d.segments.is_empty());
        assert!(d.n_long <= d.n_traced);
        for w in d.segments.windows(2) {
            assert!(w[0].len() >= w[1].len(), "segments sorted longest first");
        }
        for seg in &d.segments {
            assert!(seg.len() >= MIN_SEGMENT_POINTS);
            for p in seg {
                assert!(e.distance(p.x as f64, p.y as f64) < 1.5);
            }
        }
    }

    #[test]
    fn short_contours_are_filtered() {
        let mut img = GrayImage::new(40, 40);
        for x in 10..14 {
            img.put_pixel(x, 20, Luma([255]));
        }
        let d = decompose(&img, 20);
        assert_eq!(d.raw_edges.len(), 4);
        assert_eq!(d.n_long, 0);
        assert!(d.segments.is_empty());
    }
}
